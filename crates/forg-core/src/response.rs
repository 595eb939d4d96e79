//! The result of requesting a [`Resource`].

use std::path::Path;

use forg_types::ItemType;
use forg_types::error::{ForgError, Result};

use crate::ask::AskForm;
use crate::parser::{self, Classification};
use crate::resource::Resource;

/// What a response holds once populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// Not populated yet, or failed.
    #[default]
    Empty,
    /// A directory listing.
    Directory(Vec<Resource>),
    /// Anything else, byte for byte.
    Data(Vec<u8>),
    /// An interactive item's questions.
    Form(AskForm),
}

/// A server's answer to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub item_type: ItemType,
    pub host: String,
    pub port: u16,
    pub locator: String,
    pub name: String,
    body: Body,
    error: Option<String>,
    pub should_cache: bool,
    pub declared_length: i64,
}

impl Response {
    /// An empty response carrying `resource`'s identity.
    pub fn for_resource(resource: &Resource) -> Self {
        Self {
            item_type: resource.item_type,
            host: resource.host.clone(),
            port: resource.port,
            locator: resource.locator.clone(),
            name: resource.name.clone(),
            body: Body::Empty,
            error: None,
            should_cache: resource.should_cache,
            declared_length: resource.declared_length,
        }
    }

    /// A failed response for `resource`, never cached.
    pub fn from_error(resource: &Resource, message: impl Into<String>) -> Self {
        let mut response = Self::for_resource(resource);
        response.set_error(message);
        response
    }

    /// Fill the body from raw response bytes.
    ///
    /// Bytes that classify as a directory are parsed into entries and
    /// the type becomes directory; anything else is kept as data.
    pub fn populate(&mut self, raw: Vec<u8>) {
        match parser::classify(self.item_type, &raw) {
            Classification::Directory => {
                let entries = parser::parse_directory(&String::from_utf8_lossy(&raw));
                log::debug!("{} parsed as a directory of {} entries", self.url(), entries.len());
                self.item_type = ItemType::Directory;
                self.body = Body::Directory(entries);
            },
            Classification::OpaqueData => {
                log::debug!("{} is {} bytes of data", self.url(), raw.len());
                self.body = Body::Data(raw);
            },
        }
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.body = Body::Data(data);
    }

    pub fn set_entries(&mut self, entries: Vec<Resource>) {
        self.body = Body::Directory(entries);
    }

    pub fn set_form(&mut self, form: AskForm) {
        self.should_cache = false;
        self.body = Body::Form(form);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.should_cache = false;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Data bytes, unless this is a directory, form or failure.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Directory entries, if this is a directory.
    pub fn entries(&self) -> Option<&[Resource]> {
        match &self.body {
            Body::Directory(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&AskForm> {
        match &self.body {
            Body::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.body, Body::Directory(_))
    }

    /// The resource this response answers.
    pub fn resource(&self) -> Resource {
        let mut resource =
            Resource::new(self.item_type, &self.host, self.port, &self.locator, &self.name);
        resource.should_cache = self.should_cache;
        resource.declared_length = self.declared_length;
        resource
    }

    pub fn url(&self) -> String {
        self.resource().to_url()
    }

    /// Directory entries re-encoded as protocol lines, or the data as is.
    /// Forms and failures have no wire form.
    pub fn to_protocol_bytes(&self) -> Vec<u8> {
        match &self.body {
            Body::Directory(entries) => entries
                .iter()
                .flat_map(|e| e.to_protocol_line().into_bytes())
                .collect(),
            Body::Data(data) => data.clone(),
            Body::Empty | Body::Form(_) => Vec::new(),
        }
    }

    /// Save the response to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(error) = &self.error {
            return Err(ForgError::Save(format!(
                "{} failed and has nothing to save: {error}",
                self.url()
            )));
        }
        std::fs::write(path, self.to_protocol_bytes())
            .map_err(|e| ForgError::Save(format!("{}: {e}", path.display())))?;
        log::info!("Saved {} to {}", self.url(), path.display());
        Ok(())
    }
}
