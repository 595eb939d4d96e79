//! Gopher and Gopher+ requests on top of the wire transport.

use forg_net::{DeclaredLength, FetchRequest, Progress, Transport};
use forg_types::ForgConfig;
use forg_types::error::{ForgError, Result};

use crate::ask::AskForm;
use crate::info::ResourceInformation;
use crate::parser;
use crate::resource::{LENGTH_UNKNOWN, Resource};
use crate::response::{Body, Response};

/// Declared length for responses that end with the `.` line.
const LENGTH_TERMINATED: i64 = -1;

/// The request line variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `loc\r\n`
    Plain,
    /// `loc\t+\r\n`
    GopherPlus,
    /// `loc\t!\r\n`
    Info,
    /// `loc\t+\t1\r\n` followed by the answers block.
    AskSubmit,
}

impl RequestKind {
    /// How `resource` is fetched for its content.
    pub fn for_resource(resource: &Resource) -> Self {
        if resource.data_block.is_some() {
            RequestKind::AskSubmit
        } else if resource.is_gopher_plus() {
            RequestKind::GopherPlus
        } else {
            RequestKind::Plain
        }
    }

    /// Whether the server answers with a `+N` length line first.
    pub fn has_length_header(self) -> bool {
        !matches!(self, RequestKind::Plain)
    }
}

/// Bytes to send for `resource` as a `kind` request.
pub fn request_bytes(resource: &Resource, kind: RequestKind) -> Vec<u8> {
    let locator = &resource.locator;
    let mut bytes = match kind {
        RequestKind::Plain => format!("{locator}\r\n"),
        RequestKind::GopherPlus => format!("{locator}\t+\r\n"),
        RequestKind::Info => format!("{locator}\t!\r\n"),
        RequestKind::AskSubmit => format!("{locator}\t+\t1\r\n"),
    }
    .into_bytes();
    if kind == RequestKind::AskSubmit
        && let Some(block) = &resource.data_block
    {
        bytes.extend_from_slice(block);
    }
    bytes
}

/// Issues requests for resources and turns the bytes into responses.
pub struct GopherConnection {
    transport: Transport,
    strip_carriage_returns: bool,
    grab_resource_info: bool,
}

impl GopherConnection {
    pub fn new(transport: Transport, config: &ForgConfig) -> Self {
        Self {
            transport,
            strip_carriage_returns: config.strip_carriage_returns,
            grab_resource_info: config.grab_resource_info,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Fetch the Gopher+ information blocks of `resource`.
    pub fn get_info(&self, resource: &Resource) -> Result<ResourceInformation> {
        let (mut body, length) = self.send(resource, RequestKind::Info, None)?;
        parser::strip_terminator(&mut body, length);
        Ok(ResourceInformation::parse(&String::from_utf8_lossy(&body)))
    }

    /// Fetch `resource`, reporting failures as an error response.
    pub fn get_resource(
        &self,
        resource: &Resource,
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> Response {
        match self.try_get_resource(resource, progress) {
            Ok(response) => response,
            Err(e) => {
                log::info!("Fetching {} failed: {e}", resource.to_url());
                Response::from_error(resource, format!("{}\n{}", resource.to_url(), e.user_message()))
            },
        }
    }

    /// Fetch `resource`.
    ///
    /// An ASK item is not requested; its info is fetched instead and the
    /// response carries the parsed form.
    pub fn try_get_resource(
        &self,
        resource: &Resource,
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> Result<Response> {
        let kind = RequestKind::for_resource(resource);
        if kind != RequestKind::AskSubmit && resource.is_ask() {
            return self.get_form(resource);
        }

        let (mut body, length) = self.send(resource, kind, progress)?;
        parser::strip_terminator(&mut body, length);

        let mut response = Response::for_resource(resource);
        response.declared_length = length;
        response.populate(body);

        if self.strip_carriage_returns
            && !response.item_type.is_binary()
            && let Body::Data(data) = response.body_mut()
        {
            *data = fold_crlf(data);
        }

        if self.grab_resource_info
            && let Body::Directory(entries) = response.body_mut()
        {
            self.attach_info(entries);
        }

        Ok(response)
    }

    fn get_form(&self, resource: &Resource) -> Result<Response> {
        let info = match &resource.info {
            Some(info) => info.clone(),
            None => self.get_info(resource)?,
        };
        let block = info.ask().ok_or_else(|| {
            ForgError::Question(format!("{} has no ASK block", resource.to_url()))
        })?;
        let form = AskForm::parse(block);
        log::debug!("{} asks {} questions", resource.to_url(), form.len());

        let mut response = Response::for_resource(resource);
        response.set_form(form);
        Ok(response)
    }

    /// Fetch info for every Gopher+ entry, one round trip each.
    fn attach_info(&self, entries: &mut [Resource]) {
        for entry in entries
            .iter_mut()
            .filter(|e| e.aux_fields.first().is_some_and(|f| f == "+"))
        {
            match self.get_info(entry) {
                Ok(info) => entry.info = Some(info),
                Err(e) => log::warn!("Cannot get info for {}: {e}", entry.to_url()),
            }
        }
    }

    /// Send one request and return the body with its effective length.
    fn send(
        &self,
        resource: &Resource,
        kind: RequestKind,
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> Result<(Vec<u8>, i64)> {
        let payload = request_bytes(resource, kind);
        log::debug!("{kind:?} request for {}", resource.to_url());

        let fetched = self.transport.fetch(
            &FetchRequest {
                host: &resource.host,
                port: resource.port,
                payload: &payload,
                length_header: kind.has_length_header(),
            },
            progress,
        )?;

        let length = effective_length(resource, fetched.declared);
        Ok((fetched.body, length))
    }
}

/// The length that decides whether a trailing terminator is stripped.
///
/// A server header wins. Without one, a length the resource already
/// carries is used; otherwise binary types run until close and
/// everything else ends with the terminator line.
fn effective_length(resource: &Resource, declared: Option<DeclaredLength>) -> i64 {
    if let Some(length) = declared {
        return length.as_i64();
    }
    if resource.declared_length != LENGTH_UNKNOWN {
        return resource.declared_length;
    }
    if resource.item_type.is_binary() {
        LENGTH_UNKNOWN
    } else {
        LENGTH_TERMINATED
    }
}

fn fold_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut bytes = data.iter().peekable();
    while let Some(&b) = bytes.next() {
        if b == b'\r' && bytes.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}
