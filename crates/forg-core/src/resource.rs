//! Resource model: the identity of something addressable on a Gopher
//! server, its URL form and its directory-line form.

use std::path::PathBuf;

use forg_types::ItemType;
use forg_types::error::{ForgError, Result};

use crate::info::ResourceInformation;

/// Port used when a URL or directory line leaves it out.
pub const DEFAULT_PORT: u16 = 70;

/// Sentinel file name holding a cached directory listing.
pub const DIRECTORY_INDEX: &str = "gopherdir.idx";

/// Declared length meaning "unknown or variable".
pub const LENGTH_UNKNOWN: i64 = -2;

const SCHEME: &str = "gopher://";

/// One addressable Gopher item.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub item_type: ItemType,
    pub host: String,
    pub port: u16,
    pub locator: String,
    pub name: String,
    /// Gopher+ fields after the port. Non-empty marks a Gopher+ item.
    pub aux_fields: Vec<String>,
    pub info: Option<ResourceInformation>,
    /// Bytes sent after the request line (ASK answers).
    pub data_block: Option<Vec<u8>>,
    pub should_cache: bool,
    pub declared_length: i64,
}

impl Resource {
    pub fn new(item_type: ItemType, host: &str, port: u16, locator: &str, name: &str) -> Self {
        Self {
            item_type,
            host: host.to_string(),
            port,
            locator: locator.to_string(),
            name: name.to_string(),
            aux_fields: Vec::new(),
            info: None,
            data_block: None,
            should_cache: true,
            declared_length: LENGTH_UNKNOWN,
        }
    }

    /// Parse a `gopher://host[:port]/<type><locator>` URL.
    ///
    /// The scheme may be omitted. A path shorter than two characters
    /// names the server's root directory. The name is set to the
    /// locator since URLs carry no display name.
    pub fn parse_url(url: &str) -> Result<Self> {
        let mut resource = Resource::new(ItemType::Directory, "", DEFAULT_PORT, "/", "");
        resource.set_url(url)?;
        Ok(resource)
    }

    /// Replace host, port, type and locator with those of `url`.
    ///
    /// On error `self` is left untouched.
    pub fn set_url(&mut self, url: &str) -> Result<()> {
        let trimmed = url.trim();
        let rest = match split_scheme(trimmed) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("gopher") => rest,
            Some((scheme, _)) => {
                return Err(ForgError::Parse(format!(
                    "URL {trimmed:?}: unsupported scheme {scheme:?}"
                )));
            },
            None => trimmed,
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, ""),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, "")) => (host, DEFAULT_PORT),
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    ForgError::Parse(format!("URL {trimmed:?}: bad port {port:?}"))
                })?;
                (host, port)
            },
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(ForgError::Parse(format!("URL {trimmed:?}: no host")));
        }

        let path = unescape_tabs(path);
        let mut chars = path.chars();
        let (item_type, locator) = match (chars.next(), chars.as_str()) {
            (Some(c), locator) if !locator.is_empty() => (ItemType::from_char(c), locator.to_string()),
            _ => (ItemType::Directory, "/".to_string()),
        };

        self.host = host.to_string();
        self.port = port;
        self.item_type = item_type;
        self.name = locator.clone();
        self.locator = locator;
        Ok(())
    }

    /// URL form, with embedded tabs written as `%9;`.
    pub fn to_url(&self) -> String {
        format!(
            "{SCHEME}{}:{}/{}{}",
            self.host,
            self.port,
            self.item_type.as_char(),
            self.locator.replace('\t', "%9;")
        )
    }

    /// Directory-line form, `\r\n` included.
    pub fn to_protocol_line(&self) -> String {
        let mut line = format!(
            "{}{}\t{}\t{}\t{}",
            self.item_type.as_char(),
            self.name,
            self.locator,
            self.host,
            self.port
        );
        for field in &self.aux_fields {
            line.push('\t');
            line.push_str(field);
        }
        line.push_str("\r\n");
        line
    }

    /// Relative cache path for this resource.
    ///
    /// Built from host, type and locator only; the port is not part of
    /// the key. Tabs stay inside their segment as `%9;`, so a search
    /// never shares a slot with a directory. Directories map to
    /// `<path>/gopherdir.idx`.
    pub fn to_cache_filename(&self) -> PathBuf {
        let raw = format!(
            "{}/{}{}",
            self.host,
            self.item_type.as_char(),
            self.locator.replace('\t', "%9;")
        );
        let mut path = PathBuf::new();
        for segment in raw.split(['/', '\n', '\\']) {
            if segment.is_empty() {
                continue;
            }
            path.push(sanitize_segment(segment));
        }
        if self.item_type.is_directory() || self.locator.ends_with('/') {
            path.push(DIRECTORY_INDEX);
        }
        path
    }

    pub fn is_gopher_plus(&self) -> bool {
        !self.aux_fields.is_empty()
    }

    /// Whether this is an interactive Gopher+ ASK item.
    pub fn is_ask(&self) -> bool {
        self.aux_fields.first().is_some_and(|f| f.trim() == "?")
    }

    /// Name to show for this resource.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() || self.name == "/" {
            format!("{} root", self.host)
        } else {
            self.name.clone()
        }
    }

    /// The directory a type-7 search for `query` returns.
    pub fn search(&self, query: &str) -> Self {
        let mut result = self.clone();
        result.locator = format!("{}\t{}", self.locator, query);
        result.item_type = ItemType::Directory;
        result.declared_length = LENGTH_UNKNOWN;
        result.data_block = None;
        result
    }

    /// A copy that submits `block` as the answers to this item's form.
    /// Never cached.
    pub fn with_answers(&self, block: Vec<u8>) -> Self {
        let mut result = self.clone();
        result.data_block = Some(block);
        result.should_cache = false;
        result
    }
}

fn split_scheme(url: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}

/// Decode the two spellings of an escaped tab.
fn unescape_tabs(path: &str) -> String {
    path.replace("%9;", "\t").replace("%09", "\t")
}

fn sanitize_segment(segment: &str) -> String {
    if segment == "." || segment == ".." {
        return "_".repeat(segment.len());
    }
    segment
        .chars()
        .map(|c| match c {
            ':' | '*' | '|' | '?' | '<' | '>' | '"' | '\r' | '\0' => '_',
            other => other,
        })
        .collect()
}
