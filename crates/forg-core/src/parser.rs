//! Response classification and directory parsing.
//!
//! Servers do not label their replies, so a reply is a directory either
//! because the request said so or because every line looks like a
//! directory line.

use forg_types::ItemType;
use forg_types::item::{is_error_code, is_known_type_char};

use crate::resource::{DEFAULT_PORT, LENGTH_UNKNOWN, Resource};

/// Marks the end of a response.
pub const TERMINATOR: &[u8] = b"\r\n.\r\n";

/// Host some servers put on error lines inside a directory listing.
const ERROR_HOST: &str = "error.host";

const UNKNOWN_FIELD: &str = "Unknown";

/// What a response body is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Directory,
    OpaqueData,
}

/// Decide whether `raw` is a directory listing.
///
/// A directory hint is trusted unless the bytes are not text and do
/// not look like a listing either.
pub fn classify(hint: ItemType, raw: &[u8]) -> Classification {
    match std::str::from_utf8(raw) {
        Ok(_) if hint.is_directory() => Classification::Directory,
        Ok(text) if looks_like_directory(text) => Classification::Directory,
        Ok(_) => Classification::OpaqueData,
        Err(_) if looks_like_directory(&String::from_utf8_lossy(raw)) => {
            Classification::Directory
        },
        Err(_) => Classification::OpaqueData,
    }
}

/// Every non-empty, non-terminator line has at least two tabs and
/// starts with a known type character or a Gopher+ error code. Empty
/// input is not a directory.
pub fn looks_like_directory(text: &str) -> bool {
    let mut entries = 0usize;
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line == "." {
            continue;
        }
        if line.matches('\t').count() < 2 {
            return false;
        }
        let Some(first) = line.chars().next() else {
            continue;
        };
        if !is_known_type_char(first) && !is_error_code(first) {
            return false;
        }
        entries += 1;
    }
    entries > 0
}

/// Parse a directory listing, one [`Resource`] per line.
///
/// Carriage returns are tolerated anywhere. Lines of one character or
/// less (the `.` terminator included) are skipped.
pub fn parse_directory(text: &str) -> Vec<Resource> {
    text.split('\n')
        .map(|line| line.replace('\r', ""))
        .filter(|line| line.chars().count() > 1)
        .map(|line| parse_directory_line(&line))
        .collect()
}

/// Parse one directory line.
///
/// Missing fields become `Unknown` (port 70). An `error.host` line that
/// is not a blurb is turned into an error item.
pub fn parse_directory_line(line: &str) -> Resource {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut chars = line.chars();
    let type_char = chars.next().unwrap_or('3');
    let mut fields = chars.as_str().split('\t');

    let name = fields.next().unwrap_or(UNKNOWN_FIELD);
    let locator = fields.next().unwrap_or(UNKNOWN_FIELD);
    let host = fields.next().unwrap_or(UNKNOWN_FIELD);
    let port = match fields.next() {
        Some(p) => p.trim().parse::<u16>().unwrap_or_else(|_| {
            log::debug!("Bad port {p:?} in directory line, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        None => DEFAULT_PORT,
    };
    let aux_fields: Vec<String> = fields.map(str::to_string).collect();

    let mut item_type = ItemType::from_char(type_char);
    if host == ERROR_HOST && !item_type.is_info() {
        item_type = ItemType::Error;
    }

    let mut resource = Resource::new(item_type, host, port, locator, name);
    resource.aux_fields = aux_fields;
    resource
}

/// Remove a trailing terminator line, unless the length was declared
/// as "until close" (`-2`), in which case the data may legitimately
/// end with it.
///
/// The `.` line counts as the terminator when only whitespace follows
/// it, whatever mix of line endings surrounds it.
pub fn strip_terminator(data: &mut Vec<u8>, declared_length: i64) {
    if declared_length == LENGTH_UNKNOWN {
        return;
    }
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    let content = &data[..end];
    if content == b"." {
        data.clear();
    } else if content.ends_with(b"\n.") {
        let mut cut = end - 2;
        if cut > 0 && data[cut - 1] == b'\r' {
            cut -= 1;
        }
        data.truncate(cut);
    }
}
