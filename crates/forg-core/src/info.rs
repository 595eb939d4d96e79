//! Gopher+ item information (`!` responses).
//!
//! An info response is a run of blocks, each introduced by a header
//! line starting with `+`:
//!
//! ```text
//! +INFO: 0About\t/about\tgopher.example.org\t70\t+
//! +ADMIN:
//!  Admin: Jane Doe <jane@example.org>
//!  Mod-Date: Mon Jan  1 00:00:00 2001
//! +ABSTRACT:
//!  A short description.
//! ```
//!
//! Body lines are indented by one space, which is removed.

use std::collections::BTreeMap;

/// Parsed info blocks keyed by lower-cased block name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInformation {
    blocks: BTreeMap<String, String>,
}

impl ResourceInformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text of an info response.
    ///
    /// Blocks with no body are left out. A block whose header has no
    /// `+` is logged and skipped.
    pub fn parse(text: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let mut info = Self::new();

        for block in split_blocks(&text) {
            if block.trim().is_empty() {
                continue;
            }
            let (header, body) = block.split_once('\n').unwrap_or((block, ""));

            let Some(plus) = header.find('+') else {
                log::warn!("Info block without a +NAME header: {:?}", header);
                continue;
            };
            let label = &header[plus + 1..];
            let (name, inline) = label.split_once(':').unwrap_or((label, ""));
            let key = name.trim().to_lowercase();

            let mut lines = Vec::new();
            let inline = inline.strip_prefix(' ').unwrap_or(inline);
            if !inline.trim().is_empty() {
                lines.push(inline);
            }
            lines.extend(body.split('\n').map(|l| l.strip_prefix(' ').unwrap_or(l)));

            let value = lines.join("\n").trim_end_matches('\n').to_string();
            if key.is_empty() || value.trim().is_empty() {
                continue;
            }
            info.blocks.insert(key, value);
        }

        log::debug!("Info blocks: {:?}", info.blocks.keys().collect::<Vec<_>>());
        info
    }

    /// Block text by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.blocks.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn admin(&self) -> Option<&str> {
        self.get("admin")
    }

    pub fn views(&self) -> Option<&str> {
        self.get("views")
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.get("abstract")
    }

    /// The `+INFO` block: the item's own directory line.
    pub fn info(&self) -> Option<&str> {
        self.get("info")
    }

    /// The `+ASK` block, present on interactive items.
    pub fn ask(&self) -> Option<&str> {
        self.get("ask")
    }

    /// Set or, for an empty value, remove a block.
    pub fn set_block(&mut self, name: &str, value: &str) {
        let key = name.to_lowercase();
        if value.is_empty() {
            self.blocks.remove(&key);
        } else {
            self.blocks.insert(key, value.to_string());
        }
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every block as `NAME:` followed by its body.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (name, body) in &self.blocks {
            out.push_str(&name.to_uppercase());
            out.push_str(":\n");
            out.push_str(body);
            out.push('\n');
        }
        out
    }
}

/// Split at every newline that is followed by `+`.
fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(pos) = text[search..].find("\n+") {
        let at = search + pos;
        blocks.push(&text[start..at]);
        start = at + 1;
        search = start;
    }
    blocks.push(&text[start..]);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "+INFO: 0About\t/about\tgopher.example.org\t70\t+\r\n\
                          +ADMIN:\r\n \
                          Admin: Jane Doe <jane@example.org>\r\n \
                          Mod-Date: <20010101000000>\r\n\
                          +VIEWS:\r\n \
                          text/plain: <2k>\r\n\
                          +ABSTRACT:\r\n \
                          A short description.\r\n";

    #[test]
    fn parses_standard_blocks() {
        let info = ResourceInformation::parse(SAMPLE);
        assert_eq!(info.info(), Some("0About\t/about\tgopher.example.org\t70\t+"));
        assert_eq!(
            info.admin(),
            Some("Admin: Jane Doe <jane@example.org>\nMod-Date: <20010101000000>")
        );
        assert_eq!(info.views(), Some("text/plain: <2k>"));
        assert_eq!(info.abstract_text(), Some("A short description."));
        assert_eq!(info.len(), 4);
    }

    #[test]
    fn names_are_case_insensitive() {
        let info = ResourceInformation::parse("+Abstract:\n hello\n");
        assert_eq!(info.get("ABSTRACT"), Some("hello"));
        assert_eq!(info.block_names().collect::<Vec<_>>(), vec!["abstract"]);
    }

    #[test]
    fn empty_blocks_are_omitted() {
        let info = ResourceInformation::parse("+-1\n+ADMIN:\n+ABSTRACT:\n text\n");
        assert!(info.admin().is_none());
        assert!(info.get("-1").is_none());
        assert_eq!(info.abstract_text(), Some("text"));
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn header_without_plus_is_skipped_not_fatal() {
        let info = ResourceInformation::parse("garbage line\nmore\n+ASK:\n Ask:Name?\n");
        assert_eq!(info.ask(), Some("Ask:Name?"));
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn only_one_leading_space_is_stripped() {
        let info = ResourceInformation::parse("+ABSTRACT:\n   indented\n");
        assert_eq!(info.abstract_text(), Some("  indented"));
    }

    #[test]
    fn set_block_and_render() {
        let mut info = ResourceInformation::new();
        info.set_block("Admin", "root");
        info.set_block("abstract", "about");
        assert_eq!(info.to_text(), "ABSTRACT:\nabout\nADMIN:\nroot\n");
        info.set_block("ADMIN", "");
        assert!(info.admin().is_none());
    }
}
