//! Gopher item type codes.
//!
//! Every directory line and every resource starts with a single type
//! character. The set below covers RFC 1436, the common extensions
//! (`i`, `h`) and the Gopher+ media types.

use std::fmt;

/// Type of a Gopher item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// `0` plain text file.
    File,
    /// `1` directory (menu).
    Directory,
    /// `2` CSO phone-book server.
    Cso,
    /// `3` error.
    Error,
    /// `4` BinHexed Macintosh file.
    BinHex,
    /// `5` DOS binary archive.
    DosBinary,
    /// `6` UNIX uuencoded file.
    Uuencoded,
    /// `7` index-search server.
    IndexSearch,
    /// `8` telnet session.
    Telnet,
    /// `9` binary file.
    Binary,
    /// `+` redundant server.
    RedundantServer,
    /// `T` tn3270 session.
    Tn3270,
    /// `g` GIF image.
    Gif,
    /// `I` generic image.
    Image,
    /// `?` unknown.
    Unknown,
    /// `:` Gopher+ bitmap.
    Bitmap,
    /// `;` Gopher+ movie.
    Movie,
    /// `<` Gopher+ sound.
    Sound,
    /// `i` informational line (blurb).
    Info,
    /// `h` HTML file.
    Html,
    /// Any character outside the table above.
    Other(char),
}

impl ItemType {
    /// Map a type character to an item type.
    pub fn from_char(c: char) -> Self {
        match c {
            '0' => ItemType::File,
            '1' => ItemType::Directory,
            '2' => ItemType::Cso,
            '3' => ItemType::Error,
            '4' => ItemType::BinHex,
            '5' => ItemType::DosBinary,
            '6' => ItemType::Uuencoded,
            '7' => ItemType::IndexSearch,
            '8' => ItemType::Telnet,
            '9' => ItemType::Binary,
            '+' => ItemType::RedundantServer,
            'T' => ItemType::Tn3270,
            'g' => ItemType::Gif,
            'I' => ItemType::Image,
            '?' => ItemType::Unknown,
            ':' => ItemType::Bitmap,
            ';' => ItemType::Movie,
            '<' => ItemType::Sound,
            'i' => ItemType::Info,
            'h' => ItemType::Html,
            other => ItemType::Other(other),
        }
    }

    /// The wire character for this type.
    pub fn as_char(self) -> char {
        match self {
            ItemType::File => '0',
            ItemType::Directory => '1',
            ItemType::Cso => '2',
            ItemType::Error => '3',
            ItemType::BinHex => '4',
            ItemType::DosBinary => '5',
            ItemType::Uuencoded => '6',
            ItemType::IndexSearch => '7',
            ItemType::Telnet => '8',
            ItemType::Binary => '9',
            ItemType::RedundantServer => '+',
            ItemType::Tn3270 => 'T',
            ItemType::Gif => 'g',
            ItemType::Image => 'I',
            ItemType::Unknown => '?',
            ItemType::Bitmap => ':',
            ItemType::Movie => ';',
            ItemType::Sound => '<',
            ItemType::Info => 'i',
            ItemType::Html => 'h',
            ItemType::Other(c) => c,
        }
    }

    /// Human label used when listing an item.
    pub fn description(self) -> &'static str {
        match self {
            ItemType::File => "File:",
            ItemType::Directory => "Directory:",
            ItemType::Cso => "CSO phone-book server:",
            ItemType::Error => "Error:",
            ItemType::BinHex => "BinHexed Macintosh file:",
            ItemType::DosBinary => "DOS binary archive:",
            ItemType::Uuencoded => "UNIX UUEncoded file:",
            ItemType::IndexSearch => "Index-Search server:",
            ItemType::Telnet => "Telnet session:",
            ItemType::Binary => "Binary file:",
            ItemType::RedundantServer => "Redundant server:",
            ItemType::Tn3270 => "tn3270 session:",
            ItemType::Gif => "GIF file:",
            ItemType::Image => "Image file:",
            ItemType::Unknown => "Unknown:",
            ItemType::Bitmap => "Bitmap Image:",
            ItemType::Movie => "Movie:",
            ItemType::Sound => "Sound:",
            ItemType::Info => " ",
            ItemType::Html => "HTML file:",
            ItemType::Other(_) => "-Unknown-",
        }
    }

    pub fn is_directory(self) -> bool {
        self == ItemType::Directory
    }

    pub fn is_error(self) -> bool {
        self == ItemType::Error
    }

    pub fn is_info(self) -> bool {
        self == ItemType::Info
    }

    /// Whether responses of this type are binary and must never have
    /// their line endings rewritten.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            ItemType::DosBinary
                | ItemType::Binary
                | ItemType::Gif
                | ItemType::Image
                | ItemType::Bitmap
                | ItemType::Movie
                | ItemType::Sound
        )
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<char> for ItemType {
    fn from(c: char) -> Self {
        ItemType::from_char(c)
    }
}

/// Whether `c` is one of the defined item type characters.
pub fn is_known_type_char(c: char) -> bool {
    !matches!(ItemType::from_char(c), ItemType::Other(_))
}

/// Whether `c` is a Gopher+ error code (`1` not available, `2` try
/// again later, `3` moved).
pub fn is_error_code(c: char) -> bool {
    matches!(c, '1' | '2' | '3')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &str = "0123456789+TgI?:;<ih";

    #[test]
    fn every_known_char_maps_back() {
        for c in ALL.chars() {
            let t = ItemType::from_char(c);
            assert!(!matches!(t, ItemType::Other(_)), "{c} should be known");
            assert_eq!(t.as_char(), c);
        }
    }

    #[test]
    fn unknown_char_is_preserved() {
        let t = ItemType::from_char('x');
        assert_eq!(t, ItemType::Other('x'));
        assert_eq!(t.as_char(), 'x');
        assert!(!is_known_type_char('x'));
        assert_eq!(t.description(), "-Unknown-");
    }

    #[test]
    fn descriptions() {
        assert_eq!(ItemType::Directory.description(), "Directory:");
        assert_eq!(ItemType::IndexSearch.description(), "Index-Search server:");
        assert_eq!(ItemType::Info.description(), " ");
    }

    #[test]
    fn predicates() {
        assert!(ItemType::Directory.is_directory());
        assert!(ItemType::Error.is_error());
        assert!(ItemType::Info.is_info());
        assert!(ItemType::Gif.is_binary());
        assert!(!ItemType::File.is_binary());
    }

    #[test]
    fn error_codes() {
        assert!(is_error_code('1'));
        assert!(is_error_code('3'));
        assert!(!is_error_code('4'));
    }

    #[test]
    fn display_writes_wire_char() {
        assert_eq!(ItemType::Html.to_string(), "h");
        assert_eq!(ItemType::from('7'), ItemType::IndexSearch);
    }
}
