//! Error types for forg.

/// Errors produced by the forg protocol, cache and navigation layers.
///
/// Every variant carries a message that already includes the context
/// (host/port, path, offending line) needed to explain the failure.
#[derive(Debug, thiserror::Error)]
pub enum ForgError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("navigation error: {0}")]
    NavigationBoundary(String),

    #[error("question error: {0}")]
    Question(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("save error: {0}")]
    Save(String),

    #[error("bookmark error: {0}")]
    Bookmark(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForgError {
    /// Short text suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            ForgError::Parse(msg) => format!("Could not understand {msg}"),
            ForgError::Connection(msg) => format!("Cannot fetch: {msg}"),
            ForgError::Cache(msg) => format!("Cache problem: {msg}"),
            ForgError::NavigationBoundary(msg) => msg.clone(),
            ForgError::Question(msg) => format!("Bad form question: {msg}"),
            ForgError::Config(msg) => format!("Bad setting: {msg}"),
            ForgError::Save(msg) => format!("Could not save: {msg}"),
            ForgError::Bookmark(msg) => format!("Bookmarks problem: {msg}"),
            ForgError::TomlParse(_) | ForgError::TomlWrite(_) => {
                "The options file could not be read or written.".to_string()
            },
            ForgError::Json(_) => "The bookmarks file is damaged.".to_string(),
        }
    }

    /// Whether this error is the expected "already at the end" signal
    /// from history navigation.
    pub fn is_boundary(&self) -> bool {
        matches!(self, ForgError::NavigationBoundary(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ForgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let e = ForgError::Parse("bad URL".into());
        assert_eq!(format!("{e}"), "parse error: bad URL");
    }

    #[test]
    fn connection_error_display() {
        let e = ForgError::Connection("gopher.example.org:70 refused".into());
        assert_eq!(
            format!("{e}"),
            "connection error: gopher.example.org:70 refused"
        );
    }

    #[test]
    fn cache_error_display() {
        let e = ForgError::Cache("root missing".into());
        assert_eq!(format!("{e}"), "cache error: root missing");
    }

    #[test]
    fn navigation_error_display() {
        let e = ForgError::NavigationBoundary("already at the end".into());
        assert_eq!(format!("{e}"), "navigation error: already at the end");
        assert!(e.is_boundary());
    }

    #[test]
    fn question_error_display() {
        let e = ForgError::Question("unknown kind".into());
        assert_eq!(format!("{e}"), "question error: unknown kind");
        assert!(!e.is_boundary());
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: ForgError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn user_messages_hide_debug_detail() {
        let e = ForgError::Connection("Cannot connect to host:70".into());
        let msg = e.user_message();
        assert!(msg.starts_with("Cannot fetch"));
        assert!(!msg.contains("Connection("));

        let toml_err = toml::from_str::<toml::Value>("[[[").unwrap_err();
        let e: ForgError = toml_err.into();
        assert_eq!(
            e.user_message(),
            "The options file could not be read or written."
        );
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let e: ForgError = json_err.into();
        assert!(format!("{e}").starts_with("JSON error"));
        assert_eq!(e.user_message(), "The bookmarks file is damaged.");
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(ForgError::Cache("oops".into()));
        assert!(r.is_err());
    }
}
