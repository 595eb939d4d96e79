//! Client configuration (`forgrc.toml`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ForgError, Result};

/// File name of the options file inside the prefs directory.
pub const CONFIG_FILE_NAME: &str = "forgrc.toml";

/// File name of the bookmarks file inside the prefs directory.
pub const BOOKMARKS_FILE_NAME: &str = "bookmarks.json";

/// User-tunable client options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgConfig {
    /// Root of the on-disk response cache.
    pub cache_directory: PathBuf,
    /// Where the options file lives.
    pub prefs_directory: PathBuf,
    /// Home page URL.
    pub home: String,
    /// Consult and populate the disk cache when navigating.
    pub use_cache: bool,
    /// Fold `\r\n` to `\n` in text responses.
    pub strip_carriage_returns: bool,
    /// Fetch Gopher+ info for every directory entry while parsing.
    /// Slow: one extra round trip per entry.
    pub grab_resource_info: bool,
    /// Empty the cache when the client exits.
    pub delete_cache_on_exit: bool,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for ForgConfig {
    fn default() -> Self {
        Self {
            cache_directory: xdg_dir("XDG_CACHE_HOME", ".cache").unwrap_or_else(|| "cache".into()),
            prefs_directory: xdg_dir("XDG_CONFIG_HOME", ".config")
                .unwrap_or_else(|| "config".into()),
            home: "gopher://gopher.floodgap.com:70/1/".to_string(),
            use_cache: true,
            strip_carriage_returns: true,
            grab_resource_info: false,
            delete_cache_on_exit: false,
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
        }
    }
}

/// Resolve `$VAR/forg`, falling back to `$HOME/<fallback>/forg`.
fn xdg_dir(var: &str, fallback: &str) -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(var)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir).join("forg"));
    }
    let home = std::env::var("HOME").ok().filter(|h| !h.is_empty())?;
    Some(PathBuf::from(home).join(fallback).join("forg"))
}

impl ForgConfig {
    /// Parse options from TOML text. Missing keys keep their defaults.
    pub fn parse(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load options from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                log::debug!("Loading options from {}", path.display());
                Self::parse(&text)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No options file at {}, using defaults", path.display());
                Ok(Self::default())
            },
            Err(e) => Err(ForgError::Config(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Write options to `path`, creating its parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ForgError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let body = format!("# Options for forg\n{text}");
        std::fs::write(path, body)
            .map_err(|e| ForgError::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// Default location of the options file.
    pub fn default_path(&self) -> PathBuf {
        self.prefs_directory.join(CONFIG_FILE_NAME)
    }

    pub fn bookmarks_path(&self) -> PathBuf {
        self.prefs_directory.join(BOOKMARKS_FILE_NAME)
    }

    /// Flip a boolean option by name and return its new value.
    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        let slot = match name.to_lowercase().as_str() {
            "use_cache" => &mut self.use_cache,
            "strip_carriage_returns" => &mut self.strip_carriage_returns,
            "grab_resource_info" => &mut self.grab_resource_info,
            "delete_cache_on_exit" => &mut self.delete_cache_on_exit,
            other => return Err(ForgError::Config(format!("no boolean option named {other}"))),
        };
        *slot = !*slot;
        log::debug!("Toggle({name}): {}", *slot);
        Ok(*slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        let cfg = ForgConfig::default();
        assert!(cfg.use_cache);
        assert!(cfg.strip_carriage_returns);
        assert!(!cfg.grab_resource_info);
        assert!(!cfg.delete_cache_on_exit);
        assert_eq!(cfg.home, "gopher://gopher.floodgap.com:70/1/");
        assert_eq!(cfg.connect_timeout_secs, 10);
    }

    #[test]
    fn parse_partial_file_keeps_defaults() {
        let cfg = ForgConfig::parse(
            r#"
use_cache = false
home = "gopher://example.org/1/"
"#,
        )
        .unwrap();
        assert!(!cfg.use_cache);
        assert_eq!(cfg.home, "gopher://example.org/1/");
        assert!(cfg.strip_carriage_returns);
    }

    #[test]
    fn parse_invalid_toml() {
        let result = ForgConfig::parse("this is not valid toml [[[");
        assert!(matches!(result, Err(ForgError::TomlParse(_))));
    }

    #[test]
    fn toggle_flips_booleans() {
        let mut cfg = ForgConfig::default();
        assert!(cfg.toggle("grab_resource_info").unwrap());
        assert!(cfg.grab_resource_info);
        assert!(!cfg.toggle("GRAB_RESOURCE_INFO").unwrap());
        assert!(cfg.toggle("home").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join(CONFIG_FILE_NAME);
        let mut cfg = ForgConfig::default();
        cfg.use_cache = false;
        cfg.cache_directory = dir.path().join("cache");
        cfg.save(&path).unwrap();

        let loaded = ForgConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn prefs_files_share_a_directory() {
        let cfg = ForgConfig {
            prefs_directory: "/home/u/.config/forg".into(),
            ..ForgConfig::default()
        };
        assert_eq!(cfg.default_path(), Path::new("/home/u/.config/forg/forgrc.toml"));
        assert_eq!(
            cfg.bookmarks_path(),
            Path::new("/home/u/.config/forg/bookmarks.json")
        );
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ForgConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert!(cfg.use_cache);
    }
}
