//! On-disk response cache.
//!
//! Each resource maps to a fixed path under the cache root, derived
//! from host, type and locator. Directory listings are stored as their
//! protocol lines plus a terminator; everything else as raw bytes.
//! Loading re-runs the classifier, so a cached response goes through
//! the same model as a live one.
//!
//! There is no in-process locking. Two writers storing the same
//! resource race on the file and the last one wins.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use forg_types::error::{ForgError, Result};

use crate::resource::Resource;
use crate::response::{Body, Response};

/// Summary of what the cache holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub file_count: u64,
    pub dir_count: u64,
    pub total_bytes: u64,
}

/// Response cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `resource` is or would be cached.
    pub fn path_for(&self, resource: &Resource) -> PathBuf {
        self.root.join(resource.to_cache_filename())
    }

    /// Path and size of the cached copy of `resource`, if there is one.
    pub fn is_cached(&self, resource: &Resource) -> Option<(PathBuf, u64)> {
        let path = self.path_for(resource);
        let meta = std::fs::metadata(&path).ok()?;
        meta.is_file().then(|| (path, meta.len()))
    }

    /// The cached response for `resource`, or `None` on a miss.
    pub fn load(&self, resource: &Resource) -> Result<Option<Response>> {
        let Some((path, size)) = self.is_cached(resource) else {
            log::debug!("Cache miss for {}", resource.to_url());
            return Ok(None);
        };

        let raw = std::fs::read(&path)
            .map_err(|e| ForgError::Cache(format!("cannot read {}: {e}", path.display())))?;
        log::debug!("Cache hit for {} ({size} bytes at {})", resource.to_url(), path.display());

        let mut response = Response::for_resource(resource);
        response.populate(raw);
        Ok(Some(response))
    }

    /// Write `response` to the cache slot of `resource` and return the
    /// absolute path written.
    ///
    /// ASK items, failed responses and anything marked not to be
    /// cached are refused without touching the disk.
    pub fn store(&self, response: &Response, resource: &Resource) -> Result<PathBuf> {
        let url = resource.to_url();
        if resource.is_ask() {
            return Err(ForgError::Cache(format!("{url} is an ASK item")));
        }
        if !resource.should_cache || !response.should_cache {
            return Err(ForgError::Cache(format!("{url} is marked not to be cached")));
        }
        if let Some(error) = response.error() {
            return Err(ForgError::Cache(format!("{url} failed: {error}")));
        }

        let bytes = match response.body() {
            Body::Directory(_) => {
                let mut bytes = response.to_protocol_bytes();
                bytes.extend_from_slice(b".\r\n");
                bytes
            },
            Body::Data(data) => data.clone(),
            Body::Empty | Body::Form(_) => {
                return Err(ForgError::Cache(format!("{url} has nothing to cache")));
            },
        };

        let path = self.path_for(resource);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ForgError::Cache(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(&path, &bytes)
            .map_err(|e| ForgError::Cache(format!("cannot write {}: {e}", path.display())))?;

        let path = std::path::absolute(&path)
            .map_err(|e| ForgError::Cache(format!("{}: {e}", path.display())))?;
        log::info!("Cached {url} ({} bytes) at {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Drop the cached copy of `resource`. Returns whether one existed.
    pub fn invalidate(&self, resource: &Resource) -> Result<bool> {
        let path = self.path_for(resource);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Invalidated {}", path.display());
                Ok(true)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ForgError::Cache(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// Delete everything under the cache root, keeping the root.
    ///
    /// Fails if the root does not exist, so a misconfigured path is
    /// reported rather than silently ignored.
    pub fn purge(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(ForgError::Cache(format!(
                "cache root {} does not exist",
                self.root.display()
            )));
        }

        for entry in WalkDir::new(&self.root).min_depth(1).contents_first(true) {
            let entry = entry.map_err(|e| ForgError::Cache(format!("purge: {e}")))?;
            let path = entry.path();
            let removed = if entry.file_type().is_dir() {
                std::fs::remove_dir(path)
            } else {
                std::fs::remove_file(path)
            };
            removed.map_err(|e| {
                ForgError::Cache(format!("cannot remove {}: {e}", path.display()))
            })?;
        }

        log::info!("Purged cache at {}", self.root.display());
        Ok(())
    }

    /// Count files, directories and bytes under the root. A missing
    /// root is an empty cache.
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        if !self.root.exists() {
            return Ok(stats);
        }

        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| ForgError::Cache(format!("stats: {e}")))?;
            if entry.file_type().is_dir() {
                stats.dir_count += 1;
            } else {
                stats.file_count += 1;
                let meta = entry.metadata().map_err(|e| {
                    ForgError::Cache(format!("stats: {}: {e}", entry.path().display()))
                })?;
                stats.total_bytes += meta.len();
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forg_types::ItemType;

    fn directory_resource() -> Resource {
        Resource::new(ItemType::Directory, "gopher.example.org", 70, "/pub", "Pub")
    }

    fn directory_response(resource: &Resource) -> Response {
        let mut response = Response::for_resource(resource);
        response.populate(
            b"0Readme\t/pub/readme\tgopher.example.org\t70\r\n\
              1Docs\t/pub/docs\tgopher.example.org\t70\t+\r\n"
                .to_vec(),
        );
        response
    }

    #[test]
    fn store_then_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let resource = directory_resource();
        let response = directory_response(&resource);

        let path = cache.store(&response, &resource).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("gopher.example.org/1/pub/gopherdir.idx"));
        assert!(std::fs::read(&path).unwrap().ends_with(b".\r\n"));

        let loaded = cache.load(&resource).unwrap().unwrap();
        assert_eq!(loaded.to_protocol_bytes(), response.to_protocol_bytes());
        assert_eq!(loaded.entries().unwrap()[1].aux_fields, vec!["+"]);
    }

    #[test]
    fn store_then_load_data() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let resource = Resource::new(ItemType::Binary, "h", 70, "/bin/file.zip", "zip");
        let mut response = Response::for_resource(&resource);
        let bytes: Vec<u8> = (0..=255u8).collect();
        response.set_data(bytes.clone());

        cache.store(&response, &resource).unwrap();
        let loaded = cache.load(&resource).unwrap().unwrap();
        assert_eq!(loaded.data(), Some(&bytes[..]));
        assert_eq!(cache.is_cached(&resource).map(|(_, size)| size), Some(256));
    }

    #[test]
    fn search_results_do_not_shadow_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let engine = Resource::new(ItemType::IndexSearch, "gopher.example.org", 70, "/pub", "Find");
        let results = engine.search("docs");
        let response = directory_response(&results);
        cache.store(&response, &results).unwrap();

        let docs = Resource::new(ItemType::Directory, "gopher.example.org", 70, "/pub/docs", "Docs");
        assert!(cache.is_cached(&docs).is_none());
        assert!(cache.load(&docs).unwrap().is_none());
        assert!(cache.load(&results).unwrap().is_some());
    }

    #[test]
    fn repeated_store_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let resource = Resource::new(ItemType::File, "h", 70, "/motd", "motd");
        let mut response = Response::for_resource(&resource);
        response.set_data(b"first".to_vec());
        let a = cache.store(&response, &resource).unwrap();
        response.set_data(b"second".to_vec());
        let b = cache.store(&response, &resource).unwrap();
        assert_eq!(a, b);
        assert_eq!(std::fs::read(&b).unwrap(), b"second");
        assert_eq!(cache.stats().unwrap().file_count, 1);
    }

    #[test]
    fn refuses_uncacheable_resources() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        let mut resource = Resource::new(ItemType::File, "h", 70, "/secret", "secret");
        resource.should_cache = false;
        let mut response = Response::for_resource(&resource);
        response.set_data(b"x".to_vec());
        assert!(matches!(cache.store(&response, &resource), Err(ForgError::Cache(_))));
        assert!(cache.is_cached(&resource).is_none());

        let mut ask = Resource::new(ItemType::File, "h", 70, "/form", "form");
        ask.aux_fields = vec!["?".into()];
        let mut response = Response::for_resource(&ask);
        response.set_data(b"x".to_vec());
        assert!(matches!(cache.store(&response, &ask), Err(ForgError::Cache(_))));

        let plain = Resource::new(ItemType::File, "h", 70, "/gone", "gone");
        let failed = Response::from_error(&plain, "Cannot fetch");
        assert!(cache.store(&failed, &plain).is_err());

        assert_eq!(cache.stats().unwrap(), CacheStats::default());
    }

    #[test]
    fn load_miss_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        assert!(cache.load(&directory_resource()).unwrap().is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let resource = directory_resource();
        cache.store(&directory_response(&resource), &resource).unwrap();
        assert!(cache.invalidate(&resource).unwrap());
        assert!(!cache.invalidate(&resource).unwrap());
        assert!(cache.load(&resource).unwrap().is_none());
    }

    #[test]
    fn stats_and_purge() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let resource = directory_resource();
        let response = directory_response(&resource);
        cache.store(&response, &resource).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.file_count, 1);
        // gopher.example.org, 1, pub
        assert_eq!(stats.dir_count, 3);
        assert_eq!(stats.total_bytes, response.to_protocol_bytes().len() as u64 + 3);

        cache.purge().unwrap();
        assert!(dir.path().is_dir());
        assert_eq!(cache.stats().unwrap(), CacheStats::default());
    }

    #[test]
    fn purge_requires_root() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("missing"));
        assert!(matches!(cache.purge(), Err(ForgError::Cache(_))));
        assert_eq!(cache.stats().unwrap(), CacheStats::default());
    }
}
