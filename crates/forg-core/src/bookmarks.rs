//! Bookmarks: named resources kept in nested folders.
//!
//! A folder holds its items in a [`History`] but never truncates it;
//! a new item goes right after the folder's cursor. Folders are saved
//! as JSON, a folder being `{ "title", "items" }` and each item tagged
//! by `kind`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use forg_types::error::{ForgError, Result};

use crate::history::{EntryId, History};
use crate::resource::Resource;

/// Name shown for a folder whose own name is blank.
const DEFAULT_FOLDER_NAME: &str = "Bookmarks";

/// A saved resource.
///
/// Only the identity and the name are kept; info blocks, Gopher+
/// fields and answer blocks are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    resource: Resource,
}

impl Bookmark {
    pub fn new(resource: &Resource) -> Self {
        Self {
            resource: Resource::new(
                resource.item_type,
                &resource.host,
                resource.port,
                &resource.locator,
                &resource.name,
            ),
        }
    }

    /// A bookmark for `url` titled `title`.
    pub fn from_url(url: &str, title: &str) -> Result<Self> {
        let mut resource = Resource::parse_url(url)?;
        resource.name = title.to_string();
        Ok(Self { resource })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn name(&self) -> &str {
        &self.resource.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.resource.name = name.to_string();
    }

    pub fn url(&self) -> String {
        self.resource.to_url()
    }

    /// Menu label: `host: name`, or `host Root` / `host:port locator`
    /// for an unnamed bookmark.
    pub fn label(&self) -> String {
        let r = &self.resource;
        if !r.name.is_empty() {
            format!("{}: {}", r.host, r.name)
        } else if r.locator.is_empty() || r.locator == "/" {
            format!("{} Root", r.host)
        } else {
            format!("{}:{} {}", r.host, r.port, r.locator)
        }
    }
}

/// One entry of a folder.
#[derive(Debug, Clone)]
pub enum BookmarkItem {
    Bookmark(Bookmark),
    Folder(BookmarkFolder),
}

impl BookmarkItem {
    pub fn name(&self) -> &str {
        match self {
            BookmarkItem::Bookmark(b) => b.name(),
            BookmarkItem::Folder(f) => f.name(),
        }
    }
}

/// An ordered, named collection of bookmarks and sub-folders.
#[derive(Debug, Clone, Default)]
pub struct BookmarkFolder {
    name: String,
    items: History<BookmarkItem>,
}

impl BookmarkFolder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: History::new(),
        }
    }

    /// The folder's name; `Bookmarks` when it has none.
    pub fn name(&self) -> &str {
        if self.name.trim().is_empty() {
            DEFAULT_FOLDER_NAME
        } else {
            &self.name
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Insert `item` after the cursor, keeping every other item.
    pub fn add(&mut self, item: BookmarkItem) -> EntryId {
        log::debug!("Adding {:?} to folder {:?}", item.name(), self.name());
        self.items.insert(item, false)
    }

    pub fn add_bookmark(&mut self, bookmark: Bookmark) -> EntryId {
        self.add(BookmarkItem::Bookmark(bookmark))
    }

    pub fn add_folder(&mut self, folder: BookmarkFolder) -> EntryId {
        self.add(BookmarkItem::Folder(folder))
    }

    pub fn items(&self) -> &History<BookmarkItem> {
        &self.items
    }

    /// Direct access for reordering and removal.
    pub fn items_mut(&mut self) -> &mut History<BookmarkItem> {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bookmarks in this folder and every folder below it.
    pub fn bookmark_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                BookmarkItem::Bookmark(_) => 1,
                BookmarkItem::Folder(f) => f.bookmark_count(),
            })
            .sum()
    }

    /// First bookmark, depth first, whose URL is `url`.
    pub fn find_url(&self, url: &str) -> Option<&Bookmark> {
        self.items.iter().find_map(|item| match item {
            BookmarkItem::Bookmark(b) => (b.url() == url).then_some(b),
            BookmarkItem::Folder(f) => f.find_url(url),
        })
    }

    /// Parse a folder from JSON. Bookmarks whose URL does not parse
    /// are skipped with a warning.
    pub fn parse(json: &str) -> Result<Self> {
        let record: FolderRecord = serde_json::from_str(json)?;
        Ok(Self::from_record(record))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    /// Load bookmarks from `path`. A missing file yields an empty
    /// folder.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let folder = Self::parse(&text)?;
                log::debug!(
                    "Loaded {} bookmarks from {}",
                    folder.bookmark_count(),
                    path.display()
                );
                Ok(folder)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No bookmarks at {}", path.display());
                Ok(Self::default())
            },
            Err(e) => Err(ForgError::Bookmark(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Write the folder to `path`, creating its parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_json()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ForgError::Bookmark(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(path, text)
            .map_err(|e| ForgError::Bookmark(format!("cannot write {}: {e}", path.display())))?;
        log::info!("Saved {} bookmarks to {}", self.bookmark_count(), path.display());
        Ok(())
    }

    fn from_record(record: FolderRecord) -> Self {
        let mut folder = Self::new(&record.title);
        for item in record.items {
            match item {
                ItemRecord::Folder(sub) => {
                    folder.add_folder(Self::from_record(sub));
                },
                ItemRecord::Bookmark { title, href } => match Bookmark::from_url(&href, &title) {
                    Ok(bookmark) => {
                        folder.add_bookmark(bookmark);
                    },
                    Err(e) => log::warn!("Skipping bookmark {title:?}: {e}"),
                },
            }
        }
        folder
    }

    fn to_record(&self) -> FolderRecord {
        FolderRecord {
            title: self.name().to_string(),
            items: self
                .items
                .traverse(|item| match item {
                    BookmarkItem::Bookmark(b) => ItemRecord::Bookmark {
                        title: b.name().to_string(),
                        href: b.url(),
                    },
                    BookmarkItem::Folder(f) => ItemRecord::Folder(f.to_record()),
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FolderRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    items: Vec<ItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ItemRecord {
    Folder(FolderRecord),
    Bookmark { title: String, href: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use forg_types::ItemType;
    use forg_types::config::BOOKMARKS_FILE_NAME;

    fn bookmark(locator: &str, name: &str) -> Bookmark {
        Bookmark::new(&Resource::new(
            ItemType::Directory,
            "gopher.example.org",
            70,
            locator,
            name,
        ))
    }

    fn names(folder: &BookmarkFolder) -> Vec<String> {
        folder.items().traverse(|item| item.name().to_string())
    }

    #[test]
    fn labels() {
        assert_eq!(bookmark("/pub", "Pub").label(), "gopher.example.org: Pub");
        assert_eq!(bookmark("/", "").label(), "gopher.example.org Root");
        assert_eq!(bookmark("/pub", "").label(), "gopher.example.org:70 /pub");
    }

    #[test]
    fn keeps_identity_only() {
        let mut r = Resource::new(ItemType::File, "h", 7070, "/form", "Form");
        r.aux_fields = vec!["?".into()];
        r.data_block = Some(b"+1\r\nx".to_vec());
        let b = Bookmark::new(&r);
        assert!(b.resource().aux_fields.is_empty());
        assert!(b.resource().data_block.is_none());
        assert_eq!(b.url(), "gopher://h:7070/0/form");
        assert_eq!(b.name(), "Form");
    }

    #[test]
    fn blank_folder_name_falls_back() {
        assert_eq!(BookmarkFolder::new("  ").name(), "Bookmarks");
        assert_eq!(BookmarkFolder::new("Phlogs").name(), "Phlogs");
    }

    #[test]
    fn adding_never_drops_items() {
        let mut folder = BookmarkFolder::new("Top");
        folder.add_bookmark(bookmark("/a", "A"));
        folder.add_bookmark(bookmark("/b", "B"));
        folder.add_bookmark(bookmark("/c", "C"));
        folder.items_mut().prev().unwrap();
        folder.items_mut().prev().unwrap();
        folder.add_bookmark(bookmark("/d", "D"));
        assert_eq!(names(&folder), ["A", "D", "B", "C"]);
        assert_eq!(folder.len(), 4);

        folder.items_mut().prepend(BookmarkItem::Bookmark(bookmark("/z", "Z")));
        folder.items_mut().postpend(BookmarkItem::Bookmark(bookmark("/y", "Y")));
        assert_eq!(names(&folder), ["Z", "A", "D", "B", "C", "Y"]);
    }

    #[test]
    fn nested_folders_round_trip() {
        let mut inner = BookmarkFolder::new("Search");
        inner.add_bookmark(
            Bookmark::from_url("gopher://gopher.floodgap.com/7/v2/vs", "Veronica-2").unwrap(),
        );
        let mut top = BookmarkFolder::new("Bookmarks");
        top.add_bookmark(bookmark("/", "Home"));
        top.add_folder(inner);
        top.add_bookmark(bookmark("/pub", "Pub"));

        let json = top.to_json().unwrap();
        let back = BookmarkFolder::parse(&json).unwrap();
        assert_eq!(names(&back), ["Home", "Search", "Pub"]);
        assert_eq!(back.bookmark_count(), 3);
        assert_eq!(back.to_json().unwrap(), json);

        let found = back.find_url("gopher://gopher.floodgap.com:70/7/v2/vs").unwrap();
        assert_eq!(found.name(), "Veronica-2");
        assert_eq!(found.resource().item_type, ItemType::IndexSearch);
    }

    #[test]
    fn bad_urls_are_skipped() {
        let json = r#"{
            "title": "Mixed",
            "items": [
                { "kind": "bookmark", "title": "Web", "href": "http://example.org/" },
                { "kind": "bookmark", "title": "Ok", "href": "gopher://example.org/1/" }
            ]
        }"#;
        let folder = BookmarkFolder::parse(json).unwrap();
        assert_eq!(names(&folder), ["Ok"]);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let result = BookmarkFolder::parse("{ not json");
        assert!(matches!(result, Err(ForgError::Json(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join(BOOKMARKS_FILE_NAME);
        let mut folder = BookmarkFolder::new("Mine");
        folder.add_bookmark(bookmark("/a", "A"));
        folder.add_folder(BookmarkFolder::new("Empty"));
        folder.save(&path).unwrap();

        let loaded = BookmarkFolder::load(&path).unwrap();
        assert_eq!(loaded.name(), "Mine");
        assert_eq!(names(&loaded), ["A", "Empty"]);
        assert_eq!(loaded.bookmark_count(), 1);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let folder = BookmarkFolder::load(&dir.path().join("nope.json")).unwrap();
        assert!(folder.is_empty());
        assert_eq!(folder.name(), "Bookmarks");
    }
}
