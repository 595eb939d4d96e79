//! Gopher and Gopher+ client core.
//!
//! Resources and their URL, directory-line and cache-path forms;
//! response classification and parsing; Gopher+ info blocks and ASK
//! forms; bookmarks; the on-disk response cache; the navigation
//! history; and the [`Session`] that ties the cache, the network and
//! the history together.

pub mod ask;
pub mod bookmarks;
pub mod cache;
pub mod connection;
pub mod context;
pub mod history;
pub mod info;
pub mod parser;
pub mod resource;
pub mod response;
pub mod session;

pub use ask::{AskForm, Question, QuestionKind};
pub use bookmarks::{Bookmark, BookmarkFolder, BookmarkItem};
pub use cache::{CacheStats, DiskCache};
pub use connection::{GopherConnection, RequestKind};
pub use context::ForgContext;
pub use history::{EntryId, History};
pub use info::ResourceInformation;
pub use parser::Classification;
pub use resource::Resource;
pub use response::{Body, Response};
pub use session::{FetchTask, HistoryEntry, Outcome, Session};
