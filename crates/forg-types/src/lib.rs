//! Foundation types for forg.
//!
//! This crate contains the pieces shared by every forg crate: the error
//! taxonomy, Gopher item type codes and the client configuration.

pub mod config;
pub mod error;
pub mod item;

pub use config::ForgConfig;
pub use error::{ForgError, Result};
pub use item::ItemType;
