//! Menu Store
//!
//! Append-only persistence for extracted menus. Menus are never edited or
//! deleted once stored; new uploads always create a new record.
//!
//! Backends:
//! - [`JsonFileMenuStore`]: the whole collection in one JSON array file
//! - [`MemoryMenuStore`]: in-process, for tests and throwaway runs

use std::path::PathBuf;

use async_trait::async_trait;

use crate::menu::{Menu, MenuItem};

mod json_file;
mod memory;

pub use json_file::JsonFileMenuStore;
pub use memory::MemoryMenuStore;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read menus file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save menus file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid menu data format in {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Failed to serialize menus: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Menu persistence trait
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Backend name, used in logs
    fn backend(&self) -> &'static str;

    /// Store a new menu built from `items` and return it
    async fn append(&self, items: Vec<MenuItem>) -> Result<Menu, StoreError>;

    /// Every stored menu, oldest first
    async fn all(&self) -> Result<Vec<Menu>, StoreError>;

    /// Look up a menu by identifier
    async fn get_by_id(&self, id: &str) -> Result<Option<Menu>, StoreError> {
        Ok(self.all().await?.into_iter().find(|menu| menu.id == id))
    }

    /// Items of the most recently stored menu, empty if there is none
    async fn latest_items(&self) -> Result<Vec<MenuItem>, StoreError> {
        Ok(self
            .all()
            .await?
            .pop()
            .map(|menu| menu.items)
            .unwrap_or_default())
    }
}
