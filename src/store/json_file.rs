//! Single-file JSON menu store
//!
//! The file holds one pretty-printed array of menus. Every append reads the
//! whole array, pushes the new menu and writes the whole array back.
//!
//! There is no locking: two appends that overlap both read the same array
//! and the later rename wins, dropping the other menu. Writes go through a
//! temporary file and a rename, so readers only ever see a complete array.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::{MenuStore, StoreError};
use crate::menu::{Menu, MenuItem};

/// Menu store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileMenuStore {
    path: PathBuf,
}

impl JsonFileMenuStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full collection. A missing or blank file is an empty collection.
    async fn load(&self) -> Result<Vec<Menu>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Replace the full collection on disk
    async fn save(&self, menus: &[Menu]) -> Result<(), StoreError> {
        let write_error = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        let json = serde_json::to_string_pretty(menus)?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "menus".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        tokio::fs::write(&temp_path, json).await.map_err(write_error)?;

        if let Err(source) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_error(source));
        }

        Ok(())
    }
}

#[async_trait]
impl MenuStore for JsonFileMenuStore {
    fn backend(&self) -> &'static str {
        "json-file"
    }

    async fn append(&self, items: Vec<MenuItem>) -> Result<Menu, StoreError> {
        let mut menus = self.load().await?;
        let menu = Menu::new(items);

        menus.push(menu.clone());
        self.save(&menus).await?;

        tracing::debug!(
            menu_id = %menu.id,
            total_menus = menus.len(),
            path = %self.path.display(),
            "Menu appended"
        );

        Ok(menu)
    }

    async fn all(&self) -> Result<Vec<Menu>, StoreError> {
        self.load().await
    }
}
