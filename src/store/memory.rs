//! In-memory menu store

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MenuStore, StoreError};
use crate::menu::{Menu, MenuItem};

/// Menu store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryMenuStore {
    menus: RwLock<Vec<Menu>>,
}

impl MemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MenuStore for MemoryMenuStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn append(&self, items: Vec<MenuItem>) -> Result<Menu, StoreError> {
        let menu = Menu::new(items);
        self.menus.write().await.push(menu.clone());
        Ok(menu)
    }

    async fn all(&self) -> Result<Vec<Menu>, StoreError> {
        Ok(self.menus.read().await.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Menu>, StoreError> {
        let menus = self.menus.read().await;
        Ok(menus.iter().find(|menu| menu.id == id).cloned())
    }

    async fn latest_items(&self) -> Result<Vec<MenuItem>, StoreError> {
        let menus = self.menus.read().await;
        Ok(menus.last().map(|menu| menu.items.clone()).unwrap_or_default())
    }
}
