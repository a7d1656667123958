//! Menu Service
//!
//! Runs the upload pipeline (encode, extract, parse, store) and serves the
//! read paths used by the HTTP layer.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::extraction::{ExtractionProvider, ImagePayload, MENU_EXTRACTION_PROMPT};
use crate::store::MenuStore;

use super::parser::ResponseParser;
use super::types::{Menu, MenuItem};

/// Menu pipeline and retrieval
#[derive(Clone)]
pub struct MenuService {
    provider: Arc<dyn ExtractionProvider>,
    parser: Arc<dyn ResponseParser>,
    store: Arc<dyn MenuStore>,
    public_base_url: String,
}

impl MenuService {
    pub fn new(
        provider: Arc<dyn ExtractionProvider>,
        parser: Arc<dyn ResponseParser>,
        store: Arc<dyn MenuStore>,
        public_base_url: &str,
    ) -> Self {
        Self {
            provider,
            parser,
            store,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read a menu photo and store the result as a new menu.
    ///
    /// Nothing is stored unless every step succeeds.
    pub async fn process_upload(&self, image_data: &[u8], media_type: &str) -> Result<Menu> {
        let payload = ImagePayload::encode(image_data, media_type);

        let reply = self
            .provider
            .extract(&payload, MENU_EXTRACTION_PROMPT)
            .await?;

        tracing::debug!(
            provider = self.provider.name(),
            reply = %reply,
            "Raw extraction response"
        );

        let items = self.parser.parse(&reply).map_err(|e| {
            tracing::warn!(
                parser = self.parser.name(),
                error = %e,
                "Failed to parse extraction response"
            );
            e
        })?;

        let unnamed = items.iter().filter(|item| item.text("name").is_none()).count();
        if unnamed > 0 {
            tracing::debug!(unnamed, "Some menu items have no text name");
        }

        let menu = self.store.append(items).await?;

        tracing::info!(
            menu_id = %menu.id,
            item_count = menu.items.len(),
            store = self.store.backend(),
            "Menu created"
        );

        Ok(menu)
    }

    /// Look up a stored menu
    pub async fn menu(&self, id: &str) -> Result<Menu> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::MenuNotFound(id.to_string()))
    }

    /// Items of the most recent menu, empty when nothing has been uploaded
    pub async fn latest_items(&self) -> Result<Vec<MenuItem>> {
        Ok(self.store.latest_items().await?)
    }

    /// Public link for a stored menu
    pub async fn share_link(&self, id: &str) -> Result<String> {
        let menu = self.menu(id).await?;
        Ok(self.share_url(&menu.id))
    }

    fn share_url(&self, id: &str) -> String {
        format!("{}/menu/{}", self.public_base_url, urlencoding::encode(id))
    }
}
