//! Menu Types
//!
//! A menu is one persisted extraction result. Items are whatever the model
//! read off the photo and are stored as the JSON it returned.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One line entry read off a menu.
///
/// Kept exactly as the model produced it. Usually an object with `name`,
/// `price` and `description` strings, but fields may be missing, hold other
/// JSON types, or come with extra keys, and an item may not be an object at
/// all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItem(Value);

impl MenuItem {
    /// Raw value of a field, if the item is an object that has it
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// A field that holds a string
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }
}

impl From<Value> for MenuItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
impl MenuItem {
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self(serde_json::json!({
            "name": name.into(),
            "price": price.into(),
            "description": description.into(),
        }))
    }
}

/// A stored menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: String,
    pub items: Vec<MenuItem>,
    pub created_at: DateTime<Utc>,
}

impl Menu {
    /// Create a menu with a fresh identifier, stamped with the current time
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            items,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}
