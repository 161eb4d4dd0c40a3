//! Discussion items

use serde::{Deserialize, Serialize};

/// An item surfaced to participants for discussion.
///
/// Opaque to the coordination core: it is carried and compared, never
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Two items discussed side by side. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPair {
    item1: Item,
    item2: Item,
}

impl ItemPair {
    pub fn new(item1: Item, item2: Item) -> Self {
        Self { item1, item2 }
    }

    pub fn first(&self) -> &Item {
        &self.item1
    }

    pub fn second(&self) -> &Item {
        &self.item2
    }
}

impl std::fmt::Display for ItemPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vs {}", self.item1.name, self.item2.name)
    }
}
