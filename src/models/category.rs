use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Any CSS color value, e.g. `#ff0000` or `tomato`.
    pub color: String,
}

impl Category {
    /// Build a category with a freshly generated id. Name and color are
    /// trimmed and must both be non-empty.
    pub fn new(name: &str, color: &str) -> Result<Self> {
        let name = name.trim();
        let color = color.trim();
        if name.is_empty() || color.is_empty() {
            return Err(Error::validation("name and color required"));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.to_string(),
        })
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
        categories.iter().find(|c| c.id == id)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
