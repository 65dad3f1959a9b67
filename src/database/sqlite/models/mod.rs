#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A node in the section hierarchy.
///
/// `id` is the only stable identifier. Slugs are unique among siblings and
/// dotted paths are recomputed from the live tree shape on demand, so neither
/// survives tree mutations as a durable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: String,
    pub parent_id: Option<String>,
    pub slug: Option<String>,
    pub header: String,
    pub content: String,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSection {
    pub header: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub slug: Option<String>,
}

/// Partial update for a section. `None` fields are left untouched;
/// `slug: Some(None)` clears the stored slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SectionUpdate {
    pub header: Option<String>,
    pub slug: Option<Option<String>>,
    pub content: Option<String>,
}

impl Section {
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl SectionUpdate {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.slug.is_none() && self.content.is_none()
    }
}
