use serde::{Deserialize, Serialize};

/// Identifier assigned by the catalog, never generated here.
pub type DocId = u32;

/// Document represents one catalog entry (a movie)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub description: String,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Get the full indexed text (title + description)
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}
