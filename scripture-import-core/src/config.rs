use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How sibling books and chapters are ordered before import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingOrder {
    /// Plain string order of the entry names ("10 X" sorts before "2 Y").
    #[default]
    Lexical,
    /// By parsed position, falling back to name order on ties or missing positions.
    Numeric,
}

/// What to do with a book or chapter name that carries no parseable number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionPolicy {
    /// Abort with [`crate::error::ImportError::InvalidPosition`].
    #[default]
    Strict,
    /// Write the record with a null position.
    Lenient,
}

/// Target collection names for each level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub work: String,
    pub book: String,
    pub chapter: String,
    pub verse: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            work: "resource".to_string(),
            book: "resourceBook".to_string(),
            chapter: "resourceChapter".to_string(),
            verse: "resourceParagraph".to_string(),
        }
    }
}

/// Options shared by every work in one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub ordering: SiblingOrder,
    pub positions: PositionPolicy,
    /// Import entries whose name starts with a dot.
    pub include_hidden: bool,
    pub collections: CollectionNames,
}

impl ImportOptions {
    pub fn trace_loaded(&self) {
        info!(
            ordering = ?self.ordering,
            positions = ?self.positions,
            include_hidden = self.include_hidden,
            "Loaded ImportOptions"
        );
        debug!(?self, "ImportOptions loaded (full debug)");
    }
}
