use std::path::PathBuf;

use crate::contract::WriteError;

/// Which level of the tree a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Book,
    Chapter,
    Verse,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Book => f.write_str("book"),
            EntryKind::Chapter => f.write_str("chapter"),
            EntryKind::Verse => f.write_str("verse"),
        }
    }
}

/// Everything that can abort an import.
///
/// There is no partial-failure isolation: the first error stops the run and
/// records already written stay in place.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("work directory {0} has no usable final path segment")]
    InvalidWorkPath(PathBuf),

    #[error("{kind} {name:?} has no parseable position")]
    InvalidPosition { kind: EntryKind, name: String },

    #[error("failed to write to collection {collection}: {source}")]
    Write {
        collection: String,
        #[source]
        source: WriteError,
    },
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            source,
        }
    }
}
