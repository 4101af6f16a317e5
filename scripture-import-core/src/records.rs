//! Typed records for each level of the tree and their document encoding.
//!
//! Every child carries references to all of its ancestors, so the store can
//! be queried by any level without joins.

use serde::Serialize;

use crate::config::CollectionNames;
use crate::contract::{Document, DocumentRef};

pub const WORK_REF: &str = "resourceRef";
pub const BOOK_REF: &str = "resourceBookRef";
pub const CHAPTER_REF: &str = "resourceChapterRef";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRecord {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub work: DocumentRef,
    pub position: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    pub work: DocumentRef,
    pub book: DocumentRef,
    pub position: Option<i64>,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRecord {
    pub work: DocumentRef,
    pub book: DocumentRef,
    pub chapter: DocumentRef,
    pub position: Option<i64>,
    pub content: String,
}

/// A verse as found in a chapter file, before it is linked to its ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verse {
    pub position: Option<i64>,
    pub content: String,
}

impl Verse {
    pub fn link(self, work: &DocumentRef, book: &DocumentRef, chapter: &DocumentRef) -> VerseRecord {
        VerseRecord {
            work: work.clone(),
            book: book.clone(),
            chapter: chapter.clone(),
            position: self.position,
            content: self.content,
        }
    }
}

/// Anything that knows its collection and document encoding.
pub trait Record {
    fn collection<'a>(&self, names: &'a CollectionNames) -> &'a str;
    fn to_document(&self) -> Document;
}

impl Record for WorkRecord {
    fn collection<'a>(&self, names: &'a CollectionNames) -> &'a str {
        &names.work
    }

    fn to_document(&self) -> Document {
        Document::new().with("name", self.name.as_str())
    }
}

impl Record for BookRecord {
    fn collection<'a>(&self, names: &'a CollectionNames) -> &'a str {
        &names.book
    }

    fn to_document(&self) -> Document {
        Document::new()
            .with(WORK_REF, &self.work)
            .with("position", self.position)
            .with("name", self.name.as_str())
    }
}

impl Record for ChapterRecord {
    fn collection<'a>(&self, names: &'a CollectionNames) -> &'a str {
        &names.chapter
    }

    fn to_document(&self) -> Document {
        Document::new()
            .with(WORK_REF, &self.work)
            .with(BOOK_REF, &self.book)
            .with("position", self.position)
            .with("name", self.name.as_str())
            .with("description", self.description.as_str())
    }
}

impl Record for VerseRecord {
    fn collection<'a>(&self, names: &'a CollectionNames) -> &'a str {
        &names.verse
    }

    fn to_document(&self) -> Document {
        Document::new()
            .with(WORK_REF, &self.work)
            .with(BOOK_REF, &self.book)
            .with(CHAPTER_REF, &self.chapter)
            .with("position", self.position)
            .with("content", self.content.as_str())
    }
}
