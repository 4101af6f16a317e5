//! High-level pipeline: walks works → books → chapters → verses and writes them.
//!
//! Every write is awaited before the next one starts, because each child
//! needs the reference its parent was given by the store. The first failure
//! ends the run: records already written stay in place and remaining works
//! are not attempted. There is no deduplication, so importing the same tree
//! twice writes everything twice.
//!
//! # Major Types
//! - [`ImportReport`]: per-work counts and the reference of each Work record.
//!
//! # Navigation
//! - Single work: [`import_work`]
//! - Several works under one root, in order: [`import_all`], or
//!   [`import_all_with_progress`] to hear about each work as it starts and ends

use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use crate::config::ImportOptions;
use crate::contract::{DocumentRef, RecordWriter};
use crate::error::{EntryKind, ImportError};
use crate::layout::{check_position, list_books, list_chapters, BookEntry, ChapterEntry};
use crate::records::{BookRecord, ChapterRecord, Record, WorkRecord};
use crate::verses::extract_verses;

#[derive(Debug)]
pub struct ImportReport {
    pub works: Vec<WorkReport>,
}

impl ImportReport {
    pub fn total_verses(&self) -> usize {
        self.works.iter().map(|w| w.verses).sum()
    }
}

#[derive(Debug)]
pub struct WorkReport {
    pub name: String,
    pub reference: DocumentRef,
    pub books: usize,
    pub chapters: usize,
    pub verses: usize,
    /// Directory entries passed over (non-chapter files, hidden entries).
    pub skipped: usize,
}

async fn write_record<W, R>(writer: &W, options: &ImportOptions, record: &R) -> Result<DocumentRef, ImportError>
where
    W: RecordWriter + ?Sized,
    R: Record,
{
    let collection = record.collection(&options.collections);
    writer
        .create_document(collection, record.to_document())
        .await
        .map_err(|source| {
            error!(collection, error = %source, "[IMPORT][ERROR] Write failed");
            ImportError::Write {
                collection: collection.to_string(),
                source,
            }
        })
}

/// Display name of a work: the final segment of its directory path.
pub fn work_name(work_dir: &Path) -> Result<String, ImportError> {
    work_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ImportError::InvalidWorkPath(work_dir.to_path_buf()))
}

/// Import one work directory and everything below it.
pub async fn import_work<W>(
    writer: &W,
    work_dir: &Path,
    options: &ImportOptions,
) -> Result<WorkReport, ImportError>
where
    W: RecordWriter + ?Sized,
{
    let name = work_name(work_dir)?;
    info!(work = %name, path = %work_dir.display(), "[IMPORT] Starting work");

    let books = list_books(work_dir, options)?;
    let work_ref = write_record(writer, options, &WorkRecord { name: name.clone() }).await?;
    info!(work = %name, reference = %work_ref, books = books.entries.len(), "[IMPORT] Created work");

    let mut report = WorkReport {
        name,
        reference: work_ref.clone(),
        books: 0,
        chapters: 0,
        verses: 0,
        skipped: books.skipped,
    };

    for book in &books.entries {
        import_book(writer, options, &work_ref, book, &mut report).await?;
    }

    info!(
        work = %report.name,
        books = report.books,
        chapters = report.chapters,
        verses = report.verses,
        skipped = report.skipped,
        "[IMPORT] Finished work"
    );
    Ok(report)
}

async fn import_book<W>(
    writer: &W,
    options: &ImportOptions,
    work_ref: &DocumentRef,
    book: &BookEntry,
    report: &mut WorkReport,
) -> Result<(), ImportError>
where
    W: RecordWriter + ?Sized,
{
    let record = BookRecord {
        work: work_ref.clone(),
        position: book.position,
        name: book.name.clone(),
    };
    let book_ref = write_record(writer, options, &record).await?;
    report.books += 1;
    info!(book = %book.name, position = ?book.position, reference = %book_ref, "[IMPORT][BOOK] Created book");

    let chapters = list_chapters(&book.path, options)?;
    report.skipped += chapters.skipped;
    if chapters.skipped > 0 {
        debug!(book = %book.name, skipped = chapters.skipped, "[IMPORT][BOOK] Skipped non-chapter entries");
    }

    for chapter in &chapters.entries {
        import_chapter(writer, options, work_ref, &book_ref, chapter, report).await?;
    }
    Ok(())
}

async fn import_chapter<W>(
    writer: &W,
    options: &ImportOptions,
    work_ref: &DocumentRef,
    book_ref: &DocumentRef,
    chapter: &ChapterEntry,
    report: &mut WorkReport,
) -> Result<(), ImportError>
where
    W: RecordWriter + ?Sized,
{
    // Verses are read and checked before the chapter is written, so a strict
    // failure never leaves a chapter without its verses.
    let text = fs::read_to_string(&chapter.path).map_err(|e| {
        error!(path = %chapter.path.display(), error = ?e, "[IMPORT][ERROR] Failed to read chapter file");
        ImportError::io(&chapter.path, e)
    })?;
    let mut verses = extract_verses(&text);
    for (index, verse) in verses.iter_mut().enumerate() {
        let name = format!("{}#{}", chapter.file_name, index + 1);
        verse.position = check_position(options.positions, EntryKind::Verse, &name, verse.position)?;
    }

    let record = ChapterRecord {
        work: work_ref.clone(),
        book: book_ref.clone(),
        position: chapter.position,
        name: chapter.name.clone(),
        description: String::new(),
    };
    let chapter_ref = write_record(writer, options, &record).await?;
    report.chapters += 1;
    info!(
        chapter = %chapter.name,
        file = %chapter.file_name,
        verses = verses.len(),
        "[IMPORT][CHAPTER] Created chapter"
    );

    for verse in verses {
        let position = verse.position;
        let verse_ref = write_record(writer, options, &verse.link(work_ref, book_ref, &chapter_ref)).await?;
        report.verses += 1;
        debug!(position = ?position, reference = %verse_ref, "[IMPORT][VERSE] Created verse");
    }
    Ok(())
}

/// Where a multi-work run is, reported before and after each work.
#[derive(Debug, Clone, Copy)]
pub enum WorkProgress<'a> {
    Started(&'a str),
    Finished(&'a WorkReport),
}

/// Import each named work under `source_root`, in the given order.
///
/// Stops at the first failure.
pub async fn import_all<W, S>(
    writer: &W,
    source_root: &Path,
    works: &[S],
    options: &ImportOptions,
) -> Result<ImportReport, ImportError>
where
    W: RecordWriter + ?Sized,
    S: AsRef<str>,
{
    import_all_with_progress(writer, source_root, works, options, |_| {}).await
}

/// Like [`import_all`], calling `on_progress` when each work starts and
/// when it finishes. A failed work gets no `Finished` call.
pub async fn import_all_with_progress<W, S, F>(
    writer: &W,
    source_root: &Path,
    works: &[S],
    options: &ImportOptions,
    mut on_progress: F,
) -> Result<ImportReport, ImportError>
where
    W: RecordWriter + ?Sized,
    S: AsRef<str>,
    F: FnMut(WorkProgress<'_>),
{
    let mut reports = Vec::with_capacity(works.len());
    for work in works {
        let work = work.as_ref();
        on_progress(WorkProgress::Started(work));
        match import_work(writer, &source_root.join(work), options).await {
            Ok(report) => {
                on_progress(WorkProgress::Finished(&report));
                reports.push(report);
            }
            Err(e) => {
                error!(work, error = %e, "[IMPORT][ERROR] Work failed, stopping");
                return Err(e);
            }
        }
    }
    Ok(ImportReport { works: reports })
}
