//! Directory enumeration for works, books and chapters.
//!
//! A work directory holds one subdirectory per book (`"01 Genesis"`), and a
//! book directory holds one markdown file per chapter (`"gen01.md"`). Names
//! carry the position: the leading integer for books, the digit run right
//! before `.md` for chapters. Listings are read completely before anything
//! is written.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{ImportOptions, PositionPolicy, SiblingOrder};
use crate::error::{EntryKind, ImportError};

static LEADING_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").expect("leading integer pattern is valid"));
static BOOK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\s*").expect("book prefix pattern is valid"));
static CHAPTER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\.md$").expect("chapter suffix pattern is valid"));

/// A book directory found inside a work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    pub dir_name: String,
    pub path: PathBuf,
    pub position: Option<i64>,
    pub name: String,
}

/// A chapter file found inside a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub file_name: String,
    pub path: PathBuf,
    pub position: Option<i64>,
    pub name: String,
}

/// Entries to import plus how many directory entries were passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub entries: Vec<T>,
    pub skipped: usize,
}

/// Integer at the start of `name`, after optional whitespace and sign.
///
/// Returns `None` when there is no digit to read or the value does not fit.
pub fn leading_integer(name: &str) -> Option<i64> {
    LEADING_INTEGER
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Book display name: the folder name without its leading digits and the whitespace after them.
pub fn book_name(dir_name: &str) -> String {
    BOOK_PREFIX.replace(dir_name, "").into_owned()
}

/// Digit run immediately before a trailing `.md`, if the file name has one.
pub fn chapter_digits(file_name: &str) -> Option<&str> {
    CHAPTER_SUFFIX
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Chapter record fields derived from a file name, or `None` for files that are not chapters.
pub fn chapter_from_file_name(file_name: &str) -> Option<(Option<i64>, String)> {
    let digits = chapter_digits(file_name)?;
    let position = digits.parse::<i64>().ok();
    let name = match position {
        Some(n) => format!("Chapter {n}"),
        None => format!("Chapter {digits}"),
    };
    Some((position, name))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

pub(crate) fn check_position(
    policy: PositionPolicy,
    kind: EntryKind,
    name: &str,
    position: Option<i64>,
) -> Result<Option<i64>, ImportError> {
    match (position, policy) {
        (Some(p), _) => Ok(Some(p)),
        (None, PositionPolicy::Lenient) => {
            warn!(kind = %kind, name, "No parseable position, writing null");
            Ok(None)
        }
        (None, PositionPolicy::Strict) => Err(ImportError::InvalidPosition {
            kind,
            name: name.to_string(),
        }),
    }
}

/// Read a directory into (file name, path, is_dir), materialised before use.
fn read_entries(dir: &Path) -> Result<(Vec<(String, PathBuf, bool)>, usize), ImportError> {
    let mut entries = Vec::new();
    let mut skipped = 0;
    for entry in fs::read_dir(dir).map_err(|e| ImportError::io(dir, e))? {
        let entry = entry.map_err(|e| ImportError::io(dir, e))?;
        let path = entry.path();
        let Ok(name) = entry.file_name().into_string() else {
            debug!(path = %path.display(), "Skipping entry with non UTF-8 name");
            skipped += 1;
            continue;
        };
        let is_dir = fs::metadata(&path)
            .map_err(|e| ImportError::io(&path, e))?
            .is_dir();
        entries.push((name, path, is_dir));
    }
    Ok((entries, skipped))
}

fn sort_siblings<T>(
    entries: &mut [T],
    order: SiblingOrder,
    name: impl Fn(&T) -> &str,
    position: impl Fn(&T) -> Option<i64>,
) {
    match order {
        SiblingOrder::Lexical => entries.sort_by(|a, b| name(a).cmp(name(b))),
        SiblingOrder::Numeric => entries.sort_by(|a, b| {
            let key = |e: &T| (position(e).is_none(), position(e));
            key(a).cmp(&key(b)).then_with(|| name(a).cmp(name(b)))
        }),
    }
}

/// List the book directories of a work in import order.
///
/// Hidden directories (names starting with `.`) are skipped and counted
/// unless `options.include_hidden` is set. Set it to treat every immediate
/// subdirectory as a book, dot-directories included.
pub fn list_books(work_dir: &Path, options: &ImportOptions) -> Result<Listing<BookEntry>, ImportError> {
    let (raw, mut skipped) = read_entries(work_dir)?;
    let mut books = Vec::new();

    for (dir_name, path, is_dir) in raw {
        if !is_dir {
            debug!(path = %path.display(), "Skipping non-directory entry in work");
            skipped += 1;
            continue;
        }
        if is_hidden(&dir_name) && !options.include_hidden {
            debug!(path = %path.display(), "Skipping hidden directory in work");
            skipped += 1;
            continue;
        }
        let position = check_position(
            options.positions,
            EntryKind::Book,
            &dir_name,
            leading_integer(&dir_name),
        )?;
        books.push(BookEntry {
            name: book_name(&dir_name),
            dir_name,
            path,
            position,
        });
    }

    sort_siblings(&mut books, options.ordering, |b| b.dir_name.as_str(), |b| b.position);
    Ok(Listing {
        entries: books,
        skipped,
    })
}

/// List the chapter files of a book in import order.
///
/// Files whose name does not end in digits followed by `.md` are skipped silently.
pub fn list_chapters(
    book_dir: &Path,
    options: &ImportOptions,
) -> Result<Listing<ChapterEntry>, ImportError> {
    let (raw, mut skipped) = read_entries(book_dir)?;
    let mut chapters = Vec::new();

    for (file_name, path, is_dir) in raw {
        if is_dir || (is_hidden(&file_name) && !options.include_hidden) {
            skipped += 1;
            continue;
        }
        let Some((position, name)) = chapter_from_file_name(&file_name) else {
            skipped += 1;
            continue;
        };
        let position = check_position(options.positions, EntryKind::Chapter, &file_name, position)?;
        chapters.push(ChapterEntry {
            file_name,
            path,
            position,
            name,
        });
    }

    sort_siblings(&mut chapters, options.ordering, |c| c.file_name.as_str(), |c| c.position);
    Ok(Listing {
        entries: chapters,
        skipped,
    })
}
