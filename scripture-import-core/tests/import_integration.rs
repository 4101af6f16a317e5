use std::fs::{create_dir_all, write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use scripture_import_core::config::{CollectionNames, ImportOptions, PositionPolicy, SiblingOrder};
use scripture_import_core::contract::{Document, DocumentRef, FieldValue, MockRecordWriter};
use scripture_import_core::error::{EntryKind, ImportError};
use scripture_import_core::import::{import_all, import_all_with_progress, import_work, WorkProgress};
use scripture_import_core::memory::MemoryStore;
use scripture_import_core::records::{BOOK_REF, CHAPTER_REF, WORK_REF};
use tempfile::tempdir;

fn write_chapter(root: &Path, work: &str, book: &str, file: &str, text: &str) {
    let dir = root.join(work).join(book);
    create_dir_all(&dir).expect("create book dir");
    write(dir.join(file), text).expect("write chapter");
}

fn string(doc: &Document, field: &str) -> String {
    match doc.get(field) {
        Some(FieldValue::String(s)) => s.clone(),
        other => panic!("expected string field {field}, got {other:?}"),
    }
}

fn integer(doc: &Document, field: &str) -> i64 {
    match doc.get(field) {
        Some(FieldValue::Integer(i)) => *i,
        other => panic!("expected integer field {field}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_import_single_chapter_end_to_end() {
    let root = tempdir().unwrap();
    write_chapter(
        root.path(),
        "Old Testament",
        "01 Genesis",
        "01.md",
        "## 1. In the beginning...\n## 2. And the earth...",
    );

    let store = MemoryStore::new();
    let report = import_work(&store, &root.path().join("Old Testament"), &ImportOptions::default())
        .await
        .expect("import should succeed");

    assert_eq!(report.name, "Old Testament");
    assert_eq!((report.books, report.chapters, report.verses), (1, 1, 2));

    let works = store.documents("resource");
    assert_eq!(works.len(), 1);
    assert_eq!(string(&works[0].document, "name"), "Old Testament");
    assert_eq!(works[0].reference, report.reference);

    let books = store.documents("resourceBook");
    assert_eq!(books.len(), 1);
    assert_eq!(integer(&books[0].document, "position"), 1);
    assert_eq!(string(&books[0].document, "name"), "Genesis");

    let chapters = store.documents("resourceChapter");
    assert_eq!(chapters.len(), 1);
    assert_eq!(integer(&chapters[0].document, "position"), 1);
    assert_eq!(string(&chapters[0].document, "name"), "Chapter 1");
    assert_eq!(string(&chapters[0].document, "description"), "");

    let verses = store.documents("resourceParagraph");
    let contents: Vec<_> = verses
        .iter()
        .map(|v| (integer(&v.document, "position"), string(&v.document, "content")))
        .collect();
    assert_eq!(
        contents,
        vec![
            (1, "In the beginning...".to_string()),
            (2, "And the earth...".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_every_child_links_all_ancestors_without_cross_linking() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "New Testament", "01 Matthew", "01.md", "## 1. a\n## 2. b");
    write_chapter(root.path(), "New Testament", "02 Mark", "01.md", "## 1. c");
    write_chapter(root.path(), "Pearl of Great Price", "01 Moses", "01.md", "## 1. d");
    write_chapter(root.path(), "Pearl of Great Price", "01 Moses", "02.md", "## 1. e");

    let store = MemoryStore::new();
    let report = import_all(
        &store,
        root.path(),
        &["New Testament", "Pearl of Great Price"],
        &ImportOptions::default(),
    )
    .await
    .expect("import should succeed");
    assert_eq!(report.works.len(), 2);
    assert_eq!(report.total_verses(), 5);

    let all = store.all();
    let lookup = |r: &DocumentRef| {
        all.iter()
            .find(|d| &d.reference == r)
            .unwrap_or_else(|| panic!("dangling reference {r}"))
    };

    for book in store.documents("resourceBook") {
        let work = lookup(book.document.reference(WORK_REF).unwrap());
        assert_eq!(work.collection, "resource");
    }
    for chapter in store.documents("resourceChapter") {
        let work_ref = chapter.document.reference(WORK_REF).unwrap();
        let book = lookup(chapter.document.reference(BOOK_REF).unwrap());
        assert_eq!(book.document.reference(WORK_REF), Some(work_ref));
    }
    for verse in store.documents("resourceParagraph") {
        let work_ref = verse.document.reference(WORK_REF).unwrap();
        let book_ref = verse.document.reference(BOOK_REF).unwrap();
        let chapter = lookup(verse.document.reference(CHAPTER_REF).unwrap());
        assert_eq!(chapter.document.reference(BOOK_REF), Some(book_ref));
        assert_eq!(chapter.document.reference(WORK_REF), Some(work_ref));
    }

    // Verses of the second work point at the second work only.
    let pearl = &report.works[1].reference;
    let pearl_verses = store
        .documents("resourceParagraph")
        .into_iter()
        .filter(|v| v.document.reference(WORK_REF) == Some(pearl))
        .count();
    assert_eq!(pearl_verses, 2);
}

#[tokio::test]
async fn test_reimport_duplicates_every_record() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Doctrine and Covenants", "01 Sections", "001.md", "## 1. Hearken\n## 2. For verily");
    let options = ImportOptions::default();
    let store = MemoryStore::new();

    let first = import_all(&store, root.path(), &["Doctrine and Covenants"], &options)
        .await
        .unwrap();
    let after_first = store.len();
    let second = import_all(&store, root.path(), &["Doctrine and Covenants"], &options)
        .await
        .unwrap();

    assert_eq!(after_first, 5);
    assert_eq!(store.len(), 2 * after_first);
    assert_eq!(store.count("resource"), 2);
    assert_eq!(store.count("resourceParagraph"), 4);
    assert_ne!(first.works[0].reference, second.works[0].reference);
}

#[tokio::test]
async fn test_writes_happen_top_down_in_sibling_order() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "2 Second", "01.md", "## 1. x");
    write_chapter(root.path(), "Work", "10 Tenth", "01.md", "");
    write_chapter(root.path(), "Work", "10 Tenth", "notes.txt", "## 1. not a chapter");

    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    let mut writer = MockRecordWriter::new();
    writer
        .expect_create_document()
        .returning(move |collection: &str, document: Document| {
            let mut seen = seen.lock().unwrap();
            seen.push((collection.to_string(), document));
            Ok(DocumentRef::new(format!("{collection}/{}", seen.len())))
        });

    let report = import_work(&writer, &root.path().join("Work"), &ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(report.skipped, 1);

    let calls = calls.lock().unwrap();
    let collections: Vec<_> = calls.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(
        collections,
        vec![
            "resource",
            "resourceBook",
            "resourceChapter",
            "resourceBook",
            "resourceChapter",
            "resourceParagraph",
        ]
    );
    // Lexical order: "10 Tenth" is imported before "2 Second".
    assert_eq!(string(&calls[1].1, "name"), "Tenth");
    assert_eq!(string(&calls[3].1, "name"), "Second");
    // The verse links to the references handed out for its ancestors.
    let verse = &calls[5].1;
    assert_eq!(verse.reference(WORK_REF).unwrap().as_str(), "resource/1");
    assert_eq!(verse.reference(BOOK_REF).unwrap().as_str(), "resourceBook/4");
    assert_eq!(verse.reference(CHAPTER_REF).unwrap().as_str(), "resourceChapter/5");
}

#[tokio::test]
async fn test_numeric_ordering_and_custom_collections() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "2 Second", "01.md", "");
    write_chapter(root.path(), "Work", "10 Tenth", "01.md", "");
    let options = ImportOptions {
        ordering: SiblingOrder::Numeric,
        collections: CollectionNames {
            work: "works".to_string(),
            book: "books".to_string(),
            chapter: "chapters".to_string(),
            verse: "verses".to_string(),
        },
        ..ImportOptions::default()
    };

    let store = MemoryStore::new();
    import_work(&store, &root.path().join("Work"), &options).await.unwrap();

    let names: Vec<_> = store
        .documents("books")
        .iter()
        .map(|b| string(&b.document, "name"))
        .collect();
    assert_eq!(names, vec!["Second", "Tenth"]);
    assert_eq!(store.count("works"), 1);
    assert_eq!(store.count("resource"), 0);
}

#[tokio::test]
async fn test_write_failure_aborts_remaining_works() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "First", "01 A", "01.md", "## 1. a\n## 2. b\n## 3. c");
    write_chapter(root.path(), "Second", "01 B", "01.md", "## 1. d");

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let mut writer = MockRecordWriter::new();
    writer
        .expect_create_document()
        .returning(move |collection: &str, _document: Document| {
            let mut n = counter.lock().unwrap();
            *n += 1;
            if *n == 5 {
                return Err("quota exceeded".into());
            }
            Ok(DocumentRef::new(format!("{collection}/{n}")))
        });

    let err = import_all(&writer, root.path(), &["First", "Second"], &ImportOptions::default())
        .await
        .unwrap_err();

    match err {
        ImportError::Write { collection, source } => {
            assert_eq!(collection, "resourceParagraph");
            assert_eq!(source.to_string(), "quota exceeded");
        }
        other => panic!("expected write error, got {other:?}"),
    }
    // Work, book, chapter, verse 1, then the failing verse 2; nothing after.
    assert_eq!(*calls.lock().unwrap(), 5);
}

#[tokio::test]
async fn test_unprefixed_book_fails_before_any_write_when_strict() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "Appendix", "01.md", "## 1. x");

    let mut writer = MockRecordWriter::new();
    writer.expect_create_document().never();

    let err = import_work(&writer, &root.path().join("Work"), &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::InvalidPosition {
            kind: EntryKind::Book,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unprefixed_book_written_with_null_position_when_lenient() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "Appendix", "01.md", "## 1. x");
    let options = ImportOptions {
        positions: PositionPolicy::Lenient,
        ..ImportOptions::default()
    };

    let store = MemoryStore::new();
    import_work(&store, &root.path().join("Work"), &options).await.unwrap();

    let books = store.documents("resourceBook");
    assert_eq!(books[0].document.get("position"), Some(&FieldValue::Null));
    assert_eq!(string(&books[0].document, "name"), "Appendix");
    assert_eq!(store.count("resourceParagraph"), 1);
}

#[tokio::test]
async fn test_missing_work_directory_stops_the_run() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Present", "01 A", "01.md", "## 1. a");

    let store = MemoryStore::new();
    let err = import_all(&store, root.path(), &["Missing", "Present"], &ImportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Io { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_chapter_without_headings_creates_no_verses() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "01 Book", "01.md", "# Introduction\n\nNo verses here.");

    let store = MemoryStore::new();
    let report = import_work(&store, &root.path().join("Work"), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(report.chapters, 1);
    assert_eq!(report.verses, 0);
    assert_eq!(store.count("resourceParagraph"), 0);
}

#[tokio::test]
async fn test_chapters_are_written_in_sibling_order() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "01 Book", "2.md", "## 1. two");
    write_chapter(root.path(), "Work", "01 Book", "10.md", "## 1. ten");

    for (ordering, expected) in [
        (SiblingOrder::Lexical, ["Chapter 10", "Chapter 2"]),
        (SiblingOrder::Numeric, ["Chapter 2", "Chapter 10"]),
    ] {
        let options = ImportOptions {
            ordering,
            ..ImportOptions::default()
        };
        let store = MemoryStore::new();
        import_work(&store, &root.path().join("Work"), &options).await.unwrap();

        let chapters = store.documents("resourceChapter");
        let names: Vec<_> = chapters.iter().map(|c| string(&c.document, "name")).collect();
        assert_eq!(names, expected, "ordering {ordering:?}");

        // Each chapter's verse is written right after the chapter itself.
        let all = store.all();
        let first_verse = all
            .iter()
            .position(|d| d.collection == "resourceParagraph")
            .unwrap();
        assert_eq!(all[first_verse - 1].reference, chapters[0].reference);
        assert_eq!(
            all[first_verse].document.reference(CHAPTER_REF),
            Some(&chapters[0].reference)
        );
    }
}

const OVERSIZED_VERSE: &str = "## 1. ok\n## 99999999999999999999. big\n";

#[tokio::test]
async fn test_oversized_verse_number_written_as_null_when_lenient() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "01 Book", "01.md", OVERSIZED_VERSE);
    write_chapter(root.path(), "Work", "01 Book", "02.md", "## 1. next chapter");
    let options = ImportOptions {
        positions: PositionPolicy::Lenient,
        ..ImportOptions::default()
    };

    let store = MemoryStore::new();
    let report = import_work(&store, &root.path().join("Work"), &options).await.unwrap();

    assert_eq!((report.chapters, report.verses), (2, 3));
    let verses = store.documents("resourceParagraph");
    assert_eq!(integer(&verses[0].document, "position"), 1);
    assert_eq!(verses[1].document.get("position"), Some(&FieldValue::Null));
    assert_eq!(string(&verses[1].document, "content"), "big");
    assert_eq!(string(&verses[2].document, "content"), "next chapter");
}

#[tokio::test]
async fn test_oversized_verse_number_fails_before_chapter_when_strict() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "Work", "01 Book", "01.md", OVERSIZED_VERSE);
    write_chapter(root.path(), "Work", "01 Book", "02.md", "## 1. next chapter");

    let store = MemoryStore::new();
    let err = import_work(&store, &root.path().join("Work"), &ImportOptions::default())
        .await
        .unwrap_err();

    match err {
        ImportError::InvalidPosition { kind, name } => {
            assert_eq!(kind, EntryKind::Verse);
            assert_eq!(name, "01.md#2");
        }
        other => panic!("expected invalid verse position, got {other:?}"),
    }
    // The work and book are in place; the offending chapter was never written.
    assert_eq!(store.count("resource"), 1);
    assert_eq!(store.count("resourceBook"), 1);
    assert_eq!(store.count("resourceChapter"), 0);
    assert_eq!(store.count("resourceParagraph"), 0);
}

#[tokio::test]
async fn test_progress_reports_each_work_start_and_finish() {
    let root = tempdir().unwrap();
    write_chapter(root.path(), "First", "01 A", "01.md", "## 1. a");
    write_chapter(root.path(), "Second", "01 B", "01.md", "## 1. b\n## 2. c");

    let store = MemoryStore::new();
    let mut events = Vec::new();
    import_all_with_progress(
        &store,
        root.path(),
        &["First", "Second", "Missing"],
        &ImportOptions::default(),
        |progress| match progress {
            WorkProgress::Started(work) => events.push(format!("start {work}")),
            WorkProgress::Finished(report) => events.push(format!("done {} {}", report.name, report.verses)),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(
        events,
        vec!["start First", "done First 1", "start Second", "done Second 2", "start Missing"]
    );
}
