//! Splits one chapter file into verses.
//!
//! A verse starts at a `## N.` heading and runs until the next such heading
//! or the end of the text. Anything else inside a verse (sub-headings,
//! lists, blank lines) is kept verbatim; only the outer whitespace is
//! trimmed. Heading numbers are recorded as written, never checked for
//! order or gaps. A number too large for `i64` yields no position; the
//! importer's position policy decides what happens to it.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::records::Verse;

static VERSE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    // Not anchored to line starts: "##" followed by a number and a period opens a verse wherever it appears.
    Regex::new(r"##\s*([0-9]+)\.\s*").expect("verse heading pattern is valid")
});

/// Extract the verses of a chapter in document order.
///
/// Text before the first heading is ignored. A text without headings yields
/// no verses.
pub fn extract_verses(text: &str) -> Vec<Verse> {
    let headings: Vec<_> = VERSE_HEADING.captures_iter(text).collect();
    let mut verses = Vec::with_capacity(headings.len());

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());

        verses.push(Verse {
            position: number.as_str().parse().ok(),
            content: text[whole.end()..end].trim().to_string(),
        });
    }

    debug!(count = verses.len(), "Extracted verses from chapter text");
    verses
}
