//! crates/scripture_core/src/links.rs
//!
//! Builds links to a verse on the Church's online scripture library.

use crate::domain::{Division, ScriptureRecord};

const STUDY_BASE: &str = "https://www.churchofjesuschrist.org/study/scriptures";

fn collection(division: Division) -> &'static str {
    match division {
        Division::OldTestament => "ot",
        Division::NewTestament => "nt",
        Division::BookOfMormon => "bofm",
        Division::DoctrineAndCovenants => "dc-testament/dc",
        Division::PearlOfGreatPrice => "pgp",
    }
}

/// `1 Ne.` -> `1-ne`, `JS—H` -> `js-h`.
pub fn book_slug(book: &str) -> String {
    book.trim_end_matches('.')
        .to_lowercase()
        .replace('.', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .replace('—', "-")
}

/// The study-site URL of `record`, anchored at the first verse of a range.
pub fn study_url(record: &ScriptureRecord, division: Division) -> String {
    let verse = record
        .verse
        .split(&['–', '-'][..])
        .next()
        .unwrap_or(&record.verse);
    let path = match division {
        Division::DoctrineAndCovenants => format!("{}/{}", collection(division), record.chapter),
        _ => format!(
            "{}/{}/{}",
            collection(division),
            book_slug(&record.book),
            record.chapter
        ),
    };
    format!("{STUDY_BASE}/{path}?lang=eng&id=p{verse}#p{verse}")
}
