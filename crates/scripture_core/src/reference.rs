//! crates/scripture_core/src/reference.rs
//!
//! Parses raw reference strings such as `1 Ne 3:7` or `JS—H 1:15–17` into
//! book, chapter and verse, and classifies them into a canonical division.

use crate::domain::Division;
use regex::Regex;
use std::sync::LazyLock;

/// A reference string that does not look like `<book> <chapter>[:<verse>]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("could not parse reference: {0}")]
    Unrecognized(String),
}

/// The structured parts of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub book: String,
    pub chapter: u32,
    pub verse: String,
}

/// Book: optional leading numerals, then letters/spaces/periods/ampersand/em-dash.
/// Chapter: digits, optionally followed by `:` and a verse or verse range.
static REFERENCE_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([\d\s]*[A-Za-z\s.&—]+)\s+(\d+)(?::([\d–-]+))?"));

/// Splits a raw reference into book, chapter and verse.
///
/// A chapter-only reference (`Ps 23`) keeps the chapter token as its verse.
pub fn parse(raw: &str) -> Result<ParsedReference, ParseError> {
    let unrecognized = || ParseError::Unrecognized(raw.to_string());
    let pattern = REFERENCE_PATTERN.as_ref().map_err(|_| unrecognized())?;
    let caps = pattern.captures(raw).ok_or_else(unrecognized)?;

    let book = caps[1].trim().to_string();
    let chapter_token = &caps[2];
    let chapter: u32 = chapter_token.parse().map_err(|_| unrecognized())?;
    if chapter == 0 || book.is_empty() {
        return Err(unrecognized());
    }
    let verse = caps
        .get(3)
        .map_or(chapter_token, |m| m.as_str())
        .to_string();

    Ok(ParsedReference {
        book,
        chapter,
        verse,
    })
}

//=========================================================================================
// Classification
//=========================================================================================

const OLD_TESTAMENT: [&str; 39] = [
    "Gen", "Ex", "Lev", "Num", "Deut", "Josh", "Judg", "Ruth", "1 Sam", "2 Sam", "1 Kgs",
    "2 Kgs", "1 Chr", "2 Chr", "Ezra", "Neh", "Esth", "Job", "Ps", "Prov", "Eccl", "Song",
    "Isa", "Jer", "Lam", "Ezek", "Dan", "Hosea", "Joel", "Amos", "Obad", "Jonah", "Micah",
    "Nahum", "Hab", "Zeph", "Hag", "Zech", "Mal",
];

const NEW_TESTAMENT: [&str; 27] = [
    "Matt", "Mark", "Luke", "John", "Acts", "Rom", "1 Cor", "2 Cor", "Gal", "Eph", "Philip",
    "Col", "1 Thes", "2 Thes", "1 Tim", "2 Tim", "Titus", "Philem", "Heb", "James", "1 Pet",
    "2 Pet", "1 Jn", "2 Jn", "3 Jn", "Jude", "Rev",
];

const BOOK_OF_MORMON: [&str; 15] = [
    "1 Ne", "2 Ne", "3 Ne", "4 Ne", "Jacob", "Enos", "Jarom", "Omni", "W of M", "Mosiah",
    "Alma", "Hel", "Morm", "Ether", "Moro",
];

const PEARL_OF_GREAT_PRICE: [&str; 5] = ["Moses", "Abr", "JS—M", "JS—H", "A of F"];

/// Prefix tables in priority order. D&C stays first: its ampersand form must win
/// before any other table is consulted.
const PREFIX_TABLE: [(Division, &[&str]); 5] = [
    (Division::DoctrineAndCovenants, &["D&C"]),
    (Division::OldTestament, &OLD_TESTAMENT),
    (Division::NewTestament, &NEW_TESTAMENT),
    (Division::BookOfMormon, &BOOK_OF_MORMON),
    (Division::PearlOfGreatPrice, &PEARL_OF_GREAT_PRICE),
];

/// Returns the first division whose prefix table matches the start of `raw`.
pub fn classify(raw: &str) -> Option<Division> {
    PREFIX_TABLE
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| raw.starts_with(*p)))
        .map(|(division, _)| *division)
}

/// The prefix tokens registered for `division`.
pub fn prefixes(division: Division) -> &'static [&'static str] {
    PREFIX_TABLE
        .iter()
        .find(|(d, _)| *d == division)
        .map(|(_, prefixes)| *prefixes)
        .unwrap_or_default()
}
