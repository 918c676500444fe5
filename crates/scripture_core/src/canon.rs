//! crates/scripture_core/src/canon.rs
//!
//! The canon index: every classified verse, grouped by division, built once at startup
//! and read-only afterwards.

use crate::domain::{Division, RawRecord, ScriptureRecord};
use crate::reference::{classify, parse};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Why a raw record was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Unparsable,
    NoDivision,
}

/// A raw record that did not make it into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    pub index: usize,
    pub reference: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default)]
pub struct CanonIndex {
    divisions: BTreeMap<Division, Vec<ScriptureRecord>>,
    dropped: Vec<DroppedRecord>,
}

impl CanonIndex {
    /// Parses and classifies every raw record, keeping raw input order within each division.
    ///
    /// Ids are `scripture-<i>` with `i` the position in `raw`, so rebuilding from the same
    /// input always yields the same ids.
    pub fn build(raw: &[RawRecord]) -> Self {
        let mut divisions: BTreeMap<Division, Vec<ScriptureRecord>> =
            Division::ALL.iter().map(|d| (*d, Vec::new())).collect();
        let mut dropped = Vec::new();

        for (index, record) in raw.iter().enumerate() {
            let parsed = match parse(&record.reference) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("{e}");
                    dropped.push(DroppedRecord {
                        index,
                        reference: record.reference.clone(),
                        reason: DropReason::Unparsable,
                    });
                    continue;
                }
            };

            let Some(division) = classify(&record.reference) else {
                warn!(reference = %record.reference, "No division matches reference; dropping it");
                dropped.push(DroppedRecord {
                    index,
                    reference: record.reference.clone(),
                    reason: DropReason::NoDivision,
                });
                continue;
            };

            divisions.entry(division).or_default().push(ScriptureRecord {
                reference: record.reference.clone(),
                book: parsed.book,
                chapter: parsed.chapter,
                verse: parsed.verse,
                text: record.text.clone(),
                id: format!("scripture-{index}"),
            });
        }

        for (division, records) in &divisions {
            info!("{division}: {} scriptures", records.len());
        }

        Self { divisions, dropped }
    }

    /// The records of one division, in raw input order.
    pub fn division(&self, division: Division) -> &[ScriptureRecord] {
        self.divisions
            .get(&division)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Divisions in display order with their records.
    pub fn iter(&self) -> impl Iterator<Item = (Division, &[ScriptureRecord])> + '_ {
        Division::ALL.into_iter().map(|d| (d, self.division(d)))
    }

    /// Resolves a read-state identifier back to its record. Linear in the number of records.
    pub fn find_by_id(&self, id: &str) -> Option<(Division, &ScriptureRecord)> {
        self.iter()
            .find_map(|(d, records)| records.iter().find(|r| r.id == id).map(|r| (d, r)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Number of classified records across all divisions.
    pub fn total(&self) -> usize {
        self.divisions.values().map(Vec::len).sum()
    }

    pub fn dropped(&self) -> &[DroppedRecord] {
        &self.dropped
    }
}
