//! crates/scripture_core/src/progress.rs
//!
//! Aggregate statistics derived from the canon index and the read-state: per-division and
//! overall completion, and the daily reading streak.

use crate::canon::CanonIndex;
use crate::domain::{Division, Partition};
use crate::ports::{LocalStore, PortResult};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `read` out of `total`, with `percent` rounded to the nearest whole number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub read: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    pub fn new(read: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((read as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            read,
            total,
            percent,
        }
    }
}

pub fn division_progress(
    canon: &CanonIndex,
    read_ids: &BTreeSet<String>,
    division: Division,
) -> Progress {
    let records = canon.division(division);
    let read = records.iter().filter(|r| read_ids.contains(&r.id)).count();
    Progress::new(read, records.len())
}

/// Only ids that still resolve in the canon count as read.
pub fn overall_progress(canon: &CanonIndex, read_ids: &BTreeSet<String>) -> Progress {
    let read = read_ids.iter().filter(|id| canon.contains(id)).count();
    Progress::new(read, canon.total())
}

//=========================================================================================
// Streak
//=========================================================================================

fn stored_streak(local: &dyn LocalStore, partition: &Partition) -> PortResult<u32> {
    let raw = local.get(&partition.streak_key())?;
    Ok(raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0))
}

fn last_read(local: &dyn LocalStore, partition: &Partition) -> PortResult<Option<NaiveDate>> {
    let raw = local.get(&partition.last_read_key())?;
    Ok(raw.and_then(|s| match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(marker = %s, "Ignoring unreadable last-read marker");
            None
        }
    }))
}

/// Records a reading day and returns the updated streak.
///
/// Reading again on the marker's day keeps the streak, reading the day after extends it,
/// and any longer gap starts over at 1.
pub fn record_reading(
    local: &dyn LocalStore,
    partition: &Partition,
    today: NaiveDate,
) -> PortResult<u32> {
    let previous = stored_streak(local, partition)?;
    let streak = match last_read(local, partition)? {
        Some(day) if day == today => previous.max(1),
        Some(day) if day.succ_opt() == Some(today) => previous.max(1) + 1,
        _ => 1,
    };

    local.set(&partition.last_read_key(), &today.format(DATE_FORMAT).to_string())?;
    local.set(&partition.streak_key(), &streak.to_string())?;
    Ok(streak)
}

/// The streak as of `today`: zero once a full day has passed without reading.
pub fn current_streak(
    local: &dyn LocalStore,
    partition: &Partition,
    today: NaiveDate,
    has_reads: bool,
) -> PortResult<u32> {
    if !has_reads {
        return Ok(0);
    }
    match last_read(local, partition)? {
        Some(day) if day == today || day.succ_opt() == Some(today) => {
            Ok(stored_streak(local, partition)?.max(1))
        }
        _ => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawRecord;
    use crate::test_support::MemoryLocalStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn percent_rounds_and_handles_empty() {
        assert_eq!(Progress::new(0, 0).percent, 0);
        assert_eq!(Progress::new(1, 3).percent, 33);
        assert_eq!(Progress::new(2, 3).percent, 67);
        assert_eq!(Progress::new(1, 2).percent, 50);
        assert_eq!(Progress::new(4, 4).percent, 100);
    }

    #[test]
    fn counts_per_division_and_overall() {
        let canon = CanonIndex::build(&[
            RawRecord::new("Gen 1:1", ""),
            RawRecord::new("Ex 20:3", ""),
            RawRecord::new("John 3:16", ""),
        ]);
        let read: BTreeSet<String> = ["scripture-0", "scripture-2", "scripture-99"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            division_progress(&canon, &read, Division::OldTestament),
            Progress::new(1, 2)
        );
        assert_eq!(
            division_progress(&canon, &read, Division::NewTestament),
            Progress::new(1, 1)
        );
        assert_eq!(overall_progress(&canon, &read), Progress::new(2, 3));
    }

    #[test]
    fn streak_grows_on_consecutive_days() {
        let local = MemoryLocalStore::default();
        let partition = Partition::anonymous();

        assert_eq!(record_reading(&local, &partition, day(1)).unwrap(), 1);
        assert_eq!(record_reading(&local, &partition, day(1)).unwrap(), 1);
        assert_eq!(record_reading(&local, &partition, day(2)).unwrap(), 2);
        assert_eq!(record_reading(&local, &partition, day(3)).unwrap(), 3);
        assert_eq!(
            local.get("lastRead_anonymous").unwrap().as_deref(),
            Some("2024-03-03")
        );
        assert_eq!(local.get("streak_anonymous").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn streak_resets_after_a_gap() {
        let local = MemoryLocalStore::default();
        let partition = Partition("u1".to_string());

        record_reading(&local, &partition, day(1)).unwrap();
        record_reading(&local, &partition, day(2)).unwrap();
        assert_eq!(current_streak(&local, &partition, day(3), true).unwrap(), 2);
        assert_eq!(current_streak(&local, &partition, day(4), true).unwrap(), 0);
        assert_eq!(record_reading(&local, &partition, day(5)).unwrap(), 1);
    }

    #[test]
    fn streak_is_zero_without_reads() {
        let local = MemoryLocalStore::default();
        let partition = Partition::anonymous();
        record_reading(&local, &partition, day(1)).unwrap();
        assert_eq!(current_streak(&local, &partition, day(1), false).unwrap(), 0);
    }
}
