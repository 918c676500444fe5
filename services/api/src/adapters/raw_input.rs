//! services/api/src/adapters/raw_input.rs
//!
//! Loads the raw `{reference, text}` records the canon index is built from.

use crate::error::ApiError;
use scripture_core::domain::RawRecord;
use std::path::Path;
use tracing::info;

/// Reads a JSON array of `{ "reference": ..., "text": ... }` objects.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>, ApiError> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<RawRecord> = serde_json::from_str(&contents)?;
    info!(path = %path.display(), "Loaded {} raw scripture records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_records_in_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scriptures.json");
        std::fs::write(
            &path,
            r#"[{"reference":"Gen 1:1","text":"In the beginning"},{"reference":"D&C 1:1","text":"Hearken"}]"#,
        )
        .unwrap();

        let records = load_raw_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], RawRecord::new("D&C 1:1", "Hearken"));
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scriptures.json");
        std::fs::write(&path, r#"{"reference":"Gen 1:1"}"#).unwrap();
        assert!(matches!(load_raw_records(&path), Err(ApiError::Json(_))));
    }
}
