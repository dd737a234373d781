//! Daily skip log
//!
//! Combinations that produce no artifact (no data, or over the row ceiling)
//! are recorded with their full filter context as JSON lines, one file per
//! day, separate from the process journal. A skipped combination must be
//! reconstructible from this file alone.

use crate::domain::{Combination, QuerySpec};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;

use super::{Journal, JournalConfig};

/// One skip log line
#[derive(Debug, Serialize)]
pub struct SkipRecord<'a> {
    pub timestamp: String,
    pub sequence: u64,
    pub reason: &'a str,
    pub view: &'a str,
    pub date_from: String,
    pub date_to: String,
    pub row_count: u64,
    pub filters: Vec<FilterValue<'a>>,
}

/// One dimension's bound value within a skipped combination
#[derive(Debug, Serialize)]
pub struct FilterValue<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// JSON-line journal for skipped combinations
pub struct SkipJournal {
    journal: Arc<Journal>,
}

impl SkipJournal {
    /// Start the skip journal in the given directory
    pub fn start(mut config: JournalConfig) -> std::io::Result<Self> {
        config.prefix = format!("{}_skip", config.prefix);
        Ok(Self {
            journal: Journal::start(config)?,
        })
    }

    /// Record one skipped combination; never blocks, never fails
    pub fn record(
        &self,
        combination: &Combination,
        query: &QuerySpec,
        reason: &str,
        row_count: u64,
    ) {
        let record = SkipRecord {
            timestamp: Local::now()
                .format("%Y-%m-%d %H:%M:%S%.3f")
                .to_string(),
            sequence: combination.sequence,
            reason,
            view: &query.view,
            date_from: query.date_from.format("%Y-%m-%d").to_string(),
            date_to: query.date_to.format("%Y-%m-%d").to_string(),
            row_count,
            filters: combination
                .pairs()
                .map(|(name, value)| FilterValue { name, value })
                .collect(),
        };

        match serde_json::to_string(&record) {
            Ok(line) => self.journal.record_raw(line),
            Err(e) => {
                tracing::warn!(sequence = combination.sequence, error = %e, "Failed to serialize skip record");
            }
        }
    }

    /// Records lost to a full queue or failed writes
    pub fn dropped(&self) -> u64 {
        self.journal.dropped()
    }

    /// Drain and stop the underlying journal
    pub fn shutdown(&self) {
        self.journal.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::enumerate::CombinationIter;
    use crate::domain::FilterDimensionSet;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn fixture() -> (Combination, QuerySpec) {
        let set =
            FilterDimensionSet::from_raw_pairs([("port", "GB"), ("code", "")].iter().copied())
                .unwrap();
        let combination = CombinationIter::new(&set).next().unwrap();
        let query = QuerySpec::new(
            "trade_export_v",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        )
        .unwrap();
        (combination, query)
    }

    #[test]
    fn test_skip_record_is_json_with_full_context() {
        let dir = TempDir::new().unwrap();
        let skip = SkipJournal::start(JournalConfig::new(dir.path(), "sweep")).unwrap();
        let (combination, query) = fixture();

        skip.record(&combination, &query, "RowLimit", 1_048_576);
        skip.shutdown();

        let path = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("sweep_skip_"));

        let content = std::fs::read_to_string(path).unwrap();
        let line = content.lines().next().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["reason"], "RowLimit");
        assert_eq!(parsed["sequence"], 1);
        assert_eq!(parsed["row_count"], 1_048_576u64);
        assert_eq!(parsed["view"], "trade_export_v");
        assert_eq!(parsed["filters"][0]["name"], "port");
        assert_eq!(parsed["filters"][0]["value"], "GB");
        assert_eq!(parsed["filters"][1]["value"], "*");
    }

    #[test]
    fn test_no_data_reason() {
        let dir = TempDir::new().unwrap();
        let skip = SkipJournal::start(JournalConfig::new(dir.path(), "sweep")).unwrap();
        let (combination, query) = fixture();

        skip.record(&combination, &query, "NoData", 0);
        skip.shutdown();

        let path = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let content = std::fs::read_to_string(path).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(parsed["reason"], "NoData");
        assert_eq!(parsed["row_count"], 0);
    }
}
