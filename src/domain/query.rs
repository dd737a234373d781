//! Query specification for one batch
//!
//! The caller selects the query object (a view or table name) and a date
//! range; both are fixed for the duration of the batch. Malformed input is
//! rejected here, before any combination starts.

use crate::domain::{Result, SweepError};
use chrono::NaiveDate;

/// Batch-level query parameters, validated at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Query object name (view or table) the gateway executes against
    pub view: String,

    /// Inclusive lower bound of the date range
    pub date_from: NaiveDate,

    /// Inclusive upper bound of the date range
    pub date_to: NaiveDate,
}

impl QuerySpec {
    /// Create a validated query specification
    ///
    /// # Errors
    ///
    /// Returns a validation error when the view name is blank or the date
    /// range is inverted.
    pub fn new(view: impl Into<String>, date_from: NaiveDate, date_to: NaiveDate) -> Result<Self> {
        let view = view.into();
        if view.trim().is_empty() {
            return Err(SweepError::Validation(
                "Query object name must not be blank".to_string(),
            ));
        }
        if date_from > date_to {
            return Err(SweepError::Validation(format!(
                "Invalid date range: {date_from} is after {date_to}"
            )));
        }
        Ok(Self {
            view,
            date_from,
            date_to,
        })
    }

    /// Compact range label used in artifact names, e.g. `20250101-20250131`
    pub fn range_label(&self) -> String {
        format!(
            "{}-{}",
            self.date_from.format("%Y%m%d"),
            self.date_to.format("%Y%m%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_spec() {
        let spec = QuerySpec::new("trade_export_v", date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        assert_eq!(spec.view, "trade_export_v");
        assert_eq!(spec.range_label(), "20250101-20250131");
    }

    #[test]
    fn test_single_day_range_is_valid() {
        assert!(QuerySpec::new("v", date(2025, 6, 1), date(2025, 6, 1)).is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = QuerySpec::new("v", date(2025, 2, 1), date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, SweepError::Validation(_)));
    }

    #[test]
    fn test_blank_view_rejected() {
        let err = QuerySpec::new("  ", date(2025, 1, 1), date(2025, 1, 2)).unwrap_err();
        assert!(matches!(err, SweepError::Validation(_)));
    }
}
