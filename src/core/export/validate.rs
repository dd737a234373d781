//! Row-count / limit validation
//!
//! Pure decision function applied to the gateway's row count before any row
//! is read: zero rows and over-ceiling results are skipped without invoking
//! the writer.

/// Maximum rows a single artifact may contain; one below the xlsx hard
/// maximum so the header row always fits.
pub const ROW_LIMIT: u64 = 1_048_575;

/// Verdict for one combination's row count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Write the artifact
    Proceed,
    /// Zero rows; skip
    NoData,
    /// Over the row ceiling; skip
    RowLimitExceeded,
}

impl Verdict {
    /// Skip-log reason tag; `None` for [`Verdict::Proceed`]
    pub fn skip_reason(&self) -> Option<&'static str> {
        match self {
            Verdict::Proceed => None,
            Verdict::NoData => Some("NoData"),
            Verdict::RowLimitExceeded => Some("RowLimit"),
        }
    }
}

/// Classify a row count against the fixed thresholds
pub fn classify_row_count(row_count: u64) -> Verdict {
    if row_count == 0 {
        Verdict::NoData
    } else if row_count > ROW_LIMIT {
        Verdict::RowLimitExceeded
    } else {
        Verdict::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 => Verdict::NoData ; "zero rows")]
    #[test_case(1 => Verdict::Proceed ; "one row")]
    #[test_case(500 => Verdict::Proceed ; "typical result")]
    #[test_case(ROW_LIMIT => Verdict::Proceed ; "exactly at the ceiling")]
    #[test_case(ROW_LIMIT + 1 => Verdict::RowLimitExceeded ; "one over the ceiling")]
    #[test_case(u64::MAX => Verdict::RowLimitExceeded ; "absurdly large")]
    fn test_classify(row_count: u64) -> Verdict {
        classify_row_count(row_count)
    }

    #[test]
    fn test_ceiling_is_one_below_xlsx_maximum() {
        assert_eq!(ROW_LIMIT, 1_048_575);
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(Verdict::Proceed.skip_reason(), None);
        assert_eq!(Verdict::NoData.skip_reason(), Some("NoData"));
        assert_eq!(Verdict::RowLimitExceeded.skip_reason(), Some("RowLimit"));
    }
}
