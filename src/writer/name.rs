//! Deterministic artifact naming
//!
//! Artifact names are derived from the date range, the combination's
//! non-wildcard filter values, and a generation timestamp, so a batch's
//! output is self-describing on disk.

use crate::domain::{Combination, QuerySpec};
use chrono::NaiveDateTime;

// Keeps names inside conservative filesystem limits even with many
// dimensions.
const MAX_KEY_SECTION_LEN: usize = 80;

/// Build the artifact file name for one combination
///
/// Format: `{prefix}_{from}-{to}_{key-values}_{timestamp}.xlsx`. Wildcard
/// values are omitted; a fully wildcarded combination uses `all` as its key
/// section.
pub fn artifact_file_name(
    prefix: &str,
    query: &QuerySpec,
    combination: &Combination,
    generated_at: NaiveDateTime,
) -> String {
    let keys = combination.key_values();
    let mut key_section = if keys.is_empty() {
        "all".to_string()
    } else {
        keys.iter()
            .map(|v| sanitize_component(v))
            .collect::<Vec<_>>()
            .join("-")
    };
    key_section.truncate(MAX_KEY_SECTION_LEN);

    format!(
        "{}_{}_{}_{}.xlsx",
        sanitize_component(prefix),
        query.range_label(),
        key_section,
        generated_at.format("%Y%m%d%H%M%S")
    )
}

// Filter values can contain anything the user typed; only a safe subset is
// allowed through into a path component.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::enumerate::CombinationIter;
    use crate::domain::{FilterDimensionSet, QuerySpec};
    use chrono::{NaiveDate, NaiveDateTime};

    fn fixture(raw: &[(&str, &str)]) -> (QuerySpec, Combination) {
        let set = FilterDimensionSet::from_raw_pairs(raw.iter().copied()).unwrap();
        let combination = CombinationIter::new(&set).next().unwrap();
        let query = QuerySpec::new(
            "trade_export_v",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        )
        .unwrap();
        (query, combination)
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_name_is_deterministic() {
        let (query, combination) = fixture(&[("port", "GB"), ("code", "X1")]);
        let a = artifact_file_name("export", &query, &combination, ts());
        let b = artifact_file_name("export", &query, &combination, ts());
        assert_eq!(a, b);
        assert_eq!(a, "export_20250101-20250131_GB-X1_20250201093000.xlsx");
    }

    #[test]
    fn test_wildcards_are_omitted() {
        let (query, combination) = fixture(&[("port", "GB"), ("code", "")]);
        let name = artifact_file_name("export", &query, &combination, ts());
        assert_eq!(name, "export_20250101-20250131_GB_20250201093000.xlsx");
    }

    #[test]
    fn test_all_wildcards_use_all_marker() {
        let (query, combination) = fixture(&[("port", ""), ("code", "")]);
        let name = artifact_file_name("export", &query, &combination, ts());
        assert!(name.contains("_all_"));
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        let (query, combination) = fixture(&[("port", "G B/1")]);
        let name = artifact_file_name("export", &query, &combination, ts());
        assert!(name.contains("G_B_1"));
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));
    }
}
