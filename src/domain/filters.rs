//! Filter dimensions and combinations
//!
//! A sweep iterates the cartesian product of several independently
//! multi-valued filter dimensions (port, code, product, ...). This module
//! defines the immutable dimension set built once per batch and the
//! per-iteration combination value assignment.

use crate::domain::{Result, SweepError};
use std::fmt;
use std::sync::Arc;

/// Value a blank dimension defaults to; binds no predicate in the gateway.
pub const WILDCARD: &str = "*";

/// One named filter dimension with a non-empty ordered value list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDimension {
    /// Dimension name (e.g. "port")
    pub name: String,

    /// Ordered values; never empty
    pub values: Vec<String>,
}

impl FilterDimension {
    /// Create a dimension from raw delimited text
    ///
    /// Values are comma-separated; surrounding whitespace is trimmed and
    /// empty fragments are dropped. Blank input defaults to the single
    /// wildcard value.
    pub fn from_raw(name: impl Into<String>, raw: &str) -> Self {
        let values: Vec<String> = raw
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        let values = if values.is_empty() {
            vec![WILDCARD.to_string()]
        } else {
            values
        };

        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of values in this dimension
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Dimensions are never empty after construction
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered, immutable set of filter dimensions for one batch
#[derive(Debug, Clone, Default)]
pub struct FilterDimensionSet {
    dimensions: Vec<FilterDimension>,
}

impl FilterDimensionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from (name, raw delimited text) pairs in declared order
    ///
    /// # Errors
    ///
    /// Returns a validation error on a duplicate dimension name or a blank name.
    pub fn from_raw_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = Self::new();
        for (name, raw) in pairs {
            set.push(FilterDimension::from_raw(name, raw))?;
        }
        Ok(set)
    }

    /// Append a dimension, preserving declared order
    pub fn push(&mut self, dimension: FilterDimension) -> Result<()> {
        if dimension.name.trim().is_empty() {
            return Err(SweepError::Validation(
                "Filter dimension name must not be blank".to_string(),
            ));
        }
        if self.dimensions.iter().any(|d| d.name == dimension.name) {
            return Err(SweepError::Validation(format!(
                "Duplicate filter dimension: {}",
                dimension.name
            )));
        }
        self.dimensions.push(dimension);
        Ok(())
    }

    /// Dimensions in declared order
    pub fn dimensions(&self) -> &[FilterDimension] {
        &self.dimensions
    }

    /// Number of dimensions
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Whether the set has no dimensions
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Total number of combinations (`|dim1| x |dim2| x ... x |dimN|`)
    pub fn total_combinations(&self) -> u64 {
        if self.dimensions.is_empty() {
            return 0;
        }
        self.dimensions
            .iter()
            .map(|d| d.len() as u64)
            .product()
    }

    /// Dimension names in declared order, shared across all combinations
    pub fn shared_names(&self) -> Arc<Vec<String>> {
        Arc::new(self.dimensions.iter().map(|d| d.name.clone()).collect())
    }
}

/// One value assignment across all dimensions; one unit of work
///
/// Combinations are generated on demand by the enumerator and discarded per
/// iteration. The sequence number is monotonically increasing within a run
/// and serves as the per-combination correlation id.
#[derive(Debug, Clone)]
pub struct Combination {
    /// 1-based sequence number within the run
    pub sequence: u64,

    names: Arc<Vec<String>>,
    values: Vec<String>,
}

impl Combination {
    pub(crate) fn new(sequence: u64, names: Arc<Vec<String>>, values: Vec<String>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self {
            sequence,
            names,
            values,
        }
    }

    /// Values in dimension order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// (name, value) pairs in dimension order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.values.iter().map(|v| v.as_str()))
    }

    /// Whether the value at `index` is the wildcard
    pub fn is_wildcard(&self, index: usize) -> bool {
        self.values
            .get(index)
            .map(|v| v == WILDCARD)
            .unwrap_or(false)
    }

    /// Non-wildcard values for filename construction, in dimension order
    pub fn key_values(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|v| v.as_str() != WILDCARD)
            .map(|v| v.as_str())
            .collect()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.pairs() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}
