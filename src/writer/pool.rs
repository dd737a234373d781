//! Workbook resource pool
//!
//! Workbook objects are heavyweight to allocate and are reused across many
//! combinations. The pool is bounded: acquire pops an idle workbook and
//! resets it to a zero-worksheet state, release returns it only while the
//! pool is below capacity. The pool also owns two small lookup caches used
//! by the formatting pass: hex color interpretation and border style names.
//! One lock guards pool and cache bookkeeping only; a checked-out workbook
//! is exclusively owned by its holder.

use crate::domain::WriteError;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use umya_spreadsheet::{Border, Spreadsheet};

/// Hex colors pre-seeded into the cache at construction
const COMMON_COLORS: &[&str] = &["D9D9D9", "FFFFFF", "000000", "4472C4", "E7E6E6"];

/// Bounded pool of reusable workbooks plus format lookup caches
pub struct WorkbookPool {
    capacity: usize,
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    idle: VecDeque<Spreadsheet>,
    colors: HashMap<String, String>,
}

impl WorkbookPool {
    /// Create a pool with the given capacity
    pub fn new(capacity: usize) -> Self {
        let mut colors = HashMap::new();
        for hex in COMMON_COLORS {
            if let Ok(argb) = normalize_hex(hex) {
                colors.insert((*hex).to_string(), argb);
            }
        }

        Self {
            capacity,
            inner: Mutex::new(PoolInner {
                idle: VecDeque::with_capacity(capacity),
                colors,
            }),
        }
    }

    /// Take a workbook, reset to zero worksheets
    pub fn acquire(&self) -> Spreadsheet {
        let reused = {
            let mut inner = self.lock();
            inner.idle.pop_front()
        };

        match reused {
            Some(mut book) => {
                reset(&mut book);
                book
            }
            None => umya_spreadsheet::new_file_empty_worksheet(),
        }
    }

    /// Return a workbook; dropped immediately when the pool is full
    pub fn release(&self, book: Spreadsheet) {
        let mut inner = self.lock();
        if inner.idle.len() < self.capacity {
            inner.idle.push_back(book);
        }
        // Otherwise the workbook is dropped here; the pool never grows
        // beyond its capacity.
    }

    /// Number of idle workbooks currently held
    pub fn idle_count(&self) -> usize {
        self.lock().idle.len()
    }

    /// Resolve a configured hex color to the engine's ARGB form, cached
    pub fn argb(&self, hex: &str) -> Result<String, WriteError> {
        {
            let inner = self.lock();
            if let Some(argb) = inner.colors.get(hex) {
                return Ok(argb.clone());
            }
        }

        let argb = normalize_hex(hex)?;
        let mut inner = self.lock();
        inner
            .colors
            .insert(hex.to_string(), argb.clone());
        Ok(argb)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Resolve a configured border style name to the engine's enumeration value
///
/// The full enumeration is small and fixed, so it lives in a static table
/// rather than the lazy cache. Unknown names fall back to a thin border.
pub fn border_style(name: &str) -> &'static str {
    match name.to_ascii_lowercase().as_str() {
        "none" => Border::BORDER_NONE,
        "thin" => Border::BORDER_THIN,
        "medium" => Border::BORDER_MEDIUM,
        "thick" => Border::BORDER_THICK,
        "dashed" => Border::BORDER_DASHED,
        "dotted" => Border::BORDER_DOTTED,
        "double" => Border::BORDER_DOUBLE,
        other => {
            tracing::warn!(style = other, "Unknown border style, using thin");
            Border::BORDER_THIN
        }
    }
}

// A reused workbook must carry no residual worksheets or formatting state.
fn reset(book: &mut Spreadsheet) {
    let names: Vec<String> = book
        .get_sheet_collection()
        .iter()
        .map(|s| s.get_name().to_string())
        .collect();
    for name in names {
        let _ = book.remove_sheet_by_name(&name);
    }
}

/// Interpret a configured hex color ("D9D9D9", "#D9D9D9" or 8-digit ARGB)
fn normalize_hex(hex: &str) -> Result<String, WriteError> {
    let trimmed = hex.trim_start_matches('#');
    let valid = trimmed.chars().all(|c| c.is_ascii_hexdigit());

    match (trimmed.len(), valid) {
        (6, true) => Ok(format!("FF{}", trimmed.to_ascii_uppercase())),
        (8, true) => Ok(trimmed.to_ascii_uppercase()),
        _ => Err(WriteError::Formatting(format!("Invalid hex color: {hex}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_returns_zero_worksheet_book() {
        let pool = WorkbookPool::new(2);
        let book = pool.acquire();
        assert_eq!(book.get_sheet_count(), 0);
    }

    #[test]
    fn test_released_book_is_reset_on_reuse() {
        let pool = WorkbookPool::new(2);
        let mut book = pool.acquire();
        book.new_sheet("Data").unwrap();
        assert_eq!(book.get_sheet_count(), 1);

        pool.release(book);
        let reused = pool.acquire();
        assert_eq!(reused.get_sheet_count(), 0);
    }

    #[test]
    fn test_pool_never_exceeds_capacity() {
        let pool = WorkbookPool::new(2);
        for _ in 0..5 {
            pool.release(umya_spreadsheet::new_file_empty_worksheet());
        }
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_acquire_beyond_pool_allocates_fresh() {
        let pool = WorkbookPool::new(1);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.idle_count(), 0);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_color_cache_preseeded_and_lazy() {
        let pool = WorkbookPool::new(1);
        assert_eq!(pool.argb("D9D9D9").unwrap(), "FFD9D9D9");
        assert_eq!(pool.argb("#abcdef").unwrap(), "FFABCDEF");
        assert_eq!(pool.argb("11223344").unwrap(), "11223344");
    }

    #[test]
    fn test_invalid_color_rejected() {
        let pool = WorkbookPool::new(1);
        assert!(pool.argb("not-a-color").is_err());
        assert!(pool.argb("FFF").is_err());
    }

    #[test]
    fn test_border_style_lookup() {
        assert_eq!(border_style("thin"), Border::BORDER_THIN);
        assert_eq!(border_style("Medium"), Border::BORDER_MEDIUM);
        assert_eq!(border_style("unknown"), Border::BORDER_THIN);
    }
}
