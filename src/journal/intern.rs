//! String interning and timestamp caching for the journal hot path
//!
//! Producers enqueue entries from the sweep worker at high volume; both
//! caches here exist to keep that path allocation- and syscall-light. The
//! interner deduplicates frequently repeated fragments (module tags, message
//! templates) into shared `Arc<str>`s; the timestamp cache avoids a full
//! clock read and reformat on every entry.

use chrono::{DateTime, Local, NaiveDate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Pool of interned string fragments
pub struct Interner {
    map: Mutex<HashMap<String, Arc<str>>>,
}

impl Interner {
    /// Create an interner pre-seeded with the given common fragments
    pub fn with_seed(seed: &[&str]) -> Self {
        let mut map = HashMap::with_capacity(seed.len() * 2);
        for s in seed {
            map.insert((*s).to_string(), Arc::from(*s));
        }
        Self {
            map: Mutex::new(map),
        }
    }

    /// Return the shared copy of `value`, inserting it on first sight
    pub fn intern(&self, value: &str) -> Arc<str> {
        let mut map = lock(&self.map);
        if let Some(existing) = map.get(value) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(value);
        map.insert(value.to_string(), Arc::clone(&shared));
        shared
    }

    /// Number of distinct interned fragments
    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    /// Whether nothing has been interned
    pub fn is_empty(&self) -> bool {
        lock(&self.map).is_empty()
    }
}

/// How stale a cached timestamp may get before it is refreshed
const REFRESH_AFTER: Duration = Duration::from_millis(40);

/// Coarse cached wall-clock timestamp
///
/// Entries only need tens-of-milliseconds granularity; refreshing on that
/// schedule instead of per entry keeps clock reads off the hot path.
pub struct TimestampCache {
    inner: Mutex<CachedStamp>,
}

struct CachedStamp {
    read_at: Instant,
    date: NaiveDate,
    formatted: Arc<str>,
}

impl TimestampCache {
    /// Create a cache primed with the current time
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Self::read_clock()),
        }
    }

    /// Current (date, formatted timestamp), at cache granularity
    pub fn now(&self) -> (NaiveDate, Arc<str>) {
        let mut inner = lock(&self.inner);
        if inner.read_at.elapsed() > REFRESH_AFTER {
            *inner = Self::read_clock();
        }
        (inner.date, Arc::clone(&inner.formatted))
    }

    fn read_clock() -> CachedStamp {
        let now: DateTime<Local> = Local::now();
        CachedStamp {
            read_at: Instant::now(),
            date: now.date_naive(),
            formatted: Arc::from(now.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        }
    }
}

impl Default for TimestampCache {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
