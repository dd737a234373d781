//! Asynchronous journal
//!
//! Best-effort, non-blocking logging for the sweep hot path, independent of
//! the tracing pipeline. Producers push entries into a bounded lock-free
//! queue and never block or observe an error; a full queue increments a
//! dropped-entry counter instead. A dedicated consumer thread drains the
//! queue in batches, formats each batch into one buffer, and appends it to
//! the current day's file in one write, rolling the file over when the
//! entry date changes. On shutdown the consumer drains and flushes
//! everything that was accepted before exiting.

pub mod intern;
pub mod skip;

use chrono::NaiveDate;
use crossbeam_queue::ArrayQueue;
use intern::{Interner, TimestampCache};
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

pub use skip::SkipJournal;

/// Journal severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Fixed-width tag written to the file
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO ",
            Level::Warn => "WARN ",
            Level::Error => "ERROR",
        }
    }
}

/// One journal record; immutable once enqueued
pub struct JournalEntry {
    date: NaiveDate,
    body: EntryBody,
}

enum EntryBody {
    /// Pipe-delimited process entry
    Line {
        stamp: Arc<str>,
        level: Level,
        module: Arc<str>,
        correlation: String,
        message: String,
    },
    /// Preformatted payload written verbatim (JSON lines for the skip log)
    Raw(String),
}

/// Journal configuration
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Directory the daily files live in
    pub directory: PathBuf,

    /// File name prefix (`{prefix}_{yyyymmdd}.log`)
    pub prefix: String,

    /// Bounded queue capacity; pushes beyond it are counted as dropped
    pub queue_capacity: usize,

    /// Maximum entries drained and written per consumer cycle
    pub batch_size: usize,

    /// How long the consumer waits when the queue is empty
    pub flush_interval: Duration,
}

impl JournalConfig {
    /// Default settings for the given directory and prefix
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            queue_capacity: 16_384,
            batch_size: 512,
            flush_interval: Duration::from_millis(250),
        }
    }
}

/// Multi-producer, single-consumer journal
pub struct Journal {
    queue: Arc<ArrayQueue<JournalEntry>>,
    dropped: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    interner: Interner,
    clock: TimestampCache,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Journal {
    /// Start a journal and its consumer thread
    ///
    /// # Errors
    ///
    /// Returns an error if the journal directory cannot be created or the
    /// consumer thread cannot be spawned. After startup the journal never
    /// surfaces an error to producers.
    pub fn start(config: JournalConfig) -> std::io::Result<Arc<Self>> {
        std::fs::create_dir_all(&config.directory)?;

        let queue = Arc::new(ArrayQueue::new(config.queue_capacity.max(1)));
        let dropped = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));

        let consumer = Consumer {
            queue: Arc::clone(&queue),
            dropped: Arc::clone(&dropped),
            shutdown: Arc::clone(&shutdown),
            batch_size: config.batch_size.max(1),
            flush_interval: config.flush_interval,
            file: DailyFile::new(&config.directory, &config.prefix),
            buffer: String::with_capacity(8 * 1024),
        };

        let worker = std::thread::Builder::new()
            .name(format!("journal-{}", config.prefix))
            .spawn(move || consumer.run())?;

        Ok(Arc::new(Self {
            queue,
            dropped,
            shutdown,
            interner: Interner::with_seed(&["sweep", "gateway", "writer", "skip", "batch"]),
            clock: TimestampCache::new(),
            worker: Mutex::new(Some(worker)),
        }))
    }

    /// Enqueue one entry; never blocks, never fails
    pub fn record(
        &self,
        level: Level,
        module: &str,
        correlation: impl std::fmt::Display,
        message: impl Into<String>,
    ) {
        let (date, stamp) = self.clock.now();
        self.enqueue(JournalEntry {
            date,
            body: EntryBody::Line {
                stamp,
                level,
                module: self.interner.intern(module),
                correlation: correlation.to_string(),
                message: message.into(),
            },
        });
    }

    /// Enqueue one preformatted line, written verbatim; never blocks
    pub fn record_raw(&self, line: String) {
        let (date, _) = self.clock.now();
        self.enqueue(JournalEntry {
            date,
            body: EntryBody::Raw(line),
        });
    }

    fn enqueue(&self, entry: JournalEntry) {
        // Entries arriving after shutdown have no consumer left; they are
        // counted like a full-queue rejection.
        if self.shutdown.load(Ordering::SeqCst) || self.queue.push(entry).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Entries rejected because the queue was full or a write failed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drain remaining entries, flush, and stop the consumer
    ///
    /// Idempotent; later calls are no-ops.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let handle = { self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() };
        if let Some(handle) = handle {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Consumer {
    queue: Arc<ArrayQueue<JournalEntry>>,
    dropped: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    batch_size: usize,
    flush_interval: Duration,
    file: DailyFile,
    buffer: String,
}

impl Consumer {
    fn run(mut self) {
        loop {
            let drained = self.drain_batch();
            if drained == 0 {
                if self.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                std::thread::park_timeout(self.flush_interval);
            }
        }
        self.file.close();
    }

    // Drain up to batch_size entries, format them into one buffer, append
    // in one write. A date change inside the batch flushes the buffer so
    // entries land in their own day's file.
    fn drain_batch(&mut self) -> usize {
        self.buffer.clear();
        let mut count = 0;
        let mut batch_date: Option<NaiveDate> = None;
        let mut batched = 0usize;

        while count < self.batch_size {
            let Some(entry) = self.queue.pop() else {
                break;
            };

            if let Some(open_date) = batch_date {
                if entry.date != open_date {
                    self.write_buffer(open_date, batched);
                    self.buffer.clear();
                    batched = 0;
                }
            }
            batch_date = Some(entry.date);

            match &entry.body {
                EntryBody::Line {
                    stamp,
                    level,
                    module,
                    correlation,
                    message,
                } => {
                    let _ = writeln!(
                        self.buffer,
                        "{}|{}|{}|{}|{}",
                        stamp,
                        level.as_str(),
                        module,
                        correlation,
                        message
                    );
                }
                EntryBody::Raw(line) => {
                    let _ = writeln!(self.buffer, "{line}");
                }
            }
            batched += 1;
            count += 1;
        }

        if let Some(date) = batch_date {
            if batched > 0 {
                self.write_buffer(date, batched);
            }
        }

        count
    }

    fn write_buffer(&mut self, date: NaiveDate, entries: usize) {
        if self.file.append(date, &self.buffer).is_err() {
            // The journal must never stall the batch; a failed write is
            // recorded as dropped entries and the consumer moves on.
            self.dropped.fetch_add(entries as u64, Ordering::Relaxed);
        }
    }
}

/// Append-only daily file with date-based rollover
pub(crate) struct DailyFile {
    directory: PathBuf,
    prefix: String,
    open: Option<(NaiveDate, BufWriter<File>)>,
}

impl DailyFile {
    pub(crate) fn new(directory: &Path, prefix: &str) -> Self {
        Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            open: None,
        }
    }

    pub(crate) fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory
            .join(format!("{}_{}.log", self.prefix, date.format("%Y%m%d")))
    }

    pub(crate) fn append(&mut self, date: NaiveDate, buf: &str) -> std::io::Result<()> {
        let needs_open = match &self.open {
            Some((open_date, _)) => *open_date != date,
            None => true,
        };

        if needs_open {
            self.close();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(date))?;
            self.open = Some((date, BufWriter::new(file)));
        }

        let (_, writer) = self.open.as_mut().expect("file opened above");
        writer.write_all(buf.as_bytes())?;
        // Flush per batch keeps the file crash-safe without per-entry
        // syscalls.
        writer.flush()
    }

    pub(crate) fn close(&mut self) {
        if let Some((_, mut writer)) = self.open.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> JournalConfig {
        JournalConfig::new(dir.path(), "test")
    }

    #[test]
    fn test_entries_are_written_in_fifo_order() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::start(test_config(&dir)).unwrap();

        for i in 0..20 {
            journal.record(Level::Info, "sweep", i, format!("message {i}"));
        }
        journal.shutdown();

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        let content = std::fs::read_to_string(entries.pop().unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 20);
        assert!(lines[0].ends_with("message 0"));
        assert!(lines[19].ends_with("message 19"));
        assert!(lines[0].contains("|INFO |sweep|0|"));
    }

    #[test]
    fn test_dropped_counter_instead_of_blocking() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.queue_capacity = 4;
        // Long interval so the consumer stays parked while we overflow.
        config.flush_interval = Duration::from_secs(30);
        let journal = Journal::start(config).unwrap();

        // Give the consumer time to finish its first empty drain and park.
        std::thread::sleep(Duration::from_millis(100));
        for i in 0..50 {
            journal.record(Level::Info, "sweep", i, "overflow");
        }
        let dropped = journal.dropped();
        journal.shutdown();

        assert!(dropped > 0, "expected drops with a capacity-4 queue");

        let path = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let written = std::fs::read_to_string(path).unwrap().lines().count() as u64;
        // Everything accepted was written; everything else was counted.
        assert_eq!(written + dropped, 50);
    }

    #[test]
    fn test_shutdown_drains_pending_entries() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.flush_interval = Duration::from_secs(30);
        let journal = Journal::start(config).unwrap();

        for i in 0..100 {
            journal.record(Level::Warn, "writer", i, "pending");
        }
        journal.shutdown();

        let path = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let written = std::fs::read_to_string(path).unwrap().lines().count() as u64;
        assert_eq!(written + journal.dropped(), 100);
    }

    #[test]
    fn test_daily_file_rollover() {
        let dir = TempDir::new().unwrap();
        let mut file = DailyFile::new(dir.path(), "roll");
        let day1 = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();

        file.append(day1, "a\n").unwrap();
        file.append(day1, "b\n").unwrap();
        file.append(day2, "c\n").unwrap();
        file.close();

        let first = std::fs::read_to_string(file.path_for(day1)).unwrap();
        let second = std::fs::read_to_string(file.path_for(day2)).unwrap();
        assert_eq!(first, "a\nb\n");
        assert_eq!(second, "c\n");
    }

    #[test]
    fn test_file_name_shape() {
        let file = DailyFile::new(Path::new("/var/log/sweep"), "skip");
        let date = NaiveDate::from_ymd_opt(2025, 8, 23).unwrap();
        assert_eq!(
            file.path_for(date),
            PathBuf::from("/var/log/sweep/skip_20250823.log")
        );
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::start(test_config(&dir)).unwrap();
        journal.record(Level::Error, "sweep", 1, "once");
        journal.shutdown();
        journal.shutdown();
        assert_eq!(journal.dropped(), 0);
    }
}
