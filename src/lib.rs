// GridSweep - combinatorial filter-sweep exporter
// Copyright (c) 2025 GridSweep Contributors
// Licensed under the MIT License

//! # GridSweep - combinatorial filter-sweep exporter
//!
//! GridSweep enumerates the cartesian product of configured filter
//! dimensions, runs one query per combination against a PostgreSQL view,
//! and writes one formatted xlsx workbook per combination that returns a
//! usable row count. Oversized and empty results are skipped and recorded;
//! a batch survives individual combination failures and can be cancelled
//! cooperatively at any time.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Batch engine (enumeration, orchestration, classification)
//! - [`adapters`] - Data access gateway (PostgreSQL)
//! - [`writer`] - Streaming xlsx writer and workbook pool
//! - [`journal`] - Asynchronous process and skip journals
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridsweep::adapters::gateway::PostgresGateway;
//! use gridsweep::config::load_config;
//! use gridsweep::core::export::{cancel_pair, SweepCoordinator};
//! use gridsweep::domain::{FilterDimensionSet, QuerySpec};
//! use gridsweep::journal::{Journal, JournalConfig, SkipJournal};
//! use gridsweep::writer::{SheetWriter, WorkbookPool};
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("gridsweep.toml")?;
//!
//!     let filters = FilterDimensionSet::from_raw_pairs([
//!         ("port", "GB,NL"),
//!         ("code", ""),
//!     ])?;
//!     let query = QuerySpec::new(
//!         config.query.view.clone(),
//!         NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
//!     )?;
//!
//!     let journal_config = JournalConfig::new(&config.journal.directory, "sweep");
//!     let journal = Journal::start(journal_config.clone())?;
//!     let skips = SkipJournal::start(journal_config)?;
//!
//!     let pool = Arc::new(WorkbookPool::new(config.pool.capacity));
//!     let writer = Arc::new(SheetWriter::new(
//!         pool,
//!         config.output.clone(),
//!         config.format.clone(),
//!         config.export.cancel_check_rows,
//!     ));
//!     let gateway = Arc::new(PostgresGateway::new(&config.database)?);
//!
//!     let coordinator = SweepCoordinator::new(gateway, writer, journal, skips, false);
//!     let (_trigger, cancel) = cancel_pair();
//!     let summary = coordinator.run(&filters, &query, &cancel).await?;
//!
//!     println!("{}", summary.render_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::SweepError`]; per-combination
//! failures are isolated inside the coordinator and surface only through the
//! summary counters and the journals.
//!
//! ## Logging
//!
//! Tool diagnostics go through `tracing` ([`logging`]); the high-volume
//! per-combination event stream goes through the non-blocking [`journal`]
//! subsystem with its own daily files.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod journal;
pub mod logging;
pub mod writer;
