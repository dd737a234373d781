//! Logging and observability
//!
//! Structured tracing for the tool's own diagnostics: console output plus
//! optional JSON file logging with rotation. Per-combination processing
//! events go through the journal subsystem instead.
//!
//! # Example
//!
//! ```no_run
//! use gridsweep::logging::init_logging;
//! use gridsweep::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};
