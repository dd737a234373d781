//! Configuration management
//!
//! TOML-based configuration with environment variable substitution
//! (`${VAR_NAME}`), `GRIDSWEEP_*` prefix overrides, defaults for optional
//! settings, and validation on load. Each section maps to one typed struct
//! that is passed into the owning component's constructor at startup.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gridsweep::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("gridsweep.toml")?;
//!
//! println!("View: {}", config.query.view);
//! println!("Output: {}", config.output.directory);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [database]
//! connection_string = "${GRIDSWEEP_DB_DSN}"
//! max_connections = 5
//!
//! [query]
//! view = "trade_export_v"
//!
//! [[query.dimensions]]
//! name = "port"
//! values = "GB,NL,US"
//!
//! [output]
//! directory = "out"
//! file_prefix = "export"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DatabaseConfig, DimensionConfig, ExportConfig, FormatConfig, JournalConfig,
    LoggingConfig, OutputConfig, PoolConfig, QueryConfig, SweepConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
