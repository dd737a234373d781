//! Export command implementation
//!
//! Wires configuration, journals, gateway, writer, and coordinator together
//! and runs one sweep to completion or cancellation.

use crate::adapters::gateway::PostgresGateway;
use crate::config::load_config;
use crate::core::export::{CancelToken, SweepCoordinator};
use crate::domain::{FilterDimension, FilterDimensionSet, QuerySpec};
use crate::journal::{Journal, JournalConfig, SkipJournal};
use crate::writer::{SheetWriter, WorkbookPool};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Inclusive start of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub from: String,

    /// Inclusive end of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub to: String,

    /// Filter dimension as name=comma,separated,values; repeatable, replaces
    /// configured dimensions. An empty value list means wildcard.
    #[arg(long)]
    pub filter: Vec<String>,

    /// Override the configured query view
    #[arg(long)]
    pub view: Option<String>,

    /// Override the configured output directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Dry run mode - query and classify without writing artifacts
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        // CLI overrides
        if let Some(view) = &self.view {
            tracing::info!(view = %view, "Overriding query view from CLI");
            config.query.view = view.clone();
        }
        if let Some(dir) = &self.output_dir {
            tracing::info!(directory = %dir, "Overriding output directory from CLI");
            config.output.directory = dir.clone();
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.export.dry_run = true;
        }

        // Batch input validation
        let (query, filters) = match self.build_batch_input(&config) {
            Ok(input) => input,
            Err(e) => {
                tracing::error!(error = %e, "Invalid batch input");
                eprintln!("Validation error: {e}");
                return Ok(3);
            }
        };

        let total = filters.total_combinations();

        if config.export.dry_run {
            println!("DRY RUN - no artifacts will be written");
            println!();
        }

        if !self.yes && !config.export.dry_run {
            println!("Sweep configuration:");
            println!("  view:         {}", query.view);
            println!("  date range:   {} to {}", query.date_from, query.date_to);
            for dim in filters.dimensions() {
                println!("  dimension:    {} = {}", dim.name, dim.values.join(","));
            }
            println!("  combinations: {total}");
            println!("  output:       {}", config.output.directory);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        // Fail fast on an unreachable database before touching the filesystem.
        let gateway = match PostgresGateway::new(&config.database) {
            Ok(g) => g,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create database gateway");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };
        if let Err(e) = gateway.test_connection().await {
            tracing::error!(error = %e, "Database connection test failed");
            eprintln!("Configuration error: database unreachable: {e}");
            return Ok(2);
        }

        let journal_config = JournalConfig {
            directory: PathBuf::from(&config.journal.directory),
            prefix: config.journal.file_prefix.clone(),
            queue_capacity: config.journal.queue_capacity,
            batch_size: config.journal.batch_size,
            flush_interval: Duration::from_millis(config.journal.flush_interval_ms),
        };
        let journal = match Journal::start(journal_config.clone()) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start journal");
                eprintln!("Fatal: cannot start journal: {e}");
                return Ok(5);
            }
        };
        let skips = match SkipJournal::start(journal_config) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start skip journal");
                eprintln!("Fatal: cannot start skip journal: {e}");
                journal.shutdown();
                return Ok(5);
            }
        };

        let pool = Arc::new(WorkbookPool::new(config.pool.capacity));
        let writer = Arc::new(SheetWriter::new(
            Arc::clone(&pool),
            config.output.clone(),
            config.format.clone(),
            config.export.cancel_check_rows,
        ));

        let coordinator = SweepCoordinator::new(
            Arc::new(gateway),
            writer,
            Arc::clone(&journal),
            skips,
            config.export.dry_run,
        );

        // Status printer, detached; stops when the coordinator is dropped.
        let mut status_rx = coordinator.status();
        let printer = tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let status = status_rx.borrow_and_update().clone();
                println!("  {status}");
            }
        });

        let cancel = CancelToken::from_watch(shutdown_signal);
        println!("Starting sweep of {total} combinations...");
        println!();

        let result = coordinator.run(&filters, &query, &cancel).await;
        printer.abort();
        journal.shutdown();

        let summary = match result {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Sweep failed");
                eprintln!("Sweep failed: {e}");
                return Ok(5);
            }
        };

        println!();
        print!("{}", summary.render_text());
        if journal.dropped() > 0 {
            println!("  log entries dropped:    {}", journal.dropped());
        }

        if summary.cancelled {
            println!();
            println!("Sweep interrupted; artifacts written before the signal are kept.");
            return Ok(4);
        }

        Ok(0)
    }

    /// Build the validated query spec and filter set from config plus CLI
    /// overrides
    fn build_batch_input(
        &self,
        config: &crate::config::SweepConfig,
    ) -> crate::domain::Result<(QuerySpec, FilterDimensionSet)> {
        let date_from = parse_date(&self.from)?;
        let date_to = parse_date(&self.to)?;
        let query = QuerySpec::new(config.query.view.clone(), date_from, date_to)?;

        let mut filters = FilterDimensionSet::new();
        if self.filter.is_empty() {
            for dim in &config.query.dimensions {
                filters.push(FilterDimension::from_raw(&dim.name, &dim.values))?;
            }
        } else {
            for raw in &self.filter {
                let (name, values) = parse_filter_arg(raw)?;
                filters.push(FilterDimension::from_raw(name, values))?;
            }
        }

        Ok((query, filters))
    }
}

fn parse_date(raw: &str) -> crate::domain::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        crate::domain::SweepError::Validation(format!("Invalid date '{raw}' (expected YYYY-MM-DD): {e}"))
    })
}

fn parse_filter_arg(raw: &str) -> crate::domain::Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(name, values)| (name.trim(), values))
        .ok_or_else(|| {
            crate::domain::SweepError::Validation(format!(
                "Invalid filter '{raw}' (expected name=value1,value2)"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert!(parse_date("31/01/2025").is_err());
    }

    #[test]
    fn test_parse_filter_arg() {
        assert_eq!(parse_filter_arg("port=GB,NL").unwrap(), ("port", "GB,NL"));
        assert_eq!(parse_filter_arg("code=").unwrap(), ("code", ""));
        assert!(parse_filter_arg("port").is_err());
    }

    #[test]
    fn test_build_batch_input_uses_cli_filters() {
        let args = ExportArgs {
            from: "2025-01-01".to_string(),
            to: "2025-01-31".to_string(),
            filter: vec!["port=GB,NL".to_string(), "code=".to_string()],
            view: None,
            output_dir: None,
            dry_run: false,
            yes: true,
        };
        let config = test_config();

        let (query, filters) = args.build_batch_input(&config).unwrap();
        assert_eq!(query.view, "trade_export_v");
        assert_eq!(filters.len(), 2);
        assert_eq!(filters.total_combinations(), 2);
    }

    #[test]
    fn test_build_batch_input_rejects_inverted_range() {
        let args = ExportArgs {
            from: "2025-02-01".to_string(),
            to: "2025-01-01".to_string(),
            filter: vec![],
            view: None,
            output_dir: None,
            dry_run: false,
            yes: true,
        };
        assert!(args.build_batch_input(&test_config()).is_err());
    }

    fn test_config() -> crate::config::SweepConfig {
        use crate::config::{
            ApplicationConfig, DatabaseConfig, ExportConfig, FormatConfig,
            JournalConfig as JournalSection, LoggingConfig, OutputConfig, PoolConfig, QueryConfig,
            SweepConfig,
        };

        SweepConfig {
            application: ApplicationConfig::default(),
            database: DatabaseConfig {
                connection_string: crate::config::secret_string(
                    "postgresql://u:p@localhost/trades".to_string(),
                ),
                max_connections: 5,
                connection_timeout_seconds: 30,
                command_timeout_seconds: 300,
                date_column: "trade_date".to_string(),
            },
            query: QueryConfig {
                view: "trade_export_v".to_string(),
                dimensions: vec![],
            },
            export: ExportConfig::default(),
            output: OutputConfig {
                directory: "out".to_string(),
                file_prefix: "export".to_string(),
                sheet_name: "Data".to_string(),
            },
            format: FormatConfig::default(),
            pool: PoolConfig::default(),
            journal: JournalSection::default(),
            logging: LoggingConfig::default(),
        }
    }
}
