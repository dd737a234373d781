//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// GridSweep - combinatorial filter-sweep exporter
#[derive(Parser, Debug)]
#[command(name = "gridsweep")]
#[command(version, about, long_about = None)]
#[command(author = "GridSweep Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "gridsweep.toml", env = "GRIDSWEEP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "GRIDSWEEP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a filter sweep and export one workbook per combination
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from([
            "gridsweep", "export", "--from", "2025-01-01", "--to", "2025-01-31",
        ]);
        assert_eq!(cli.config, "gridsweep.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from([
            "gridsweep",
            "--config",
            "custom.toml",
            "export",
            "--from",
            "2025-01-01",
            "--to",
            "2025-01-31",
        ]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["gridsweep", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["gridsweep", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["gridsweep", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_parse_export_filters() {
        let cli = Cli::parse_from([
            "gridsweep",
            "export",
            "--from",
            "2025-01-01",
            "--to",
            "2025-01-31",
            "--filter",
            "port=GB,NL",
            "--filter",
            "code=",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.filter.len(), 2);
        assert_eq!(args.filter[0], "port=GB,NL");
    }
}
