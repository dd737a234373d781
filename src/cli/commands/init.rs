//! Init command implementation
//!
//! Generates a commented sample configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "gridsweep.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set GRIDSWEEP_DB_DSN in the environment or a .env file");
                println!("  3. Validate: gridsweep validate-config");
                println!("  4. Run: gridsweep export --from 2025-01-01 --to 2025-01-31");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("  {e}");
                Ok(5)
            }
        }
    }
}

fn sample_config() -> &'static str {
    r#"# GridSweep configuration file
# Combinatorial filter-sweep exporter

[application]
log_level = "info"

[database]
# Credentials stay out of the file; set GRIDSWEEP_DB_DSN in the environment.
connection_string = "${GRIDSWEEP_DB_DSN}"
max_connections = 5
connection_timeout_seconds = 30
command_timeout_seconds = 300
# Column the --from/--to date range binds against
date_column = "trade_date"

[query]
# View or table the sweep queries; one column per dimension name below
view = "trade_export_v"

# Default filter dimensions, swept in declared order (last varies fastest).
# An empty values string means a single wildcard (no predicate).
[[query.dimensions]]
name = "port"
values = "GB,NL,US"

[[query.dimensions]]
name = "code"
values = ""

[export]
dry_run = false
# Rows streamed between cancellation checks inside one artifact
cancel_check_rows = 10000

[output]
directory = "out"
file_prefix = "export"
sheet_name = "Data"

[format]
font_name = "Calibri"
font_size = 11.0
header_fill = "D9D9D9"
header_border = "thin"
date_format = "yyyy-mm-dd"
date_columns = ["trade_date"]
# Columns kept as text to preserve leading zeros
text_columns = []
wrap_text = false
autosize = true
autosize_sample_rows = 200

[pool]
# Idle workbooks retained for reuse across combinations
capacity = 5

[journal]
directory = "logs"
file_prefix = "sweep"
queue_capacity = 16384
batch_size = 512
flush_interval_ms = 250

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_is_loadable() {
        std::env::set_var("GRIDSWEEP_DB_DSN", "postgresql://u:p@localhost/trades");
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gridsweep.toml");
        fs::write(&path, sample_config()).unwrap();

        let config = crate::config::load_config(&path).unwrap();
        assert_eq!(config.query.view, "trade_export_v");
        assert_eq!(config.query.dimensions.len(), 2);
        std::env::remove_var("GRIDSWEEP_DB_DSN");
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gridsweep.toml");
        fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_force_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gridsweep.toml");
        fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: true,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&path)
            .unwrap()
            .contains("[query]"));
    }
}
