//! Command-line interface for apichain.
//!
//! # Commands
//!
//! - `resolve` - Extract producer/consumer dependencies and write diagnostics
//! - `validate` - Check inputs, dictionaries and annotations without resolving
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - No logging
//! - `--config` / `-c` - Compiler configuration file (defaults to `./apichain.toml`)
//!
//! `RUST_LOG` overrides the level chosen by `--verbose` and `--quiet`.
//!
//! # Example
//!
//! ```bash
//! apichain resolve --input requests.json --output-dir out/
//! apichain -c apichain.toml validate --input requests.json --format json
//! ```

pub mod common;
mod resolve;
pub mod validate;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use resolve::ResolveCommand;
pub use validate::{OutputFormat, ValidateCommand};

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level filter; `None` disables logging.
    pub log_level: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` wins over `log_level`. Calling this twice is harmless.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(format!("apichain_cli={level}"))
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Producer/consumer dependency resolver for REST API fuzzing grammars
#[derive(Parser)]
#[command(
    name = "apichain",
    about = "Infer producer/consumer dependencies between REST API requests",
    version,
    author,
    long_about = "apichain finds, for every request input, the response value, dictionary entry or \
                  sibling property that should feed it, and writes the dependency graph as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the compiler configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve dependencies and write diagnostics
    Resolve(ResolveCommand),

    /// Validate inputs without resolving
    Validate(ValidateCommand),
}

impl Cli {
    /// Execute the selected command.
    ///
    /// # Errors
    ///
    /// Propagates any loading, validation or resolution failure.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Global flags as a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Propagates any loading, validation or resolution failure.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(config.config_path.as_deref(), self.quiet),
            Commands::Validate(cmd) => cmd.execute(config.config_path.as_deref(), self.quiet),
        }
    }
}
