//! Generic configuration parsing utilities.
//!
//! The resolver reads two kinds of files: the TOML compiler configuration and
//! the JSON documents (dictionaries, annotations, compilation input) that
//! travel with an API description. Both parsers are generic over any
//! `DeserializeOwned` type and attach the offending file path to every error.
//!
//! # Usage Patterns
//!
//! ```rust,no_run
//! use apichain_cli::config::parse_config;
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Deserialize)]
//! struct MyConfig {
//!     allow_get_producers: bool,
//! }
//!
//! # fn example() -> anyhow::Result<()> {
//! let config: MyConfig = parse_config(Path::new("apichain.toml"))?;
//! println!("GET producers allowed: {}", config.allow_get_producers);
//! # Ok(())
//! # }
//! ```
//!
//! Example error output:
//! ```text
//! Failed to parse config file: /path/to/apichain.toml
//! Caused by:
//!     invalid TOML value, expected boolean
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML configuration file into the specified type.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content does not match `T`.
/// The error chain carries "Failed to read config file" or "Failed to parse
/// config file" followed by the path.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Parse a JSON document into the specified type.
///
/// Same contract as [`parse_config`], for the JSON side files.
pub fn parse_json_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let value: T = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))?;

    Ok(value)
}
