//! Configuration management for apichain
//!
//! The resolver is driven by one TOML file, `apichain.toml`, plus the JSON
//! side files it points at (mutations dictionaries and annotations).
//!
//! # Modules
//!
//! - `compiler` - [`CompilerConfig`], the settings of the extraction pass
//! - `parser` - Generic TOML and JSON parsing utilities with error context
//!
//! # Configuration File
//!
//! ```toml
//! allow_get_producers = false
//! resolve_header_dependencies = true
//! dictionary = "dict.json"
//! annotations = "annotations.json"
//!
//! [same_body]
//! aliases = { id = "name" }
//! ```
//!
//! Every key is optional. A missing configuration file is only an error when
//! its path was given explicitly.

mod compiler;
mod parser;

pub use compiler::{CompilerConfig, PerEndpointDictionaryConfig, SameBodyConfig};
pub use parser::{parse_config, parse_json_file};
