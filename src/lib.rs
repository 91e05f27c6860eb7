//! apichain - producer/consumer dependency inference for REST API fuzzing
//!
//! Given the requests of an API description, apichain decides for every
//! request input where its value should come from: a response of another
//! request, an entry of the mutations dictionary, or a sibling property of the
//! same body. The result drives request sequencing in a stateful fuzzer.
//!
//! # Architecture Overview
//!
//! Compilation is a single synchronous pass:
//!
//! 1. The schema layer hands over a [`grammar::CompilationInput`]
//! 2. Every writable fuzzable input becomes a consumer, every response
//!    property a producer
//! 3. [`resolver::DependencyExtractor`] binds consumers to producers using
//!    annotations, the dictionary, naming heuristics and same-body aliases
//! 4. [`diagnostics`] writes the dependency graph and the updated dictionary
//!
//! # Core Modules
//!
//! - [`grammar`] - Request, parameter and payload tree types
//! - [`resolver`] - Resource model, producer index, matching strategies, ordering
//! - [`dictionary`] - Mutations dictionary and per-endpoint overrides
//! - [`annotations`] - Explicit producer/consumer annotations
//! - [`naming`] - Naming conventions and word splitting
//!
//! ## Supporting Modules
//!
//! - [`cli`] - Command-line interface
//! - [`config`] - Compiler configuration (`apichain.toml`)
//! - [`core`] - Error types and user-facing error context
//! - [`diagnostics`] - JSON dumps of the resolution result
//! - [`utils`] - Atomic file writes
//! - [`constants`] - Shared names and limits
//!
//! # Configuration Format (apichain.toml)
//!
//! ```toml
//! allow_get_producers = false
//! resolve_query_dependencies = true
//! resolve_header_dependencies = false
//! resolve_body_dependencies = true
//! naming_convention = "camel_case"
//! dictionary = "dict.json"
//! annotations = "annotations.json"
//!
//! [same_body.aliases]
//! id = "name"
//!
//! [[per_endpoint_dictionaries]]
//! endpoints = ["/legacy/items"]
//! dictionary = "legacy_dict.json"
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! apichain resolve --input requests.json --output-dir out/
//! apichain validate --input requests.json --strict
//! ```

pub mod annotations;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod diagnostics;
pub mod dictionary;
pub mod grammar;
pub mod naming;
pub mod resolver;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
