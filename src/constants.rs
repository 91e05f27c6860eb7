//! Global constants used throughout the apichain codebase.
//!
//! This module contains naming exceptions, payload limits and the file names
//! of the diagnostics the resolver writes. Defining them centrally keeps the
//! baselines that downstream tooling diffs against in one place.

/// Container words that must never be singularized.
///
/// Stripping the trailing `s` from these produces a different word, which
/// would make type inference match unrelated producers.
pub const SINGULAR_EXCEPTIONS: &[&str] = &[
    "data",
    "metadata",
    "address",
    "status",
    "access",
    "alias",
    "analysis",
    "canvas",
    "class",
    "dns",
    "news",
    "process",
    "series",
    "species",
    "settings",
];

/// Maximum length of a generated uuid-suffix prefix.
///
/// Some services reject resource names longer than this once the random
/// suffix is appended.
pub const UUID_SUFFIX_PREFIX_MAX_LEN: usize = 10;

/// Same-body aliases applied when the configuration declares none.
///
/// A body property named like the key mirrors the sibling named like the value.
pub const DEFAULT_SAME_BODY_ALIASES: &[(&str, &str)] = &[("id", "name")];

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "apichain.toml";

/// Dictionary file written after resolution.
pub const DICTIONARY_FILE: &str = "dict.json";

/// Consumer dump file.
pub const CONSUMERS_FILE: &str = "consumers.json";

/// Producer index dump file.
pub const PRODUCERS_FILE: &str = "producers.json";

/// Combined dependency dump file.
pub const DEPENDENCIES_FILE: &str = "dependencies.json";

/// Dump restricted to consumers with no producer.
pub const UNRESOLVED_DEPENDENCIES_FILE: &str = "unresolved_dependencies.json";

/// Ordering constraint dump file.
pub const ORDERING_CONSTRAINTS_FILE: &str = "ordering_constraints.json";
