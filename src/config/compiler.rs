//! Compiler configuration (`apichain.toml`).
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
//! [[per_endpoint_dictionaries]]
//! dictionary = "billing-dict.json"
//! endpoints = ["/invoices", "/invoices/{invoiceId}"]
//!
//! [same_body]
//! aliases = { id = "name" }
//! ```
//!
//! Relative paths are resolved against the directory holding the
//! configuration file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_SAME_BODY_ALIASES;
use crate::core::ApichainError;
use crate::naming::NamingConvention;

const fn default_true() -> bool {
    true
}

/// Settings for the dependency extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Let GET responses produce values for other requests.
    #[serde(default)]
    pub allow_get_producers: bool,

    /// Infer producers for query parameters.
    #[serde(default = "default_true")]
    pub resolve_query_dependencies: bool,

    /// Infer producers for header parameters.
    #[serde(default)]
    pub resolve_header_dependencies: bool,

    /// Infer producers for body properties.
    #[serde(default = "default_true")]
    pub resolve_body_dependencies: bool,

    /// Force one naming convention instead of inferring it per identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming_convention: Option<NamingConvention>,

    /// Global mutations dictionary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,

    /// Global annotation file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<PathBuf>,

    /// Dictionaries that apply to a subset of endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub per_endpoint_dictionaries: Vec<PerEndpointDictionaryConfig>,

    #[serde(default)]
    pub same_body: SameBodyConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            allow_get_producers: false,
            resolve_query_dependencies: true,
            resolve_header_dependencies: false,
            resolve_body_dependencies: true,
            naming_convention: None,
            dictionary: None,
            annotations: None,
            per_endpoint_dictionaries: Vec::new(),
            same_body: SameBodyConfig::default(),
        }
    }
}

/// A dictionary file and the endpoints it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerEndpointDictionaryConfig {
    pub dictionary: PathBuf,
    pub endpoints: Vec<String>,
}

/// Aliases for the same-body pass: a property named like a key takes its value
/// from the sibling named like the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SameBodyConfig {
    pub aliases: BTreeMap<String, String>,
}

impl Default for SameBodyConfig {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_SAME_BODY_ALIASES
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
        }
    }
}

impl CompilerConfig {
    /// Load the configuration from a TOML file.
    ///
    /// Relative file references are rewritten against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ApichainError::ConfigNotFound`] when the file does not exist and
    /// a parse error when it is not valid TOML for this structure.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ApichainError::ConfigNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let mut config: Self = super::parse_config(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.validate()?;

        tracing::debug!("Loaded compiler configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(dictionary) = self.dictionary.as_mut() {
            rebase(dictionary);
        }
        if let Some(annotations) = self.annotations.as_mut() {
            rebase(annotations);
        }
        for entry in &mut self.per_endpoint_dictionaries {
            rebase(&mut entry.dictionary);
        }
    }

    /// Reject settings that cannot be honored.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.per_endpoint_dictionaries {
            if entry.endpoints.is_empty() {
                return Err(ApichainError::ConfigError {
                    message: format!(
                        "per-endpoint dictionary {} lists no endpoints",
                        entry.dictionary.display()
                    ),
                }
                .into());
            }
        }
        for (from, to) in &self.same_body.aliases {
            if from.is_empty() || to.is_empty() || from == to {
                return Err(ApichainError::ConfigError {
                    message: format!("invalid same-body alias '{from}' -> '{to}'"),
                }
                .into());
            }
        }
        Ok(())
    }
}
