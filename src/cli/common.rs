//! Common loading steps shared by CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::annotations::{ProducerConsumerAnnotation, load_global_annotations};
use crate::config::{CompilerConfig, parse_json_file};
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::core::ApichainError;
use crate::dictionary::{MutationsDictionary, PerEndpointDictionaries};
use crate::grammar::CompilationInput;

/// Everything a command needs before running the resolver.
#[derive(Debug)]
pub struct CommandContext {
    pub config: CompilerConfig,
    /// Configuration file actually used, if any
    pub config_path: Option<PathBuf>,
    pub input: CompilationInput,
    pub dictionary: MutationsDictionary,
    pub global_annotations: Vec<ProducerConsumerAnnotation>,
    pub per_endpoint: PerEndpointDictionaries,
}

/// File overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct InputOverrides {
    pub dictionary: Option<PathBuf>,
    pub annotations: Option<PathBuf>,
}

impl CommandContext {
    /// Load the input, configuration, dictionaries and annotations.
    ///
    /// Without an explicit `config_path`, `apichain.toml` in the current
    /// directory is used when present. Command-line overrides win over paths
    /// named in the configuration.
    ///
    /// # Errors
    ///
    /// Fails when any named file is missing or malformed, or when two distinct
    /// per-endpoint dictionaries claim the same endpoint.
    pub fn load(input: &Path, config_path: Option<&Path>, overrides: &InputOverrides) -> Result<Self> {
        let config_path = config_path.map(Path::to_path_buf).or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        });
        let config = CompilerConfig::load_or_default(config_path.as_deref())?;

        let input = load_compilation_input(input)?;

        let dictionary = match overrides.dictionary.as_ref().or(config.dictionary.as_ref()) {
            Some(path) => MutationsDictionary::load(path)?,
            None => MutationsDictionary::with_defaults(),
        };

        let global_annotations = match overrides.annotations.as_ref().or(config.annotations.as_ref()) {
            Some(path) => load_global_annotations(path)?,
            None => Vec::new(),
        };

        let mut declarations = Vec::with_capacity(config.per_endpoint_dictionaries.len());
        for entry in &config.per_endpoint_dictionaries {
            let dictionary = MutationsDictionary::load(&entry.dictionary).with_context(|| {
                format!("Failed to load per-endpoint dictionary: {}", entry.dictionary.display())
            })?;
            declarations.push((entry.endpoints.clone(), dictionary));
        }
        let per_endpoint = PerEndpointDictionaries::build(declarations)?;

        tracing::debug!(
            "Loaded {} requests, {} global annotations, {} per-endpoint dictionaries",
            input.requests.len(),
            global_annotations.len(),
            config.per_endpoint_dictionaries.len()
        );

        Ok(Self {
            config,
            config_path,
            input,
            dictionary,
            global_annotations,
            per_endpoint,
        })
    }
}

/// Parse the request list handed over by the schema layer.
///
/// # Errors
///
/// Returns an I/O error when the file is missing and
/// [`ApichainError::InputParseError`] when it is not a valid request list.
pub fn load_compilation_input(path: &Path) -> Result<CompilationInput> {
    if !path.exists() {
        return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "input file not found"))
            .with_context(|| format!("Failed to read input: {}", path.display()));
    }
    parse_json_file(path).map_err(|e| {
        ApichainError::InputParseError {
            file: path.display().to_string(),
            reason: format!("{:#}", e.root_cause()),
        }
        .into()
    })
}
