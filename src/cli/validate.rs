//! Validate compilation inputs without resolving dependencies.
//!
//! Checks, in order:
//!
//! 1. The compiler configuration parses and is consistent
//! 2. The compilation input parses
//! 3. The dictionary, per-endpoint dictionaries and annotation file parse,
//!    and no endpoint is claimed by two distinct dictionaries
//! 4. Every request uses parameter shapes the resolver supports
//! 5. Every annotation names requests present in the input
//!
//! # Output Example
//!
//! ```text
//! ✗ Annotation references unknown request POST /archives
//! ⚠ Warning: Per-endpoint dictionary names unknown endpoint /legacy
//! ✓ 12 requests, 3 annotations
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::common::{CommandContext, InputOverrides};
use crate::annotations::ProducerConsumerAnnotation;
use crate::core::ApichainError;
use crate::grammar::{CompilationInput, RequestId};
use crate::resolver::validate_request;

/// Output format for validation results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Text,
    /// Structured JSON output
    Json,
}

/// Validate the compilation input, dictionaries and annotations.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Compilation input: the parsed requests as JSON
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Mutations dictionary, overriding the configured one
    #[arg(long, value_name = "FILE")]
    pub dictionary: Option<PathBuf>,

    /// Global annotations file, overriding the configured one
    #[arg(long, value_name = "FILE")]
    pub annotations: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Aggregated validation outcome, used for JSON output.
#[derive(Debug, Default, Serialize)]
pub struct ValidationResults {
    /// No errors (and no warnings in strict mode)
    pub valid: bool,
    /// Configuration, input and side files all loaded
    pub inputs_loaded: bool,
    /// Every request passed the parameter shape checks
    pub requests_valid: bool,
    /// Every annotation names known requests
    pub annotations_valid: bool,
    pub requests: usize,
    pub annotations: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidateCommand {
    /// Run the checks and report them.
    ///
    /// # Errors
    ///
    /// Returns the first failure when any check fails, or a summary error in
    /// strict mode when warnings were raised.
    pub fn execute(self, config_path: Option<&Path>, quiet: bool) -> Result<()> {
        let mut results = ValidationResults::default();

        let overrides = InputOverrides {
            dictionary: self.dictionary.clone(),
            annotations: self.annotations.clone(),
        };
        let context = match CommandContext::load(&self.input, config_path, &overrides) {
            Ok(context) => context,
            Err(e) => {
                results.errors.push(format!("{e:#}"));
                self.report(&results, quiet)?;
                return Err(e);
            }
        };
        results.inputs_loaded = true;
        results.requests = context.input.requests.len();

        let mut first_error: Option<ApichainError> = None;
        let mut record = |results: &mut ValidationResults, error: ApichainError| {
            results.errors.push(error.to_string());
            first_error.get_or_insert(error);
        };

        let mut seen = BTreeSet::new();
        let mut request_errors = 0;
        for entry in &context.input.requests {
            if !seen.insert(&entry.id) {
                results.warnings.push(format!("Duplicate request {} will be ignored", entry.id));
                continue;
            }
            if let Err(error) = validate_request(&entry.id, &entry.data) {
                request_errors += 1;
                record(&mut results, error);
            }
        }
        results.requests_valid = request_errors == 0;

        let annotations = declared_annotations(&context.input, &context.global_annotations);
        results.annotations = annotations.len();
        let unknown = unknown_annotation_requests(&seen, &annotations);
        results.annotations_valid = unknown.is_empty();
        for request in unknown {
            record(&mut results, ApichainError::UnknownAnnotationRequest {
                request: request.to_string(),
            });
        }

        for endpoint in context.per_endpoint.endpoints() {
            let known = context
                .input
                .requests
                .iter()
                .any(|e| crate::grammar::normalize_endpoint(&e.id.endpoint) == endpoint);
            if !known {
                results
                    .warnings
                    .push(format!("Per-endpoint dictionary names unknown endpoint {endpoint}"));
            }
        }

        results.valid = results.errors.is_empty() && (!self.strict || results.warnings.is_empty());
        self.report(&results, quiet)?;

        if let Some(error) = first_error {
            return Err(error.into());
        }
        if !results.valid {
            return Err(anyhow::anyhow!(
                "Strict mode: validation failed with {} warning(s)",
                results.warnings.len()
            ));
        }
        Ok(())
    }

    fn report(&self, results: &ValidationResults, quiet: bool) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(results)?);
            }
            OutputFormat::Text => {
                for error in &results.errors {
                    println!("{} {}", "✗".red(), error);
                }
                for warning in &results.warnings {
                    println!("{} Warning: {warning}", "⚠".yellow());
                }
                if !quiet && results.inputs_loaded {
                    println!("{} {} requests, {} annotations", "✓".green(), results.requests, results.annotations);
                    if results.valid {
                        println!("{} Valid compilation input", "✓".green());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Global, local and link annotations of the input.
fn declared_annotations<'a>(
    input: &'a CompilationInput,
    global: &'a [ProducerConsumerAnnotation],
) -> Vec<&'a ProducerConsumerAnnotation> {
    input
        .requests
        .iter()
        .flat_map(|e| e.data.local_annotations.iter().chain(&e.data.link_annotations))
        .chain(global)
        .collect()
}

/// Requests named by annotations but absent from the input, sorted.
fn unknown_annotation_requests<'a>(
    known: &BTreeSet<&RequestId>,
    annotations: &[&'a ProducerConsumerAnnotation],
) -> BTreeSet<&'a RequestId> {
    annotations
        .iter()
        .copied()
        .flat_map(|a| std::iter::once(&a.producer_id).chain(&a.consumer_id).chain(&a.except))
        .filter(|request| !known.contains(request))
        .collect()
}
