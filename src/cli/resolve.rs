//! Run the dependency extraction and write its diagnostics.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use super::common::{CommandContext, InputOverrides};
use crate::diagnostics;
use crate::resolver::{DependencyExtractor, ExtractionResult};

/// Resolve producer/consumer dependencies.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Compilation input: the parsed requests as JSON
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Mutations dictionary, overriding the configured one
    #[arg(long, value_name = "FILE")]
    pub dictionary: Option<PathBuf>,

    /// Global annotations file, overriding the configured one
    #[arg(long, value_name = "FILE")]
    pub annotations: Option<PathBuf>,

    /// Directory receiving the diagnostic JSON files and the updated dictionary
    #[arg(short, long, value_name = "DIR", default_value = "apichain-out")]
    pub output_dir: PathBuf,
}

impl ResolveCommand {
    /// Load inputs, extract dependencies and write diagnostics.
    ///
    /// # Errors
    ///
    /// Fails on malformed inputs, conflicting dictionaries, resolution
    /// conflicts and write failures. Unresolved consumers are reported, not
    /// treated as errors.
    pub fn execute(self, config_path: Option<&Path>, quiet: bool) -> Result<()> {
        let overrides = InputOverrides {
            dictionary: self.dictionary.clone(),
            annotations: self.annotations.clone(),
        };
        let context = CommandContext::load(&self.input, config_path, &overrides)?;

        let extractor = DependencyExtractor::new(context.config)
            .with_global_annotations(context.global_annotations)
            .with_per_endpoint_dictionaries(context.per_endpoint);
        let result = extractor.extract(&context.input, context.dictionary)?;

        let written = diagnostics::write_all(&self.output_dir, &result)?;

        if !quiet {
            print_summary(&result);
            println!("Diagnostics written to {} ({} files)", self.output_dir.display(), written.len());
        }
        Ok(())
    }
}

fn print_summary(result: &ExtractionResult) {
    let stats = &result.stats;
    println!(
        "{} Resolved {}/{} consumers",
        "✓".green(),
        stats.resolved,
        stats.consumers
    );
    for (strategy, count) in &stats.by_strategy {
        println!("  {strategy}: {count}");
    }
    if stats.same_body > 0 {
        println!("  same_body: {}", stats.same_body);
    }
    if stats.equality_aliases > 0 {
        println!("  equality aliases: {}", stats.equality_aliases);
    }
    if !result.ordering_constraints.is_empty() {
        println!("  ordering constraints: {}", result.ordering_constraints.len());
    }
    if stats.unresolved > 0 {
        println!("{} {} unresolved consumers", "⚠".yellow(), stats.unresolved);
    }
    if stats.ambiguous > 0 {
        println!("{} {} ambiguous matches left unresolved", "⚠".yellow(), stats.ambiguous);
    }
}
