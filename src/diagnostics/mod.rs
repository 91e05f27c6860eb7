//! Diagnostic dumps of an extraction.
//!
//! Every file is pretty JSON in a stable order, so two runs over the same
//! input can be diffed directly:
//!
//! | file                           | content                                  |
//! |--------------------------------|------------------------------------------|
//! | `consumers.json`               | every consumer, canonical order          |
//! | `producers.json`               | indexed and ordering producers           |
//! | `dependencies.json`            | dependency map keyed by access path      |
//! | `unresolved_dependencies.json` | consumers left without a producer        |
//! | `ordering_constraints.json`    | request ordering constraints             |
//! | `dict.json`                    | the dictionary with synthesized entries  |

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants::{
    CONSUMERS_FILE, DEPENDENCIES_FILE, DICTIONARY_FILE, ORDERING_CONSTRAINTS_FILE, PRODUCERS_FILE,
    UNRESOLVED_DEPENDENCIES_FILE,
};
use crate::resolver::ExtractionResult;
use crate::utils::{ensure_dir, write_json_file};

/// Write all diagnostic files of `result` into `dir`.
///
/// Returns the written paths in the order above.
///
/// # Errors
///
/// Fails when `dir` cannot be created or a file cannot be written.
pub fn write_all(dir: &Path, result: &ExtractionResult) -> Result<Vec<PathBuf>> {
    ensure_dir(dir)?;

    let dumps = [
        (CONSUMERS_FILE, serde_json::to_value(&result.consumers)?),
        (PRODUCERS_FILE, serde_json::to_value(&result.producers)?),
        (DEPENDENCIES_FILE, serde_json::to_value(&result.dependencies)?),
        (UNRESOLVED_DEPENDENCIES_FILE, serde_json::to_value(result.unresolved())?),
        (ORDERING_CONSTRAINTS_FILE, serde_json::to_value(&result.ordering_constraints)?),
        (DICTIONARY_FILE, serde_json::to_value(&result.dictionary)?),
    ];

    let mut written = Vec::with_capacity(dumps.len());
    for (file, value) in dumps {
        let path = dir.join(file);
        write_json_file(&path, &value)
            .with_context(|| format!("Failed to write diagnostics to {}", dir.display()))?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }

    tracing::info!("Wrote {} diagnostic files to {}", written.len(), dir.display());
    Ok(written)
}
