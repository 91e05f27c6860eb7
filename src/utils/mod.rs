//! File system helpers
//!
//! Diagnostics and the updated dictionary are written with [`atomic_write`],
//! so a reader never sees a partially written file.
//!
//! # Example
//!
//! ```rust,no_run
//! use apichain_cli::utils::{atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("out/diagnostics"))?;
//! atomic_write(Path::new("out/diagnostics/dict.json"), b"{}")?;
//! # Ok(())
//! # }
//! ```

pub mod fs;

pub use fs::{atomic_write, ensure_dir, safe_write, write_json_file};
