//! apichain CLI entry point
//!
//! Parses arguments, runs the selected command and renders failures with
//! their context and suggestions.
//!
//! The CLI provides two commands:
//! - `resolve` - Infer producer/consumer dependencies and write diagnostics
//! - `validate` - Check the compilation input, dictionaries and annotations

use anyhow::Result;
use apichain_cli::cli;
use apichain_cli::core::error::user_friendly_error;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
