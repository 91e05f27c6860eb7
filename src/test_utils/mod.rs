//! Test utilities for apichain
//!
//! This module provides helpers for writing tests: one-time logging setup and
//! builders for the request data the resolver consumes.
//!
//! # Example
//!
//! ```rust,no_run
//! use apichain_cli::grammar::PrimitiveType;
//! use apichain_cli::test_utils::{RequestFixture, compilation_input};
//!
//! let input = compilation_input([
//!     RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
//!     RequestFixture::get("/stores/{storeId}"),
//! ]);
//! assert_eq!(input.requests.len(), 2);
//! ```

pub mod fixtures;

pub use fixtures::{ConfigFixture, RequestFixture, compilation_input};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=apichain_cli::resolver=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
