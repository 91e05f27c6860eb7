//! Integration test suite for apichain
//!
//! End-to-end tests that drive the `apichain` binary or the public library API
//! over inputs written to temporary directories.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolve**: Resolution scenarios through `apichain resolve`
//! - **validate**: The validate command and its output formats
//! - **config**: Configuration discovery, overrides and errors
//! - **determinism**: Byte-stable diagnostics across runs and input orders

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod config;
mod determinism;
mod resolve;
mod validate;
