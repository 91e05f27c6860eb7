//! Core types and functionality for apichain
//!
//! This module holds the error system shared by every stage of the resolver:
//! - **Strongly-typed errors** ([`ApichainError`]) for precise error handling in code
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions for CLI users
//! - **Automatic error conversion** from I/O, JSON and TOML errors
//!
//! # Error Handling Pattern
//!
//! ```rust
//! use apichain_cli::core::{ApichainError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(ApichainError::ConfigError { message: "missing dictionary".into() }.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.to_string().contains("missing dictionary"));
//! }
//! ```

pub mod error;

pub use error::{ApichainError, ErrorContext, user_friendly_error};
