//! Error handling for apichain
//!
//! This module provides the error types and user-friendly error reporting for the
//! dependency resolver. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can tell a malformed input apart from an
//!    ambiguous configuration or a genuine resolution conflict
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Malformed input**: [`ApichainError::MalformedResource`],
//!   [`ApichainError::ArrayPathParameter`]. These indicate the schema layer broke its
//!   contract and abort the whole compilation.
//! - **Ambiguous configuration**: [`ApichainError::ConflictingDictionaries`],
//!   [`ApichainError::UnsupportedSerialization`].
//! - **Resolution conflicts**: [`ApichainError::ResolutionConflict`], raised when two
//!   distinct producers claim one consumer key.
//! - **Files and configuration**: [`ApichainError::ConfigError`],
//!   [`ApichainError::DictionaryParseError`], [`ApichainError::AnnotationParseError`],
//!   [`ApichainError::InputParseError`] and the converted I/O, JSON and TOML errors.
//!
//! An unresolved dependency is never an error: the consumer is reported with no
//! producer and the grammar falls back to a fuzzable value.
//!
//! # Examples
//!
//! ```rust,no_run
//! use apichain_cli::core::{ApichainError, ErrorContext, user_friendly_error};
//!
//! let error = ApichainError::ConflictingDictionaries {
//!     endpoint: "/stores".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for apichain operations
///
/// Each variant names one failure mode of the resolver pipeline and carries
/// the endpoint, parameter or file needed to act on it.
#[derive(Error, Debug)]
pub enum ApichainError {
    /// A resource reference violates the schema layer's contract
    ///
    /// Raised for empty resource names and body resources without an access path.
    #[error("Malformed resource in {request}: {reason}")]
    MalformedResource {
        /// The request the resource belongs to (`METHOD endpoint`)
        request: String,
        /// What is wrong with the resource
        reason: String,
    },

    /// A path parameter is declared with an array schema
    #[error("Path parameter '{name}' of {endpoint} is an array")]
    ArrayPathParameter {
        /// The endpoint declaring the parameter
        endpoint: String,
        /// The parameter name
        name: String,
    },

    /// A parameter uses a serialization style the grammar cannot express
    #[error("Unsupported serialization style '{style}' for parameter '{parameter}' of {endpoint}")]
    UnsupportedSerialization {
        /// The endpoint declaring the parameter
        endpoint: String,
        /// The parameter name
        parameter: String,
        /// The declared style
        style: String,
    },

    /// Two API documents declare distinct dictionaries for the same endpoint
    #[error("Conflicting dictionaries declared for endpoint {endpoint}")]
    ConflictingDictionaries {
        /// The endpoint both dictionaries claim
        endpoint: String,
    },

    /// Two distinct producers were bound to one consumer key
    #[error("Conflicting producers for consumer '{key}': {existing} and {new}")]
    ResolutionConflict {
        /// Consumer key (`METHOD endpoint kind resource access-path`)
        key: String,
        /// The producer bound first
        existing: String,
        /// The producer found afterwards
        new: String,
    },

    /// Ordering constraints form a cycle
    #[error("Circular ordering constraint detected: {chain}")]
    CircularDependency {
        /// The requests forming the cycle, in order
        chain: String,
    },

    /// An annotation names a request that is not part of the API surface
    #[error("Annotation references unknown request {request}")]
    UnknownAnnotationRequest {
        /// The request named by the annotation
        request: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was searched
        path: String,
    },

    /// Invalid mutations dictionary file
    #[error("Invalid dictionary file {file}")]
    DictionaryParseError {
        /// The dictionary file
        file: String,
        /// The parse failure
        reason: String,
    },

    /// Invalid annotation file
    #[error("Invalid annotation file {file}")]
    AnnotationParseError {
        /// The annotation file
        file: String,
        /// The parse failure
        reason: String,
    },

    /// Invalid compilation input (parsed request trees)
    #[error("Invalid compilation input {file}")]
    InputParseError {
        /// The input file
        file: String,
        /// The parse failure
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Generic error with a message
    #[error("{message}")]
    Other {
        /// The message
        message: String,
    },
}

impl Clone for ApichainError {
    fn clone(&self) -> Self {
        match self {
            Self::MalformedResource {
                request,
                reason,
            } => Self::MalformedResource {
                request: request.clone(),
                reason: reason.clone(),
            },
            Self::ArrayPathParameter {
                endpoint,
                name,
            } => Self::ArrayPathParameter {
                endpoint: endpoint.clone(),
                name: name.clone(),
            },
            Self::UnsupportedSerialization {
                endpoint,
                parameter,
                style,
            } => Self::UnsupportedSerialization {
                endpoint: endpoint.clone(),
                parameter: parameter.clone(),
                style: style.clone(),
            },
            Self::ConflictingDictionaries {
                endpoint,
            } => Self::ConflictingDictionaries {
                endpoint: endpoint.clone(),
            },
            Self::ResolutionConflict {
                key,
                existing,
                new,
            } => Self::ResolutionConflict {
                key: key.clone(),
                existing: existing.clone(),
                new: new.clone(),
            },
            Self::CircularDependency {
                chain,
            } => Self::CircularDependency {
                chain: chain.clone(),
            },
            Self::UnknownAnnotationRequest {
                request,
            } => Self::UnknownAnnotationRequest {
                request: request.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::ConfigNotFound {
                path,
            } => Self::ConfigNotFound {
                path: path.clone(),
            },
            Self::DictionaryParseError {
                file,
                reason,
            } => Self::DictionaryParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::AnnotationParseError {
                file,
                reason,
            } => Self::AnnotationParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::InputParseError {
                file,
                reason,
            } => Self::InputParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            // IO, JSON and TOML errors don't implement Clone; keep their message
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps an [`ApichainError`] and adds optional details and a
/// suggestion for resolution. This is the primary way apichain presents
/// errors to CLI users.
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ApichainError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ApichainError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ApichainError`] variants, I/O errors and JSON/TOML parse
/// failures anywhere in the error chain; everything else is reported with its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(apichain_error) = cause.downcast_ref::<ApichainError>() {
            return create_error_context(apichain_error.clone());
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ApichainError::Other {
                    message: format!("Permission denied: {error}"),
                })
                .with_suggestion("Check the ownership and permissions of the input and output paths");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ApichainError::Other {
                    message: format!("File not found: {error}"),
                })
                .with_suggestion("Check that the file exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(json_error) = error.downcast_ref::<serde_json::Error>() {
        return ErrorContext::new(ApichainError::Other {
            message: format!("{error}"),
        })
        .with_details(format!(
            "JSON error at line {}, column {}",
            json_error.line(),
            json_error.column()
        ))
        .with_suggestion("Validate the file with a JSON linter");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error
        .chain()
        .skip(1) // Skip the root cause which is already in to_string()
        .map(std::string::ToString::to_string)
        .collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ApichainError::Other {
        message,
    })
}

/// Map each [`ApichainError`] variant to a context with tailored suggestions.
fn create_error_context(error: ApichainError) -> ErrorContext {
    match &error {
        ApichainError::MalformedResource { .. } | ApichainError::ArrayPathParameter { .. } => {
            ErrorContext::new(error.clone())
                .with_suggestion("Regenerate the compilation input; the schema layer produced a tree the resolver cannot interpret")
                .with_details("The compilation was aborted before any dependency was resolved")
        }

        ApichainError::UnsupportedSerialization { style, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Change the parameter to the 'form' or 'simple' style, or exclude the operation (found '{style}')"
            )),

        ApichainError::ConflictingDictionaries { endpoint } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Declare '{endpoint}' in only one [[per_endpoint_dictionaries]] entry, or make both dictionaries identical"
            ))
            .with_details("Each endpoint may use at most one dictionary"),

        ApichainError::ResolutionConflict { key, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Add an annotation naming the intended producer for '{key}'"
            ))
            .with_details("Two different producers matched the same consumer"),

        ApichainError::CircularDependency { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Review the ordering annotations and remove the constraint closing the cycle"),

        ApichainError::UnknownAnnotationRequest { request } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Check the endpoint and method of '{request}' against the compilation input"
            )),

        ApichainError::DictionaryParseError { reason, .. }
        | ApichainError::AnnotationParseError { reason, .. }
        | ApichainError::InputParseError { reason, .. } => ErrorContext::new(error.clone())
            .with_details(reason.clone())
            .with_suggestion("Check the JSON syntax and the expected key names"),

        ApichainError::ConfigNotFound { path } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Create {path} or pass --config with an existing file")),

        _ => ErrorContext::new(error.clone()),
    }
}
