//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout workforce.
//! Every error maps to a stable error code used by the JSON report output.
//!
//! # Error Categories
//! - `MissingInput` / `InvalidInput`: operator input problems, detected before any database access
//! - `NotFound` / `Conflict`: client-side referential pre-checks inside a transaction
//! - `ReadOnly`: mutating operation refused by a read-only connection
//! - `Rejected`: a database constraint violation translated into an operator message
//! - `Database`: any other engine error, with its server code and violation class
//! - `ConnectionFailed` / `ConfigError`: startup failures
//! - `PromptFailed` / `InputClosed`: terminal I/O problems

use thiserror::Error;

/// Class of integrity constraint reported by the database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Primary key or unique constraint
    Unique,
    /// CHECK constraint
    Check,
    /// Foreign key constraint
    ForeignKey,
}

/// Main error type for workforce operations
#[derive(Error, Debug)]
pub enum WorkforceError {
    /// A required field was left empty
    #[error("{0} is required")]
    MissingInput(String),

    /// A field could not be parsed as its declared type
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced row does not exist
    #[error("{0}")]
    NotFound(String),

    /// A relation already exists or the request contradicts itself
    #[error("{0}")]
    Conflict(String),

    /// Mutation attempted on a read-only connection
    #[error("Connection '{0}' is read-only")]
    ReadOnly(String),

    /// Constraint violation translated into an operator-facing message
    #[error("{0}")]
    Rejected(String),

    /// Engine error not covered by a specific message
    #[error("Database error {}: {detail}", code.as_deref().unwrap_or("-"))]
    Database { code: Option<String>, violation: Option<Violation>, detail: String },

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Reading from or writing to the terminal failed
    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    /// Standard input reached end of file
    #[error("Input closed")]
    InputClosed,
}

impl WorkforceError {
    /// Convert error to error code string for JSON output
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::ReadOnly(_) => "READ_ONLY",
            Self::Rejected(_) => "REJECTED",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::PromptFailed(_) => "PROMPT_FAILED",
            Self::InputClosed => "INPUT_CLOSED",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Constraint class of a database error, if the engine reported one
    #[must_use]
    pub const fn violation(&self) -> Option<Violation> {
        match self {
            Self::Database { violation, .. } => *violation,
            _ => None,
        }
    }

    /// Replace a database error of the given constraint class with an operator message.
    ///
    /// Errors of any other class pass through unchanged.
    #[must_use]
    pub fn explain(self, class: Violation, message: impl FnOnce() -> String) -> Self {
        if self.violation() == Some(class) {
            Self::Rejected(message())
        } else {
            self
        }
    }

    /// Create a missing input error
    pub fn missing_input(field: impl Into<String>) -> Self {
        Self::MissingInput(field.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a database error
    pub fn database(
        code: Option<String>,
        violation: Option<Violation>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Database { code, violation, detail: detail.into() }
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a prompt failure error
    pub fn prompt_failed(message: impl Into<String>) -> Self {
        Self::PromptFailed(message.into())
    }
}

/// Result type alias for workforce operations
pub type Result<T> = std::result::Result<T, WorkforceError>;
