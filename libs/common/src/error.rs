//! Custom error types for the common library
//!
//! This module defines the failure taxonomy of the profile flow. Every call
//! against the REST collaborator resolves to one of these variants.

use thiserror::Error;

/// Custom error type for profile operations
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The collaborator answered 404 for the requested email
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// The request could not be completed (connect, timeout, broken body)
    #[error("Network failure: {0}")]
    Network(String),

    /// Non-2xx status other than 404
    #[error("Server error: HTTP {status}")]
    Server { status: u16, body: String },

    /// A 2xx response whose body is not a profile
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Discriminant of [`ProfileError`], small enough to live in page state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NetworkFailure,
    ServerError,
    InvalidResponse,
    Configuration,
}

impl ErrorKind {
    /// Human readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "profile not found",
            ErrorKind::NetworkFailure => "network failure",
            ErrorKind::ServerError => "server error",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Configuration => "configuration error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProfileError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProfileError::NotFound(_) => ErrorKind::NotFound,
            ProfileError::Network(_) => ErrorKind::NetworkFailure,
            ProfileError::Server { .. } => ErrorKind::ServerError,
            ProfileError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            ProfileError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProfileError::Network(_))
    }
}

impl From<config::ConfigError> for ProfileError {
    fn from(err: config::ConfigError) -> Self {
        ProfileError::Configuration(err.to_string())
    }
}

/// Type alias for Result with ProfileError
pub type ProfileResult<T> = Result<T, ProfileError>;
