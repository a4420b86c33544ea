//! Error types for xrt-prods
//!
//! This module provides the error taxonomy for the library:
//! - Validation errors, raised before any network call is made
//! - State errors, for operations that are illegal in the request's lifecycle state
//! - Not-found, protocol and server-rejection errors from the job server
//! - Transport-level errors (network, I/O, JSON)

use crate::types::{JobId, ProductKind};
use thiserror::Error;

/// Result type alias for xrt-prods operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xrt-prods
///
/// Validation and state errors are always returned at the point of the offending
/// call and never leave a partially applied mutation behind.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// A parameter name, type, value or joint constraint was rejected
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The operation is not allowed in the request's current lifecycle state
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A product or job that does not exist, or is not owned by the caller
    #[error("not found: {0}")]
    NotFound(String),

    /// The server response was malformed or missing expected fields
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server understood the request and declined it
    #[error("server rejected request: {0}")]
    ServerRejection(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Parameter name is not part of the schema for this scope
    #[error("unknown parameter '{name}' for {scope}")]
    UnknownParameter {
        /// Scope the parameter was set on ("global" or a product kind)
        scope: String,
        /// The rejected parameter name
        name: String,
    },

    /// Known parameter given a value of the wrong type or out of range
    #[error("invalid value for {scope} parameter '{name}': {reason}")]
    InvalidValue {
        /// Scope the parameter was set on
        scope: String,
        /// The parameter name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Parameters were copied between products of different kinds
    #[error("cannot copy {found} parameters into a {expected} product")]
    KindMismatch {
        /// The kind of the receiving product
        expected: ProductKind,
        /// The kind of the source product
        found: ProductKind,
    },

    /// The input document does not have the expected shape
    #[error("malformed parameter document: {0}")]
    MalformedDocument(String),

    /// Aggregated request validation failures (one per line)
    #[error("request is not valid:\n{0}")]
    Incomplete(String),
}

/// Lifecycle state errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    /// The request has left the Draft state and can no longer be changed
    #[error("cannot {operation}: request is {state}")]
    NotDraft {
        /// The operation that was attempted
        operation: String,
        /// The current submission state
        state: String,
    },

    /// The request has not been accepted by the server yet
    #[error("cannot {operation}: request has not been submitted")]
    NotSubmitted {
        /// The operation that was attempted
        operation: String,
    },

    /// A product of this kind is already present
    #[error("a {kind} product already exists (pass allow_override to replace it)")]
    ProductExists {
        /// The duplicated product kind
        kind: ProductKind,
    },

    /// The product (or whole job) has not reached the required completion state
    #[error("{what} is not complete")]
    NotComplete {
        /// Description of what was expected to be complete
        what: String,
    },

    /// The products to cancel have already completed
    #[error("{what} of job {job_id} has already completed")]
    AlreadyComplete {
        /// The job the products belong to
        job_id: JobId,
        /// The completed products, comma-separated
        what: String,
    },
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(ValidationError::UnknownParameter { .. }) => "unknown_parameter",
            Error::Validation(ValidationError::InvalidValue { .. }) => "invalid_value",
            Error::Validation(ValidationError::KindMismatch { .. }) => "kind_mismatch",
            Error::Validation(_) => "validation_error",
            Error::State(_) => "invalid_state",
            Error::NotFound(_) => "not_found",
            Error::Protocol(_) => "protocol_error",
            Error::ServerRejection(_) => "server_rejection",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Shorthand for a "not found" error about a product missing from a request
    pub(crate) fn product_not_found(kind: ProductKind) -> Self {
        Error::NotFound(format!("no {kind} product in this request"))
    }
}
