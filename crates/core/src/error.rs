//! Error types for the history domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`LedgerError`] - Ledger node RPC errors
//! - [`DomainError`] - Input validation and domain rule errors
//! - [`TallyError`] - Top-level wiring errors
//!
//! None of these ever escape [`crate::services::HistoryService`]'s public
//! entry points: ledger failures degrade to a partial or synthetic history.
//! They exist for the adapters, the API layer and the binary.

use thiserror::Error;

// =============================================================================
// Ledger Errors
// =============================================================================

/// Ledger node RPC and connectivity errors.
///
/// These errors occur when talking to the remote node that backs a
/// [`crate::ports::LedgerSource`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Node could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    RpcError {
        /// JSON-RPC error code.
        code: i64,
        /// Error message returned by the node.
        message: String,
    },

    /// Request did not complete in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response could not be decoded into the expected shape.
    #[error("Decoding error: {0}")]
    DecodeError(String),

    /// Transport-level failure (non-2xx status, broken body, ...).
    #[error("HTTP error: {0}")]
    Http(String),
}

// =============================================================================
// Domain Errors
// =============================================================================

/// Domain rule and input validation errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Wallet address failed validation.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Transaction signature failed validation.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Strict parse of a transaction type label failed.
    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),

    /// Generic validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level errors surfaced while wiring the service together.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Ledger client could not be built.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for top-level operations.
pub type TallyResult<T> = Result<T, TallyError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
