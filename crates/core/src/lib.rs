//! Core domain layer for Tally.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! the history reconstruction service for a wallet dashboard. It follows
//! hexagonal architecture principles - this is the innermost layer with
//! no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      tally (binary)                         │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │        tally-graphql         │         tally-solana         │
//! │           (API)              │        (JSON-RPC)            │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                     tally-core  ← YOU ARE HERE              │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Transaction, TransactionType, etc.)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - History reconstruction and the synthetic fallback
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Reconstruction Pipeline
//!
//! 1. List the most recent signatures for the watched address
//! 2. Fetch each transaction detail (bounded concurrency, order preserved)
//! 3. Compute the watched address's balance delta and classify it
//! 4. Derive status, fee and timestamp
//! 5. Return the list in listing order, newest first
//!
//! If step 1 fails the service returns a fixed synthetic dataset instead,
//! flagged as [`services::HistorySource::Fallback`].

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;

pub use models::{
    format_transaction_type, format_transaction_type_str, transaction_type_color,
    transaction_type_color_str,
};
