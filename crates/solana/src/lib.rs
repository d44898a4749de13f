//! Solana JSON-RPC adapter for Tally.
//!
//! This crate implements the [`LedgerSource`] port from `tally-core`,
//! talking to a Solana node over HTTP JSON-RPC.
//!
//! # Features
//!
//! - Signature listing with `before` cursor paging (`getSignaturesForAddress`)
//! - Transaction detail fetch with versioned transaction support (`getTransaction`)
//! - Account keys from both `json` and `jsonParsed` encodings, including
//!   address lookup table entries
//! - Per-request timeout and configurable commitment
//!
//! # Usage
//!
//! ```ignore
//! use tally_solana::{SolanaClientConfig, SolanaRpcClient};
//!
//! let client = SolanaRpcClient::new(SolanaClientConfig {
//!     rpc_url: "https://api.devnet.solana.com".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let slot = client.current_slot().await?;
//! ```
//!
//! [`LedgerSource`]: tally_core::ports::LedgerSource

mod client;
mod rpc;

pub use client::{Commitment, SolanaClientConfig, SolanaRpcClient};
