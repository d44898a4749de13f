//! Port trait for the remote ledger node.
//!
//! This trait defines the interface for listing an address's transaction
//! signatures and fetching individual transaction details. Implementations
//! live in the infrastructure layer (e.g., `tally-solana`).

use async_trait::async_trait;

use crate::error::LedgerResult;

/// One entry of a signature listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureInfo {
    /// Transaction signature.
    pub signature: String,
    /// Slot the transaction landed in.
    pub slot: u64,
    /// Block time in seconds, if the node reports it in the listing.
    pub block_time: Option<i64>,
    /// Error object, if the transaction failed.
    pub error: Option<serde_json::Value>,
}

/// Parameters of a signature listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureQuery {
    /// Maximum number of signatures to return.
    pub limit: usize,
    /// Only return signatures older than this one.
    pub before: Option<String>,
}

/// Execution metadata of a transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionMeta {
    /// Fee in minor units.
    pub fee: u64,
    /// Error object; `None` when the transaction succeeded.
    pub error: Option<serde_json::Value>,
    /// Balances before execution, indexed like the account keys.
    pub pre_balances: Vec<u64>,
    /// Balances after execution, indexed like the account keys.
    pub post_balances: Vec<u64>,
}

/// Decoded transaction detail as returned by the node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionDetail {
    /// Slot the transaction landed in.
    pub slot: u64,
    /// Block time in seconds.
    pub block_time: Option<i64>,
    /// Account keys in message order.
    pub account_keys: Vec<String>,
    /// Execution metadata (may be missing on pruned nodes).
    pub meta: Option<TransactionMeta>,
}

/// An account touched by a transaction, with its balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant<'a> {
    pub address: &'a str,
    pub pre_balance: u64,
    pub post_balance: u64,
}

impl TransactionDetail {
    /// Participants in message order.
    ///
    /// Accounts without both a pre and a post balance are omitted.
    pub fn participants(&self) -> Vec<Participant<'_>> {
        let Some(meta) = &self.meta else {
            return Vec::new();
        };

        self.account_keys
            .iter()
            .zip(meta.pre_balances.iter().zip(meta.post_balances.iter()))
            .map(|(address, (pre, post))| Participant {
                address: address.as_str(),
                pre_balance: *pre,
                post_balance: *post,
            })
            .collect()
    }
}

/// Port trait for the ledger node.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// List signatures involving `address`, newest first.
    async fn list_signatures(
        &self,
        address: &str,
        query: &SignatureQuery,
    ) -> LedgerResult<Vec<SignatureInfo>>;

    /// Fetch a single transaction.
    ///
    /// Returns `Ok(None)` when the node does not know the signature.
    async fn get_transaction(&self, signature: &str) -> LedgerResult<Option<TransactionDetail>>;

    /// Current slot of the node; used as a connectivity check.
    async fn current_slot(&self) -> LedgerResult<u64>;
}
