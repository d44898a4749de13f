//! GraphQL schema definition.
//!
//! This module exposes wallet history reconstruction to the dashboard:
//! one query for a history page, one for the type legend.

use std::sync::Arc;

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Result, Schema};
use chrono::{DateTime, Utc};

use tally_core::error::{DomainError, DomainResult};
use tally_core::models::{Cluster, TransactionFilter, short_address};
use tally_core::ports::{Cursor, HistoryRequest};
use tally_core::services::{History, HistorySource};

use crate::types::{SchemaConfig, SharedHistoryService, TallySchema};

// -----------------------------------------------------------------------------
// Schema Configuration
// -----------------------------------------------------------------------------

/// Maximum query depth to prevent deeply nested queries (DoS protection).
/// Note: GraphQL introspection requires depth ~13, so we use 15 to allow it.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score (DoS protection).
pub const MAX_QUERY_COMPLEXITY: usize = 500;

// -----------------------------------------------------------------------------
// Schema Builder
// -----------------------------------------------------------------------------

/// Build the schema around a history service.
pub fn build_schema(service: SharedHistoryService, config: SchemaConfig) -> TallySchema {
    Schema::build(HistoryQuery, EmptyMutation, EmptySubscription)
        .data(service)
        .data(config)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

// -----------------------------------------------------------------------------
// History Query
// -----------------------------------------------------------------------------

/// Query root for wallet history.
#[derive(Default)]
pub struct HistoryQuery;

#[Object]
impl HistoryQuery {
    /// Recent transactions for a wallet, newest first.
    ///
    /// Never fails because of the ledger node: when it is unreachable the
    /// synthetic example history is returned with `source: FALLBACK`.
    async fn transaction_history<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        address: String,
        first: Option<i32>,
        before: Option<String>,
        #[graphql(default)] filter: TxFilter,
    ) -> Result<TransactionHistory> {
        validate_address(&address)?;
        if let Some(cursor) = &before {
            validate_signature(cursor)?;
        }

        let service = ctx.data::<SharedHistoryService>()?;
        let config = ctx.data::<SchemaConfig>().copied().unwrap_or_default();

        let request = HistoryRequest::new(address)
            .with_limit(validate_pagination_first(first, config.default_page_size))
            .before(before.map(|value| Cursor { value }));

        let history = service.fetch_history(&request).await;
        Ok(TransactionHistory::new(history, filter.into(), config.cluster))
    }

    /// Label and color of every transaction type.
    async fn transaction_types(&self) -> Vec<TransactionTypeInfo> {
        tally_core::models::TransactionType::ALL
            .into_iter()
            .map(|kind| TransactionTypeInfo {
                kind: kind.into(),
                label: kind.label().to_string(),
                color: kind.color().to_string(),
            })
            .collect()
    }
}

// -----------------------------------------------------------------------------
// GraphQL Types
// -----------------------------------------------------------------------------

/// Transaction kind.
#[derive(async_graphql::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxType {
    Send,
    Receive,
    Swap,
    Stake,
    Unknown,
}

impl From<tally_core::models::TransactionType> for TxType {
    fn from(kind: tally_core::models::TransactionType) -> Self {
        use tally_core::models::TransactionType as T;
        match kind {
            T::Send => TxType::Send,
            T::Receive => TxType::Receive,
            T::Swap => TxType::Swap,
            T::Stake => TxType::Stake,
            T::Unknown => TxType::Unknown,
        }
    }
}

/// Transaction status.
#[derive(async_graphql::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failed,
    Pending,
}

impl From<tally_core::models::TransactionStatus> for TxStatus {
    fn from(status: tally_core::models::TransactionStatus) -> Self {
        use tally_core::models::TransactionStatus as S;
        match status {
            S::Success => TxStatus::Success,
            S::Failed => TxStatus::Failed,
            S::Pending => TxStatus::Pending,
        }
    }
}

/// Type filter for the history list.
#[derive(async_graphql::Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TxFilter {
    #[default]
    All,
    Send,
    Receive,
    Swap,
    Stake,
}

impl From<TxFilter> for TransactionFilter {
    fn from(filter: TxFilter) -> Self {
        use tally_core::models::TransactionType as T;
        match filter {
            TxFilter::All => TransactionFilter::All,
            TxFilter::Send => TransactionFilter::Type(T::Send),
            TxFilter::Receive => TransactionFilter::Type(T::Receive),
            TxFilter::Swap => TransactionFilter::Type(T::Swap),
            TxFilter::Stake => TransactionFilter::Type(T::Stake),
        }
    }
}

/// Provenance of a history result.
#[derive(async_graphql::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryOrigin {
    Live,
    Fallback,
}

/// Transaction type.
#[derive(async_graphql::SimpleObject)]
pub struct Transaction {
    pub signature: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
    pub datetime: Option<DateTime<Utc>>,
    #[graphql(name = "type")]
    pub kind: TxType,
    pub status: TxStatus,
    pub amount: f64,
    pub token: String,
    pub from: Option<String>,
    pub to: Option<String>,
    /// The other side of a send or receive.
    pub counterparty: Option<String>,
    /// Counterparty shortened to `abcd...wxyz`.
    pub short_counterparty: Option<String>,
    /// `To: ...`, `From: ...` or `Internal transaction`; null when no
    /// address is known.
    pub counterparty_line: Option<String>,
    pub fee: f64,
    pub block_time: Option<i64>,
    pub label: String,
    pub color: String,
    pub display_amount: String,
    pub explorer_url: String,
}

impl Transaction {
    fn from_core(tx: tally_core::models::Transaction, cluster: Cluster) -> Self {
        let counterparty = tx.counterparty().map(str::to_string);
        Self {
            short_counterparty: counterparty.as_deref().map(short_address),
            counterparty_line: tx.counterparty_line(),
            counterparty,
            datetime: tx.datetime(),
            label: tx.kind.label().to_string(),
            color: tx.kind.color().to_string(),
            display_amount: tx.display_amount(),
            explorer_url: cluster.explorer_url(&tx.signature),
            kind: tx.kind.into(),
            status: tx.status.into(),
            signature: tx.signature,
            timestamp: tx.timestamp,
            amount: tx.amount,
            token: tx.token,
            from: tx.from,
            to: tx.to,
            fee: tx.fee,
            block_time: tx.block_time,
        }
    }
}

/// A listed signature that produced no record.
#[derive(async_graphql::SimpleObject)]
pub struct SkippedTransaction {
    pub signature: String,
    pub reason: String,
    /// False when the transaction simply did not move the wallet's balance.
    pub failure: bool,
}

#[derive(async_graphql::SimpleObject)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page of wallet history.
#[derive(async_graphql::SimpleObject)]
pub struct TransactionHistory {
    pub transactions: Vec<Transaction>,
    pub source: HistoryOrigin,
    pub fallback_reason: Option<String>,
    pub skipped: Vec<SkippedTransaction>,
    pub page_info: PageInfo,
}

impl TransactionHistory {
    fn new(history: History, filter: TransactionFilter, cluster: Cluster) -> Self {
        let (source, fallback_reason) = match history.source {
            HistorySource::Live => (HistoryOrigin::Live, None),
            HistorySource::Fallback { reason } => (HistoryOrigin::Fallback, Some(reason)),
        };

        Self {
            transactions: filter
                .apply(history.transactions)
                .into_iter()
                .map(|tx| Transaction::from_core(tx, cluster))
                .collect(),
            source,
            fallback_reason,
            skipped: history
                .skipped
                .into_iter()
                .map(|s| SkippedTransaction {
                    failure: s.reason.is_failure(),
                    reason: s.reason.to_string(),
                    signature: s.signature,
                })
                .collect(),
            page_info: PageInfo {
                has_next_page: history.page_info.has_next_page,
                end_cursor: history.page_info.end_cursor.map(|c| c.value),
            },
        }
    }
}

/// Legend entry for a transaction type.
#[derive(async_graphql::SimpleObject)]
pub struct TransactionTypeInfo {
    #[graphql(name = "type")]
    pub kind: TxType,
    pub label: String,
    pub color: String,
}

// -----------------------------------------------------------------------------
// Helpers & Validation
// -----------------------------------------------------------------------------

/// Maximum length of a base58 address (32 bytes).
const MAX_ADDRESS_LENGTH: usize = 44;
/// Maximum length of a base58 signature (64 bytes).
const MAX_SIGNATURE_LENGTH: usize = 88;
/// Maximum page size for pagination.
const MAX_PAGE_SIZE: usize = 100;

/// Decode a base58 string and check its byte length.
fn decode_base58(s: &str, max_len: usize, bytes: usize) -> std::result::Result<(), String> {
    if s.len() > max_len {
        return Err(format!("too long: maximum {} characters allowed", max_len));
    }

    let decoded = bs58::decode(s).into_vec().map_err(|e| e.to_string())?;

    if decoded.len() != bytes {
        return Err(format!("must be exactly {} bytes", bytes));
    }
    Ok(())
}

/// Validate a wallet address.
fn validate_address(s: &str) -> DomainResult<()> {
    decode_base58(s, MAX_ADDRESS_LENGTH, 32).map_err(DomainError::InvalidAddress)
}

/// Validate a signature cursor.
fn validate_signature(s: &str) -> DomainResult<()> {
    decode_base58(s, MAX_SIGNATURE_LENGTH, 64).map_err(DomainError::InvalidSignature)
}

/// Validate and normalize pagination first parameter.
fn validate_pagination_first(first: Option<i32>, default: usize) -> usize {
    match first {
        Some(n) => n.clamp(1, MAX_PAGE_SIZE as i32) as usize,
        None => default.clamp(1, MAX_PAGE_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tally_core::error::{LedgerError, LedgerResult};
    use tally_core::ports::{
        LedgerSource, SignatureInfo, SignatureQuery, TransactionDetail, TransactionMeta,
    };
    use tally_core::services::{HistoryConfig, HistoryService};

    const WALLET: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";
    const PEER: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

    struct MockLedger {
        reachable: bool,
    }

    #[async_trait]
    impl LedgerSource for MockLedger {
        async fn list_signatures(
            &self,
            _address: &str,
            _query: &SignatureQuery,
        ) -> LedgerResult<Vec<SignatureInfo>> {
            if !self.reachable {
                return Err(LedgerError::Timeout("getSignaturesForAddress".into()));
            }
            Ok(["S1", "S2"]
                .iter()
                .map(|s| SignatureInfo {
                    signature: s.to_string(),
                    slot: 1,
                    block_time: None,
                    error: None,
                })
                .collect())
        }

        async fn get_transaction(
            &self,
            signature: &str,
        ) -> LedgerResult<Option<TransactionDetail>> {
            // S1: envoi de 0.5, S2: réception de 0.25
            let (pre, post) = match signature {
                "S1" => (2_000_000_000, 1_500_000_000),
                _ => (1_000_000_000, 1_250_000_000),
            };
            Ok(Some(TransactionDetail {
                slot: 1,
                block_time: Some(1_700_000_000),
                account_keys: vec![WALLET.into(), PEER.into()],
                meta: Some(TransactionMeta {
                    fee: 5000,
                    error: None,
                    pre_balances: vec![pre, 0],
                    post_balances: vec![post, 0],
                }),
            }))
        }

        async fn current_slot(&self) -> LedgerResult<u64> {
            Ok(1)
        }
    }

    fn schema(reachable: bool) -> TallySchema {
        let source: Arc<dyn LedgerSource> = Arc::new(MockLedger { reachable });
        let service = Arc::new(HistoryService::new(HistoryConfig::default(), source));
        build_schema(service, SchemaConfig::default())
    }

    // Tests de validation critiques - protègent contre les entrées invalides

    #[test]
    fn test_validate_address_rejects_invalid_input() {
        // Trop long (DoS prevention)
        assert!(validate_address(&"1".repeat(100)).is_err());
        // Caractères hors base58 (0, O, I, l)
        assert!(validate_address("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl").is_err());
        // Mauvaise longueur décodée
        assert!(validate_address("abc").is_err());
    }

    #[test]
    fn test_validation_errors_are_typed() {
        assert!(matches!(
            validate_address("abc"),
            Err(DomainError::InvalidAddress(_))
        ));
        assert!(matches!(
            validate_signature(WALLET),
            Err(DomainError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_validate_address_accepts_pubkeys() {
        assert!(validate_address(WALLET).is_ok());
        assert!(validate_address("11111111111111111111111111111111").is_ok());
    }

    #[test]
    fn test_pagination_clamping() {
        assert_eq!(validate_pagination_first(Some(-100), 20), 1);
        assert_eq!(validate_pagination_first(Some(0), 20), 1);
        assert_eq!(validate_pagination_first(Some(10000), 20), MAX_PAGE_SIZE);
        assert_eq!(validate_pagination_first(Some(7), 20), 7);
        assert_eq!(validate_pagination_first(None, 20), 20);
        // Une limite CLI trop grande reste bornée
        assert_eq!(validate_pagination_first(None, 500), MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_history_query_live() {
        let query = format!(
            r#"{{ transactionHistory(address: "{WALLET}") {{
                source
                transactions {{ signature type status amount label color explorerUrl }}
                pageInfo {{ hasNextPage endCursor }}
            }} }}"#
        );
        let resp = schema(true).execute(query).await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);

        let data = resp.data.into_json().unwrap();
        let history = &data["transactionHistory"];
        assert_eq!(history["source"], "LIVE");
        assert_eq!(history["transactions"][0]["type"], "SEND");
        assert_eq!(history["transactions"][0]["amount"], 0.5);
        assert_eq!(history["transactions"][0]["label"], "Sent");
        assert_eq!(history["transactions"][1]["type"], "RECEIVE");
        assert_eq!(
            history["transactions"][0]["explorerUrl"],
            "https://explorer.solana.com/tx/S1?cluster=devnet"
        );
        assert_eq!(history["pageInfo"]["endCursor"], "S2");
    }

    #[tokio::test]
    async fn test_history_query_counterparty_line() {
        let query = format!(
            r#"{{ transactionHistory(address: "{WALLET}") {{
                transactions {{ counterparty shortCounterparty counterpartyLine }}
            }} }}"#
        );
        let resp = schema(true).execute(query).await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);

        let data = resp.data.into_json().unwrap();
        let txs = &data["transactionHistory"]["transactions"];
        // Le pair ne bouge pas: aucune contrepartie, mais le portefeuille est connu
        assert!(txs[0]["counterparty"].is_null());
        assert!(txs[0]["shortCounterparty"].is_null());
        assert_eq!(txs[0]["counterpartyLine"], "To: Unknown");
    }

    #[tokio::test]
    async fn test_fallback_counterparty_line() {
        let query = format!(
            r#"{{ transactionHistory(address: "{WALLET}") {{
                transactions {{ type counterparty shortCounterparty counterpartyLine }}
            }} }}"#
        );
        let resp = schema(false).execute(query).await;
        let data = resp.data.into_json().unwrap();
        let txs = data["transactionHistory"]["transactions"].as_array().unwrap();

        for tx in txs {
            match tx["type"].as_str().unwrap() {
                "SEND" => assert!(tx["counterpartyLine"].as_str().unwrap().starts_with("To: ")),
                "RECEIVE" => {
                    assert!(tx["counterpartyLine"].as_str().unwrap().starts_with("From: "))
                }
                _ => assert_eq!(tx["counterpartyLine"], "Internal transaction"),
            }
        }
        let short = txs[0]["shortCounterparty"].as_str().unwrap();
        assert_eq!(short.len(), 11);
        assert!(short.contains("..."));
    }

    #[tokio::test]
    async fn test_history_query_filter() {
        let query = format!(
            r#"{{ transactionHistory(address: "{WALLET}", filter: RECEIVE) {{
                transactions {{ signature }}
            }} }}"#
        );
        let resp = schema(true).execute(query).await;
        let data = resp.data.into_json().unwrap();
        let txs = data["transactionHistory"]["transactions"].as_array().unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0]["signature"], "S2");
    }

    #[tokio::test]
    async fn test_history_query_fallback_is_not_an_error() {
        let query = format!(
            r#"{{ transactionHistory(address: "{WALLET}") {{
                source fallbackReason transactions {{ type status }}
            }} }}"#
        );
        let resp = schema(false).execute(query).await;
        assert!(resp.errors.is_empty());

        let data = resp.data.into_json().unwrap();
        let history = &data["transactionHistory"];
        assert_eq!(history["source"], "FALLBACK");
        assert!(history["fallbackReason"].as_str().unwrap().contains("timed out"));
        assert_eq!(history["transactions"].as_array().unwrap().len(), 5);
        assert_eq!(history["transactions"][4]["status"], "FAILED");
    }

    #[tokio::test]
    async fn test_history_query_rejects_bad_address() {
        let resp = schema(true)
            .execute(r#"{ transactionHistory(address: "not-an-address") { source } }"#)
            .await;
        assert!(!resp.errors.is_empty());
    }

    #[tokio::test]
    async fn test_transaction_types_cover_every_variant() {
        let resp = schema(true)
            .execute("{ transactionTypes { type label color } }")
            .await;
        let data = resp.data.into_json().unwrap();
        let types = data["transactionTypes"].as_array().unwrap();
        assert_eq!(types.len(), 5);
        assert!(types.iter().all(|t| !t["label"].as_str().unwrap().is_empty()));
        assert_eq!(types[4]["label"], "Unknown");
    }
}
