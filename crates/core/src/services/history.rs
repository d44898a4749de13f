//! History reconstruction service.
//!
//! Lists an address's recent signatures, fetches and decodes each
//! transaction, and assembles the normalized history in listing order.
//! The public entry points never fail: a listing failure yields the
//! synthetic dataset, and per-signature failures are skipped.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use crate::metrics::{
    FetchTimer, record_fallback, record_history_request, record_transaction_skipped,
    record_transactions_decoded,
};
use crate::models::{NATIVE_TOKEN, Transaction};
use crate::ports::{Cursor, HistoryRequest, LedgerSource, PageInfo, SignatureQuery};
use crate::services::decode::{SkipReason, decode_transaction};
use crate::services::fallback::synthetic_transactions;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the history service.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Symbol reported for native balance movements.
    pub native_token: String,
    /// Maximum number of transaction details fetched at once.
    /// `1` fetches strictly one after another.
    pub max_concurrent_fetches: usize,
    /// Serve the synthetic dataset when a live listing yields no records.
    pub fallback_on_empty: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            native_token: NATIVE_TOKEN.to_string(),
            max_concurrent_fetches: 4,
            fallback_on_empty: false,
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Where a history result came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySource {
    /// Reconstructed from the ledger node.
    Live,
    /// Synthetic dataset, served because live data was unavailable.
    Fallback {
        /// Why live data was not used.
        reason: String,
    },
}

impl HistorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistorySource::Live => "live",
            HistorySource::Fallback { .. } => "fallback",
        }
    }
}

/// A listed signature that produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSignature {
    pub signature: String,
    pub reason: SkipReason,
}

/// Result of a history reconstruction.
#[derive(Debug, Clone)]
pub struct History {
    /// Records, newest first.
    pub transactions: Vec<Transaction>,
    /// Provenance of the records.
    pub source: HistorySource,
    /// Listed signatures left out, in listing order.
    pub skipped: Vec<SkippedSignature>,
    /// Cursor for the next (older) page.
    pub page_info: PageInfo,
}

impl History {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, HistorySource::Fallback { .. })
    }
}

// =============================================================================
// HistoryService
// =============================================================================

/// Reconstructs wallet history from a [`LedgerSource`].
///
/// # Flow
///
/// 1. List up to `limit` signatures for the watched address
/// 2. Fetch every detail, at most `max_concurrent_fetches` at a time
/// 3. Decode each detail relative to the watched address
/// 4. Collect records in listing order, keeping skip reasons aside
pub struct HistoryService<S: LedgerSource + ?Sized> {
    config: HistoryConfig,
    source: Arc<S>,
}

impl<S: LedgerSource + ?Sized> HistoryService<S> {
    pub fn new(config: HistoryConfig, source: Arc<S>) -> Self {
        Self { config, source }
    }

    /// Most recent history for `address`, newest first.
    ///
    /// `limit` defaults to 20 signatures.
    pub async fn get_transaction_history(
        &self,
        address: &str,
        limit: Option<usize>,
    ) -> Vec<Transaction> {
        let mut request = HistoryRequest::new(address);
        if let Some(limit) = limit {
            request = request.with_limit(limit);
        }
        self.fetch_history(&request).await.transactions
    }

    /// Reconstruct one page of history.
    #[instrument(skip_all, fields(address = %request.address, limit = request.effective_limit()))]
    pub async fn fetch_history(&self, request: &HistoryRequest) -> History {
        let _timer = FetchTimer::new();
        let limit = request.effective_limit();
        let address = request.address.as_str();

        let query = SignatureQuery {
            limit,
            before: request.before.as_ref().map(|c| c.value.clone()),
        };

        let signatures = match self.source.list_signatures(address, &query).await {
            Ok(signatures) => signatures,
            Err(e) => {
                warn!(error = %e, "⚠️  Signature listing failed, serving synthetic history");
                return self.fallback(format!("signature listing failed: {e}"), Vec::new());
            }
        };

        debug!(count = signatures.len(), "Signatures listed");

        let page_info = PageInfo {
            has_next_page: signatures.len() >= limit,
            end_cursor: signatures.last().map(|s| Cursor {
                value: s.signature.clone(),
            }),
        };

        let concurrency = self.config.max_concurrent_fetches.max(1);
        let outcomes: Vec<(String, Result<Transaction, SkipReason>)> =
            stream::iter(signatures.into_iter().map(|s| s.signature))
                .map(move |signature| async move {
                    let outcome = self.decode_signature(&signature, address).await;
                    (signature, outcome)
                })
                .buffered(concurrency)
                .collect()
                .await;

        let mut transactions = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();

        for (signature, outcome) in outcomes {
            match outcome {
                Ok(tx) => transactions.push(tx),
                Err(reason) => {
                    if reason.is_failure() {
                        warn!(signature = %signature, reason = %reason, "⚠️  Transaction skipped");
                    } else {
                        debug!(signature = %signature, "No balance change, transaction dropped");
                    }
                    record_transaction_skipped(reason.tag());
                    skipped.push(SkippedSignature { signature, reason });
                }
            }
        }

        if transactions.is_empty() && self.config.fallback_on_empty {
            info!(skipped = skipped.len(), "No live transactions, serving synthetic history");
            return self.fallback(skip_summary(&skipped), skipped);
        }

        let source = HistorySource::Live;
        record_transactions_decoded(transactions.len() as u64);
        record_history_request(source.as_str());
        debug!(
            decoded = transactions.len(),
            skipped = skipped.len(),
            "History reconstructed"
        );

        History {
            transactions,
            source,
            skipped,
            page_info,
        }
    }

    /// Fetch and decode a single signature.
    async fn decode_signature(
        &self,
        signature: &str,
        address: &str,
    ) -> Result<Transaction, SkipReason> {
        let detail = match self.source.get_transaction(signature).await {
            Ok(Some(detail)) => detail,
            Ok(None) => return Err(SkipReason::NotFound),
            Err(e) => return Err(SkipReason::FetchFailed(e.to_string())),
        };

        decode_transaction(signature, &detail, address, &self.config.native_token)
    }

    /// Degraded-mode result built from the synthetic dataset.
    ///
    /// `skipped` keeps whatever the live attempt left out.
    fn fallback(&self, reason: String, skipped: Vec<SkippedSignature>) -> History {
        let source = HistorySource::Fallback { reason };
        record_fallback();
        record_history_request(source.as_str());

        History {
            transactions: synthetic_transactions(Utc::now()),
            source,
            skipped,
            page_info: PageInfo::default(),
        }
    }
}

/// Why a live page produced nothing, e.g.
/// `all 2 listed signatures skipped (1 fetch_failed, 1 not_found)`.
fn skip_summary(skipped: &[SkippedSignature]) -> String {
    if skipped.is_empty() {
        return "no transactions found".to_string();
    }

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for s in skipped {
        *counts.entry(s.reason.tag()).or_default() += 1;
    }
    let detail = counts
        .iter()
        .map(|(tag, n)| format!("{n} {tag}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("all {} listed signatures skipped ({detail})", skipped.len())
}
