//! Solana JSON-RPC client.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument, trace};

use tally_core::error::{DomainError, LedgerError, LedgerResult};
use tally_core::metrics::record_rpc_error;
use tally_core::ports::{LedgerSource, SignatureInfo, SignatureQuery, TransactionDetail};

use crate::rpc::{RpcResponse, decode_signatures, decode_slot, decode_transaction};

/// Commitment level requested from the node.
///
/// `getTransaction` does not accept `processed`, so it is not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Commitment {
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            _ => Err(DomainError::ValidationError(format!(
                "Invalid commitment '{}'. Use 'confirmed' or 'finalized'.",
                s
            ))),
        }
    }
}

/// Configuration for the Solana client.
#[derive(Debug, Clone)]
pub struct SolanaClientConfig {
    /// HTTP JSON-RPC endpoint (e.g., "https://api.devnet.solana.com").
    pub rpc_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Commitment level for every request.
    pub commitment: Commitment,
}

impl Default for SolanaClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            timeout: Duration::from_secs(30),
            commitment: Commitment::Confirmed,
        }
    }
}

/// Solana client adapter implementing the LedgerSource port.
pub struct SolanaRpcClient {
    config: SolanaClientConfig,
    http: Client,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    /// Build a client. No request is sent until the first call.
    pub fn new(config: SolanaClientConfig) -> LedgerResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LedgerError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            config,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one JSON-RPC request and unwrap its result.
    async fn call(&self, method: &str, params: Value) -> LedgerResult<Value> {
        let result = self.send(method, params).await;
        if result.is_err() {
            record_rpc_error(method);
        }
        result
    }

    async fn send(&self, method: &str, params: Value) -> LedgerResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        trace!(method, id, "RPC request");

        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Http(format!("{method} returned HTTP {status}")));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::DecodeError(format!("{method} response: {e}")))?;

        body.into_result()
    }
}

/// Classify a transport failure.
fn map_transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout(e.to_string())
    } else if e.is_connect() {
        LedgerError::ConnectionFailed(e.to_string())
    } else {
        LedgerError::Http(e.to_string())
    }
}

/// Params for `getSignaturesForAddress`.
fn signatures_params(address: &str, query: &SignatureQuery, commitment: Commitment) -> Value {
    let mut options = json!({
        "limit": query.limit,
        "commitment": commitment.as_str(),
    });
    if let Some(before) = &query.before {
        options["before"] = json!(before);
    }
    json!([address, options])
}

/// Params for `getTransaction`.
fn transaction_params(signature: &str, commitment: Commitment) -> Value {
    json!([
        signature,
        {
            "encoding": "jsonParsed",
            "maxSupportedTransactionVersion": 0,
            "commitment": commitment.as_str(),
        }
    ])
}

#[async_trait]
impl LedgerSource for SolanaRpcClient {
    #[instrument(skip(self, query), fields(limit = query.limit))]
    async fn list_signatures(
        &self,
        address: &str,
        query: &SignatureQuery,
    ) -> LedgerResult<Vec<SignatureInfo>> {
        let params = signatures_params(address, query, self.config.commitment);
        let result = self.call("getSignaturesForAddress", params).await?;
        let signatures = decode_signatures(result)?;
        debug!(count = signatures.len(), "Signatures fetched");
        Ok(signatures)
    }

    #[instrument(skip(self))]
    async fn get_transaction(&self, signature: &str) -> LedgerResult<Option<TransactionDetail>> {
        let params = transaction_params(signature, self.config.commitment);
        let result = self.call("getTransaction", params).await?;
        decode_transaction(result)
    }

    async fn current_slot(&self) -> LedgerResult<u64> {
        let params = json!([{ "commitment": self.config.commitment.as_str() }]);
        let result = self.call("getSlot", params).await?;
        decode_slot(result)
    }
}
