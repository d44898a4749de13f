//! JSON-RPC wire types and their conversion to port types.

use serde::Deserialize;
use serde_json::Value;

use tally_core::error::{LedgerError, LedgerResult};
use tally_core::ports::{SignatureInfo, TransactionDetail, TransactionMeta};

// =============================================================================
// Envelope
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    /// Unwrap the envelope. A missing `result` is returned as JSON `null`.
    pub fn into_result(self) -> LedgerResult<Value> {
        if let Some(error) = self.error {
            return Err(LedgerError::RpcError {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

// =============================================================================
// getSignaturesForAddress
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcSignatureInfo {
    pub signature: String,
    pub slot: u64,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub block_time: Option<i64>,
}

impl From<RpcSignatureInfo> for SignatureInfo {
    fn from(s: RpcSignatureInfo) -> Self {
        Self {
            signature: s.signature,
            slot: s.slot,
            block_time: s.block_time,
            error: s.err,
        }
    }
}

// =============================================================================
// getTransaction
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcTransaction {
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<RpcMeta>,
    pub transaction: RpcTransactionBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    #[serde(default)]
    pub loaded_addresses: Option<RpcLoadedAddresses>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RpcLoadedAddresses {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readonly: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcTransactionBody {
    pub message: RpcMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcMessage {
    pub account_keys: Vec<RpcAccountKey>,
}

/// `json` encoding lists bare keys, `jsonParsed` wraps them in objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RpcAccountKey {
    Plain(String),
    Parsed { pubkey: String },
}

impl RpcTransaction {
    /// Account keys in the order balances are reported.
    ///
    /// `jsonParsed` already includes lookup table entries in the key list;
    /// with `json` they are appended from `loadedAddresses`, writable first.
    fn account_keys(&self) -> Vec<String> {
        let keys = &self.transaction.message.account_keys;
        let parsed = keys.iter().all(|k| matches!(k, RpcAccountKey::Parsed { .. }));

        let mut out: Vec<String> = keys
            .iter()
            .map(|k| match k {
                RpcAccountKey::Plain(key) => key.clone(),
                RpcAccountKey::Parsed { pubkey } => pubkey.clone(),
            })
            .collect();

        if !parsed
            && let Some(loaded) = self.meta.as_ref().and_then(|m| m.loaded_addresses.as_ref())
        {
            out.extend(loaded.writable.iter().cloned());
            out.extend(loaded.readonly.iter().cloned());
        }

        out
    }

    pub fn into_detail(self) -> TransactionDetail {
        let account_keys = self.account_keys();
        TransactionDetail {
            slot: self.slot,
            block_time: self.block_time,
            account_keys,
            meta: self.meta.map(|m| TransactionMeta {
                fee: m.fee.unwrap_or(0),
                error: m.err,
                pre_balances: m.pre_balances,
                post_balances: m.post_balances,
            }),
        }
    }
}

// =============================================================================
// Decoding helpers
// =============================================================================

pub(crate) fn decode_signatures(value: Value) -> LedgerResult<Vec<SignatureInfo>> {
    let infos: Vec<RpcSignatureInfo> = serde_json::from_value(value)
        .map_err(|e| LedgerError::DecodeError(format!("signature list: {e}")))?;
    Ok(infos.into_iter().map(SignatureInfo::from).collect())
}

pub(crate) fn decode_transaction(value: Value) -> LedgerResult<Option<TransactionDetail>> {
    let tx: Option<RpcTransaction> = serde_json::from_value(value)
        .map_err(|e| LedgerError::DecodeError(format!("transaction: {e}")))?;
    Ok(tx.map(RpcTransaction::into_detail))
}

pub(crate) fn decode_slot(value: Value) -> LedgerResult<u64> {
    serde_json::from_value(value).map_err(|e| LedgerError::DecodeError(format!("slot: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_error_is_surfaced() {
        let resp: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32602, "message": "Invalid param: WrongSize"}
        }))
        .unwrap();

        match resp.into_result() {
            Err(LedgerError::RpcError { code, message }) => {
                assert_eq!(code, -32602);
                assert!(message.contains("WrongSize"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_null_result_means_unknown_transaction() {
        let resp: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        let value = resp.into_result().unwrap();
        assert_eq!(decode_transaction(value).unwrap(), None);
    }

    #[test]
    fn test_decode_signature_listing() {
        let sigs = decode_signatures(json!([
            {
                "signature": "5h6xBEauJ3PK6SWCZ1PGjBvj8vDdWG3KpwATGy1ARAXFSDwt8GFXM7W5Ncn16wmqokgpiKRLuS83KUxyZyv2sUYv",
                "slot": 114,
                "err": null,
                "memo": null,
                "blockTime": null,
                "confirmationStatus": "finalized"
            },
            {
                "signature": "2nBhEBYYvfaAe16UMNqRHre4YNSskvuYgx3M6E4JP1oDYvZEJHvoPzyUidNgNX5r9sTyN1J9UxtbCXy2rqYcuyuv",
                "slot": 113,
                "err": {"InstructionError": [0, {"Custom": 1}]},
                "blockTime": 1700000000
            }
        ]))
        .unwrap();

        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[0].slot, 114);
        assert_eq!(sigs[0].error, None);
        assert_eq!(sigs[0].block_time, None);
        assert!(sigs[1].error.is_some());
        assert_eq!(sigs[1].block_time, Some(1_700_000_000));
    }

    #[test]
    fn test_decode_json_parsed_transaction() {
        let detail = decode_transaction(json!({
            "slot": 430,
            "blockTime": 1700000000,
            "meta": {
                "err": null,
                "fee": 5000,
                "preBalances": [2000000000, 0, 1],
                "postBalances": [1499995000, 500000000, 1],
                "loadedAddresses": {"writable": [], "readonly": []}
            },
            "transaction": {
                "message": {
                    "accountKeys": [
                        {"pubkey": "Sender1111", "signer": true, "writable": true, "source": "transaction"},
                        {"pubkey": "Recipient2222", "signer": false, "writable": true, "source": "transaction"},
                        {"pubkey": "11111111111111111111111111111111", "signer": false, "writable": false, "source": "transaction"}
                    ]
                },
                "signatures": ["abc"]
            }
        }))
        .unwrap()
        .unwrap();

        assert_eq!(detail.slot, 430);
        assert_eq!(detail.block_time, Some(1_700_000_000));
        assert_eq!(detail.account_keys[1], "Recipient2222");
        let meta = detail.meta.as_ref().unwrap();
        assert_eq!(meta.fee, 5000);
        assert_eq!(meta.error, None);
        assert_eq!(detail.participants()[0].post_balance, 1_499_995_000);
    }

    #[test]
    fn test_json_encoding_appends_loaded_addresses() {
        let detail = decode_transaction(json!({
            "slot": 1,
            "blockTime": null,
            "meta": {
                "err": null,
                "fee": 5000,
                "preBalances": [10, 20, 30, 40],
                "postBalances": [5, 25, 30, 40],
                "loadedAddresses": {"writable": ["LutW"], "readonly": ["LutR"]}
            },
            "transaction": {
                "message": {"accountKeys": ["A", "B"]},
                "signatures": ["abc"]
            }
        }))
        .unwrap()
        .unwrap();

        assert_eq!(detail.account_keys, vec!["A", "B", "LutW", "LutR"]);
        assert_eq!(detail.block_time, None);
    }

    #[test]
    fn test_missing_meta_and_fee_are_tolerated() {
        let detail = decode_transaction(json!({
            "slot": 1,
            "meta": null,
            "transaction": {"message": {"accountKeys": ["A"]}}
        }))
        .unwrap()
        .unwrap();
        assert!(detail.meta.is_none());

        let detail = decode_transaction(json!({
            "slot": 1,
            "meta": {"preBalances": [1], "postBalances": [2]},
            "transaction": {"message": {"accountKeys": ["A"]}}
        }))
        .unwrap()
        .unwrap();
        assert_eq!(detail.meta.unwrap().fee, 0);
    }

    #[test]
    fn test_malformed_payload_is_decode_error() {
        assert!(matches!(
            decode_signatures(json!({"not": "a list"})),
            Err(LedgerError::DecodeError(_))
        ));
        assert!(matches!(decode_slot(json!("x")), Err(LedgerError::DecodeError(_))));
        assert_eq!(decode_slot(json!(12345)).unwrap(), 12345);
    }
}
