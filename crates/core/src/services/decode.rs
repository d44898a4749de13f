//! Decoding of raw ledger transactions into history records.
//!
//! Decoding is a pure function of the transaction detail and the watched
//! address. Each signature yields either a [`Transaction`] or a
//! [`SkipReason`] explaining why it was left out.

use std::fmt;

use crate::models::{
    Transaction, TransactionStatus, TransactionType, balance_delta_sol, lamports_to_sol,
};
use crate::ports::{Participant, TransactionDetail};

/// Why a listed signature produced no history record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The detail request failed.
    FetchFailed(String),
    /// The node returned no transaction for the signature.
    NotFound,
    /// The transaction has no execution metadata.
    MissingMeta,
    /// The transaction has no block time.
    MissingBlockTime,
    /// The watched address's balance did not change.
    NoBalanceChange,
}

impl SkipReason {
    /// Short tag used as a metrics label.
    pub fn tag(&self) -> &'static str {
        match self {
            SkipReason::FetchFailed(_) => "fetch_failed",
            SkipReason::NotFound => "not_found",
            SkipReason::MissingMeta => "missing_meta",
            SkipReason::MissingBlockTime => "missing_block_time",
            SkipReason::NoBalanceChange => "no_balance_change",
        }
    }

    /// Whether the skip stems from a fetch or decode failure, as opposed
    /// to a transaction that simply did not move the watched balance.
    pub fn is_failure(&self) -> bool {
        !matches!(self, SkipReason::NoBalanceChange)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            SkipReason::NotFound => f.write_str("transaction not found"),
            SkipReason::MissingMeta => f.write_str("missing transaction metadata"),
            SkipReason::MissingBlockTime => f.write_str("missing block time"),
            SkipReason::NoBalanceChange => f.write_str("no balance change for watched address"),
        }
    }
}

/// Decode a transaction detail relative to `watched`.
///
/// The first participant matching `watched` decides the classification:
/// a positive delta is a receive, a negative one a send. A zero delta, or
/// no matching participant, is not evidence of involvement and the record
/// is dropped.
pub fn decode_transaction(
    signature: &str,
    detail: &TransactionDetail,
    watched: &str,
    token: &str,
) -> Result<Transaction, SkipReason> {
    let meta = detail.meta.as_ref().ok_or(SkipReason::MissingMeta)?;
    // A zero block time is the node's placeholder, not the epoch.
    let block_time = detail
        .block_time
        .filter(|t| *t != 0)
        .ok_or(SkipReason::MissingBlockTime)?;

    let participants = detail.participants();
    let watched_entry = participants
        .iter()
        .find(|p| p.address == watched)
        .ok_or(SkipReason::NoBalanceChange)?;

    let delta = balance_delta_sol(watched_entry.pre_balance, watched_entry.post_balance);
    if delta == 0.0 {
        return Err(SkipReason::NoBalanceChange);
    }

    let kind = if delta > 0.0 {
        TransactionType::Receive
    } else {
        TransactionType::Send
    };

    let counterparty = find_counterparty(&participants, watched, kind);
    let (from, to) = match kind {
        TransactionType::Receive => (counterparty, Some(watched.to_string())),
        _ => (Some(watched.to_string()), counterparty),
    };

    let status = if meta.error.as_ref().is_some_and(|e| !e.is_null()) {
        TransactionStatus::Failed
    } else {
        TransactionStatus::Success
    };

    Ok(Transaction {
        signature: signature.to_string(),
        timestamp: block_time.saturating_mul(1000),
        kind,
        status,
        amount: delta.abs(),
        token: token.to_string(),
        from,
        to,
        fee: lamports_to_sol(meta.fee),
        block_time: Some(block_time),
    })
}

/// Pick the account whose balance moved the most in the opposite direction.
fn find_counterparty(
    participants: &[Participant<'_>],
    watched: &str,
    kind: TransactionType,
) -> Option<String> {
    participants
        .iter()
        .filter(|p| p.address != watched)
        .filter_map(|p| {
            let moved = match kind {
                TransactionType::Send => p.post_balance.checked_sub(p.pre_balance),
                _ => p.pre_balance.checked_sub(p.post_balance),
            };
            moved.filter(|m| *m > 0).map(|m| (m, p.address))
        })
        // max_by_key keeps the last maximum; reverse so the first one wins
        .rev()
        .max_by_key(|(moved, _)| *moved)
        .map(|(_, address)| address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NATIVE_TOKEN;
    use crate::ports::TransactionMeta;
    use serde_json::json;

    const WATCHED: &str = "Watched1111111111111111111111111111111111111";
    const OTHER: &str = "Other22222222222222222222222222222222222222";

    fn detail(pre: Vec<u64>, post: Vec<u64>, keys: Vec<&str>) -> TransactionDetail {
        TransactionDetail {
            slot: 42,
            block_time: Some(1_700_000_000),
            account_keys: keys.into_iter().map(String::from).collect(),
            meta: Some(TransactionMeta {
                fee: 5000,
                error: None,
                pre_balances: pre,
                post_balances: post,
            }),
        }
    }

    #[test]
    fn decrease_is_send() {
        let d = detail(
            vec![2_000_000_000, 0],
            vec![1_500_000_000, 499_995_000],
            vec![WATCHED, OTHER],
        );
        let tx = decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN).unwrap();

        assert_eq!(tx.kind, TransactionType::Send);
        assert_eq!(tx.amount, 0.5);
        assert_eq!(tx.fee, 0.000005);
        assert_eq!(tx.status, TransactionStatus::Success);
        assert_eq!(tx.timestamp, 1_700_000_000_000);
        assert_eq!(tx.block_time, Some(1_700_000_000));
        assert_eq!(tx.from.as_deref(), Some(WATCHED));
        assert_eq!(tx.to.as_deref(), Some(OTHER));
    }

    #[test]
    fn increase_is_receive() {
        let d = detail(
            vec![3_000_000_000, 1_000_000_000],
            vec![2_499_995_000, 1_500_000_000],
            vec![OTHER, WATCHED],
        );
        let tx = decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN).unwrap();

        assert_eq!(tx.kind, TransactionType::Receive);
        assert_eq!(tx.amount, 0.5);
        assert!(tx.amount >= 0.0);
        assert_eq!(tx.from.as_deref(), Some(OTHER));
        assert_eq!(tx.to.as_deref(), Some(WATCHED));
    }

    #[test]
    fn zero_delta_is_dropped() {
        let d = detail(vec![1_000, 7], vec![1_000, 7], vec![WATCHED, OTHER]);
        assert_eq!(
            decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN),
            Err(SkipReason::NoBalanceChange)
        );
    }

    #[test]
    fn absent_address_is_dropped() {
        let d = detail(vec![10, 20], vec![5, 25], vec![OTHER, "Third"]);
        assert_eq!(
            decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN),
            Err(SkipReason::NoBalanceChange)
        );
    }

    #[test]
    fn first_match_wins() {
        // Adresse présente deux fois: seule la première entrée compte
        let d = detail(vec![100, 0], vec![50, 500], vec![WATCHED, WATCHED]);
        let tx = decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN).unwrap();
        assert_eq!(tx.kind, TransactionType::Send);
        assert_eq!(tx.amount, 50.0 / 1e9);
    }

    #[test]
    fn error_indicator_marks_failed() {
        let mut d = detail(vec![10_000], vec![5_000], vec![WATCHED]);
        d.meta.as_mut().unwrap().error = Some(json!({"InstructionError": [0, "Custom"]}));
        let tx = decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN).unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);

        // Un null JSON explicite n'est pas une erreur
        d.meta.as_mut().unwrap().error = Some(serde_json::Value::Null);
        let tx = decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN).unwrap();
        assert_eq!(tx.status, TransactionStatus::Success);
    }

    #[test]
    fn missing_meta_or_block_time_is_skipped() {
        let mut d = detail(vec![10], vec![5], vec![WATCHED]);
        d.block_time = None;
        assert_eq!(
            decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN),
            Err(SkipReason::MissingBlockTime)
        );

        let mut d = detail(vec![10], vec![5], vec![WATCHED]);
        d.block_time = Some(0);
        assert_eq!(
            decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN),
            Err(SkipReason::MissingBlockTime)
        );

        let mut d = detail(vec![10], vec![5], vec![WATCHED]);
        d.meta = None;
        assert_eq!(
            decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN),
            Err(SkipReason::MissingMeta)
        );
    }

    #[test]
    fn fee_only_send_has_no_counterparty() {
        let d = detail(vec![10_000, 1], vec![5_000, 1], vec![WATCHED, OTHER]);
        let tx = decode_transaction("S1", &d, WATCHED, NATIVE_TOKEN).unwrap();
        assert_eq!(tx.kind, TransactionType::Send);
        assert_eq!(tx.to, None);
    }

    #[test]
    fn skip_reason_tags() {
        assert!(SkipReason::NotFound.is_failure());
        assert!(!SkipReason::NoBalanceChange.is_failure());
        assert_eq!(SkipReason::FetchFailed("x".into()).tag(), "fetch_failed");
    }
}
