//! Synthetic history served when the ledger node cannot be listed.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Transaction, TransactionStatus, TransactionType};

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

struct Template {
    signature: &'static str,
    age_ms: i64,
    kind: TransactionType,
    status: TransactionStatus,
    amount: f64,
    token: &'static str,
    from: &'static str,
    to: &'static str,
    fee: f64,
}

const TEMPLATES: [Template; 5] = [
    Template {
        signature: "5j7s8K9mN2pQ3rT4uV6wX7yZ8aB1cD2eF3gH4iJ5kL6mN7oP8qR9sT0uV1wX2yZ3",
        age_ms: HOUR_MS,
        kind: TransactionType::Send,
        status: TransactionStatus::Success,
        amount: 0.5,
        token: "SOL",
        from: "11111111111111111111111111111112",
        to: "22222222222222222222222222222223",
        fee: 0.000005,
    },
    Template {
        signature: "4i6r7K8mL1nO2pP3qR4sS5tT6uU7vV8wW9xX0yY1zZ2aA3bB4cC5dD6eE7fF8gG9",
        age_ms: 2 * HOUR_MS,
        kind: TransactionType::Receive,
        status: TransactionStatus::Success,
        amount: 1.25,
        token: "SOL",
        from: "33333333333333333333333333333334",
        to: "11111111111111111111111111111112",
        fee: 0.000005,
    },
    Template {
        signature: "3h5q6J7kK8lL9mM0nN1oO2pP3qQ4rR5sS6tT7uU8vV9wW0xX1yY2zZ3aA4bB5cC6",
        age_ms: DAY_MS,
        kind: TransactionType::Send,
        status: TransactionStatus::Success,
        amount: 100.0,
        token: "USDC",
        from: "11111111111111111111111111111112",
        to: "44444444444444444444444444444445",
        fee: 0.000005,
    },
    Template {
        signature: "2g4p5I6jJ7kK8lL9mM0nN1oO2pP3qQ4rR5sS6tT7uU8vV9wW0xX1yY2zZ3aA4bB5",
        age_ms: 2 * DAY_MS,
        kind: TransactionType::Swap,
        status: TransactionStatus::Success,
        amount: 50.0,
        token: "RAY",
        from: "11111111111111111111111111111112",
        to: "11111111111111111111111111111112",
        fee: 0.000025,
    },
    Template {
        signature: "1f3o4H5iI6jJ7kK8lL9mM0nN1oO2pP3qQ4rR5sS6tT7uU8vV9wW0xX1yY2zZ3aA4",
        age_ms: 3 * DAY_MS,
        kind: TransactionType::Send,
        status: TransactionStatus::Failed,
        amount: 0.1,
        token: "SOL",
        from: "11111111111111111111111111111112",
        to: "55555555555555555555555555555556",
        fee: 0.000005,
    },
];

/// The fixed five-item example history, timestamped relative to `now`.
///
/// Newest first, like a live listing.
pub fn synthetic_transactions(now: DateTime<Utc>) -> Vec<Transaction> {
    TEMPLATES
        .iter()
        .map(|t| {
            let at = now - Duration::milliseconds(t.age_ms);
            let timestamp = at.timestamp_millis();
            Transaction {
                signature: t.signature.to_string(),
                timestamp,
                kind: t.kind,
                status: t.status,
                amount: t.amount,
                token: t.token.to_string(),
                from: Some(t.from.to_string()),
                to: Some(t.to.to_string()),
                fee: t.fee,
                block_time: Some(timestamp.div_euclid(1000)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_is_fixed() {
        let txs = synthetic_transactions(Utc::now());

        let kinds: Vec<_> = txs.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionType::Send,
                TransactionType::Receive,
                TransactionType::Send,
                TransactionType::Swap,
                TransactionType::Send,
            ]
        );

        let statuses: Vec<_> = txs.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![
                TransactionStatus::Success,
                TransactionStatus::Success,
                TransactionStatus::Success,
                TransactionStatus::Success,
                TransactionStatus::Failed,
            ]
        );
    }

    #[test]
    fn timestamps_are_relative_to_now() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let txs = synthetic_transactions(now);

        assert_eq!(txs[0].timestamp, 1_700_000_000_000 - HOUR_MS);
        assert_eq!(txs[4].timestamp, 1_700_000_000_000 - 3 * DAY_MS);
        assert_eq!(txs[0].block_time, Some(1_700_000_000 - 3600));
        // Plus récent en premier
        assert!(txs.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn amounts_and_fees_are_non_negative() {
        for tx in synthetic_transactions(Utc::now()) {
            assert!(tx.amount >= 0.0);
            assert!(tx.fee >= 0.0);
        }
    }
}
