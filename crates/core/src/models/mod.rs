//! Domain models representing reconstructed wallet history.
//!
//! These models are transport-agnostic and represent the canonical form
//! of a transaction as the dashboard displays it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

// =============================================================================
// Units
// =============================================================================

/// Minor units (lamports) per major unit (SOL).
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Symbol of the native asset.
pub const NATIVE_TOKEN: &str = "SOL";

/// Convert an amount in minor units to major units.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Signed balance change `post - pre`, in major units.
pub fn balance_delta_sol(pre: u64, post: u64) -> f64 {
    let delta = i128::from(post) - i128::from(pre);
    delta as f64 / LAMPORTS_PER_SOL as f64
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Semantic kind of a transaction, relative to the watched address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Send,
    Receive,
    Swap,
    Stake,
    #[default]
    Unknown,
}

impl TransactionType {
    /// Every variant, in display order.
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Send,
        TransactionType::Receive,
        TransactionType::Swap,
        TransactionType::Stake,
        TransactionType::Unknown,
    ];

    /// Wire name (`"send"`, `"receive"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Send => "send",
            TransactionType::Receive => "receive",
            TransactionType::Swap => "swap",
            TransactionType::Stake => "stake",
            TransactionType::Unknown => "unknown",
        }
    }

    /// Human-readable label shown in the history list.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Send => "Sent",
            TransactionType::Receive => "Received",
            TransactionType::Swap => "Swapped",
            TransactionType::Stake => "Staked",
            TransactionType::Unknown => "Unknown",
        }
    }

    /// Semantic color tag used by the presentation layer.
    pub fn color(&self) -> &'static str {
        match self {
            TransactionType::Send => "text-destructive",
            TransactionType::Receive => "text-accent",
            TransactionType::Swap => "text-chart-1",
            TransactionType::Stake => "text-primary",
            TransactionType::Unknown => "text-muted-foreground",
        }
    }

    /// Parse any string, mapping unrecognized input to [`TransactionType::Unknown`].
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(TransactionType::Unknown)
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "send" => Ok(TransactionType::Send),
            "receive" => Ok(TransactionType::Receive),
            "swap" => Ok(TransactionType::Swap),
            "stake" => Ok(TransactionType::Stake),
            "unknown" => Ok(TransactionType::Unknown),
            _ => Err(DomainError::UnknownTransactionType(s.to_string())),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display label for a transaction type.
pub fn format_transaction_type(kind: TransactionType) -> &'static str {
    kind.label()
}

/// Display label for an untyped value; unrecognized input yields `"Unknown"`.
pub fn format_transaction_type_str(kind: &str) -> &'static str {
    TransactionType::parse_lenient(kind).label()
}

/// Color tag for a transaction type.
pub fn transaction_type_color(kind: TransactionType) -> &'static str {
    kind.color()
}

/// Color tag for an untyped value; unrecognized input yields the muted tag.
pub fn transaction_type_color_str(kind: &str) -> &'static str {
    TransactionType::parse_lenient(kind).color()
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Execution status of a transaction.
///
/// `Pending` is never produced by the history pipeline, which only sees
/// transactions the node already executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A normalized transaction, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Ledger transaction signature.
    pub signature: String,
    /// Block time in milliseconds since epoch.
    pub timestamp: i64,
    /// Kind of transaction relative to the watched address.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Execution status.
    pub status: TransactionStatus,
    /// Magnitude of the balance change, in major units. Never negative.
    pub amount: f64,
    /// Symbol of the asset moved.
    pub token: String,
    /// Sending counterparty, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Receiving counterparty, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Network fee, in major units.
    pub fee: f64,
    /// Raw ledger block time in seconds.
    pub block_time: Option<i64>,
}

impl Transaction {
    /// Block time as a UTC datetime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Sign shown in front of the amount.
    pub fn amount_prefix(&self) -> &'static str {
        match self.kind {
            TransactionType::Send => "-",
            TransactionType::Receive => "+",
            TransactionType::Swap | TransactionType::Stake | TransactionType::Unknown => "",
        }
    }

    /// Amount with sign and symbol, e.g. `-0.5000 SOL`.
    pub fn display_amount(&self) -> String {
        format!("{}{:.4} {}", self.amount_prefix(), self.amount, self.token)
    }

    /// The other side of the transfer, from the watched address's point of view.
    pub fn counterparty(&self) -> Option<&str> {
        match self.kind {
            TransactionType::Send => self.to.as_deref(),
            TransactionType::Receive => self.from.as_deref(),
            _ => None,
        }
    }

    /// One-line summary of the other side for list views: `To: abcd...wxyz`
    /// for sends, `From: ...` for receives, `Internal transaction` otherwise.
    /// `None` when neither address is known.
    pub fn counterparty_line(&self) -> Option<String> {
        if self.from.is_none() && self.to.is_none() {
            return None;
        }
        Some(match self.kind {
            TransactionType::Send => format!("To: {}", short_address(self.to.as_deref().unwrap_or(""))),
            TransactionType::Receive => {
                format!("From: {}", short_address(self.from.as_deref().unwrap_or("")))
            }
            _ => "Internal transaction".to_string(),
        })
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Type filter applied by consumers of the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionFilter {
    #[default]
    All,
    Type(TransactionType),
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Type(kind) => tx.kind == *kind,
        }
    }

    /// Keep matching transactions, preserving order.
    pub fn apply(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        transactions.into_iter().filter(|tx| self.matches(tx)).collect()
    }
}

// =============================================================================
// Display Helpers
// =============================================================================

/// Shorten an address to `abcd...wxyz`; empty input yields `"Unknown"`.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.is_empty() {
        return "Unknown".to_string();
    }
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Solana cluster, used to build block explorer links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cluster {
    Mainnet,
    #[default]
    Devnet,
    Testnet,
}

impl Cluster {
    /// Explorer URL for a transaction signature.
    pub fn explorer_url(&self, signature: &str) -> String {
        match self {
            Cluster::Mainnet => format!("https://explorer.solana.com/tx/{signature}"),
            Cluster::Devnet => format!("https://explorer.solana.com/tx/{signature}?cluster=devnet"),
            Cluster::Testnet => {
                format!("https://explorer.solana.com/tx/{signature}?cluster=testnet")
            }
        }
    }
}

impl FromStr for Cluster {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            _ => Err(DomainError::ValidationError(format!(
                "Invalid cluster '{}'. Use 'mainnet', 'devnet' or 'testnet'.",
                s
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
