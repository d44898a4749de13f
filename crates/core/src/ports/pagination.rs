//! Pagination types for history queries.
//!
//! History is paged backwards in time with a `before` cursor, the way
//! ledger nodes page signature listings. The cursor is the signature of
//! the oldest transaction listed on the previous page.

/// Default number of signatures considered per request.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Largest page a node will list in one request.
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// Opaque cursor for pagination.
///
/// Clients should treat the value as an opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub value: String,
}

/// A history request for one watched address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Watched address.
    pub address: String,
    /// Number of signatures to consider (clamped to `1..=MAX_HISTORY_LIMIT`).
    pub limit: usize,
    /// Resume after this cursor (older transactions only).
    pub before: Option<Cursor>,
}

impl HistoryRequest {
    /// First page with the default limit.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            limit: DEFAULT_HISTORY_LIMIT,
            before: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn before(mut self, cursor: Option<Cursor>) -> Self {
        self.before = cursor;
        self
    }

    /// Limit clamped to what a node accepts.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_HISTORY_LIMIT)
    }
}

/// Information about the current page of a history result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageInfo {
    /// Whether older signatures may exist past this page.
    pub has_next_page: bool,
    /// Cursor of the last listed signature, to request the next page.
    pub end_cursor: Option<Cursor>,
}
