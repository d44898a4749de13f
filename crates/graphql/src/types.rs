//! GraphQL type definitions.

use std::sync::Arc;

use async_graphql::{EmptyMutation, EmptySubscription, Schema};
use tally_core::models::Cluster;
use tally_core::ports::{DEFAULT_HISTORY_LIMIT, LedgerSource};
use tally_core::services::HistoryService;

use crate::schema::HistoryQuery;

/// The Tally GraphQL schema type.
pub type TallySchema = Schema<HistoryQuery, EmptyMutation, EmptySubscription>;

/// History service shared by every resolver, behind any ledger source.
pub type SharedHistoryService = Arc<HistoryService<dyn LedgerSource>>;

/// Settings shared by resolvers.
#[derive(Debug, Clone, Copy)]
pub struct SchemaConfig {
    /// Block explorer used for `explorerUrl`.
    pub cluster: Cluster,
    /// Page size when `first` is omitted.
    pub default_page_size: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::Devnet,
            default_page_size: DEFAULT_HISTORY_LIMIT,
        }
    }
}
