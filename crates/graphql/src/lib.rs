//! GraphQL API for Tally wallet history.
//!
//! Exposes reconstructed transaction history, ready for display: each
//! record carries its label, color class and explorer link.
//!
//! ```ignore
//! use tally_graphql::{build_schema, serve_with_shutdown, SchemaConfig, ServerConfig};
//!
//! let schema = build_schema(service, SchemaConfig::default());
//! serve_with_shutdown(schema, ServerConfig::default(), shutdown).await?;
//! ```

mod schema;
mod server;
mod types;

pub use schema::{
    HistoryQuery, MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH, TransactionHistory, TxFilter, TxType,
    build_schema,
};
pub use server::{ServerConfig, router, serve_with_shutdown};
pub use types::{SchemaConfig, SharedHistoryService, TallySchema};
