mod decode;
mod fallback;
mod history;

pub use decode::{SkipReason, decode_transaction};
pub use fallback::synthetic_transactions;
pub use history::{History, HistoryConfig, HistoryService, HistorySource, SkippedSignature};
