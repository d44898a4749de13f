mod ledger_source;
mod pagination;

pub use ledger_source::*;
pub use pagination::*;
