mod tracked_transaction;
mod transaction_kind;
mod transaction_status;

pub use tracked_transaction::*;
pub use transaction_kind::*;
pub use transaction_status::*;
