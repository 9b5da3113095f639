//! Types that represent the core data model, such as `Transaction` and `Amount`.
mod amount;
mod summary;
mod transaction;

pub use amount::{Amount, AmountError};
pub use summary::Summary;
pub use transaction::{NewTransaction, Transaction, TransactionId};
