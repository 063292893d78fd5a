pub mod audit;
pub mod credential;
pub mod hierarchy;
pub mod ledger;
pub mod lifecycle;
pub mod store;
#[cfg(test)]
pub mod test_utils;

pub use hierarchy::Hierarchy;
pub use ledger::{Ledger, SettlementPolicy};
pub use lifecycle::Lifecycle;
pub use store::Store;
