pub mod account;
pub mod activity_log;
pub mod referral_transaction;
pub mod role_counter;
pub mod transaction;

pub use account::{IdList, Role};
#[allow(unused_imports)]
pub use referral_transaction::ReferralStatus;
#[allow(unused_imports)]
pub use transaction::{TransactionType, TxStatus};
