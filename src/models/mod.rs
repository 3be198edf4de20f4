pub mod account;
pub mod message;

pub use account::{Account, AccountSummary, NewAccount, ResetStatus};
pub use message::StoredMessage;
