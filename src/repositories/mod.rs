pub mod account_repository;
pub mod message_repository;

pub use account_repository::{AccountRepository, RepositoryError, SqliteAccountRepository};
pub use message_repository::{MessageRepository, SqliteMessageRepository};
