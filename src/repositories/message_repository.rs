use crate::models::StoredMessage;
use crate::repositories::account_repository::RepositoryResult;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Append-only store of conversation turns. Each append is a single atomic
/// insert; two concurrent appends for the same account never interleave.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, account_id: &str, sender: &str, content: &str)
        -> RepositoryResult<()>;
    async fn load_ordered(&self, account_id: &str) -> RepositoryResult<Vec<StoredMessage>>;
}

pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn append(
        &self,
        account_id: &str,
        sender: &str,
        content: &str,
    ) -> RepositoryResult<()> {
        sqlx::query("INSERT INTO messages (account_id, sender, content) VALUES (?, ?, ?)")
            .bind(account_id)
            .bind(sender)
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_ordered(&self, account_id: &str) -> RepositoryResult<Vec<StoredMessage>> {
        // The rowid tiebreak keeps insertion order when the store lacks
        // sub-second timestamp resolution.
        let messages = sqlx::query_as::<_, StoredMessage>(
            "SELECT account_id, sender, content, timestamp FROM messages \
             WHERE account_id = ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}
