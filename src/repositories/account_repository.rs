use crate::models::{Account, NewAccount, ResetStatus};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Account not found")]
    NotFound,
    #[error("Account already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

const ACCOUNT_COLUMNS: &str = "user_uuid, email, password_hash, first_name, last_name, birthdate, \
     is_verified, verification_token, verification_expiration, \
     reset_token, reset_expiration, reset_status, created_at";

/// Raw account CRUD plus the conditional updates the token lifecycle and
/// reset state machine rely on. Every method runs a single statement (or one
/// transaction for the sweep); no connection is held across calls.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AccountRepository: Send + Sync {
    async fn create_account(&self, account: &NewAccount) -> RepositoryResult<Account>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>>;
    async fn find_by_uuid(&self, user_uuid: &str) -> RepositoryResult<Option<Account>>;
    async fn find_by_verification_token(&self, token: &str)
        -> RepositoryResult<Option<Account>>;
    async fn update_password(&self, user_uuid: &str, password_hash: &str)
        -> RepositoryResult<()>;
    async fn set_verification_token(
        &self,
        user_uuid: &str,
        token: &str,
        expires_at: &str,
    ) -> RepositoryResult<()>;
    /// Marks the account verified and clears the token pair, keyed on the
    /// token itself so a replay matches zero rows. Returns whether a row
    /// was updated.
    async fn mark_verified(&self, token: &str) -> RepositoryResult<bool>;
    /// Check-then-set evaluated atomically by the store: the row is matched
    /// only when no live pending reset exists. Returns whether a row was
    /// updated.
    async fn try_issue_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: &str,
        now: &str,
    ) -> RepositoryResult<bool>;
    async fn reset_status(&self, email: &str) -> RepositoryResult<Option<ResetStatus>>;
    /// The external approver's write: resolves the request to a terminal
    /// status and clears the token pair.
    async fn resolve_reset(&self, email: &str, status: ResetStatus) -> RepositoryResult<()>;
    /// Stores the new hash, clears the token pair and returns the status to
    /// NONE in one statement, matched only while the request is APPROVED.
    /// Returns whether a row was updated; on zero rows the approval (if any)
    /// is left intact so the flow can be retried.
    async fn finalize_reset(&self, email: &str, password_hash: &str) -> RepositoryResult<bool>;
    async fn delete_account(&self, user_uuid: &str) -> RepositoryResult<()>;
    /// Storage-hygiene sweep, one transaction: drop unverified accounts whose
    /// verification window lapsed before `unverified_cutoff`, clear leftover
    /// verification data on verified accounts, and mark pending resets that
    /// expired before `reset_cutoff` as EXPIRED.
    async fn sweep_expired(
        &self,
        now: &str,
        unverified_cutoff: &str,
        reset_cutoff: &str,
    ) -> RepositoryResult<()>;
}

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create_account(&self, account: &NewAccount) -> RepositoryResult<Account> {
        let result = sqlx::query(
            "INSERT INTO accounts (user_uuid, email, password_hash, first_name, last_name, birthdate) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.user_uuid)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.birthdate)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => self
                .find_by_uuid(&account.user_uuid)
                .await?
                .ok_or(RepositoryError::NotFound),
            Err(e) => {
                if e.to_string().contains("UNIQUE") {
                    Err(RepositoryError::AlreadyExists)
                } else {
                    Err(RepositoryError::Database(e))
                }
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_uuid(&self, user_uuid: &str) -> RepositoryResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_uuid = ?");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(user_uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> RepositoryResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE verification_token = ?");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn update_password(
        &self,
        user_uuid: &str,
        password_hash: &str,
    ) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE accounts SET password_hash = ? WHERE user_uuid = ?")
            .bind(password_hash)
            .bind(user_uuid)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_verification_token(
        &self,
        user_uuid: &str,
        token: &str,
        expires_at: &str,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET verification_token = ?, verification_expiration = ? \
             WHERE user_uuid = ?",
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_uuid)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_verified(&self, token: &str) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET is_verified = 1, verification_token = NULL, \
             verification_expiration = NULL WHERE verification_token = ?",
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_issue_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: &str,
        now: &str,
    ) -> RepositoryResult<bool> {
        // A stale pending request (expiration in the past) no longer blocks
        // a fresh issue.
        let result = sqlx::query(
            "UPDATE accounts \
             SET reset_token = ?, reset_expiration = ?, reset_status = 'PENDING' \
             WHERE email = ? \
               AND (reset_status != 'PENDING' \
                    OR reset_expiration IS NULL \
                    OR reset_expiration < ?)",
        )
        .bind(token)
        .bind(expires_at)
        .bind(email)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reset_status(&self, email: &str) -> RepositoryResult<Option<ResetStatus>> {
        let status = sqlx::query_scalar::<_, ResetStatus>(
            "SELECT reset_status FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    async fn resolve_reset(&self, email: &str, status: ResetStatus) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET reset_status = ?, reset_token = NULL, reset_expiration = NULL \
             WHERE email = ?",
        )
        .bind(status.as_str())
        .bind(email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn finalize_reset(&self, email: &str, password_hash: &str) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE accounts \
             SET password_hash = ?, reset_token = NULL, reset_expiration = NULL, \
                 reset_status = 'NONE' \
             WHERE email = ? AND reset_status = 'APPROVED'",
        )
        .bind(password_hash)
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_account(&self, user_uuid: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE user_uuid = ?")
            .bind(user_uuid)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn sweep_expired(
        &self,
        now: &str,
        unverified_cutoff: &str,
        reset_cutoff: &str,
    ) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM accounts \
             WHERE is_verified = 0 AND verification_expiration < ?",
        )
        .bind(unverified_cutoff)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE accounts \
             SET verification_token = NULL, verification_expiration = NULL \
             WHERE is_verified = 1 \
               AND (verification_expiration < ? OR verification_token IS NOT NULL)",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE accounts \
             SET reset_token = NULL, reset_expiration = NULL, reset_status = 'EXPIRED' \
             WHERE reset_status = 'PENDING' AND reset_expiration < ?",
        )
        .bind(reset_cutoff)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
