use crate::error::{CoreError, CoreResult};
use crate::models::ResetStatus;
use crate::repositories::account_repository::{AccountRepository, RepositoryError};
use crate::services::credential_service::CredentialService;
use crate::services::notification_service::NotificationService;
use crate::services::token_service::TokenService;
use std::sync::Arc;
use std::time::Duration;

/// Reference polling interval for callers waiting on a reset resolution.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Drives the NONE -> PENDING -> APPROVED/REJECTED -> NONE lifecycle of a
/// password-reset request. The approval itself comes from an external actor;
/// the core only observes it by polling the stored status.
pub struct ResetService {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<TokenService>,
    credentials: Arc<CredentialService>,
    notifier: Arc<dyn NotificationService>,
}

impl ResetService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: Arc<TokenService>,
        credentials: Arc<CredentialService>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            accounts,
            tokens,
            credentials,
            notifier,
        }
    }

    /// NONE -> PENDING. Mints a reset token and notifies the user. The
    /// notification is fire-and-forget: a failure is logged, not retried,
    /// and does not undo the token issuance.
    pub async fn request_reset(&self, email: &str) -> CoreResult<String> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(CoreError::NotFound)?;

        if !account.is_verified {
            return Err(CoreError::NotVerified);
        }

        let token = self.tokens.issue_reset_token(email).await?;

        if let Err(e) = self
            .notifier
            .send_reset_password(email, &account.first_name, &token)
            .await
        {
            tracing::warn!(email, error = %e, "reset notification dispatch failed");
        }

        Ok(token)
    }

    /// Reports the stored status as-is; unknown emails get a distinct
    /// `NotFound` so the polling logic is never left guessing.
    pub async fn check_status(&self, email: &str) -> CoreResult<ResetStatus> {
        self.accounts
            .reset_status(email)
            .await?
            .ok_or(CoreError::NotFound)
    }

    /// Caller-owned polling loop. Returns on the first terminal status, or
    /// returns the last observed status once `timeout` elapses, leaving the
    /// stored state untouched. Cancellation is cooperative: drop the future.
    pub async fn poll_until_resolved(
        &self,
        email: &str,
        interval: Duration,
        timeout: Duration,
    ) -> CoreResult<ResetStatus> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let status = self.check_status(email).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(status);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// PENDING -> APPROVED, written on behalf of the external approver.
    pub async fn approve(&self, email: &str) -> CoreResult<()> {
        self.resolve(email, ResetStatus::Approved).await
    }

    /// PENDING -> REJECTED, the requester cancelling.
    pub async fn reject(&self, email: &str) -> CoreResult<()> {
        self.resolve(email, ResetStatus::Rejected).await
    }

    async fn resolve(&self, email: &str, status: ResetStatus) -> CoreResult<()> {
        match self.accounts.resolve_reset(email, status).await {
            Ok(()) => {
                tracing::info!(email, status = %status, "reset request resolved");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(CoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// APPROVED -> NONE together with the password replacement, presented as
    /// one logical step: the conditional update either stores the new hash
    /// and returns the status to NONE, or matches nothing and leaves any
    /// approval intact so the flow can be retried.
    pub async fn finalize_reset(&self, email: &str, new_password: &str) -> CoreResult<()> {
        if new_password.len() < 6 {
            return Err(CoreError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }

        let password_hash = self.credentials.hash_password(new_password)?;

        if !self.accounts.finalize_reset(email, &password_hash).await? {
            return Err(CoreError::NotFound);
        }

        tracing::info!(email, "password reset finalized");
        Ok(())
    }
}
