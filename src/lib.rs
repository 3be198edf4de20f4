pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod wire;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use error::{CoreError, CoreResult};
use models::{Account, AccountSummary, ResetStatus, StoredMessage};
use repositories::{SqliteAccountRepository, SqliteMessageRepository};
use services::{
    chat_service::ChatService,
    credential_service::{CredentialService, RegisterRequest},
    inference_client::{HttpInferenceClient, InferenceClient},
    notification_service::{HttpNotificationService, NotificationService},
    reset_service::ResetService,
    token_service::TokenService,
};

/// The function-call boundary the presentation layer talks to. Owns the
/// service graph; holds no account or message state of its own beyond a
/// single request's scope.
#[derive(Clone)]
pub struct ChatCore {
    credential_service: Arc<CredentialService>,
    token_service: Arc<TokenService>,
    reset_service: Arc<ResetService>,
    chat_service: Arc<ChatService>,
    notifier: Arc<dyn NotificationService>,
}

impl ChatCore {
    /// Wires the core over HTTP collaborators rooted at `base_url`
    /// (inference at `/ask`, notifications at `/send-activation` and
    /// `/send-reset-password`).
    pub fn new(pool: sqlx::SqlitePool, base_url: &str) -> Self {
        Self::with_collaborators(
            pool,
            Arc::new(HttpInferenceClient::new(base_url)),
            Arc::new(HttpNotificationService::new(base_url)),
        )
    }

    /// Same wiring with the collaborators injected, for tests and for future
    /// non-HTTP implementations.
    pub fn with_collaborators(
        pool: sqlx::SqlitePool,
        inference: Arc<dyn InferenceClient>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        let accounts = Arc::new(SqliteAccountRepository::new(pool.clone()));
        let messages = Arc::new(SqliteMessageRepository::new(pool));

        let credential_service = Arc::new(CredentialService::new(accounts.clone()));
        let token_service = Arc::new(TokenService::new(accounts.clone()));
        let reset_service = Arc::new(ResetService::new(
            accounts,
            token_service.clone(),
            credential_service.clone(),
            notifier.clone(),
        ));
        let chat_service = Arc::new(ChatService::new(messages, inference));

        Self {
            credential_service,
            token_service,
            reset_service,
            chat_service,
            notifier,
        }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<AccountSummary> {
        self.credential_service.authenticate(email, password).await
    }

    /// Creates the account, issues its verification token and dispatches the
    /// activation notification (fire-and-forget).
    pub async fn register(&self, request: RegisterRequest) -> CoreResult<Account> {
        let account = self.credential_service.register(request).await?;
        let token = self
            .token_service
            .issue_verification_token(&account.user_uuid)
            .await?;

        if let Err(e) = self
            .notifier
            .send_activation(&account.email, &account.first_name, &token)
            .await
        {
            tracing::warn!(email = %account.email, error = %e, "activation dispatch failed");
        }

        Ok(account)
    }

    /// Re-issues the verification token for an existing unverified account,
    /// overwriting the previous one, and dispatches a fresh activation link.
    pub async fn resend_activation(&self, email: &str) -> CoreResult<()> {
        let account = self
            .credential_service
            .find_by_email(email)
            .await?
            .ok_or(CoreError::NotFound)?;

        if account.is_verified {
            return Err(CoreError::Validation(
                "account is already verified".to_string(),
            ));
        }

        let token = self
            .token_service
            .issue_verification_token(&account.user_uuid)
            .await?;

        if let Err(e) = self
            .notifier
            .send_activation(&account.email, &account.first_name, &token)
            .await
        {
            tracing::warn!(email = %account.email, error = %e, "activation dispatch failed");
        }

        Ok(())
    }

    /// Consumes an emailed verification token; returns the verified
    /// account's uuid. Replays are rejected.
    pub async fn verify_email(&self, token: &str) -> CoreResult<String> {
        self.token_service.consume_verification_token(token).await
    }

    pub async fn request_reset(&self, email: &str) -> CoreResult<String> {
        self.reset_service.request_reset(email).await
    }

    pub async fn check_reset_status(&self, email: &str) -> CoreResult<ResetStatus> {
        self.reset_service.check_status(email).await
    }

    pub async fn poll_reset_status(
        &self,
        email: &str,
        interval: Duration,
        timeout: Duration,
    ) -> CoreResult<ResetStatus> {
        self.reset_service
            .poll_until_resolved(email, interval, timeout)
            .await
    }

    /// Invoked on behalf of the external approver.
    pub async fn approve_reset(&self, email: &str) -> CoreResult<()> {
        self.reset_service.approve(email).await
    }

    pub async fn reject_reset(&self, email: &str) -> CoreResult<()> {
        self.reset_service.reject(email).await
    }

    pub async fn finalize_reset(&self, email: &str, new_password: &str) -> CoreResult<()> {
        self.reset_service.finalize_reset(email, new_password).await
    }

    pub async fn record_turn(
        &self,
        account_id: &str,
        sender: &str,
        content: &str,
    ) -> CoreResult<()> {
        self.chat_service.record_turn(account_id, sender, content).await
    }

    pub async fn history(&self, account_id: &str) -> CoreResult<Vec<StoredMessage>> {
        self.chat_service.history(account_id).await
    }

    pub async fn history_as_wire_payload(&self, account_id: &str) -> CoreResult<String> {
        self.chat_service.history_as_wire_payload(account_id).await
    }

    pub async fn transcript(&self, account_id: &str) -> CoreResult<String> {
        self.chat_service.transcript(account_id).await
    }

    pub async fn ask(&self, account_id: &str, sender: &str, text: &str) -> CoreResult<String> {
        self.chat_service.ask(account_id, sender, text).await
    }

    pub async fn run_maintenance(&self) -> CoreResult<()> {
        self.token_service.run_maintenance().await
    }
}
