use crate::error::{CoreError, CoreResult};
use crate::repositories::account_repository::AccountRepository;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;

/// Issues, consumes and expires the two token classes: email verification
/// (24 hour window) and password reset (30 minute window). Expiry is
/// evaluated at consumption time against the stored expiration; the sweep in
/// `run_maintenance` is storage hygiene only.
pub struct TokenService {
    accounts: Arc<dyn AccountRepository>,
}

impl TokenService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// 256 bits of randomness, hex-encoded.
    fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
        hex::encode(bytes)
    }

    /// Overwrites any prior token; only one live verification token exists
    /// per account.
    pub async fn issue_verification_token(&self, user_uuid: &str) -> CoreResult<String> {
        let token = Self::generate_token();
        let expires_at = (Utc::now() + Duration::hours(24)).to_rfc3339();

        self.accounts
            .set_verification_token(user_uuid, &token, &expires_at)
            .await?;

        tracing::info!(user_uuid, "verification token issued");
        Ok(token)
    }

    /// Fails with `AlreadyPending` while a live pending request exists for
    /// the account. The guard is a single conditional update evaluated
    /// atomically by the store, so concurrent calls cannot both win.
    pub async fn issue_reset_token(&self, email: &str) -> CoreResult<String> {
        let token = Self::generate_token();
        let now = Utc::now();
        let expires_at = (now + Duration::minutes(30)).to_rfc3339();

        let issued = self
            .accounts
            .try_issue_reset_token(email, &token, &expires_at, &now.to_rfc3339())
            .await?;

        if !issued {
            return if self.accounts.find_by_email(email).await?.is_some() {
                Err(CoreError::AlreadyPending)
            } else {
                Err(CoreError::NotFound)
            };
        }

        tracing::info!(email, "reset token issued");
        Ok(token)
    }

    /// On success atomically marks the account verified and clears the token
    /// so it cannot be replayed; a second consumption of the same token
    /// yields `NotFound`.
    pub async fn consume_verification_token(&self, token: &str) -> CoreResult<String> {
        let account = self
            .accounts
            .find_by_verification_token(token)
            .await?
            .ok_or(CoreError::NotFound)?;

        let expires_at = account
            .verification_expiration
            .as_deref()
            .map(DateTime::parse_from_rfc3339)
            .transpose()
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or(CoreError::Expired)?;

        if expires_at < Utc::now() {
            return Err(CoreError::Expired);
        }

        // Keyed on the token itself; a concurrent consumer that lost the
        // race matches zero rows.
        if !self.accounts.mark_verified(token).await? {
            return Err(CoreError::NotFound);
        }

        tracing::info!(user_uuid = %account.user_uuid, "account verified");
        Ok(account.user_uuid)
    }

    /// Storage-hygiene sweep: unverified accounts whose verification window
    /// lapsed over 7 days ago are dropped, leftover verification data on
    /// verified accounts is cleared, and pending resets that expired more
    /// than a day ago are marked EXPIRED.
    pub async fn run_maintenance(&self) -> CoreResult<()> {
        let now = Utc::now();
        let unverified_cutoff = (now - Duration::days(7)).to_rfc3339();
        let reset_cutoff = (now - Duration::days(1)).to_rfc3339();

        self.accounts
            .sweep_expired(&now.to_rfc3339(), &unverified_cutoff, &reset_cutoff)
            .await?;

        tracing::info!("maintenance sweep complete");
        Ok(())
    }
}
