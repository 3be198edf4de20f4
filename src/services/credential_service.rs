use crate::error::{CoreError, CoreResult};
use crate::models::{Account, AccountSummary, NewAccount};
use crate::repositories::account_repository::{AccountRepository, RepositoryError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
}

/// Password hashing/verification and the storage boundary for account
/// records. Hashing is argon2 with a per-call random salt, so the same input
/// never reproduces the same hash but always verifies.
pub struct CredentialService {
    accounts: Arc<dyn AccountRepository>,
}

impl CredentialService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub fn hash_password(&self, password: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CoreError::Internal(e.to_string()))
    }

    /// Returns false on a malformed stored hash rather than erroring.
    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        } else {
            false
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> CoreResult<Account> {
        self.validate_email(&request.email)?;
        self.validate_password(&request.password)?;
        if request.first_name.trim().is_empty() {
            return Err(CoreError::Validation("first name is required".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;
        let account = NewAccount {
            user_uuid: Uuid::new_v4().to_string(),
            email: request.email,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            birthdate: request.birthdate,
        };

        match self.accounts.create_account(&account).await {
            Ok(created) => Ok(created),
            Err(RepositoryError::AlreadyExists) => Err(CoreError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    /// Unknown email and wrong password both come back as
    /// `InvalidCredentials`; a valid but unverified account as `NotVerified`.
    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<AccountSummary> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        if !self.verify_password(password, &account.password_hash) {
            return Err(CoreError::InvalidCredentials);
        }

        if !account.is_verified {
            return Err(CoreError::NotVerified);
        }

        Ok(AccountSummary::from(&account))
    }

    pub async fn find_by_email(&self, email: &str) -> CoreResult<Option<Account>> {
        Ok(self.accounts.find_by_email(email).await?)
    }

    pub async fn update_password(&self, user_uuid: &str, new_password: &str) -> CoreResult<()> {
        self.validate_password(new_password)?;
        let password_hash = self.hash_password(new_password)?;
        self.accounts
            .update_password(user_uuid, &password_hash)
            .await?;
        Ok(())
    }

    fn validate_email(&self, email: &str) -> CoreResult<()> {
        if email.is_empty() || !email.contains('@') || email.len() > 255 {
            return Err(CoreError::Validation("invalid email address".to_string()));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> CoreResult<()> {
        if password.len() < 6 {
            return Err(CoreError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }
}
