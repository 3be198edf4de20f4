use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Lifecycle of a password-reset request. PENDING is entered when a reset
/// token is issued; APPROVED/REJECTED are written by the external approver
/// or the requester cancelling; EXPIRED is assigned by the maintenance sweep
/// to stale pending requests. Resolving a request returns the account to NONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ResetStatus {
    None,
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl ResetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetStatus::None => "NONE",
            ResetStatus::Pending => "PENDING",
            ResetStatus::Approved => "APPROVED",
            ResetStatus::Rejected => "REJECTED",
            ResetStatus::Expired => "EXPIRED",
        }
    }

    /// A terminal status resolves the request; polling stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResetStatus::Approved | ResetStatus::Rejected | ResetStatus::Expired
        )
    }
}

impl fmt::Display for ResetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user identity with credentials and verification/reset state.
///
/// Invariant: a token field is non-null iff its paired expiration is non-null,
/// and `reset_status` is PENDING iff a live reset token exists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub user_uuid: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub verification_expiration: Option<String>,
    pub reset_token: Option<String>,
    pub reset_expiration: Option<String>,
    pub reset_status: ResetStatus,
    pub created_at: Option<String>,
}

/// What a successful authentication hands back to the presentation layer.
/// Deliberately excludes the password hash and token material.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub user_uuid: String,
    pub email: String,
    pub first_name: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            user_uuid: account.user_uuid.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
        }
    }
}

/// Field set for inserting a new account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_uuid: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
}
