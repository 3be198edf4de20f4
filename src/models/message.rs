use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One conversation turn. Append-only; never mutated or deleted except via
/// cascading account deletion. Ordering is store-assigned timestamp with
/// insertion order breaking sub-second ties.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredMessage {
    pub account_id: String,
    pub sender: String,
    pub content: String,
    pub timestamp: Option<String>,
}
