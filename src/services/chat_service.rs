use crate::error::{CoreError, CoreResult};
use crate::models::StoredMessage;
use crate::repositories::message_repository::MessageRepository;
use crate::services::inference_client::InferenceClient;
use crate::wire;
use std::sync::Arc;

/// Substituted when the inference backend returns nothing usable.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Conversation turns plus the round trip to the inference collaborator.
pub struct ChatService {
    messages: Arc<dyn MessageRepository>,
    inference: Arc<dyn InferenceClient>,
}

impl ChatService {
    pub fn new(messages: Arc<dyn MessageRepository>, inference: Arc<dyn InferenceClient>) -> Self {
        Self { messages, inference }
    }

    pub async fn record_turn(
        &self,
        account_id: &str,
        sender: &str,
        content: &str,
    ) -> CoreResult<()> {
        self.messages.append(account_id, sender, content).await?;
        Ok(())
    }

    pub async fn history(&self, account_id: &str) -> CoreResult<Vec<StoredMessage>> {
        Ok(self.messages.load_ordered(account_id).await?)
    }

    /// The JSON array of role/content pairs the inference backend consumes.
    pub async fn history_as_wire_payload(&self, account_id: &str) -> CoreResult<String> {
        let history = self.messages.load_ordered(account_id).await?;
        wire::encode_json(&history).map_err(|e| CoreError::Internal(e.to_string()))
    }

    /// Human-readable replay of the conversation.
    pub async fn transcript(&self, account_id: &str) -> CoreResult<String> {
        let history = self.messages.load_ordered(account_id).await?;
        let mut out = String::new();
        for turn in &history {
            out.push_str(&turn.sender);
            out.push_str(": ");
            out.push_str(&turn.content);
            out.push_str("\n\n");
        }
        Ok(out)
    }

    /// Records the user turn, sends the full history to the inference
    /// backend, and records its reply. A malformed or empty reply becomes
    /// the fallback text instead of an error; transport failures propagate.
    pub async fn ask(&self, account_id: &str, sender: &str, text: &str) -> CoreResult<String> {
        self.messages.append(account_id, sender, text).await?;

        let history = self.messages.load_ordered(account_id).await?;
        let payload = wire::encode(&history);

        let reply = match self.inference.ask(account_id, &payload).await {
            Ok(reply) if !reply.is_empty() => reply,
            Ok(_) => FALLBACK_REPLY.to_string(),
            Err(CoreError::MalformedReply) => {
                tracing::warn!(account_id, "inference reply malformed, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => return Err(e),
        };

        self.messages
            .append(account_id, wire::ASSISTANT_SENDER, &reply)
            .await?;

        Ok(reply)
    }
}
