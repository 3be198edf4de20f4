pub mod chat_service;
pub mod credential_service;
pub mod inference_client;
pub mod notification_service;
pub mod reset_service;
pub mod token_service;

pub use chat_service::{ChatService, FALLBACK_REPLY};
pub use credential_service::{CredentialService, RegisterRequest};
pub use inference_client::{HttpInferenceClient, InferenceClient};
pub use notification_service::{HttpNotificationService, NotificationService, NotifyError};
pub use reset_service::ResetService;
pub use token_service::TokenService;
