use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("notification endpoint returned status {0}")]
    BadStatus(u16),
}

/// Outbound calls to the email-sending collaborator. Dispatch is
/// fire-and-forget: callers log a failure and move on; nothing is retried
/// and token issuance is never rolled back.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait NotificationService: Send + Sync {
    async fn send_activation(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), NotifyError>;
    async fn send_reset_password(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), NotifyError>;
}

pub struct HttpNotificationService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotificationService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post(
        &self,
        path: &str,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .query(&[("email", email), ("name", name), ("token", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::BadStatus(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn send_activation(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), NotifyError> {
        self.post("/send-activation", email, name, token).await
    }

    async fn send_reset_password(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), NotifyError> {
        self.post("/send-reset-password", email, name, token).await
    }
}
