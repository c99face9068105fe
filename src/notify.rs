//! Notification delivery for workflow outcomes.
//!
//! The workflow reports every outcome through a [`Notifier`]. The shipped
//! implementation posts to a Discord webhook: plain messages as a JSON body,
//! messages with a diagnostic attachment as `multipart/form-data` with the
//! message under `payload_json` and the file under `files[0]`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use thiserror::Error;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// File attached to a notification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    /// File name shown in the channel.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

/// Errors raised while delivering a notification.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum NotifyError {
    /// Raised when the webhook request could not be sent.
    #[error("failed to deliver notification: {message}")]
    Delivery {
        /// Underlying error message.
        message: String,
    },
    /// Raised when the webhook endpoint rejected the notification.
    #[error("webhook rejected notification with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the endpoint.
        status: u16,
        /// Response body, when one was readable.
        body: String,
    },
}

/// Future returned by notifier operations.
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Interface for delivering workflow notifications.
pub trait Notifier {
    /// Delivers a text message.
    fn send<'a>(&'a self, content: &'a str) -> NotifyFuture<'a>;

    /// Delivers a text message with one attached file.
    fn send_with_attachment<'a>(
        &'a self,
        content: &'a str,
        attachment: &'a Attachment,
    ) -> NotifyFuture<'a>;
}

/// Notifier that posts to a Discord webhook URL.
#[derive(Clone, Debug)]
pub struct DiscordWebhook {
    client: reqwest::Client,
    url: String,
}

impl DiscordWebhook {
    /// Creates a webhook notifier for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    async fn post_text(&self, content: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(|err| NotifyError::Delivery {
                message: err.to_string(),
            })?;
        Self::check_status(response).await
    }

    async fn post_with_file(
        &self,
        content: &str,
        attachment: &Attachment,
    ) -> Result<(), NotifyError> {
        let payload = serde_json::json!({ "content": content }).to_string();
        let file = Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone());
        let form = Form::new().text("payload_json", payload).part("files[0]", file);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| NotifyError::Delivery {
                message: err.to_string(),
            })?;
        Self::check_status(response).await
    }

    async fn check_status(response: reqwest::Response) -> Result<(), NotifyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

impl Notifier for DiscordWebhook {
    fn send<'a>(&'a self, content: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move { self.post_text(content).await })
    }

    fn send_with_attachment<'a>(
        &'a self,
        content: &'a str,
        attachment: &'a Attachment,
    ) -> NotifyFuture<'a> {
        Box::pin(async move { self.post_with_file(content, attachment).await })
    }
}
