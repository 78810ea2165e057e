use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use crate::error::NotifyError;

/// Delivers a reminder to the user somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `NotifyError` when delivery fails.
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

/// Writes reminders to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        info!(title, message, "reminder");
        Ok(())
    }
}

/// Posts reminders to an IFTTT-style webhook as `value1` (title) and `value2` (message).
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .form(&[("value1", title), ("value2", message)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

/// Sends to every target, even when some fail.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    #[must_use]
    pub fn new(targets: Vec<Arc<dyn Notifier>>) -> Self {
        Self { targets }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let mut failed = 0;
        for target in &self.targets {
            if let Err(err) = target.notify(title, message).await {
                warn!(error = %err, "notifier failed");
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(NotifyError::Partial {
                failed,
                total: self.targets.len(),
            });
        }
        Ok(())
    }
}
