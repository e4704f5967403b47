//! HTTP callback notifier.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::SyncError;
use crate::ports::ClientNotifier;

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct PaidNotice<'a> {
    uuid: &'a str,
}

/// POSTs `{"uuid": …}` to a fixed URL. Any non-2xx reply is a failure.
#[derive(Clone, Debug)]
pub struct HttpClientNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClientNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Notify {
                uuid: String::new(),
                reason: format!("building client for {url}: {e}"),
            })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ClientNotifier for HttpClientNotifier {
    async fn notify(&self, uuid: &str) -> Result<(), SyncError> {
        let failed = |reason: String| SyncError::Notify {
            uuid: uuid.to_string(),
            reason,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&PaidNotice { uuid })
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("callback returned {status}")));
        }
        Ok(())
    }
}
