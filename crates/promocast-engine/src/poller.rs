use crate::backend_trait::GenerationBackend;
use promocast_core::config::VideoConfig;
use promocast_core::{ApiKey, AssetResponse, GenerationError, GenerationOperation, VideoRequest};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How long the poller is willing to wait. With neither bound set it waits
/// until the operation reports `done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Option<Duration>,
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            max_attempts: None,
        }
    }
}

impl From<&VideoConfig> for PollPolicy {
    fn from(config: &VideoConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_wait: config.max_wait(),
            max_attempts: config.max_attempts,
        }
    }
}

/// Sender half of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half, checked before every poll and raced against the
/// inter-poll sleep.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn pair() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_handle, signal) = Self::pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the
    /// handle was dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Drives a video job from submission to downloaded bytes.
pub struct OperationPoller<'a> {
    backend: &'a dyn GenerationBackend,
    policy: PollPolicy,
}

impl<'a> OperationPoller<'a> {
    pub fn new(backend: &'a dyn GenerationBackend, policy: PollPolicy) -> Self {
        Self { backend, policy }
    }

    /// Submit, poll until done, then download the asset. Every network
    /// round trip is a separate failure point; nothing is retried.
    pub async fn run(
        &self,
        key: &ApiKey,
        request: &VideoRequest,
        cancel: &CancelSignal,
    ) -> Result<Vec<u8>, GenerationError> {
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        let operation = self.backend.submit_video_job(key, request).await?;
        tracing::info!(operation = %operation.name, done = operation.done, "video job accepted");

        let operation = self.wait_until_done(key, operation, cancel).await?;
        let uri = completed_asset_uri(&operation)?;
        self.download(key, uri).await
    }

    pub async fn wait_until_done(
        &self,
        key: &ApiKey,
        mut operation: GenerationOperation,
        cancel: &CancelSignal,
    ) -> Result<GenerationOperation, GenerationError> {
        let mut cancel = cancel.clone();
        let started = Instant::now();
        let mut attempts: u32 = 0;

        while !operation.done {
            if cancel.is_cancelled() {
                tracing::info!(operation = %operation.name, "video job polling cancelled");
                return Err(GenerationError::Cancelled);
            }
            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(GenerationError::GenerationTimeout(started.elapsed()));
                }
            }
            if let Some(max_wait) = self.policy.max_wait {
                if started.elapsed() + self.policy.interval > max_wait {
                    return Err(GenerationError::GenerationTimeout(max_wait));
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.policy.interval) => {}
                _ = cancel.cancelled() => {
                    tracing::info!(operation = %operation.name, "video job polling cancelled");
                    return Err(GenerationError::Cancelled);
                }
            }

            attempts += 1;
            operation = self.backend.poll_video_job(key, &operation).await?;
            tracing::debug!(
                operation = %operation.name,
                attempt = attempts,
                done = operation.done,
                "polled video job"
            );
        }

        tracing::info!(
            operation = %operation.name,
            polls = attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "video job finished"
        );
        Ok(operation)
    }

    pub async fn download(&self, key: &ApiKey, uri: &str) -> Result<Vec<u8>, GenerationError> {
        let url = authenticated_asset_url(uri, key)?;
        let response = self.backend.fetch_asset(&url).await?;
        let body = classify_asset_response(response)?;
        tracing::info!(bytes = body.len(), "video asset downloaded");
        Ok(body)
    }
}

/// The asset reference of a finished operation. A provider-reported failure
/// takes precedence over a missing reference.
pub fn completed_asset_uri(operation: &GenerationOperation) -> Result<&str, GenerationError> {
    if let Some(failure) = &operation.failure {
        return Err(GenerationError::GenerationFailed {
            code: failure.code,
            message: failure.message.clone(),
        });
    }
    operation
        .asset_uri
        .as_deref()
        .ok_or(GenerationError::GenerationIncomplete)
}

/// Append the credential to the asset URI as the `key` query parameter.
pub fn authenticated_asset_url(uri: &str, key: &ApiKey) -> Result<String, GenerationError> {
    let mut url = reqwest::Url::parse(uri).map_err(|e| {
        GenerationError::MalformedResponse(format!("invalid asset uri {uri:?}: {e}"))
    })?;
    url.query_pairs_mut().append_pair("key", key.expose());
    Ok(url.into())
}

/// 400 and 403 mean the credential cannot download the asset; any other
/// non-2xx is a generic download failure.
pub fn classify_asset_response(response: AssetResponse) -> Result<Vec<u8>, GenerationError> {
    if response.is_success() {
        return Ok(response.body);
    }
    match response.status {
        400 | 403 => Err(GenerationError::CredentialRejected),
        _ => {
            let text = if response.status_text.is_empty() {
                response.status.to_string()
            } else {
                response.status_text
            };
            Err(GenerationError::AssetDownloadFailed(text))
        }
    }
}
