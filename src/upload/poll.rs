use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::api::VideoApi;
use crate::api::model::{Asset, AssetStatus, UploadStatus};

use super::error::UploadError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the resource reaches a terminal state.
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_POLL_TIMEOUT),
        }
    }
}

pub enum Poll<T> {
    Ready(T),
    Pending,
}

/// Probes immediately, then once per interval, until `probe` yields a value or
/// an error, or the deadline passes.
pub async fn poll_until<T, F, Fut>(
    settings: &PollSettings,
    subject: &str,
    mut probe: F,
) -> Result<T, UploadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>, UploadError>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if let Poll::Ready(value) = probe().await? {
            debug!(subject, attempts, elapsed = ?started.elapsed(), "poll finished");
            return Ok(value);
        }

        if let Some(timeout) = settings.timeout {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(UploadError::PollTimeout {
                    subject: subject.to_string(),
                    elapsed,
                });
            }
        }

        trace!(subject, attempts, "still pending");
        sleep(settings.interval).await;
    }
}

/// Waits for an upload to turn into an asset and returns the asset id.
pub async fn wait_for_upload(
    api: &dyn VideoApi,
    upload_id: &str,
    subject: &str,
    settings: &PollSettings,
) -> Result<String, UploadError> {
    poll_until(settings, subject, move || async move {
        let handle = api
            .get_upload(upload_id)
            .await
            .map_err(|e| UploadError::transport(subject, e))?;

        match handle.status {
            UploadStatus::Waiting | UploadStatus::Unknown => Ok(Poll::Pending),
            UploadStatus::AssetCreated => handle
                .asset_id
                .map(Poll::Ready)
                .ok_or_else(|| UploadError::remote(subject, "upload reported no asset id")),
            status => {
                let detail = handle
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| format!("upload {}", status));
                Err(UploadError::remote(subject, detail))
            }
        }
    })
    .await
}

/// Waits until the asset is playable.
pub async fn wait_for_asset(
    api: &dyn VideoApi,
    asset_id: &str,
    subject: &str,
    settings: &PollSettings,
) -> Result<Asset, UploadError> {
    poll_until(settings, subject, move || async move {
        let asset = api
            .get_asset(asset_id)
            .await
            .map_err(|e| UploadError::transport(subject, e))?;

        match asset.status {
            AssetStatus::Ready => Ok(Poll::Ready(asset)),
            AssetStatus::Errored => {
                let detail = asset
                    .errors
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "asset errored".to_string());
                Err(UploadError::remote(subject, detail))
            }
            AssetStatus::Preparing | AssetStatus::Unknown => Ok(Poll::Pending),
        }
    })
    .await
}
