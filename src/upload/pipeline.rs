use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

use crate::api::VideoApi;
use crate::api::model::{PlaybackPolicy, UploadRequest};

use super::error::UploadError;
use super::poll::{PollSettings, wait_for_asset, wait_for_upload};
use super::selector::display_name;

pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub concurrency: usize,
    pub policy: PlaybackPolicy,
    pub poll: PollSettings,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            policy: PlaybackPolicy::Public,
            poll: PollSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub filename: String,
    pub asset_id: String,
    pub playback_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    CreateUpload,
    Transfer,
    AwaitUpload,
    AwaitAsset,
    Task,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::CreateUpload => write!(f, "create-upload"),
            Stage::Transfer => write!(f, "transfer"),
            Stage::AwaitUpload => write!(f, "await-upload"),
            Stage::AwaitAsset => write!(f, "await-asset"),
            Stage::Task => write!(f, "task"),
        }
    }
}

#[derive(Debug)]
pub struct FileFailure {
    pub filename: String,
    pub stage: Stage,
    pub error: UploadError,
}

/// Rows arrive in completion order, not submission order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub rows: Vec<ResultRow>,
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.rows.len() + self.failures.len()
    }
}

/// Uploads every file with at most `options.concurrency` in flight.
///
/// A failing file never cancels its siblings; it ends up in
/// `BatchOutcome::failures` tagged with the step that failed.
pub async fn run_batch(
    api: Arc<dyn VideoApi>,
    files: Vec<PathBuf>,
    options: &PipelineOptions,
) -> BatchOutcome {
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let (tx, mut rx) = mpsc::unbounded_channel::<Result<ResultRow, FileFailure>>();
    let mut tasks = JoinSet::new();
    let mut names = HashMap::new();

    for path in files {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore should not be closed");
        let api = api.clone();
        let tx = tx.clone();
        let options = options.clone();
        let filename = display_name(&path);
        let span = info_span!("upload", file = %filename);

        let handle = tasks.spawn(
            async move {
                let result = process_file(api.as_ref(), path, &options).await;
                drop(permit);
                // the receiver outlives every task
                let _ = tx.send(result);
            }
            .instrument(span),
        );
        names.insert(handle.id(), filename);
    }
    drop(tx);

    let mut outcome = BatchOutcome::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        if let Err(e) = joined {
            let filename = names.remove(&e.id()).unwrap_or_default();
            error!(file = %filename, error = %e, "upload task aborted");
            outcome.failures.push(FileFailure {
                filename,
                stage: Stage::Task,
                error: UploadError::Task(e.to_string()),
            });
        }
    }

    while let Some(result) = rx.recv().await {
        match result {
            Ok(row) => outcome.rows.push(row),
            Err(failure) => outcome.failures.push(failure),
        }
    }
    outcome
}

async fn process_file(
    api: &dyn VideoApi,
    path: PathBuf,
    options: &PipelineOptions,
) -> Result<ResultRow, FileFailure> {
    let filename = display_name(&path);
    let fail = |stage: Stage| {
        let filename = filename.clone();
        move |error: UploadError| {
            warn!(%stage, error = %error, "upload failed");
            FileFailure {
                filename,
                stage,
                error,
            }
        }
    };
    let start_time = coarsetime::Instant::now();

    let handle = api
        .create_upload(&UploadRequest::new(options.policy))
        .await
        .map_err(|e| UploadError::transport(&filename, e))
        .map_err(fail(Stage::CreateUpload))?;
    info!(upload_id = %handle.id, "upload target created");

    api.upload_file(&handle.url, &path)
        .await
        .map_err(|e| UploadError::transport(&filename, e))
        .map_err(fail(Stage::Transfer))?;
    info!(upload_id = %handle.id, "file transferred, waiting for asset");

    let asset_id = wait_for_upload(api, &handle.id, &filename, &options.poll)
        .await
        .map_err(fail(Stage::AwaitUpload))?;
    info!(%asset_id, "asset created, waiting until ready");

    let asset = wait_for_asset(api, &asset_id, &filename, &options.poll)
        .await
        .map_err(fail(Stage::AwaitAsset))?;
    let playback_url = asset
        .playback_url()
        .ok_or_else(|| UploadError::remote(&filename, "asset has no playback ids"))
        .map_err(fail(Stage::AwaitAsset))?;

    info!(%asset_id, duration = ?start_time.elapsed(), "asset ready");
    Ok(ResultRow {
        filename,
        asset_id: asset.id,
        playback_url,
    })
}
