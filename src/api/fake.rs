use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::VideoApi;
use super::error::ApiError;
use super::model::{
    Asset, AssetRequest, AssetStatus, PlaybackId, PlaybackPolicy, RemoteError, UploadHandle,
    UploadRequest, UploadStatus,
};

/// How the fake service treats one file, keyed by file name.
#[derive(Clone, Debug)]
pub struct FileScript {
    pub transfer_fails: bool,
    pub transfer_panics: bool,
    pub upload_statuses: Vec<UploadStatus>,
    pub asset_statuses: Vec<AssetStatus>,
}

impl Default for FileScript {
    fn default() -> Self {
        Self {
            transfer_fails: false,
            transfer_panics: false,
            upload_statuses: vec![UploadStatus::AssetCreated],
            asset_statuses: vec![AssetStatus::Ready],
        }
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, FileScript>,
    uploads: HashMap<String, PlaybackPolicy>,
    upload_files: HashMap<String, String>,
    upload_polls: HashMap<String, VecDeque<UploadStatus>>,
    asset_polls: HashMap<String, VecDeque<AssetStatus>>,
    asset_policies: HashMap<String, PlaybackPolicy>,
    deleted: Vec<String>,
}

/// In-memory stand-in for the remote API used by workflow tests.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
    transfer_delay: Duration,
    pub create_calls: AtomicUsize,
    pub transfer_calls: AtomicUsize,
    pub upload_polls: AtomicUsize,
    pub asset_polls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transfer_delay(mut self, delay: Duration) -> Self {
        self.transfer_delay = delay;
        self
    }

    pub fn script(self, file_name: &str, script: FileScript) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(file_name.to_string(), script);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.transfer_calls.load(Ordering::SeqCst)
            + self.upload_polls.load(Ordering::SeqCst)
            + self.asset_polls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    fn asset(id: &str, status: AssetStatus, policy: PlaybackPolicy) -> Asset {
        Asset {
            id: id.to_string(),
            status,
            playback_ids: vec![PlaybackId {
                id: format!("pb-{}", id),
                policy,
            }],
            duration: Some(1.0),
            created_at: Some("1700000000".to_string()),
            errors: (status == AssetStatus::Errored).then(|| RemoteError {
                kind: "invalid_input".to_string(),
                message: None,
                messages: vec!["unsupported codec".to_string()],
            }),
        }
    }
}

fn next<T: Copy>(queue: &mut VecDeque<T>) -> Option<T> {
    // the last scripted status repeats forever
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().copied()
    }
}

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{} {} not found", what, id),
    }
}

#[async_trait]
impl VideoApi for FakeApi {
    async fn create_upload(&self, request: &UploadRequest) -> Result<UploadHandle, ApiError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("up-{}", n);
        self.state
            .lock()
            .unwrap()
            .uploads
            .insert(id.clone(), request.new_asset_settings.playback_policy[0]);
        Ok(UploadHandle {
            url: format!("https://storage.test/{}", id),
            id,
            status: UploadStatus::Waiting,
            asset_id: None,
            error: None,
        })
    }

    async fn get_upload(&self, id: &str) -> Result<UploadHandle, ApiError> {
        self.upload_polls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let file = state
            .upload_files
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("upload", id))?;
        let status = state
            .upload_polls
            .get_mut(id)
            .and_then(next)
            .unwrap_or(UploadStatus::Waiting);

        let asset_id = format!("asset-{}", file);
        if status == UploadStatus::AssetCreated && !state.asset_polls.contains_key(&asset_id) {
            let script = state.scripts.get(&file).cloned().unwrap_or_default();
            let policy = state.uploads.get(id).copied().unwrap_or(PlaybackPolicy::Public);
            state
                .asset_polls
                .insert(asset_id.clone(), script.asset_statuses.into());
            state.asset_policies.insert(asset_id.clone(), policy);
        }

        Ok(UploadHandle {
            id: id.to_string(),
            url: String::new(),
            status,
            asset_id: (status == UploadStatus::AssetCreated).then_some(asset_id),
            error: (status == UploadStatus::Errored).then(|| RemoteError {
                kind: "invalid_input".to_string(),
                message: Some(format!("{} is not a video", file)),
                messages: vec![],
            }),
        })
    }

    async fn get_asset(&self, id: &str) -> Result<Asset, ApiError> {
        self.asset_polls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let status = state
            .asset_polls
            .get_mut(id)
            .and_then(next)
            .ok_or_else(|| not_found("asset", id))?;
        let policy = state
            .asset_policies
            .get(id)
            .copied()
            .unwrap_or(PlaybackPolicy::Public);
        Ok(Self::asset(id, status, policy))
    }

    async fn upload_file(&self, url: &str, path: &Path) -> Result<(), ApiError> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.transfer_delay.is_zero() {
            tokio::time::sleep(self.transfer_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let id = url.rsplit('/').next().unwrap_or_default().to_string();

        let script = self
            .state
            .lock()
            .unwrap()
            .scripts
            .get(&file)
            .cloned()
            .unwrap_or_default();
        if script.transfer_panics {
            panic!("transfer of {} crashed", file);
        }

        let mut state = self.state.lock().unwrap();
        if script.transfer_fails {
            return Err(ApiError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        state.upload_files.insert(id.clone(), file);
        state.upload_polls.insert(id, script.upload_statuses.into());
        Ok(())
    }

    async fn create_asset(&self, request: &AssetRequest) -> Result<Asset, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = format!("asset-{}", request.input.rsplit('/').next().unwrap_or("input"));
        let mut state = self.state.lock().unwrap();
        let script = state.scripts.get(&request.input).cloned().unwrap_or_default();
        state
            .asset_polls
            .insert(id.clone(), script.asset_statuses.into());
        state
            .asset_policies
            .insert(id.clone(), request.playback_policy[0]);
        Ok(Self::asset(&id, AssetStatus::Preparing, request.playback_policy[0]))
    }

    async fn list_assets(&self, limit: u32, page: u32) -> Result<Vec<Asset>, ApiError> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<&String> = state.asset_polls.keys().collect();
        ids.sort();
        let skip = (page.saturating_sub(1) * limit) as usize;
        Ok(ids
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .map(|id| {
                let policy = state
                    .asset_policies
                    .get(id)
                    .copied()
                    .unwrap_or(PlaybackPolicy::Public);
                Self::asset(id, AssetStatus::Ready, policy)
            })
            .collect())
    }

    async fn delete_asset(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.asset_polls.remove(id).is_none() {
            return Err(not_found("asset", id));
        }
        state.deleted.push(id.to_string());
        Ok(())
    }
}
