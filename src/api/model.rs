use std::fmt;

use serde::{Deserialize, Serialize};

pub const STREAM_BASE_URL: &str = "https://stream.mux.com";

/// Every API response wraps its payload in a `data` field.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPolicy {
    Public,
    Signed,
    /// Policies this client never requests, such as `drm`.
    #[serde(other)]
    Other,
}

impl PlaybackPolicy {
    pub fn from_private(private: bool) -> Self {
        if private {
            PlaybackPolicy::Signed
        } else {
            PlaybackPolicy::Public
        }
    }
}

impl fmt::Display for PlaybackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackPolicy::Public => write!(f, "public"),
            PlaybackPolicy::Signed => write!(f, "signed"),
            PlaybackPolicy::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAssetSettings {
    pub playback_policy: Vec<PlaybackPolicy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    pub cors_origin: String,
    pub new_asset_settings: NewAssetSettings,
}

impl UploadRequest {
    pub fn new(policy: PlaybackPolicy) -> Self {
        Self {
            cors_origin: "*".to_string(),
            new_asset_settings: NewAssetSettings {
                playback_policy: vec![policy],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetRequest {
    pub input: String,
    pub playback_policy: Vec<PlaybackPolicy>,
}

impl AssetRequest {
    pub fn new(input: impl Into<String>, policy: PlaybackPolicy) -> Self {
        Self {
            input: input.into(),
            playback_policy: vec![policy],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Waiting,
    AssetCreated,
    Errored,
    Cancelled,
    TimedOut,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStatus::Waiting => "waiting",
            UploadStatus::AssetCreated => "asset_created",
            UploadStatus::Errored => "errored",
            UploadStatus::Cancelled => "cancelled",
            UploadStatus::TimedOut => "timed_out",
            UploadStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Error payload attached to errored uploads (`message`) and assets (`messages`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(message) = &self.message {
            parts.push(message);
        }
        parts.extend(self.messages.iter().map(String::as_str));

        match (self.kind.is_empty(), parts.is_empty()) {
            (true, true) => write!(f, "unknown error"),
            (false, true) => write!(f, "{}", self.kind),
            (true, false) => write!(f, "{}", parts.join("; ")),
            (false, false) => write!(f, "{}: {}", self.kind, parts.join("; ")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadHandle {
    pub id: String,
    #[serde(default)]
    pub url: String,
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Preparing,
    Ready,
    Errored,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetStatus::Preparing => write!(f, "preparing"),
            AssetStatus::Ready => write!(f, "ready"),
            AssetStatus::Errored => write!(f, "errored"),
            AssetStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    pub policy: PlaybackPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub status: AssetStatus,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<RemoteError>,
}

impl Asset {
    /// URL of the first playback id, the one a freshly created asset is given.
    pub fn playback_url(&self) -> Option<String> {
        self.playback_ids
            .first()
            .map(|p| format!("{}/{}.m3u8", STREAM_BASE_URL, p.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_envelope() {
        let body = r#"{
            "data": {
                "id": "up1",
                "url": "https://storage.example.com/up1?sig=abc",
                "status": "asset_created",
                "asset_id": "as1",
                "timeout": 3600,
                "new_asset_settings": { "playback_policies": ["public"] }
            }
        }"#;
        let env: Envelope<UploadHandle> = serde_json::from_str(body).unwrap();
        assert_eq!(env.data.id, "up1");
        assert_eq!(env.data.status, UploadStatus::AssetCreated);
        assert_eq!(env.data.asset_id.as_deref(), Some("as1"));
        assert!(env.data.error.is_none());
    }

    #[test]
    fn test_errored_upload() {
        let body = r#"{"id":"up2","status":"errored","error":{"type":"invalid_input","message":"bad file"}}"#;
        let handle: UploadHandle = serde_json::from_str(body).unwrap();
        assert_eq!(handle.status, UploadStatus::Errored);
        assert_eq!(handle.url, "");
        assert_eq!(handle.error.unwrap().to_string(), "invalid_input: bad file");
    }

    #[test]
    fn test_asset_playback_url() {
        let body = r#"{
            "id": "as1",
            "status": "ready",
            "duration": 12.5,
            "playback_ids": [
                { "id": "pb1", "policy": "signed" },
                { "id": "pb2", "policy": "public" }
            ]
        }"#;
        let asset: Asset = serde_json::from_str(body).unwrap();
        assert_eq!(asset.status, AssetStatus::Ready);
        assert_eq!(asset.playback_ids[0].policy, PlaybackPolicy::Signed);
        assert_eq!(
            asset.playback_url().as_deref(),
            Some("https://stream.mux.com/pb1.m3u8")
        );
    }

    #[test]
    fn test_unknown_asset_status() {
        let asset: Asset = serde_json::from_str(r#"{"id":"as1","status":"migrating"}"#).unwrap();
        assert_eq!(asset.status, AssetStatus::Unknown);
        assert!(asset.playback_url().is_none());
    }

    #[test]
    fn test_unlisted_playback_policy() {
        let body = r#"{
            "data": [
                {"id":"as1","status":"ready","playback_ids":[{"id":"pb1","policy":"drm"}]},
                {"id":"as2","status":"ready","playback_ids":[{"id":"pb2","policy":"public"}]}
            ]
        }"#;
        let env: Envelope<Vec<Asset>> = serde_json::from_str(body).unwrap();
        assert_eq!(env.data[0].playback_ids[0].policy, PlaybackPolicy::Other);
        assert_eq!(env.data[1].playback_ids[0].policy, PlaybackPolicy::Public);
        assert_eq!(PlaybackPolicy::Other.to_string(), "other");
    }

    #[test]
    fn test_unknown_upload_status() {
        let handle: UploadHandle = serde_json::from_str(r#"{"id":"up1","status":"paused"}"#).unwrap();
        assert_eq!(handle.status, UploadStatus::Unknown);
        assert!(handle.asset_id.is_none());
    }

    #[test]
    fn test_upload_request_body() {
        let body = serde_json::to_value(UploadRequest::new(PlaybackPolicy::from_private(true))).unwrap();
        assert_eq!(body["cors_origin"], "*");
        assert_eq!(body["new_asset_settings"]["playback_policy"][0], "signed");
    }

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError {
            kind: "input_error".to_string(),
            message: None,
            messages: vec!["no video track".to_string(), "try again".to_string()],
        };
        assert_eq!(err.to_string(), "input_error: no video track; try again");
        assert_eq!(RemoteError::default().to_string(), "unknown error");
    }
}
