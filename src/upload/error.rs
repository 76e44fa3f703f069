use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::api::error::ApiError;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Cannot read {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] regex::Error),
    #[error("{subject}: {source}")]
    Transport {
        subject: String,
        #[source]
        source: ApiError,
    },
    #[error("{subject}: processing failed: {detail}")]
    RemoteProcessing { subject: String, detail: String },
    #[error("{subject}: still processing after {elapsed:?}")]
    PollTimeout { subject: String, elapsed: Duration },
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
    #[error("Upload task failed: {0}")]
    Task(String),
}

impl UploadError {
    pub fn transport(subject: impl Into<String>, source: ApiError) -> Self {
        UploadError::Transport {
            subject: subject.into(),
            source,
        }
    }

    pub fn remote(subject: impl Into<String>, detail: impl Into<String>) -> Self {
        UploadError::RemoteProcessing {
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}
