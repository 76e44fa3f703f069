pub mod client;
pub mod error;
pub mod model;

#[cfg(test)]
pub mod fake;

use std::path::Path;

use async_trait::async_trait;

use error::ApiError;
use model::{Asset, AssetRequest, UploadHandle, UploadRequest};

/// The remote video API as the upload workflow and commands see it.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn create_upload(&self, request: &UploadRequest) -> Result<UploadHandle, ApiError>;
    async fn get_upload(&self, id: &str) -> Result<UploadHandle, ApiError>;
    async fn get_asset(&self, id: &str) -> Result<Asset, ApiError>;
    /// Streams the file at `path` as the body of a PUT to a one-time upload URL.
    async fn upload_file(&self, url: &str, path: &Path) -> Result<(), ApiError>;

    async fn create_asset(&self, request: &AssetRequest) -> Result<Asset, ApiError>;
    async fn list_assets(&self, limit: u32, page: u32) -> Result<Vec<Asset>, ApiError>;
    async fn delete_asset(&self, id: &str) -> Result<(), ApiError>;
}
