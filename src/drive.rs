//! Client for the Google Drive destination: folder find-or-create and the
//! two-step file upload (metadata first, then the binary content).

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::contract::{DownloadedFile, FolderId, ResumeStore, ServiceError, UploadedFile};

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

/// Escapes a value for interpolation into a Drive search query, which uses
/// single-quoted string literals.
fn escape_query_term(term: &str) -> String {
    term.replace('\\', "\\\\").replace('\'', "\\'")
}

/// HTTP client for the storage destination, authenticated with a Bearer
/// token.
pub struct DriveClient {
    client: reqwest::Client,
    token: String,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    pub fn new(token: String) -> Result<Self, DriveError> {
        Self::with_base_urls(
            token,
            DRIVE_API_BASE.to_string(),
            DRIVE_UPLOAD_BASE.to_string(),
        )
    }

    /// Same client against different base URLs. Used by tests to point at a
    /// local server.
    pub fn with_base_urls(
        token: String,
        api_base: String,
        upload_base: String,
    ) -> Result<Self, DriveError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            token,
            api_base,
            upload_base,
        })
    }

    /// Find the non-trashed folder with this exact name, creating it when
    /// none exists. Repeated calls against unchanged state return the same
    /// id without creating duplicates.
    pub async fn ensure_folder(&self, name: &str) -> Result<FolderId, DriveError> {
        if let Some(existing) = self.find_folder(name).await? {
            info!(folder = %name, folder_id = %existing.0, "found existing destination folder");
            return Ok(existing);
        }
        let created = self.create_folder(name).await?;
        info!(folder = %name, folder_id = %created.0, "created destination folder");
        Ok(created)
    }

    async fn find_folder(&self, name: &str) -> Result<Option<FolderId>, DriveError> {
        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query_term(name),
            FOLDER_MIME_TYPE
        );
        let url = format!("{}/files", self.api_base);
        debug!(folder = %name, "searching for destination folder");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("q", query.as_str())])
            .send()
            .await?;
        let text = Self::successful_body(response).await?;
        let listing: FileList = serde_json::from_str(&text)?;
        Ok(listing.files.into_iter().next().map(|file| FolderId(file.id)))
    }

    async fn create_folder(&self, name: &str) -> Result<FolderId, DriveError> {
        let url = format!("{}/files", self.api_base);
        let body = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let text = Self::successful_body(response).await?;
        let created: FileRef = serde_json::from_str(&text)?;
        Ok(FolderId(created.id))
    }

    /// Store a file in two steps: create the metadata record (name, MIME
    /// type, optional parent folder), then upload the bytes against the
    /// returned file id.
    pub async fn upload(
        &self,
        file: &DownloadedFile,
        file_name: &str,
        folder: Option<&FolderId>,
    ) -> Result<UploadedFile, DriveError> {
        let url = format!("{}/files", self.api_base);
        let mut metadata = serde_json::json!({
            "name": file_name,
            "mimeType": file.content_type,
        });
        if let Some(folder) = folder {
            metadata["parents"] = serde_json::json!([folder.0]);
        }
        debug!(file_name, "creating file metadata");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&metadata)
            .send()
            .await?;
        let text = Self::successful_body(response).await?;
        let created: FileRef = serde_json::from_str(&text)?;

        let upload_url = format!("{}/files/{}", self.upload_base, created.id);
        debug!(file_id = %created.id, size = file.size(), "uploading file content");
        let response = self
            .client
            .patch(&upload_url)
            .query(&[("uploadType", "media")])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, file.content_type.as_str())
            .body(file.bytes.clone())
            .send()
            .await?;
        Self::successful_body(response).await?;

        info!(file_id = %created.id, file_name, size = file.size(), "upload complete");
        Ok(UploadedFile {
            file_id: created.id,
            file_name: file_name.to_string(),
            file_size: file.size(),
        })
    }

    async fn successful_body(response: reqwest::Response) -> Result<String, DriveError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ResumeStore for DriveClient {
    async fn ensure_folder(&self, name: &str) -> Result<FolderId, ServiceError> {
        Ok(DriveClient::ensure_folder(self, name).await?)
    }

    async fn upload(
        &self,
        file: &DownloadedFile,
        file_name: &str,
        folder: &Option<FolderId>,
    ) -> Result<UploadedFile, ServiceError> {
        Ok(DriveClient::upload(self, file, file_name, folder.as_ref()).await?)
    }
}
