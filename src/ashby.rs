//! Client for the Ashby tracking API: cursor-paginated listings, candidate
//! detail with resume resolution, file-locator lookup and the raw download.
//!
//! Every listing endpoint is a POST returning a `results` array plus the
//! cursor fields `moreDataAvailable` and `nextCursor`. The client follows
//! the cursor until the server reports no more data; raw page bodies are
//! retained alongside the mapped records.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::contract::{
    ApplicationFilter, CandidateProfile, CandidateSource, CandidateSummary, DownloadedFile,
    FileLocator, JobSummary, ResumeHandle, ServiceError,
};

const ASHBY_API_BASE: &str = "https://api.ashbyhq.com";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum AshbyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("file.info reported an unsuccessful lookup")]
    LookupFailed,

    #[error("download response did not declare a content-type")]
    MissingContentType,
}

/// One page of a cursor-paginated listing.
///
/// `results` is required; a page without it fails the whole fetch. The
/// cursor fields default to "no more data" when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    results: Vec<T>,
    #[serde(default)]
    more_data_available: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationRecord {
    candidate: ApplicationCandidate,
}

#[derive(Debug, Deserialize)]
struct ApplicationCandidate {
    id: String,
    name: String,
}

/// Candidate detail as returned by `candidate.info`. The two resume-bearing
/// fields are mutually exclusive in practice; both are optional here so a
/// record carrying neither still deserializes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateRecord {
    id: String,
    name: String,
    #[serde(default)]
    resume_file_handle: Option<AttachmentRef>,
    #[serde(default)]
    file_handles: Option<Vec<AttachmentEntry>>,
}

#[derive(Debug, Deserialize)]
struct AttachmentRef {
    #[serde(default)]
    handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SingleEnvelope<T> {
    results: T,
}

#[derive(Debug, Deserialize)]
struct FileInfoResponse {
    results: FileInfoRecord,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct FileInfoRecord {
    url: String,
}

/// Picks the resume handle out of a candidate record.
///
/// The dedicated `resumeFileHandle` field always wins. Failing that, the
/// first generically-attached file whose name contains "resume"
/// (case-insensitive) is used. Neither field being present means the
/// candidate has no resume on file.
fn resolve_resume_handle(record: &CandidateRecord) -> Option<ResumeHandle> {
    if let Some(handle) = record
        .resume_file_handle
        .as_ref()
        .and_then(|attachment| attachment.handle.as_ref())
    {
        return Some(ResumeHandle(handle.clone()));
    }

    record
        .file_handles
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .find(|entry| {
            entry
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains("resume"))
        })
        .and_then(|entry| entry.handle.clone())
        .map(ResumeHandle)
}

/// HTTP client for the tracking API. Authenticates every API call with
/// HTTP Basic, the token as username and an empty password.
pub struct AshbyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl AshbyClient {
    pub fn new(token: String) -> Result<Self, AshbyError> {
        Self::with_base_url(token, ASHBY_API_BASE.to_string())
    }

    /// Same client against a different base URL. Used by tests to point at
    /// a local server.
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, AshbyError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            token,
            base_url,
        })
    }

    /// List all jobs. Returns the mapped summaries plus the raw page bodies.
    pub async fn list_jobs(&self) -> Result<(Vec<JobSummary>, Vec<serde_json::Value>), AshbyError> {
        let (records, raw_pages) = self.paged_post::<JobRecord>("job.list", json!({})).await?;
        let jobs = records
            .into_iter()
            .map(|record| JobSummary {
                id: record.id,
                name: record.title,
            })
            .collect::<Vec<_>>();
        info!(jobs = jobs.len(), pages = raw_pages.len(), "listed jobs");
        Ok((jobs, raw_pages))
    }

    /// List applications matching the filter, one candidate summary per
    /// application entry.
    pub async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<(Vec<CandidateSummary>, Vec<serde_json::Value>), AshbyError> {
        let params = serde_json::to_value(filter)?;
        let (records, raw_pages) = self
            .paged_post::<ApplicationRecord>("application.list", params)
            .await?;
        let candidates = records
            .into_iter()
            .map(|record| CandidateSummary {
                id: record.candidate.id,
                name: record.candidate.name,
            })
            .collect::<Vec<_>>();
        info!(
            candidates = candidates.len(),
            pages = raw_pages.len(),
            "listed applications"
        );
        Ok((candidates, raw_pages))
    }

    /// Fetch one candidate's full detail and resolve their resume handle.
    pub async fn candidate_profile(
        &self,
        candidate_id: &str,
    ) -> Result<CandidateProfile, AshbyError> {
        let raw = self
            .post_json("candidate.info", &json!({ "candidateId": candidate_id }))
            .await?;
        let envelope: SingleEnvelope<CandidateRecord> = serde_json::from_value(raw)?;
        let record = envelope.results;
        let resume_handle = resolve_resume_handle(&record);
        debug!(
            candidate = %record.name,
            has_resume = resume_handle.is_some(),
            "resolved candidate detail"
        );
        Ok(CandidateProfile {
            id: record.id,
            name: record.name,
            resume_handle,
        })
    }

    /// Exchange a resume handle for a short-lived download URL.
    pub async fn file_locator(&self, handle: &ResumeHandle) -> Result<FileLocator, AshbyError> {
        let raw = self
            .post_json("file.info", &json!({ "fileHandle": handle.0 }))
            .await?;
        let response: FileInfoResponse = serde_json::from_value(raw)?;
        if !response.success {
            return Err(AshbyError::LookupFailed);
        }
        Ok(FileLocator {
            url: response.results.url,
        })
    }

    /// Download the bytes behind a locator with a plain GET. The locator URL
    /// is pre-authorized, so no credentials are attached to this request.
    pub async fn fetch_file(&self, locator: &FileLocator) -> Result<DownloadedFile, AshbyError> {
        debug!(url = %locator.url, "downloading file");
        let response = self.client.get(&locator.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, "file download returned error status");
            return Err(AshbyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or(AshbyError::MissingContentType)?;
        let bytes = response.bytes().await?.to_vec();
        debug!(size = bytes.len(), content_type = %content_type, "download complete");
        Ok(DownloadedFile {
            bytes,
            content_type,
        })
    }

    /// Issues the initial request without a cursor, then follows `nextCursor`
    /// while the server reports more data. A page claiming more data without
    /// providing a cursor terminates the loop; it is logged as an
    /// inconsistency, not treated as an error.
    async fn paged_post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        fixed_params: serde_json::Value,
    ) -> Result<(Vec<T>, Vec<serde_json::Value>), AshbyError> {
        let mut items = Vec::new();
        let mut raw_pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = fixed_params.clone();
            if let (Some(params), Some(cursor)) = (body.as_object_mut(), cursor.as_ref()) {
                params.insert("cursor".to_string(), json!(cursor));
            }

            let raw = self.post_json(endpoint, &body).await?;
            let page: Page<T> = serde_json::from_value(raw.clone())?;
            debug!(
                endpoint,
                records = page.results.len(),
                more = page.more_data_available,
                "fetched page"
            );
            raw_pages.push(raw);
            items.extend(page.results);

            if !page.more_data_available {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    warn!(
                        endpoint,
                        "server reports more data but sent no cursor, stopping pagination"
                    );
                    break;
                }
            }
        }

        Ok((items, raw_pages))
    }

    async fn post_json(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AshbyError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, "issuing tracking API request");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.token, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(endpoint, status = %status, "tracking API returned error status");
            return Err(AshbyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let value = serde_json::from_str(&text)?;
        Ok(value)
    }
}

#[async_trait]
impl CandidateSource for AshbyClient {
    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<CandidateSummary>, ServiceError> {
        let (candidates, _raw_pages) = AshbyClient::list_applications(self, filter).await?;
        Ok(candidates)
    }

    async fn candidate_profile(&self, candidate_id: &str) -> Result<CandidateProfile, ServiceError> {
        Ok(AshbyClient::candidate_profile(self, candidate_id).await?)
    }

    async fn file_locator(&self, handle: &ResumeHandle) -> Result<FileLocator, ServiceError> {
        Ok(AshbyClient::file_locator(self, handle).await?)
    }

    async fn fetch_file(&self, locator: &FileLocator) -> Result<DownloadedFile, ServiceError> {
        Ok(AshbyClient::fetch_file(self, locator).await?)
    }
}
