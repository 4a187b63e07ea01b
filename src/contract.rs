//! Shared data model and the two service traits the pipeline is wired
//! through.
//!
//! The pipeline never talks to a concrete HTTP client directly: it sees a
//! [`CandidateSource`] (the tracking system holding candidates and their
//! files) and a [`ResumeStore`] (the destination the resumes land in).
//! Concrete implementations live in [`crate::ashby`] and [`crate::drive`];
//! tests substitute the generated mocks.
//!
//! All trait methods are async and return boxed errors, so implementors can
//! surface their own error types without the orchestration code depending on
//! them.

use async_trait::async_trait;
use serde::Serialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type shared by the service traits (boxed trait object).
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// A job as listed by the tracking system.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub name: String,
}

/// One application entry: the applying candidate's id and name.
///
/// A candidate who applied to several jobs appears once per application;
/// entries are not deduplicated.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub id: String,
    pub name: String,
}

/// Opaque token referencing a file stored in the tracking system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeHandle(pub String);

/// Full candidate detail after resume resolution.
///
/// `resume_handle` is `None` when the candidate simply has no resume on
/// file. That is a normal state, not an error.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub id: String,
    pub name: String,
    pub resume_handle: Option<ResumeHandle>,
}

/// Short-lived download URL for one file. Resolved immediately before the
/// download; never cached across runs.
#[derive(Debug, Clone, Serialize)]
pub struct FileLocator {
    pub url: String,
}

/// Raw file content plus the content type the source declared for it.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl DownloadedFile {
    /// Actual byte count; remote-declared sizes are never trusted.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Opaque identifier of a destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderId(pub String);

/// What the destination reported back for one stored file.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub file_id: String,
    pub file_name: String,
    pub file_size: usize,
}

/// Outcome of one candidate's transfer attempt.
///
/// For a completed attempt exactly one of `upload_info` and `error` is
/// populated. Results are appended to the batch report and never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub candidate_id: String,
    pub candidate_name: String,
    pub file_info: Option<FileLocator>,
    pub upload_info: Option<UploadedFile>,
    pub error: Option<String>,
}

/// Server-side filter fields for the application listing. All fields are
/// optional; unset fields are omitted from the request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    /// Creation-date lower bound, epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<i64>,
}

/// Application status values accepted by the tracking system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplicationStatus {
    Active,
    Hired,
    Archived,
    Lead,
}

/// Read side: the applicant-tracking system.
///
/// Implemented by the real API client and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// List applications matching the filter, one summary per application.
    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<CandidateSummary>, ServiceError>;

    /// Fetch full candidate detail, including resume resolution.
    async fn candidate_profile(
        &self,
        candidate_id: &str,
    ) -> Result<CandidateProfile, ServiceError>;

    /// Exchange a resume handle for a short-lived download URL.
    async fn file_locator(&self, handle: &ResumeHandle) -> Result<FileLocator, ServiceError>;

    /// Download the bytes behind a locator.
    async fn fetch_file(&self, locator: &FileLocator) -> Result<DownloadedFile, ServiceError>;
}

/// Write side: the destination the resumes are stored in.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Find the folder with this exact name, creating it if absent.
    async fn ensure_folder(&self, name: &str) -> Result<FolderId, ServiceError>;

    /// Store the file under the given name, inside `folder` when present or
    /// at the destination root otherwise.
    async fn upload(
        &self,
        file: &DownloadedFile,
        file_name: &str,
        folder: &Option<FolderId>,
    ) -> Result<UploadedFile, ServiceError>;
}
