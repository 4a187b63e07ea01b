//! The transfer pipeline: filter candidates down to those with a resume,
//! resolve the destination folder, then move each resume across one at a
//! time.
//!
//! Failure handling differs by stage. The listing and filtering stages are
//! setup: any error there fails the whole run. Folder resolution is a
//! convenience: on failure the batch continues with uploads unfiled. The
//! per-candidate stage isolates failures: a candidate's error is recorded
//! on their result and the loop moves on, so one bad record never stops
//! the rest.
//!
//! Calls are issued strictly one at a time; there is no fan-out across
//! candidates or pages.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::contract::{
    ApplicationFilter, CandidateProfile, CandidateSource, CandidateSummary, FolderId, ResumeStore,
    TransferResult,
};
use crate::runlog::RunLog;

/// What a single relay run operates on: which applications to pull and the
/// folder the resumes land in.
#[derive(Debug)]
pub struct RelayOptions {
    pub folder_name: String,
    pub filter: ApplicationFilter,
}

/// Aggregated outcome of one batch, one entry per attempted candidate in
/// input order.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub results: Vec<TransferResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Derives the destination filename for a candidate's resume: the name with
/// spaces replaced by underscores, joined with the candidate id and a fixed
/// suffix. Candidates deriving the same name are not deduplicated.
pub fn destination_filename(candidate_name: &str, candidate_id: &str) -> String {
    format!(
        "{}_{}_resume.pdf",
        candidate_name.replace(' ', "_"),
        candidate_id
    )
}

/// Entrypoint: run the whole pipeline according to the options.
pub async fn relay<S, D>(
    source: &S,
    store: &D,
    options: &RelayOptions,
    log: &RunLog,
) -> Result<BatchReport, String>
where
    S: CandidateSource,
    D: ResumeStore,
{
    info!("Starting resume relay pipeline");

    let candidates = match source.list_applications(&options.filter).await {
        Ok(candidates) => {
            info!(count = candidates.len(), "Application listing succeeded");
            candidates
        }
        Err(e) => {
            error!(error = ?e, "Application listing failed");
            return Err(format!("Application listing failed: {e}"));
        }
    };
    log.info(&format!("Fetched {} application(s)", candidates.len()));

    let with_resumes = filter_with_resumes(source, &candidates).await?;
    log.info(&format!(
        "{} of {} candidate(s) have a resume on file",
        with_resumes.len(),
        candidates.len()
    ));

    let folder = match store.ensure_folder(&options.folder_name).await {
        Ok(folder) => {
            info!(folder_name = %options.folder_name, folder_id = %folder.0, "Destination folder resolved");
            Some(folder)
        }
        Err(e) => {
            warn!(
                error = ?e,
                folder_name = %options.folder_name,
                "Folder resolution failed, uploading without a folder"
            );
            log.info(&format!(
                "Could not resolve folder '{}', uploading without a folder",
                options.folder_name
            ));
            None
        }
    };

    Ok(run_batch(source, store, &with_resumes, &folder, log).await)
}

/// Re-fetches full detail for each candidate and keeps those with a
/// resolvable resume handle, in their original order.
///
/// A detail-fetch failure fails the whole pass: at this stage an error
/// almost always means bad credentials or an unreachable service, which
/// would fail every remaining candidate too.
pub async fn filter_with_resumes<S>(
    source: &S,
    candidates: &[CandidateSummary],
) -> Result<Vec<CandidateProfile>, String>
where
    S: CandidateSource,
{
    let mut retained = Vec::new();
    for candidate in candidates {
        let profile = match source.candidate_profile(&candidate.id).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(candidate = %candidate.name, error = ?e, "Candidate detail lookup failed");
                return Err(format!(
                    "Candidate detail lookup failed for {}: {e}",
                    candidate.name
                ));
            }
        };
        if profile.resume_handle.is_some() {
            retained.push(profile);
        } else {
            info!(candidate = %profile.name, "No resume on file, skipping");
        }
    }
    Ok(retained)
}

/// Walks the candidates in order, transferring each resume and collecting
/// one result per candidate. Never stops early.
pub async fn run_batch<S, D>(
    source: &S,
    store: &D,
    candidates: &[CandidateProfile],
    folder: &Option<FolderId>,
    log: &RunLog,
) -> BatchReport
where
    S: CandidateSource,
    D: ResumeStore,
{
    info!(candidates = candidates.len(), "Starting per-candidate transfers");
    log.info(&format!(
        "Starting resume transfer for {} candidate(s)",
        candidates.len()
    ));

    let mut results = Vec::new();
    for candidate in candidates {
        let result = transfer_candidate(source, store, candidate, folder).await;
        match (&result.upload_info, &result.error) {
            (Some(uploaded), _) => log.info(&format!(
                "Uploaded {} ({} bytes) for {}",
                uploaded.file_name, uploaded.file_size, result.candidate_name
            )),
            (None, Some(error)) => log.info(&format!(
                "Failed to transfer resume for {}: {}",
                result.candidate_name, error
            )),
            (None, None) => {}
        }
        results.push(result);
    }

    let report = BatchReport { results };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch finished"
    );
    log.info(&format!(
        "Transfer complete: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    ));
    report
}

/// Moves one candidate's resume from the source to the store. Every failure
/// past this point lands in the result's `error` field; nothing escapes to
/// the caller.
pub async fn transfer_candidate<S, D>(
    source: &S,
    store: &D,
    candidate: &CandidateProfile,
    folder: &Option<FolderId>,
) -> TransferResult
where
    S: CandidateSource,
    D: ResumeStore,
{
    let mut result = TransferResult {
        candidate_id: candidate.id.clone(),
        candidate_name: candidate.name.clone(),
        file_info: None,
        upload_info: None,
        error: None,
    };

    let handle = match &candidate.resume_handle {
        Some(handle) => handle,
        None => {
            warn!(candidate = %candidate.name, "Candidate reached transfer without a resume handle");
            result.error = Some("No resume file handle found".to_string());
            return result;
        }
    };

    info!(candidate = %candidate.name, "Resolving download link");
    let locator = match source.file_locator(handle).await {
        Ok(locator) => locator,
        Err(e) => {
            error!(candidate = %candidate.name, error = ?e, "Download link resolution failed");
            result.error = Some(format!("Failed to resolve download link: {e}"));
            return result;
        }
    };
    result.file_info = Some(locator.clone());

    let file = match source.fetch_file(&locator).await {
        Ok(file) => file,
        Err(e) => {
            error!(candidate = %candidate.name, error = ?e, "Download failed");
            result.error = Some(format!("Download failed: {e}"));
            return result;
        }
    };

    let file_name = destination_filename(&candidate.name, &candidate.id);
    info!(
        candidate = %candidate.name,
        file_name = %file_name,
        size = file.size(),
        "Uploading resume"
    );
    match store.upload(&file, &file_name, folder).await {
        Ok(uploaded) => {
            info!(candidate = %candidate.name, file_id = %uploaded.file_id, "Upload succeeded");
            result.upload_info = Some(uploaded);
        }
        Err(e) => {
            error!(candidate = %candidate.name, error = ?e, "Upload failed");
            result.error = Some(format!("Upload failed: {e}"));
        }
    }

    result
}
