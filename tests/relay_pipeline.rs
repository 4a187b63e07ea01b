//! End-to-end pipeline behavior against mocked source and store: failure
//! isolation between candidates, the degraded no-folder path and the
//! abort-early listing stages.

use resume_relay::contract::{
    ApplicationFilter, CandidateProfile, CandidateSummary, DownloadedFile, FileLocator, FolderId,
    MockCandidateSource, MockResumeStore, ResumeHandle, UploadedFile,
};
use resume_relay::runlog::RunLog;
use resume_relay::transfer::{self, RelayOptions};

fn summary(id: &str, name: &str) -> CandidateSummary {
    CandidateSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn profile(id: &str, name: &str, handle: Option<&str>) -> CandidateProfile {
    CandidateProfile {
        id: id.to_string(),
        name: name.to_string(),
        resume_handle: handle.map(|h| ResumeHandle(h.to_string())),
    }
}

fn pdf() -> DownloadedFile {
    DownloadedFile {
        bytes: b"%PDF-1.4 pretend resume".to_vec(),
        content_type: "application/pdf".to_string(),
    }
}

fn uploaded_from(file: &DownloadedFile, file_name: &str) -> UploadedFile {
    UploadedFile {
        file_id: format!("drive-{file_name}"),
        file_name: file_name.to_string(),
        file_size: file.size(),
    }
}

#[tokio::test]
async fn one_failed_download_does_not_stop_the_batch() {
    let mut source = MockCandidateSource::new();
    let mut store = MockResumeStore::new();

    let candidates = vec![
        profile("cand-1", "Ada Lovelace", Some("handle-1")),
        profile("cand-2", "Grace Hopper", Some("handle-2")),
        profile("cand-3", "Mary Jackson", Some("handle-3")),
    ];

    for n in 1..=3 {
        source
            .expect_file_locator()
            .withf(move |handle| handle.0 == format!("handle-{n}"))
            .times(1)
            .returning(move |_| {
                Ok(FileLocator {
                    url: format!("https://files.example.com/url-{n}"),
                })
            });
    }
    source
        .expect_fetch_file()
        .withf(|locator| locator.url.ends_with("url-2"))
        .times(1)
        .returning(|_| Err("connection reset by peer".into()));
    source
        .expect_fetch_file()
        .withf(|locator| !locator.url.ends_with("url-2"))
        .times(2)
        .returning(|_| Ok(pdf()));
    store
        .expect_upload()
        .times(2)
        .returning(|file, file_name, _| Ok(uploaded_from(file, file_name)));

    let folder = Some(FolderId("folder-1".to_string()));
    let report =
        transfer::run_batch(&source, &store, &candidates, &folder, &RunLog::disabled()).await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let ids = report
        .results
        .iter()
        .map(|r| r.candidate_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["cand-1", "cand-2", "cand-3"]);

    let failed = &report.results[1];
    assert_eq!(
        failed.error.as_deref(),
        Some("Download failed: connection reset by peer")
    );
    assert_eq!(
        failed.file_info.as_ref().map(|l| l.url.as_str()),
        Some("https://files.example.com/url-2")
    );
    assert!(failed.upload_info.is_none());

    let first = &report.results[0];
    assert_eq!(
        first.upload_info.as_ref().map(|u| u.file_name.as_str()),
        Some("Ada_Lovelace_cand-1_resume.pdf")
    );
    assert!(first.error.is_none());
}

#[tokio::test]
async fn relay_continues_without_folder_when_resolution_fails() {
    let mut source = MockCandidateSource::new();
    let mut store = MockResumeStore::new();

    source
        .expect_list_applications()
        .times(1)
        .returning(|_| Ok(vec![summary("cand-1", "Ada Lovelace")]));
    source
        .expect_candidate_profile()
        .withf(|id| id == "cand-1")
        .times(1)
        .returning(|_| Ok(profile("cand-1", "Ada Lovelace", Some("handle-1"))));
    source.expect_file_locator().times(1).returning(|_| {
        Ok(FileLocator {
            url: "https://files.example.com/url-1".to_string(),
        })
    });
    source.expect_fetch_file().times(1).returning(|_| Ok(pdf()));

    store
        .expect_ensure_folder()
        .withf(|name| name == "Resumes")
        .times(1)
        .returning(|_| Err("permission denied".into()));
    store
        .expect_upload()
        .withf(|_, file_name, folder| {
            folder.is_none() && file_name == "Ada_Lovelace_cand-1_resume.pdf"
        })
        .times(1)
        .returning(|file, file_name, _| Ok(uploaded_from(file, file_name)));

    let options = RelayOptions {
        folder_name: "Resumes".to_string(),
        filter: ApplicationFilter::default(),
    };
    let report = transfer::relay(&source, &store, &options, &RunLog::disabled())
        .await
        .expect("a failed folder lookup must not abort the run");

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);
}

#[tokio::test]
async fn candidates_without_resumes_never_reach_the_store() {
    let mut source = MockCandidateSource::new();
    let mut store = MockResumeStore::new();

    source.expect_list_applications().times(1).returning(|_| {
        Ok(vec![
            summary("cand-1", "Ada Lovelace"),
            summary("cand-2", "Bob"),
        ])
    });
    source
        .expect_candidate_profile()
        .withf(|id| id == "cand-1")
        .times(1)
        .returning(|_| Ok(profile("cand-1", "Ada Lovelace", Some("handle-1"))));
    source
        .expect_candidate_profile()
        .withf(|id| id == "cand-2")
        .times(1)
        .returning(|_| Ok(profile("cand-2", "Bob", None)));
    source.expect_file_locator().times(1).returning(|_| {
        Ok(FileLocator {
            url: "https://files.example.com/url-1".to_string(),
        })
    });
    source.expect_fetch_file().times(1).returning(|_| Ok(pdf()));

    store
        .expect_ensure_folder()
        .times(1)
        .returning(|_| Ok(FolderId("folder-1".to_string())));
    store
        .expect_upload()
        .withf(|_, file_name, _| file_name.starts_with("Ada_Lovelace"))
        .times(1)
        .returning(|file, file_name, _| Ok(uploaded_from(file, file_name)));

    let options = RelayOptions {
        folder_name: "Resumes".to_string(),
        filter: ApplicationFilter::default(),
    };
    let report = transfer::relay(&source, &store, &options, &RunLog::disabled())
        .await
        .expect("the run should succeed");

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].candidate_id, "cand-1");
}

#[tokio::test]
async fn missing_handle_fails_before_any_service_call() {
    let mut source = MockCandidateSource::new();
    let mut store = MockResumeStore::new();

    source.expect_file_locator().times(0);
    source.expect_fetch_file().times(0);
    store.expect_upload().times(0);

    let candidate = profile("cand-1", "Ada Lovelace", None);
    let result = transfer::transfer_candidate(&source, &store, &candidate, &None).await;

    assert_eq!(result.error.as_deref(), Some("No resume file handle found"));
    assert!(result.file_info.is_none());
    assert!(result.upload_info.is_none());
}

#[tokio::test]
async fn listing_failure_aborts_the_run() {
    let mut source = MockCandidateSource::new();
    let store = MockResumeStore::new();

    source
        .expect_list_applications()
        .times(1)
        .returning(|_| Err("boom".into()));

    let options = RelayOptions {
        folder_name: "Resumes".to_string(),
        filter: ApplicationFilter::default(),
    };
    let err = transfer::relay(&source, &store, &options, &RunLog::disabled())
        .await
        .expect_err("a failed listing must abort the run");

    assert_eq!(err, "Application listing failed: boom");
}

#[tokio::test]
async fn detail_failure_aborts_before_any_upload() {
    let mut source = MockCandidateSource::new();
    let mut store = MockResumeStore::new();

    source.expect_list_applications().times(1).returning(|_| {
        Ok(vec![
            summary("cand-1", "Ada Lovelace"),
            summary("cand-2", "Grace Hopper"),
        ])
    });
    source
        .expect_candidate_profile()
        .withf(|id| id == "cand-1")
        .times(1)
        .returning(|_| Ok(profile("cand-1", "Ada Lovelace", Some("handle-1"))));
    source
        .expect_candidate_profile()
        .withf(|id| id == "cand-2")
        .times(1)
        .returning(|_| Err("tls handshake failed".into()));
    store.expect_ensure_folder().times(0);
    store.expect_upload().times(0);

    let options = RelayOptions {
        folder_name: "Resumes".to_string(),
        filter: ApplicationFilter::default(),
    };
    let err = transfer::relay(&source, &store, &options, &RunLog::disabled())
        .await
        .expect_err("a failed detail lookup must abort the run");

    assert_eq!(
        err,
        "Candidate detail lookup failed for Grace Hopper: tls handshake failed"
    );
}

#[tokio::test]
async fn resume_filter_preserves_candidate_order() {
    let mut source = MockCandidateSource::new();

    for (id, name, handle) in [
        ("cand-1", "Ada Lovelace", Some("handle-1")),
        ("cand-2", "Bob", None),
        ("cand-3", "Mary Jackson", Some("handle-3")),
    ] {
        source
            .expect_candidate_profile()
            .withf(move |requested| requested == id)
            .times(1)
            .returning(move |_| Ok(profile(id, name, handle)));
    }

    let candidates = vec![
        summary("cand-1", "Ada Lovelace"),
        summary("cand-2", "Bob"),
        summary("cand-3", "Mary Jackson"),
    ];
    let retained = transfer::filter_with_resumes(&source, &candidates)
        .await
        .expect("filtering should succeed");

    let ids = retained.iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["cand-1", "cand-3"]);
}
