//! Integration tests for the job state machine.
//!
//! These drive full submissions against mock HTTP servers and assert the
//! observable lifecycle: phases, progress bookkeeping, terminal outcomes,
//! guarded resubmission, and abort recovery.

use std::time::Duration;

use bytes::Bytes;
use pdfdesk_core::{
    ApiClient, FailureKind, FileHandle, Job, JobPhase, OperationRequest, Selection, SplitSpec,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pdf_file(name: &str, size: usize) -> FileHandle {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(size.max(9), b'x');
    FileHandle::new(name, "application/pdf", 1_700_000_000_000, Bytes::from(data))
}

fn job_for(server: &MockServer) -> Job {
    let base = Url::parse(&format!("{}/", server.uri())).expect("mock server URI");
    Job::new(ApiClient::new(base))
}

fn merge_request() -> OperationRequest {
    OperationRequest::Merge {
        files: vec![pdf_file("a.pdf", 64), pdf_file("b.pdf", 64)],
    }
}

#[tokio::test]
async fn test_happy_path_reaches_succeeded_at_full_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/merged-pdfs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", r#"attachment; filename="united.pdf""#)
                .set_body_bytes(b"%PDF result".to_vec()),
        )
        .mount(&server)
        .await;

    let job = job_for(&server);
    let outcome = job.submit(merge_request()).await.expect("not in flight");

    assert!(outcome.is_success());
    let success = outcome.success().expect("success outcome");
    assert_eq!(success.suggested_filename(), Some("united.pdf"));

    let state = job.state();
    assert_eq!(state.phase, JobPhase::Succeeded);
    assert_eq!(state.progress_percent, 100);
    assert!(state.outcome.is_some(), "terminal state carries the outcome");
}

#[tokio::test]
async fn test_server_processing_phase_is_observable_during_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/extract"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"zip".to_vec())
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let job = job_for(&server);
    let submission = {
        let job = job.clone();
        tokio::spawn(async move {
            job.submit(OperationRequest::ExtractImages {
                files: vec![pdf_file("a.pdf", 64)],
            })
            .await
        })
    };

    // The upload is tiny, so the job should sit in ServerProcessing while
    // the mock delays its answer.
    let mut saw_server_processing = false;
    for _ in 0..100 {
        let state = job.state();
        if state.phase == JobPhase::ServerProcessing {
            assert!(
                state.progress_percent <= 99,
                "100 is reserved for a fully received response"
            );
            saw_server_processing = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(saw_server_processing, "never observed ServerProcessing");

    let outcome = submission
        .await
        .expect("task must not panic")
        .expect("not in flight");
    assert!(outcome.is_success());
    assert_eq!(job.state().phase, JobPhase::Succeeded);
}

#[tokio::test]
async fn test_validation_failure_makes_no_network_call() {
    let server = MockServer::start().await;
    // Any request reaching the server fails the expect(0) assertion on drop.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let job = job_for(&server);
    let not_a_pdf = FileHandle::new("notes.txt", "text/plain", 0, Bytes::from_static(b"text"));
    let outcome = job
        .submit(OperationRequest::ExtractImages {
            files: vec![not_a_pdf],
        })
        .await
        .expect("not in flight");

    assert_eq!(outcome.failure_kind(), Some(FailureKind::ValidationFailed));
    assert_eq!(job.state().phase, JobPhase::Failed);
}

#[tokio::test]
async fn test_oversized_merge_fails_validation_before_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Two 300 MiB files: 600 MiB combined, over the 500 MiB ceiling.
    let big = 300 * 1024 * 1024;
    let job = job_for(&server);
    let outcome = job
        .submit(OperationRequest::Merge {
            files: vec![pdf_file("a.pdf", big), pdf_file("b.pdf", big)],
        })
        .await
        .expect("not in flight");

    assert_eq!(outcome.failure_kind(), Some(FailureKind::ValidationFailed));
    match outcome {
        pdfdesk_core::OperationOutcome::Failure { message, .. } => {
            assert!(message.contains("500"), "message should name the limit: {message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_inverted_split_range_is_unrepresentable() {
    // The range scenario start=5, end=3 is rejected at construction, before
    // a request can even be assembled.
    let error = pdfdesk_core::PageRange::new(5, 3).expect_err("inverted range");
    assert_eq!(error.kind(), FailureKind::ValidationFailed);
}

#[tokio::test]
async fn test_server_error_detail_reaches_the_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/merged-pdfs"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("content-type", "application/json")
                .set_body_bytes(br#"{"detail":"corrupt PDF"}"#.to_vec()),
        )
        .mount(&server)
        .await;

    let job = job_for(&server);
    let outcome = job.submit(merge_request()).await.expect("not in flight");

    assert_eq!(outcome.failure_kind(), Some(FailureKind::ServerError));
    match outcome {
        pdfdesk_core::OperationOutcome::Failure { message, .. } => {
            assert_eq!(message, "corrupt PDF");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(job.state().phase, JobPhase::Failed);
}

#[tokio::test]
async fn test_abort_in_flight_then_resubmit_from_terminal_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/split/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"pages".to_vec())
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let job = job_for(&server);
    let submission = {
        let job = job.clone();
        tokio::spawn(async move {
            job.submit(OperationRequest::Split {
                file: pdf_file("doc.pdf", 64),
                spec: SplitSpec::Each,
            })
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    job.abort();

    let outcome = tokio::time::timeout(Duration::from_secs(5), submission)
        .await
        .expect("abort must cut the exchange short")
        .expect("task must not panic")
        .expect("not in flight");
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Aborted));
    assert_eq!(job.state().phase, JobPhase::Failed);

    // Terminal Failed accepts a fresh submission; point it at a fast mock.
    job.reset().expect("reset from terminal state");
    assert_eq!(job.state().phase, JobPhase::Idle);

    Mock::given(method("POST"))
        .and(path("/v1/merged-pdfs"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&server)
        .await;
    let second = job.submit(merge_request()).await.expect("not in flight");
    assert!(second.is_success());
}

#[tokio::test]
async fn test_second_submission_while_in_flight_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/merged-pdfs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF".to_vec())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let job = job_for(&server);
    let first = {
        let job = job.clone();
        tokio::spawn(async move { job.submit(merge_request()).await })
    };

    // Wait until the first submission is past its guard.
    let mut in_flight = false;
    for _ in 0..100 {
        if !job.state().phase.accepts_submission() {
            in_flight = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(in_flight, "first submission never became active");

    let second = job.submit(merge_request()).await;
    assert!(
        matches!(second, Err(pdfdesk_core::SubmitError::AlreadyInFlight)),
        "expected AlreadyInFlight, got {second:?}"
    );

    // Rejecting the second must not disturb the first.
    let outcome = first
        .await
        .expect("task must not panic")
        .expect("not in flight");
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_independent_jobs_run_in_parallel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/merged-pdfs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF".to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let job_a = job_for(&server);
    let job_b = job_for(&server);

    let (a, b) = tokio::join!(job_a.submit(merge_request()), job_b.submit(merge_request()));
    assert!(a.expect("not in flight").is_success());
    assert!(b.expect("not in flight").is_success());
}

#[tokio::test]
async fn test_selection_feeds_a_merge_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/merged-pdfs"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&server)
        .await;

    // Duplicate and non-PDF entries are filtered on the way in, so the
    // request sees the clean working set.
    let mut selection = Selection::new();
    let outcome = selection.add_files(vec![
        pdf_file("a.pdf", 64),
        pdf_file("a.pdf", 64),
        FileHandle::new("junk.bin", "application/octet-stream", 0, Bytes::from_static(b"x")),
        pdf_file("b.pdf", 64),
    ]);
    assert_eq!(outcome.accepted, 2);
    assert_eq!(outcome.rejected_count, 2);

    let job = job_for(&server);
    let result = job
        .submit(OperationRequest::Merge {
            files: selection.into_files(),
        })
        .await
        .expect("not in flight");
    assert!(result.is_success());
}
