use std::sync::Arc;

use mapload::{
    config::RetryConfig,
    error::{LoaderError, LoaderErrorKind, configuration_error},
    retry::{RetryPolicy, acquire_with_retry},
    testing::{DownloadOutcome, FakeContainer, FakeHost},
};

use crate::support::coordinator;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(&RetryConfig {
        max_attempts,
        backoff_base_ms: 10,
        backoff_max_ms: 40,
    })
}

fn download_failure() -> LoaderError {
    LoaderError::new(LoaderErrorKind::DownloadFailed, "network unreachable")
}

#[tokio::test]
async fn given_three_download_failures_when_acquire_with_retry_then_exactly_three_attempts() {
    let host = Arc::new(FakeHost::absent());
    for _ in 0..3 {
        host.queue_download(DownloadOutcome::Fail(download_failure()));
    }
    let coordinator = coordinator(Arc::clone(&host), &[]);

    let err = acquire_with_retry(&coordinator, &fast_policy(3))
        .await
        .expect_err("persistent failure must surface");

    // A fourth attempt would drain past the scripted queue and change the
    // error kind; the surfaced kind proves the loop stopped at three.
    assert_eq!(err.kind, LoaderErrorKind::DownloadFailed);
    assert_eq!(host.download_calls(), 3);
}

#[tokio::test]
async fn given_configuration_error_when_acquire_with_retry_then_no_retry_happens() {
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Fail(configuration_error(
        "credential rejected by vendor",
    )));
    let coordinator = coordinator(Arc::clone(&host), &[]);

    let err = acquire_with_retry(&coordinator, &fast_policy(3))
        .await
        .expect_err("configuration error must surface immediately");

    assert_eq!(err.kind, LoaderErrorKind::Configuration);
    assert_eq!(host.download_calls(), 1);
}

#[tokio::test]
async fn given_transient_failure_then_success_when_acquire_with_retry_then_recovers() {
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Fail(download_failure()));
    host.queue_download(DownloadOutcome::Deliver(Arc::new(FakeContainer::valid())));
    let coordinator = coordinator(Arc::clone(&host), &[]);

    acquire_with_retry(&coordinator, &fast_policy(3))
        .await
        .expect("second attempt should succeed");

    assert_eq!(host.download_calls(), 2);
    assert_eq!(coordinator.state_name().await, "ready");
}
