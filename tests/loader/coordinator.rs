use std::{sync::Arc, time::Duration};

use mapload::{
    error::LoaderErrorKind,
    testing::{DownloadOutcome, FakeContainer, FakeHost, ReadyBehavior},
    types::RequiredComponent,
};

use crate::support::{coordinator, coordinator_with_timeouts};

#[tokio::test]
async fn given_no_prior_state_when_five_callers_acquire_concurrently_then_one_download_serves_all()
{
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::DeliverAfter(
        Duration::from_millis(50),
        Arc::new(FakeContainer::valid()),
    ));
    let coordinator = coordinator(Arc::clone(&host), &[]);

    let (a, b, c, d, e) = tokio::join!(
        coordinator.acquire(),
        coordinator.acquire(),
        coordinator.acquire(),
        coordinator.acquire(),
        coordinator.acquire(),
    );

    let first = a.expect("first caller should get a handle");
    for outcome in [b, c, d, e] {
        let handle = outcome.expect("every caller should get a handle");
        assert_eq!(handle.id(), first.id(), "all callers share one handle");
    }
    assert_eq!(host.download_calls(), 1, "exactly one underlying download");
}

#[tokio::test]
async fn given_ready_state_when_acquire_again_then_host_is_not_touched() {
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Deliver(Arc::new(FakeContainer::valid())));
    let coordinator = coordinator(Arc::clone(&host), &[]);

    let first = coordinator.acquire().await.expect("initial acquire");
    let second = coordinator.acquire().await.expect("repeat acquire");

    assert_eq!(first.id(), second.id());
    assert_eq!(host.download_calls(), 1);
    assert_eq!(coordinator.state_name().await, "ready");
}

#[tokio::test]
async fn given_partial_container_when_acquire_then_activation_repairs_without_download() {
    let container = Arc::new(
        FakeContainer::partial(&[RequiredComponent::CoreConstructor])
            .with_ready_behavior(ReadyBehavior::SucceedAndRepair),
    );
    let host = Arc::new(FakeHost::present(Arc::clone(&container)));
    let coordinator = coordinator(Arc::clone(&host), &[]);

    coordinator
        .acquire()
        .await
        .expect("partial container should be repaired");

    assert_eq!(host.download_calls(), 0, "repair path must not re-download");
    assert_eq!(container.ready_calls(), 1);
    assert_eq!(coordinator.state_name().await, "ready");
}

#[tokio::test]
async fn given_hung_download_when_timeout_elapses_then_all_waiters_fail_and_state_is_failed() {
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Hang);
    let coordinator = Arc::new(coordinator_with_timeouts(
        Arc::clone(&host),
        &[],
        Duration::from_millis(100),
        Duration::from_millis(100),
    ));

    let (a, b) = tokio::join!(coordinator.acquire(), coordinator.acquire());

    for outcome in [a, b] {
        let err = outcome.expect_err("hung download must time out");
        assert_eq!(err.kind, LoaderErrorKind::Timeout);
        assert!(err.retryable);
    }
    assert_eq!(coordinator.state_name().await, "failed");
    assert!(
        host.discard_calls() >= 2,
        "partial artifact must be discarded after the timeout"
    );
}

#[tokio::test]
async fn given_failed_state_when_acquire_again_then_new_flight_starts() {
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Fail(mapload::error::LoaderError::new(
        LoaderErrorKind::DownloadFailed,
        "network unreachable",
    )));
    host.queue_download(DownloadOutcome::Deliver(Arc::new(FakeContainer::valid())));
    let coordinator = coordinator(Arc::clone(&host), &[]);

    let err = coordinator
        .acquire()
        .await
        .expect_err("first acquire should fail");
    assert_eq!(err.kind, LoaderErrorKind::DownloadFailed);
    assert_eq!(coordinator.state_name().await, "failed");

    coordinator
        .acquire()
        .await
        .expect("second acquire should restart and succeed");
    assert_eq!(host.download_calls(), 2);
    assert_eq!(coordinator.state_name().await, "ready");
}

#[tokio::test]
async fn given_ready_handle_that_turned_partial_when_acquire_then_state_restarts() {
    let container = Arc::new(
        FakeContainer::valid().with_ready_behavior(ReadyBehavior::SucceedAndRepair),
    );
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Deliver(Arc::clone(&container)));
    let coordinator = coordinator(Arc::clone(&host), &[]);

    let first = coordinator.acquire().await.expect("initial acquire");

    // The module loses a component after it was handed out.
    container.set_missing(&[RequiredComponent::CoordinatePrimitive]);

    let second = coordinator
        .acquire()
        .await
        .expect("invalid ready state should self-heal");

    assert_ne!(first.id(), second.id(), "a fresh handle is issued");
    assert_eq!(host.download_calls(), 1, "repair goes through activation only");
    assert_eq!(container.ready_calls(), 2);
}
