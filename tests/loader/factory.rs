use std::sync::Arc;

use mapload::{
    error::{LoaderErrorKind, internal_error, transient_construction},
    factory::{ConsumerFactory, MIN_SURFACE_HEIGHT, MIN_SURFACE_WIDTH},
    testing::{DownloadOutcome, FakeContainer, FakeHost},
    types::{GeoPoint, MapOptions, SurfaceTarget},
};

use crate::support::coordinator;

fn target(width: u32, height: u32) -> SurfaceTarget {
    SurfaceTarget {
        element_id: "map-root".to_string(),
        width,
        height,
    }
}

fn options() -> MapOptions {
    MapOptions {
        center: GeoPoint { lat: 48.8566, lon: 2.3522 },
        zoom_level: 11,
    }
}

#[tokio::test]
async fn given_zero_sized_target_when_build_then_minimum_fallback_is_applied() {
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Deliver(Arc::new(FakeContainer::valid())));
    let coordinator = Arc::new(coordinator(Arc::clone(&host), &[]));
    let factory = ConsumerFactory::new(Arc::clone(&coordinator));

    let handle = coordinator.acquire().await.expect("acquire");
    let view = factory
        .build(&handle, target(0, 0), options())
        .await
        .expect("zero-sized target must still build");

    assert_eq!(view.surface().width, MIN_SURFACE_WIDTH);
    assert_eq!(view.surface().height, MIN_SURFACE_HEIGHT);
}

#[tokio::test]
async fn given_transient_construction_error_when_build_then_reacquire_and_single_retry() {
    let container = Arc::new(FakeContainer::valid());
    container.queue_construction_failure(transient_construction(
        "map dependency not fully initialized",
    ));
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Deliver(Arc::clone(&container)));
    let coordinator = Arc::new(coordinator(Arc::clone(&host), &[]));
    let factory = ConsumerFactory::new(Arc::clone(&coordinator));

    let handle = coordinator.acquire().await.expect("acquire");
    let view = factory
        .build(&handle, target(800, 600), options())
        .await
        .expect("transient failure must be retried once");

    assert_ne!(
        view.handle().id(),
        handle.id(),
        "retry goes through a reacquired handle"
    );
    assert_eq!(container.maps_created(), 1);
    assert_eq!(coordinator.state_name().await, "ready");
}

#[tokio::test]
async fn given_non_transient_construction_error_when_build_then_error_propagates_unmodified() {
    let container = Arc::new(FakeContainer::valid());
    container.queue_construction_failure(
        internal_error("invalid viewport parameters").with_detail("zoom out of range"),
    );
    let host = Arc::new(FakeHost::absent());
    host.queue_download(DownloadOutcome::Deliver(Arc::clone(&container)));
    let coordinator = Arc::new(coordinator(Arc::clone(&host), &[]));
    let factory = ConsumerFactory::new(Arc::clone(&coordinator));

    let handle = coordinator.acquire().await.expect("acquire");
    let err = factory
        .build(&handle, target(800, 600), options())
        .await
        .expect_err("non-transient failure must propagate");

    assert_eq!(err.kind, LoaderErrorKind::Internal);
    assert_eq!(container.maps_created(), 0, "no hidden retry");
    assert_eq!(
        coordinator.state_name().await,
        "ready",
        "singleton is not invalidated for caller mistakes"
    );
    assert_eq!(host.download_calls(), 1);
}
