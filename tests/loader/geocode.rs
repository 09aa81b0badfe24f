use std::sync::Arc;

use mapload::{
    error::LoaderErrorKind,
    geocode::{forward_geocode, reverse_geocode},
    ports::ExternalHandle,
    testing::FakeContainer,
    types::SdkLibrary,
};

fn handle_with(libraries: Vec<SdkLibrary>) -> ExternalHandle {
    ExternalHandle::new(Arc::new(FakeContainer::valid()), libraries)
}

#[tokio::test]
async fn given_handle_without_geocoding_library_when_reverse_geocode_then_service_unavailable() {
    let handle = handle_with(vec![]);
    let err = reverse_geocode(&handle, 52.52, 13.405)
        .await
        .expect_err("geocoding was never validated");
    assert_eq!(err.kind, LoaderErrorKind::ServiceUnavailable);
    assert!(!err.retryable);
}

#[tokio::test]
async fn given_out_of_range_latitude_when_reverse_geocode_then_invalid_request() {
    let handle = handle_with(vec![SdkLibrary::Geocoding]);
    let err = reverse_geocode(&handle, 120.0, 13.405)
        .await
        .expect_err("latitude outside [-90, 90] must be rejected");
    assert_eq!(err.kind, LoaderErrorKind::InvalidRequest);
}

#[tokio::test]
async fn given_geocoding_handle_when_reverse_geocode_then_address_is_returned() {
    let handle = handle_with(vec![SdkLibrary::Geocoding]);
    let address = reverse_geocode(&handle, 52.52, 13.405)
        .await
        .expect("valid request should resolve");
    assert!(!address.formatted.is_empty());
}

#[tokio::test]
async fn given_blank_address_when_forward_geocode_then_invalid_request() {
    let handle = handle_with(vec![SdkLibrary::Geocoding]);
    let err = forward_geocode(&handle, "   ")
        .await
        .expect_err("blank address must be rejected");
    assert_eq!(err.kind, LoaderErrorKind::InvalidRequest);
}

#[tokio::test]
async fn given_geocoding_handle_when_forward_geocode_then_point_is_returned() {
    let handle = handle_with(vec![SdkLibrary::Geocoding]);
    let point = forward_geocode(&handle, "10 Downing Street, London")
        .await
        .expect("valid request should resolve");
    assert!((-90.0..=90.0).contains(&point.lat));
    assert!((-180.0..=180.0).contains(&point.lon));
}
