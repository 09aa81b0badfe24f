use crate::{
    error::{LoaderError, invalid_request, service_unavailable},
    ports::ExternalHandle,
    types::{Address, GeoPoint, SdkLibrary},
};

/// Thin adapters over the loaded module's geocoding service. Only callable
/// on a handle whose validation covered the geocoding library.
pub async fn reverse_geocode(
    handle: &ExternalHandle,
    lat: f64,
    lon: f64,
) -> Result<Address, LoaderError> {
    ensure_geocoding(handle)?;
    let point = GeoPoint { lat, lon };
    validate_point(&point)?;
    handle.container().reverse_geocode(point).await
}

pub async fn forward_geocode(
    handle: &ExternalHandle,
    address: &str,
) -> Result<GeoPoint, LoaderError> {
    ensure_geocoding(handle)?;
    let address = address.trim();
    if address.is_empty() {
        return Err(invalid_request("address cannot be empty"));
    }
    handle.container().forward_geocode(address).await
}

fn ensure_geocoding(handle: &ExternalHandle) -> Result<(), LoaderError> {
    if !handle.supports(SdkLibrary::Geocoding) {
        return Err(service_unavailable(
            "geocoding sub-library was not requested and validated for this handle",
        ));
    }
    Ok(())
}

fn validate_point(point: &GeoPoint) -> Result<(), LoaderError> {
    if !point.lat.is_finite() || !point.lon.is_finite() {
        return Err(invalid_request("coordinates must be finite"));
    }
    if !(-90.0..=90.0).contains(&point.lat) {
        return Err(invalid_request(format!(
            "latitude {} outside [-90, 90]",
            point.lat
        )));
    }
    if !(-180.0..=180.0).contains(&point.lon) {
        return Err(invalid_request(format!(
            "longitude {} outside [-180, 180]",
            point.lon
        )));
    }
    Ok(())
}
