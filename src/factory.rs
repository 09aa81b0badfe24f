use std::sync::Arc;

use crate::{
    coordinator::SingletonCoordinator,
    error::{LoaderError, LoaderErrorKind, invalid_request},
    ports::{ExternalHandle, MapSurface},
    types::{MapOptions, MapSpec, SurfaceTarget},
};

/// Fallback applied when the target element has not been laid out yet and
/// reports zero size; constructing into a zero-area element fails in most
/// SDKs.
pub const MIN_SURFACE_WIDTH: u32 = 256;
pub const MIN_SURFACE_HEIGHT: u32 = 256;

/// A constructed map bound to a host element. Holds its own clone of the
/// handle: dropping a view never tears down the shared module.
#[derive(Debug)]
pub struct MapView {
    surface: MapSurface,
    handle: ExternalHandle,
}

impl MapView {
    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn handle(&self) -> &ExternalHandle {
        &self.handle
    }
}

/// Builds consumer objects from a validated handle. Transient construction
/// failures (module not fully wired underneath a handle we thought was
/// valid) trigger one invalidate-and-reacquire cycle; every other error
/// propagates unmodified.
pub struct ConsumerFactory {
    coordinator: Arc<SingletonCoordinator>,
}

impl ConsumerFactory {
    pub fn new(coordinator: Arc<SingletonCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn build(
        &self,
        handle: &ExternalHandle,
        target: SurfaceTarget,
        options: MapOptions,
    ) -> Result<MapView, LoaderError> {
        let spec = resolve_spec(&target, &options)?;

        match handle.container().create_map(&spec) {
            Ok(surface) => Ok(MapView {
                surface,
                handle: handle.clone(),
            }),
            Err(err) if err.kind == LoaderErrorKind::TransientConstruction => {
                tracing::warn!(
                    target: "mapload",
                    handle_id = %handle.id(),
                    error = %err,
                    "transient_construction_reacquiring"
                );
                self.coordinator.invalidate().await;
                let fresh = self.coordinator.acquire().await?;
                // Retried exactly once; a second failure propagates.
                let surface = fresh.container().create_map(&spec)?;
                Ok(MapView {
                    surface,
                    handle: fresh,
                })
            }
            Err(err) => Err(err),
        }
    }
}

fn resolve_spec(target: &SurfaceTarget, options: &MapOptions) -> Result<MapSpec, LoaderError> {
    if target.element_id.trim().is_empty() {
        return Err(invalid_request("surface target element_id cannot be empty"));
    }

    let (width, height) = if target.width == 0 || target.height == 0 {
        tracing::debug!(
            target: "mapload",
            element_id = %target.element_id,
            width = target.width,
            height = target.height,
            "surface_minimum_size_fallback"
        );
        (
            target.width.max(MIN_SURFACE_WIDTH),
            target.height.max(MIN_SURFACE_HEIGHT),
        )
    } else {
        (target.width, target.height)
    };

    Ok(MapSpec {
        element_id: target.element_id.clone(),
        width,
        height,
        center: options.center,
        zoom_level: options.zoom_level,
    })
}
