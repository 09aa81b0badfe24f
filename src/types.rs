use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Optional vendor sub-libraries that can be requested at download time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SdkLibrary {
    Geocoding,
    Drawing,
}

impl SdkLibrary {
    pub fn component(self) -> RequiredComponent {
        match self {
            SdkLibrary::Geocoding => RequiredComponent::GeocodingService,
            SdkLibrary::Drawing => RequiredComponent::DrawingTools,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SdkLibrary::Geocoding => "geocoding",
            SdkLibrary::Drawing => "drawing",
        }
    }
}

/// Probe points the readiness validator checks on a loaded container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredComponent {
    ModuleNamespace,
    CoreConstructor,
    CoordinatePrimitive,
    GeocodingService,
    DrawingTools,
}

impl RequiredComponent {
    /// Components every usable container must expose, independent of which
    /// sub-libraries were requested.
    pub const CORE: [RequiredComponent; 3] = [
        RequiredComponent::ModuleNamespace,
        RequiredComponent::CoreConstructor,
        RequiredComponent::CoordinatePrimitive,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub formatted: String,
    pub locality: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MapOptions {
    pub center: GeoPoint,
    pub zoom_level: u8,
}

/// Where a map surface should be mounted. Width/height of zero means the
/// host element has not been laid out yet.
#[derive(Debug, Clone)]
pub struct SurfaceTarget {
    pub element_id: String,
    pub width: u32,
    pub height: u32,
}

/// Fully resolved construction request handed to the container, after the
/// minimum-size fallback has been applied.
#[derive(Debug, Clone)]
pub struct MapSpec {
    pub element_id: String,
    pub width: u32,
    pub height: u32,
    pub center: GeoPoint,
    pub zoom_level: u8,
}

/// Per-run bookkeeping for one acquirer execution. Never persisted; exists
/// for logging and retry accounting only.
#[derive(Debug, Clone)]
pub struct AcquireAttempt {
    pub number: u32,
    pub attempt_id: Uuid,
    pub started_at: Instant,
    pub download_timeout: Duration,
}

impl AcquireAttempt {
    pub fn begin(number: u32, download_timeout: Duration) -> Self {
        Self {
            number,
            attempt_id: Uuid::now_v7(),
            started_at: Instant::now(),
            download_timeout,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// Three-way classification of the loaded container: never touched,
/// half-loaded, or fully usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Valid,
    Partial,
    Absent,
}
