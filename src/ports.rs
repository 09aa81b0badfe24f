use std::{fmt, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::LoaderError,
    types::{AcquireAttempt, Address, GeoPoint, MapSpec, RequiredComponent, SdkLibrary},
};

/// A map surface the container has bound to a host element. Owned by the
/// consumer; dropping it never affects the shared module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSurface {
    pub surface_id: String,
    pub element_id: String,
    pub width: u32,
    pub height: u32,
}

/// The loaded external module as seen by the loader. Implementations wrap
/// whatever the host environment produced (injected script global, dynamic
/// library, test fake).
#[async_trait]
pub trait ModuleContainer: Send + Sync {
    fn component_present(&self, component: RequiredComponent) -> bool;

    /// Construct the simplest primitive the module offers. An error here
    /// means the module is only half-wired even if all components exist.
    fn smoke_test(&self) -> Result<(), String>;

    /// The module's own second-phase ready registration. Resolves once the
    /// module reports itself usable; the activator bounds this with its own
    /// timeout.
    async fn notify_ready(&self) -> Result<(), LoaderError>;

    fn create_map(&self, spec: &MapSpec) -> Result<MapSurface, LoaderError>;

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<Address, LoaderError>;

    async fn forward_geocode(&self, address: &str) -> Result<GeoPoint, LoaderError>;
}

/// What the host environment currently holds. `Stale` is an artifact left by
/// a failed prior load: the injection happened but the module global never
/// materialized, so it must be discarded before a fresh download.
pub enum HostProbe {
    Absent,
    Stale,
    Present(Arc<dyn ModuleContainer>),
}

/// The environment the module is fetched into. Host-side artifacts are
/// mutated only here; the resource state machine never reaches through.
#[async_trait]
pub trait ResourceHost: Send + Sync {
    fn inspect(&self) -> HostProbe;

    async fn download(
        &self,
        attempt: &AcquireAttempt,
    ) -> Result<Arc<dyn ModuleContainer>, LoaderError>;

    fn discard_artifact(&self);
}

/// Turns a downloaded bundle into a live container. The non-browser
/// analogue of waiting for a script element's load event.
pub trait ModuleLinker: Send + Sync {
    fn link(&self, bundle: &[u8]) -> Result<Arc<dyn ModuleContainer>, LoaderError>;
}

/// Opaque reference to the validated module. Cheap to clone; all clones
/// share the same underlying container. Identity is the handle id.
#[derive(Clone)]
pub struct ExternalHandle {
    id: Uuid,
    container: Arc<dyn ModuleContainer>,
    libraries: Vec<SdkLibrary>,
}

impl ExternalHandle {
    pub fn new(container: Arc<dyn ModuleContainer>, libraries: Vec<SdkLibrary>) -> Self {
        Self {
            id: Uuid::now_v7(),
            container,
            libraries,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn container(&self) -> &Arc<dyn ModuleContainer> {
        &self.container
    }

    pub fn supports(&self, library: SdkLibrary) -> bool {
        self.libraries.contains(&library)
    }
}

impl fmt::Debug for ExternalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalHandle")
            .field("id", &self.id)
            .field("libraries", &self.libraries)
            .finish_non_exhaustive()
    }
}
