//! Scriptable fakes for the host environment and the loaded module, used by
//! the unit and integration tests. Outcomes are queued ahead of time and
//! every interesting interaction is counted.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{LoaderError, internal_error},
    ports::{HostProbe, MapSurface, ModuleContainer, ResourceHost},
    types::{AcquireAttempt, Address, GeoPoint, MapSpec, RequiredComponent},
};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How a fake container answers its ready registration.
#[derive(Debug, Clone)]
pub enum ReadyBehavior {
    Succeed,
    /// Succeed and wire up whatever was missing, modelling an SDK that
    /// finishes its internal setup during the ready callback.
    SucceedAndRepair,
    Fail(LoaderError),
    Hang,
}

pub struct FakeContainer {
    missing: Mutex<Vec<RequiredComponent>>,
    smoke_failure: Mutex<Option<String>>,
    ready_behavior: Mutex<ReadyBehavior>,
    ready_calls: AtomicU32,
    construction_failures: Mutex<VecDeque<LoaderError>>,
    maps_created: AtomicU32,
}

impl FakeContainer {
    pub fn valid() -> Self {
        Self {
            missing: Mutex::new(Vec::new()),
            smoke_failure: Mutex::new(None),
            ready_behavior: Mutex::new(ReadyBehavior::Succeed),
            ready_calls: AtomicU32::new(0),
            construction_failures: Mutex::new(VecDeque::new()),
            maps_created: AtomicU32::new(0),
        }
    }

    pub fn partial(missing: &[RequiredComponent]) -> Self {
        let container = Self::valid();
        *locked(&container.missing) = missing.to_vec();
        container
    }

    pub fn with_smoke_failure(self, reason: impl Into<String>) -> Self {
        *locked(&self.smoke_failure) = Some(reason.into());
        self
    }

    pub fn with_ready_behavior(self, behavior: ReadyBehavior) -> Self {
        *locked(&self.ready_behavior) = behavior;
        self
    }

    /// Break an already-delivered container, simulating a module that lost
    /// components after it was handed out.
    pub fn set_missing(&self, missing: &[RequiredComponent]) {
        *locked(&self.missing) = missing.to_vec();
    }

    pub fn queue_construction_failure(&self, err: LoaderError) {
        locked(&self.construction_failures).push_back(err);
    }

    pub fn ready_calls(&self) -> u32 {
        self.ready_calls.load(Ordering::Relaxed)
    }

    pub fn maps_created(&self) -> u32 {
        self.maps_created.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ModuleContainer for FakeContainer {
    fn component_present(&self, component: RequiredComponent) -> bool {
        !locked(&self.missing).contains(&component)
    }

    fn smoke_test(&self) -> Result<(), String> {
        match &*locked(&self.smoke_failure) {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    async fn notify_ready(&self) -> Result<(), LoaderError> {
        self.ready_calls.fetch_add(1, Ordering::Relaxed);
        let behavior = locked(&self.ready_behavior).clone();
        match behavior {
            ReadyBehavior::Succeed => Ok(()),
            ReadyBehavior::SucceedAndRepair => {
                locked(&self.missing).clear();
                *locked(&self.smoke_failure) = None;
                Ok(())
            }
            ReadyBehavior::Fail(err) => Err(err),
            ReadyBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn create_map(&self, spec: &MapSpec) -> Result<MapSurface, LoaderError> {
        if let Some(err) = locked(&self.construction_failures).pop_front() {
            return Err(err);
        }
        self.maps_created.fetch_add(1, Ordering::Relaxed);
        Ok(MapSurface {
            surface_id: Uuid::now_v7().to_string(),
            element_id: spec.element_id.clone(),
            width: spec.width,
            height: spec.height,
        })
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<Address, LoaderError> {
        Ok(Address {
            formatted: format!("{:.4}, {:.4}", point.lat, point.lon),
            locality: Some("Faketown".to_string()),
            country: Some("Testland".to_string()),
        })
    }

    async fn forward_geocode(&self, _address: &str) -> Result<GeoPoint, LoaderError> {
        Ok(GeoPoint {
            lat: 52.52,
            lon: 13.405,
        })
    }
}

enum ProbeState {
    Absent,
    Stale,
    Present(Arc<FakeContainer>),
}

/// What one scripted download does.
pub enum DownloadOutcome {
    Deliver(Arc<FakeContainer>),
    DeliverAfter(Duration, Arc<FakeContainer>),
    Fail(LoaderError),
    Hang,
}

pub struct FakeHost {
    probe: Mutex<ProbeState>,
    downloads: Mutex<VecDeque<DownloadOutcome>>,
    download_calls: AtomicU32,
    discard_calls: AtomicU32,
}

impl FakeHost {
    pub fn absent() -> Self {
        Self {
            probe: Mutex::new(ProbeState::Absent),
            downloads: Mutex::new(VecDeque::new()),
            download_calls: AtomicU32::new(0),
            discard_calls: AtomicU32::new(0),
        }
    }

    pub fn stale() -> Self {
        let host = Self::absent();
        *locked(&host.probe) = ProbeState::Stale;
        host
    }

    pub fn present(container: Arc<FakeContainer>) -> Self {
        let host = Self::absent();
        *locked(&host.probe) = ProbeState::Present(container);
        host
    }

    pub fn queue_download(&self, outcome: DownloadOutcome) {
        locked(&self.downloads).push_back(outcome);
    }

    pub fn download_calls(&self) -> u32 {
        self.download_calls.load(Ordering::Relaxed)
    }

    pub fn discard_calls(&self) -> u32 {
        self.discard_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ResourceHost for FakeHost {
    fn inspect(&self) -> HostProbe {
        match &*locked(&self.probe) {
            ProbeState::Absent => HostProbe::Absent,
            ProbeState::Stale => HostProbe::Stale,
            ProbeState::Present(container) => {
                HostProbe::Present(Arc::clone(container) as Arc<dyn ModuleContainer>)
            }
        }
    }

    async fn download(
        &self,
        _attempt: &AcquireAttempt,
    ) -> Result<Arc<dyn ModuleContainer>, LoaderError> {
        self.download_calls.fetch_add(1, Ordering::Relaxed);
        let outcome = locked(&self.downloads).pop_front();
        match outcome {
            Some(DownloadOutcome::Deliver(container)) => {
                *locked(&self.probe) = ProbeState::Present(Arc::clone(&container));
                Ok(container as Arc<dyn ModuleContainer>)
            }
            Some(DownloadOutcome::DeliverAfter(delay, container)) => {
                tokio::time::sleep(delay).await;
                *locked(&self.probe) = ProbeState::Present(Arc::clone(&container));
                Ok(container as Arc<dyn ModuleContainer>)
            }
            Some(DownloadOutcome::Fail(err)) => {
                *locked(&self.probe) = ProbeState::Stale;
                Err(err)
            }
            Some(DownloadOutcome::Hang) => {
                std::future::pending::<()>().await;
                Err(internal_error("unreachable: hung download resumed"))
            }
            None => Err(internal_error("no scripted download outcome left")),
        }
    }

    fn discard_artifact(&self) {
        self.discard_calls.fetch_add(1, Ordering::Relaxed);
        *locked(&self.probe) = ProbeState::Absent;
    }
}
