use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use futures_util::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use tokio::sync::Mutex;

use crate::{
    acquirer::Acquirer,
    activator::ModuleActivator,
    config::LoaderConfig,
    error::LoaderError,
    ports::{ExternalHandle, ResourceHost},
    types::{AcquireAttempt, Readiness},
    validator::ReadinessValidator,
};

type SharedAcquire = Shared<BoxFuture<'static, Result<ExternalHandle, LoaderError>>>;

/// Global readiness state of the singleton. Exactly one `Loading` flight may
/// exist at a time; the flight settles exactly once for all waiters.
pub enum ResourceState {
    Uninitialized,
    Loading(SharedAcquire),
    Ready(ExternalHandle),
    Failed(LoaderError),
}

impl ResourceState {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceState::Uninitialized => "uninitialized",
            ResourceState::Loading(_) => "loading",
            ResourceState::Ready(_) => "ready",
            ResourceState::Failed(_) => "failed",
        }
    }
}

/// Single-flight state machine every caller goes through. Owns the only
/// mutable shared state; the acquirer and activator return values and the
/// coordinator applies the resulting transition. Injectable rather than a
/// process-global so tests can construct and reset their own instance.
pub struct SingletonCoordinator {
    state: Arc<Mutex<ResourceState>>,
    acquirer: Arc<Acquirer>,
    validator: ReadinessValidator,
    download_timeout: Duration,
    attempt_counter: AtomicU32,
}

impl SingletonCoordinator {
    pub fn new(
        acquirer: Acquirer,
        validator: ReadinessValidator,
        download_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResourceState::Uninitialized)),
            acquirer: Arc::new(acquirer),
            validator,
            download_timeout,
            attempt_counter: AtomicU32::new(0),
        }
    }

    /// Wires validator, activator and acquirer from one config plus a host
    /// implementation.
    pub fn from_config(config: &LoaderConfig, host: Arc<dyn ResourceHost>) -> Self {
        let validator = ReadinessValidator::for_libraries(&config.libraries);
        let activator = ModuleActivator::new(config.activation_timeout());
        let acquirer = Acquirer::new(
            host,
            validator.clone(),
            activator,
            config.libraries.clone(),
        );
        Self::new(acquirer, validator, config.download_timeout())
    }

    /// Idempotent entry point, safe to call from any number of concurrent
    /// call sites. At most one underlying acquirer run is in flight; all
    /// callers that observe it receive the identical outcome.
    pub async fn acquire(&self) -> Result<ExternalHandle, LoaderError> {
        let flight = {
            let mut state = self.state.lock().await;

            if let ResourceState::Ready(handle) = &*state {
                match self.validator.classify(Some(handle.container().as_ref())) {
                    Readiness::Valid => return Ok(handle.clone()),
                    readiness => {
                        tracing::warn!(
                            target: "mapload",
                            handle_id = %handle.id(),
                            readiness = ?readiness,
                            "ready_state_invalidated"
                        );
                        *state = ResourceState::Uninitialized;
                    }
                }
            }

            if let ResourceState::Loading(flight) = &*state {
                flight.clone()
            } else {
                self.start_flight(&mut state)
            }
        };

        flight.await
    }

    /// Treat the shared handle as broken and force the next `acquire` to
    /// restart. No-op while a load is in flight or before first use.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        match &*state {
            ResourceState::Ready(handle) => {
                tracing::info!(target: "mapload", handle_id = %handle.id(), "handle_invalidated");
                *state = ResourceState::Uninitialized;
            }
            ResourceState::Failed(err) => {
                tracing::debug!(target: "mapload", kind = ?err.kind, "failed_state_cleared");
                *state = ResourceState::Uninitialized;
            }
            ResourceState::Loading(_) | ResourceState::Uninitialized => {}
        }
    }

    pub async fn state_name(&self) -> &'static str {
        self.state.lock().await.name()
    }

    fn start_flight(&self, state: &mut ResourceState) -> SharedAcquire {
        if let ResourceState::Failed(err) = state {
            tracing::debug!(target: "mapload", kind = ?err.kind, "failed_state_cleared");
        }

        let number = self.attempt_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let attempt = AcquireAttempt::begin(number, self.download_timeout);
        tracing::info!(
            target: "mapload",
            attempt = attempt.number,
            attempt_id = %attempt.attempt_id,
            "acquire_start"
        );

        let acquirer = Arc::clone(&self.acquirer);
        let shared_state = Arc::clone(&self.state);
        let flight: SharedAcquire = async move {
            let outcome = acquirer.run(&attempt).await;

            let mut state = shared_state.lock().await;
            match &outcome {
                Ok(handle) => {
                    tracing::info!(
                        target: "mapload",
                        attempt = attempt.number,
                        handle_id = %handle.id(),
                        elapsed_ms = attempt.elapsed_ms(),
                        "singleton_ready"
                    );
                    *state = ResourceState::Ready(handle.clone());
                }
                Err(err) => {
                    tracing::warn!(
                        target: "mapload",
                        attempt = attempt.number,
                        kind = ?err.kind,
                        error = %err,
                        elapsed_ms = attempt.elapsed_ms(),
                        "acquire_failed"
                    );
                    *state = ResourceState::Failed(err.clone());
                }
            }
            outcome
        }
        .boxed()
        .shared();

        // Driver task: the flight must run to completion and apply its state
        // transition even if every waiting caller is cancelled, otherwise the
        // state could stay Loading forever.
        tokio::spawn(flight.clone());

        *state = ResourceState::Loading(flight.clone());
        flight
    }
}
