use std::sync::Arc;

use tokio::time::timeout;

use crate::{
    activator::ModuleActivator,
    error::{LoaderError, LoaderErrorKind},
    ports::{ExternalHandle, HostProbe, ModuleContainer, ResourceHost},
    types::{AcquireAttempt, Readiness, SdkLibrary},
    validator::ReadinessValidator,
};

/// Performs one load attempt: reuse what the host already has where
/// possible, otherwise discard stale artifacts and download fresh under the
/// outer timeout. Never touches the coordinator's resource state.
pub struct Acquirer {
    host: Arc<dyn ResourceHost>,
    validator: ReadinessValidator,
    activator: ModuleActivator,
    libraries: Vec<SdkLibrary>,
}

impl Acquirer {
    pub fn new(
        host: Arc<dyn ResourceHost>,
        validator: ReadinessValidator,
        activator: ModuleActivator,
        libraries: Vec<SdkLibrary>,
    ) -> Self {
        Self {
            host,
            validator,
            activator,
            libraries,
        }
    }

    pub async fn run(&self, attempt: &AcquireAttempt) -> Result<ExternalHandle, LoaderError> {
        match self.host.inspect() {
            HostProbe::Present(container) => {
                match self.validator.classify(Some(container.as_ref())) {
                    Readiness::Valid => {
                        // Another part of the process already loaded it.
                        tracing::debug!(
                            target: "mapload",
                            attempt = attempt.number,
                            attempt_id = %attempt.attempt_id,
                            "acquire_short_circuit"
                        );
                        Ok(self.wrap(container))
                    }
                    Readiness::Partial | Readiness::Absent => {
                        tracing::info!(
                            target: "mapload",
                            attempt = attempt.number,
                            attempt_id = %attempt.attempt_id,
                            "acquire_repair_partial"
                        );
                        self.activator.activate(&container, &self.validator).await?;
                        Ok(self.wrap(container))
                    }
                }
            }
            HostProbe::Stale | HostProbe::Absent => self.fresh_download(attempt).await,
        }
    }

    async fn fresh_download(
        &self,
        attempt: &AcquireAttempt,
    ) -> Result<ExternalHandle, LoaderError> {
        self.host.discard_artifact();

        tracing::info!(
            target: "mapload",
            attempt = attempt.number,
            attempt_id = %attempt.attempt_id,
            timeout_ms = attempt.download_timeout.as_millis() as u64,
            "acquire_download_start"
        );

        let container = match timeout(attempt.download_timeout, self.host.download(attempt)).await
        {
            Ok(Ok(container)) => container,
            Ok(Err(err)) => {
                tracing::warn!(
                    target: "mapload",
                    attempt = attempt.number,
                    kind = ?err.kind,
                    error = %err,
                    elapsed_ms = attempt.elapsed_ms(),
                    "acquire_download_failed"
                );
                return Err(err);
            }
            Err(_) => {
                // Drop whatever half-created artifact the download left so
                // the next attempt does not observe stale Partial state.
                self.host.discard_artifact();
                tracing::warn!(
                    target: "mapload",
                    attempt = attempt.number,
                    elapsed_ms = attempt.elapsed_ms(),
                    "acquire_download_timeout"
                );
                return Err(LoaderError::new(
                    LoaderErrorKind::Timeout,
                    format!(
                        "download did not complete within {}ms",
                        attempt.download_timeout.as_millis()
                    ),
                ));
            }
        };

        self.activator.activate(&container, &self.validator).await?;
        Ok(self.wrap(container))
    }

    fn wrap(&self, container: Arc<dyn ModuleContainer>) -> ExternalHandle {
        ExternalHandle::new(container, self.libraries.clone())
    }
}
