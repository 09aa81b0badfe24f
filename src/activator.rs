use std::{sync::Arc, time::Duration};

use tokio::time::timeout;

use crate::{
    error::{LoaderError, LoaderErrorKind},
    ports::ModuleContainer,
    types::Readiness,
    validator::ReadinessValidator,
};

/// Second phase of the two-phase load: the module is parsed/linked, but many
/// SDKs only become usable after their own internal ready callback fires.
/// Bounded by a short timeout independent of the download timeout.
#[derive(Debug, Clone)]
pub struct ModuleActivator {
    timeout: Duration,
}

impl ModuleActivator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn activate(
        &self,
        container: &Arc<dyn ModuleContainer>,
        validator: &ReadinessValidator,
    ) -> Result<(), LoaderError> {
        match timeout(self.timeout, container.notify_ready()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(target: "mapload", error = %err, "activation_failed");
                return Err(LoaderError::new(
                    LoaderErrorKind::ActivationFailed,
                    "module ready callback failed",
                )
                .with_detail(err.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    target: "mapload",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "activation_timeout"
                );
                return Err(LoaderError::new(
                    LoaderErrorKind::Timeout,
                    format!(
                        "module activation did not complete within {}ms",
                        self.timeout.as_millis()
                    ),
                ));
            }
        }

        // Re-validate after the ready callback: a module that reports ready
        // while still failing validation must never reach consumers.
        match validator.classify(Some(container.as_ref())) {
            Readiness::Valid => Ok(()),
            readiness => {
                tracing::warn!(target: "mapload", readiness = ?readiness, "activation_incomplete");
                Err(LoaderError::new(
                    LoaderErrorKind::ActivationIncomplete,
                    "module reported ready but readiness validation still fails",
                ))
            }
        }
    }
}
