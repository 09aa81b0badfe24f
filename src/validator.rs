use crate::{
    ports::ModuleContainer,
    types::{Readiness, RequiredComponent, SdkLibrary},
};

/// Classifies a loaded container as never-touched, half-loaded, or fully
/// usable. This three-way split is what lets the coordinator tell "start a
/// download" apart from "someone else half-loaded this, repair it".
#[derive(Debug, Clone)]
pub struct ReadinessValidator {
    required: Vec<RequiredComponent>,
}

impl ReadinessValidator {
    /// Required set is the core components plus whatever the configured
    /// sub-libraries imply.
    pub fn for_libraries(libraries: &[SdkLibrary]) -> Self {
        let mut required = RequiredComponent::CORE.to_vec();
        for library in libraries {
            let component = library.component();
            if !required.contains(&component) {
                required.push(component);
            }
        }
        Self { required }
    }

    pub fn classify(&self, container: Option<&dyn ModuleContainer>) -> Readiness {
        let Some(container) = container else {
            return Readiness::Absent;
        };

        for component in &self.required {
            if !container.component_present(*component) {
                tracing::debug!(
                    target: "mapload",
                    component = ?component,
                    "readiness_component_missing"
                );
                return Readiness::Partial;
            }
        }

        // All components present is not enough: a half-wired module can still
        // fail to construct its simplest primitive.
        if let Err(reason) = container.smoke_test() {
            tracing::debug!(target: "mapload", reason = %reason, "readiness_smoke_test_failed");
            return Readiness::Partial;
        }

        Readiness::Valid
    }
}
