use std::{sync::Arc, time::Duration};

use mapload::{
    acquirer::Acquirer,
    activator::ModuleActivator,
    coordinator::SingletonCoordinator,
    testing::FakeHost,
    types::SdkLibrary,
    validator::ReadinessValidator,
};

pub const FAST_DOWNLOAD_TIMEOUT: Duration = Duration::from_millis(200);
pub const FAST_ACTIVATION_TIMEOUT: Duration = Duration::from_millis(100);

pub fn coordinator(host: Arc<FakeHost>, libraries: &[SdkLibrary]) -> SingletonCoordinator {
    coordinator_with_timeouts(host, libraries, FAST_DOWNLOAD_TIMEOUT, FAST_ACTIVATION_TIMEOUT)
}

pub fn coordinator_with_timeouts(
    host: Arc<FakeHost>,
    libraries: &[SdkLibrary],
    download_timeout: Duration,
    activation_timeout: Duration,
) -> SingletonCoordinator {
    let validator = ReadinessValidator::for_libraries(libraries);
    let activator = ModuleActivator::new(activation_timeout);
    let acquirer = Acquirer::new(host, validator.clone(), activator, libraries.to_vec());
    SingletonCoordinator::new(acquirer, validator, download_timeout)
}
