use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::Url;

use crate::{
    config::LoaderConfig,
    credentials::ApiKey,
    error::{LoaderError, LoaderErrorKind, configuration_error},
    ports::{HostProbe, ModuleContainer, ModuleLinker, ResourceHost},
    types::{AcquireAttempt, SdkLibrary},
};

/// Host that fetches the vendor bundle over HTTPS and hands it to a linker
/// for materialization. The artifact slot mirrors what a browser host would
/// see in the DOM: nothing, a dead script tag, or a live module.
pub struct HttpVendorHost {
    endpoint: String,
    api_key: ApiKey,
    libraries: Vec<SdkLibrary>,
    client: reqwest::Client,
    linker: Arc<dyn ModuleLinker>,
    slot: Mutex<ArtifactSlot>,
}

enum ArtifactSlot {
    Empty,
    /// Bundle fetched (or fetch attempted) but no live container: the
    /// stale-artifact case a later attempt must discard.
    Stale,
    Linked(Arc<dyn ModuleContainer>),
}

impl std::fmt::Debug for HttpVendorHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpVendorHost")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key)
            .field("libraries", &self.libraries)
            .finish_non_exhaustive()
    }
}

impl HttpVendorHost {
    /// Resolves the credential up front: a missing key fails here, before
    /// any network attempt is made.
    pub fn from_config(
        config: &LoaderConfig,
        linker: Arc<dyn ModuleLinker>,
    ) -> Result<Self, LoaderError> {
        let api_key = config.credential.resolve()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key,
            libraries: config.libraries.clone(),
            client: reqwest::Client::new(),
            linker,
            slot: Mutex::new(ArtifactSlot::Empty),
        })
    }

    fn bundle_url(&self) -> Result<Url, LoaderError> {
        let mut url = Url::parse(&self.endpoint).map_err(|err| {
            configuration_error(format!("invalid vendor endpoint '{}'", self.endpoint))
                .with_detail(err.to_string())
        })?;
        url.query_pairs_mut().append_pair("key", self.api_key.expose());
        if !self.libraries.is_empty() {
            let libraries = self
                .libraries
                .iter()
                .map(|library| library.as_param())
                .collect::<Vec<_>>()
                .join(",");
            url.query_pairs_mut().append_pair("libraries", &libraries);
        }
        Ok(url)
    }

    fn set_slot(&self, slot: ArtifactSlot) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = slot;
    }
}

#[async_trait]
impl ResourceHost for HttpVendorHost {
    fn inspect(&self) -> HostProbe {
        match &*self.slot.lock().unwrap_or_else(PoisonError::into_inner) {
            ArtifactSlot::Empty => HostProbe::Absent,
            ArtifactSlot::Stale => HostProbe::Stale,
            ArtifactSlot::Linked(container) => HostProbe::Present(Arc::clone(container)),
        }
    }

    async fn download(
        &self,
        attempt: &AcquireAttempt,
    ) -> Result<Arc<dyn ModuleContainer>, LoaderError> {
        let url = self.bundle_url()?;

        // Log the endpoint only; the full URL carries the credential.
        tracing::info!(
            target: "mapload",
            attempt = attempt.number,
            endpoint = %self.endpoint,
            "bundle_download_start"
        );

        let response = self.client.get(url).send().await.map_err(|err| {
            self.set_slot(ArtifactSlot::Stale);
            LoaderError::new(LoaderErrorKind::DownloadFailed, "bundle request failed")
                .with_detail(err.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            self.set_slot(ArtifactSlot::Stale);
            return Err(LoaderError::new(
                LoaderErrorKind::DownloadFailed,
                format!("vendor endpoint returned {}", status),
            ));
        }

        let bundle = response.bytes().await.map_err(|err| {
            self.set_slot(ArtifactSlot::Stale);
            LoaderError::new(LoaderErrorKind::DownloadFailed, "bundle body read failed")
                .with_detail(err.to_string())
        })?;

        // Bundle is on the host but not yet a live module; a link failure
        // must leave the slot stale, not empty.
        self.set_slot(ArtifactSlot::Stale);
        let container = self.linker.link(&bundle)?;
        self.set_slot(ArtifactSlot::Linked(Arc::clone(&container)));

        tracing::info!(
            target: "mapload",
            attempt = attempt.number,
            bundle_bytes = bundle.len(),
            "bundle_linked"
        );
        Ok(container)
    }

    fn discard_artifact(&self) {
        tracing::debug!(target: "mapload", "artifact_discarded");
        self.set_slot(ArtifactSlot::Empty);
    }
}
