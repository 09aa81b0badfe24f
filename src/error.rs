use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderErrorKind {
    Configuration,
    DownloadFailed,
    Timeout,
    ActivationFailed,
    ActivationIncomplete,
    ServiceUnavailable,
    TransientConstruction,
    InvalidRequest,
    Internal,
}

/// Error type shared by every loader phase. Errors are `Clone` so a single
/// failure can settle all waiters of the shared in-flight future.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderError {
    pub kind: LoaderErrorKind,
    pub message: String,
    pub retryable: bool,
    pub detail: Option<String>,
}

impl LoaderError {
    pub fn new(kind: LoaderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: matches!(
                kind,
                LoaderErrorKind::DownloadFailed
                    | LoaderErrorKind::Timeout
                    | LoaderErrorKind::ActivationFailed
                    | LoaderErrorKind::ActivationIncomplete
                    | LoaderErrorKind::TransientConstruction
            ),
            detail: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.message, detail),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for LoaderError {}

pub fn configuration_error(message: impl Into<String>) -> LoaderError {
    LoaderError::new(LoaderErrorKind::Configuration, message)
}

pub fn invalid_request(message: impl Into<String>) -> LoaderError {
    LoaderError::new(LoaderErrorKind::InvalidRequest, message)
}

pub fn service_unavailable(message: impl Into<String>) -> LoaderError {
    LoaderError::new(LoaderErrorKind::ServiceUnavailable, message)
}

pub fn transient_construction(message: impl Into<String>) -> LoaderError {
    LoaderError::new(LoaderErrorKind::TransientConstruction, message)
}

pub fn internal_error(message: impl Into<String>) -> LoaderError {
    LoaderError::new(LoaderErrorKind::Internal, message)
}
