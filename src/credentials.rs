use std::{env, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, configuration_error};

/// Where the vendor API key comes from. Resolution happens before any
/// network attempt; a missing or empty key is a hard configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CredentialRef {
    Env { var: String },
    Inline { key: String },
}

impl CredentialRef {
    pub fn resolve(&self) -> Result<ApiKey, LoaderError> {
        match self {
            CredentialRef::Env { var } => {
                let key = env::var(var).map_err(|_| {
                    configuration_error(format!(
                        "missing credential environment variable {}",
                        var
                    ))
                })?;
                ApiKey::parse(key)
            }
            CredentialRef::Inline { key } => ApiKey::parse(key.clone()),
        }
    }
}

/// Resolved vendor API key. Debug/Display never expose the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    fn parse(key: String) -> Result<Self, LoaderError> {
        if key.trim().is_empty() {
            return Err(configuration_error("credential key cannot be empty"));
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
