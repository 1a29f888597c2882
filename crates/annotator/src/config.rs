// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;
use url::Url;

/// Where the predictor listens when nothing else is configured.
pub const DEFAULT_PREDICTOR_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "mixed transport: secure transport is required but the {service} is plain http ({url}); \
         use a public https URL for it or drop the secure-transport requirement"
    )]
    MixedTransport { service: &'static str, url: String },
    #[error("{service} URL must be http or https, not {scheme:?}")]
    UnsupportedScheme {
        service: &'static str,
        scheme: String,
    },
}

/// Endpoints of the two remote services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub predictor_url: Url,
    pub catalog_url: Url,
    /// When set, every endpoint must be https.
    pub require_secure_transport: bool,
}

impl ServiceConfig {
    pub fn new(predictor_url: Url, catalog_url: Url) -> Self {
        Self {
            predictor_url,
            catalog_url,
            require_secure_transport: false,
        }
    }

    /// Check the endpoints once, before anything is sent anywhere.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (service, url) in self.endpoints() {
            match url.scheme() {
                "https" => {}
                "http" if self.require_secure_transport => {
                    return Err(ConfigError::MixedTransport {
                        service,
                        url: url.to_string(),
                    })
                }
                "http" => {}
                other => {
                    return Err(ConfigError::UnsupportedScheme {
                        service,
                        scheme: other.to_owned(),
                    })
                }
            }
        }
        Ok(())
    }

    fn endpoints(&self) -> [(&'static str, &Url); 2] {
        [
            ("predictor", &self.predictor_url),
            ("catalog", &self.catalog_url),
        ]
    }
}
