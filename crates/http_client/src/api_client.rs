// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::api_client_core::{ApiClientCore, ApiClientCoreImpl};
use crate::error::HttpError;
use shared_types::requests::RequestId;

/// Helper for talking JSON to the catalog and predictor services.
#[derive(Clone)]
pub struct BaseApiClient {
    // 99% of the time this is going to be ApiClientCoreImpl, but it's overrideable for mocking purposes
    core: Arc<dyn ApiClientCore + Send + Sync>,
}

impl<Core: ApiClientCore + Send + Sync + 'static> From<Core> for BaseApiClient {
    fn from(core: Core) -> Self {
        Self {
            core: Arc::new(core),
        }
    }
}

// constructors for the usual case where we're using ApiClientCoreImpl
impl BaseApiClient {
    /// Construct a new ApiClient for the given RequestId. It will attach this
    /// id to each request it makes.
    pub fn new(request_id: RequestId) -> Result<Self, HttpError> {
        Ok(ApiClientCoreImpl::new(request_id)?.into())
    }

    /// Construct a new ApiClient for use with external APIs: it won't set any
    /// extra headers.
    pub fn new_external() -> Result<Self, HttpError> {
        Ok(ApiClientCoreImpl::new_external()?.into())
    }

    /// Get JSON. Returns error for non-2xx status.
    pub async fn json_get<O: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<O, HttpError> {
        let bytes = self.raw_get(url, &[], "application/json").await?;
        decode_json(url, bytes)
    }

    /// Post JSON, get JSON. Returns error for non-2xx status.
    pub async fn json_json_post<I: serde::Serialize, O: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        payload: &I,
    ) -> Result<O, HttpError> {
        let body = serde_json::to_vec(payload).map_err(|e| HttpError::EncodeError {
            encoding: format!("json payload for {url}"),
            source: Box::new(e),
        })?;
        self.bytes_json_post(url, body.into(), "application/json")
            .await
    }

    /// Post bytes, get JSON. Bring your own content-type. Returns error for non-2xx status.
    pub async fn bytes_json_post<O: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: Bytes,
        content_type: &'static str,
    ) -> Result<O, HttpError> {
        let bytes = self
            .raw_post(url, body, content_type, &[], "application/json")
            .await?;
        decode_json(url, bytes)
    }

    pub(crate) async fn raw_post(
        &self,
        url: &str,
        body: Bytes,
        content_type: &'static str,
        header_iter: &[(String, String)],
        expected_content_type: &'static str,
    ) -> Result<bytes::Bytes, HttpError> {
        self.core
            .raw_request(
                url,
                Some(body),
                content_type,
                header_iter,
                expected_content_type,
            )
            .await
    }

    pub(crate) async fn raw_get(
        &self,
        url: &str,
        header_iter: &[(String, String)],
        expected_content_type: &'static str,
    ) -> Result<bytes::Bytes, HttpError> {
        self.core
            .raw_request(url, None, "", header_iter, expected_content_type)
            .await
    }
}

impl fmt::Debug for BaseApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseApiClient").finish_non_exhaustive()
    }
}

fn decode_json<O: serde::de::DeserializeOwned>(url: &str, bytes: Bytes) -> Result<O, HttpError> {
    serde_json::from_slice(&bytes).map_err(|e| {
        let error_text = format_serde_error_from_bytes(bytes.into(), e);
        HttpError::DecodeError {
            decoding: format!("json from {url}"),
            source: error_text.into(),
        }
    })
}

fn format_serde_error_from_bytes(
    bytes: Vec<u8>,
    e: impl Into<format_serde_error::ErrorTypes>,
) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => format_serde_error::SerdeError::new(text, e).to_string(),
        Err(err) => err.to_string(),
    }
}
