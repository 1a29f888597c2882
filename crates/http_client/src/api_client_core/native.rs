// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use bytes::Bytes;
use tracing::debug;

use crate::error::HttpError;
use shared_types::requests::RequestId;

const USER_AGENT: &str = concat!("annotator/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ApiClientCore {
    client: reqwest::Client, // cheaply cloneable (Arc<...> internally), see docs
}

impl ApiClientCore {
    /// Client for our own services: every request carries the given request id.
    pub fn new(request_id: RequestId) -> Result<Self, HttpError> {
        let mut default_headers = reqwest::header::HeaderMap::with_capacity(1);
        default_headers.insert(
            RequestId::FIELD,
            reqwest::header::HeaderValue::from_str(&request_id.0).unwrap_or(
                reqwest::header::HeaderValue::from_static("non-ascii request id"),
            ),
        );

        let client = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .build()
            .map_err(|e| HttpError::BuildError {
                source: Box::new(e),
            })?;

        Ok(Self { client })
    }

    /// Construct a new ApiClientCore with no default headers / assumptions, for use with external APIs
    pub fn new_external() -> Result<Self, HttpError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::BuildError {
                source: Box::new(e),
            })?;
        Ok(Self { client })
    }

    /// Get or post a given body to a given url with a given content type, and optional extra headers.
    /// The content type of a successful response is checked against `expected_content_type`.
    pub(crate) async fn raw_request(
        &self,
        url: &str,
        body: Option<Bytes>,
        content_type: &'static str,
        header_iter: &[(String, String)],
        expected_content_type: &'static str,
    ) -> Result<bytes::Bytes, HttpError> {
        let mut rb = match body {
            Some(b) => self
                .client
                .post(url)
                .body(b)
                .header(reqwest::header::CONTENT_TYPE, content_type),
            None => self.client.get(url),
        };

        for (key, value) in header_iter {
            rb = rb.header(key, value)
        }

        debug!("http_client: requesting {url}");

        let response = rb.send().await.map_err(|e| HttpError::RequestError {
            ctx: format!("requesting {url}"),
            source: Box::new(e.without_url()),
        })?;

        let status = response.status();
        debug!("http_client: response from {url:?}: {status}");

        let content_type_ok = check_content_type(response.headers(), expected_content_type);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::RequestError {
                ctx: format!("reading response body from {url}"),
                source: Box::new(e.without_url()),
            })?;

        if !status.is_success() {
            return Err(HttpError::StatusError {
                ctx: format!("requesting {url}"),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        if let Err(actual) = content_type_ok {
            return Err(HttpError::ProtocolError {
                error: format!(
                    "{url} answered {status} with content type {actual:?}, expected {expected_content_type:?}"
                ),
            });
        }

        Ok(bytes)
    }
}

/// A missing content type header is accepted; a present one must start with
/// the expected media type (parameters such as `charset` are ignored).
fn check_content_type(
    headers: &reqwest::header::HeaderMap,
    expected_content_type: &str,
) -> Result<(), String> {
    if expected_content_type.is_empty() {
        return Ok(());
    }
    let Some(value) = headers.get(reqwest::header::CONTENT_TYPE) else {
        return Ok(());
    };
    let actual = String::from_utf8_lossy(value.as_bytes()).into_owned();
    let media_type = actual.split(';').next().unwrap_or_default().trim();
    if media_type.eq_ignore_ascii_case(expected_content_type) {
        Ok(())
    } else {
        Err(actual)
    }
}
