// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod native;

use bytes::Bytes;

pub use self::native::ApiClientCore as ApiClientCoreImpl;
use crate::error::HttpError;

/// The one transport operation everything else is built on. GET when `body`
/// is `None`, POST otherwise.
#[async_trait::async_trait]
pub trait ApiClientCore {
    async fn raw_request(
        &self,
        url: &str,
        body: Option<Bytes>,
        content_type: &'static str,
        headers: &[(String, String)],
        expected_content_type: &'static str,
    ) -> Result<Bytes, HttpError>;
}

#[async_trait::async_trait]
impl ApiClientCore for ApiClientCoreImpl {
    async fn raw_request(
        &self,
        url: &str,
        body: Option<Bytes>,
        content_type: &'static str,
        headers: &[(String, String)],
        expected_content_type: &'static str,
    ) -> Result<Bytes, HttpError> {
        self.raw_request(url, body, content_type, headers, expected_content_type)
            .await
    }
}

pub mod test_utils {
    use super::*;

    use futures::future::BoxFuture;

    /// A request as seen by [`ApiClientCoreMock`].
    #[derive(Clone, Debug)]
    pub struct MockRequest {
        pub url: String,
        /// `None` for GET.
        pub body: Option<Bytes>,
        pub content_type: &'static str,
        pub headers: Vec<(String, String)>,
        pub expected_content_type: &'static str,
    }

    type Responder =
        dyn Fn(MockRequest) -> BoxFuture<'static, Result<Bytes, HttpError>> + Send + Sync;

    /// Mock `ApiClientCore` that holds a closure that can respond to requests with fake responses, or errors.
    ///
    /// ```rust
    /// use futures::FutureExt;
    ///
    /// use http_client::{BaseApiClient, HttpError};
    /// use http_client::test_utils::{ApiClientCoreMock, MockRequest};
    ///
    /// let mock = ApiClientCoreMock::from(|req: MockRequest| {
    ///     // note the `async { ... }.boxed()`!
    ///     async move {
    ///         if req.url.ends_with("/entry/0000") {
    ///             Err(HttpError::StatusError {
    ///                 ctx: req.url,
    ///                 status: 404,
    ///                 body: r#"{"status":404,"message":"No data found"}"#.into(),
    ///             })
    ///         } else {
    ///             Ok(r#"{"polymer_entity_ids":["1"]}"#.as_bytes().into())
    ///         }
    ///     }.boxed()
    /// });
    /// let client = BaseApiClient::from(mock);
    ///
    /// // use the mocked client as desired
    /// let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    /// rt.block_on(async {
    ///     client.json_get::<serde_json::Value>("example.com/entry/1CRN").await.unwrap();
    ///     let err = client.json_get::<serde_json::Value>("example.com/entry/0000").await.unwrap_err();
    ///     assert_eq!(err.status(), Some(404));
    /// });
    /// ```
    pub struct ApiClientCoreMock {
        responder: Box<Responder>,
    }

    #[async_trait::async_trait]
    impl ApiClientCore for ApiClientCoreMock {
        async fn raw_request(
            &self,
            url: &str,
            body: Option<Bytes>,
            content_type: &'static str,
            headers: &[(String, String)],
            expected_content_type: &'static str,
        ) -> Result<Bytes, HttpError> {
            (self.responder)(MockRequest {
                url: url.to_owned(),
                body,
                content_type,
                headers: headers.to_vec(),
                expected_content_type,
            })
            .await
        }
    }

    impl<F> From<F> for ApiClientCoreMock
    where
        F: Fn(MockRequest) -> BoxFuture<'static, Result<Bytes, HttpError>> + Send + Sync + 'static,
    {
        fn from(responder: F) -> Self {
            Self {
                responder: Box::new(responder),
            }
        }
    }
}
