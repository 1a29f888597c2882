// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned HTTP services for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::FutureExt;

use http_client::test_utils::{ApiClientCoreMock, MockRequest};
use http_client::{BaseApiClient, HttpError};

pub const CATALOG: &str = "https://catalog.test/rest/v1/core";
pub const PREDICTOR: &str = "https://predictor.test";

#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub url: String,
    pub body: Option<Bytes>,
}

/// Replies keyed by full URL. Unknown URLs fail like a refused connection.
#[derive(Default)]
pub struct FakeServices {
    routes: HashMap<String, (u16, String)>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), (status, body.into()));
        self
    }

    pub fn entry(self, id: &str, entity_ids: &[&str]) -> Self {
        let body = serde_json::json!({
            "rcsb_entry_container_identifiers": { "polymer_entity_ids": entity_ids }
        });
        self.route(format!("{CATALOG}/entry/{id}"), 200, body.to_string())
    }

    pub fn chain(self, id: &str, entity: &str, poly_type: &str, sequence: &str) -> Self {
        let body = serde_json::json!({
            "entity_poly": {
                "type": poly_type,
                "pdbx_seq_one_letter_code_can": sequence,
            }
        });
        self.route(
            format!("{CATALOG}/polymer_entity/{id}/{entity}"),
            200,
            body.to_string(),
        )
    }

    pub fn predictor(self, status: u16, body: impl Into<String>) -> Self {
        self.route(format!("{PREDICTOR}/predict"), status, body)
    }

    /// Build the client plus a log of every request it receives.
    pub fn build(self) -> (BaseApiClient, Arc<Mutex<Vec<RecordedCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let log = calls.clone();
        let routes = Arc::new(self.routes);
        let client = BaseApiClient::from(ApiClientCoreMock::from(move |req: MockRequest| {
            log.lock().unwrap().push(RecordedCall {
                url: req.url.clone(),
                body: req.body,
            });
            let url = req.url;
            let reply = routes.get(&url).cloned();
            async move {
                match reply {
                    Some((200, body)) => Ok::<_, HttpError>(Bytes::from(body)),
                    Some((status, body)) => Err(HttpError::StatusError {
                        ctx: format!("requesting {url}"),
                        status,
                        body,
                    }),
                    None => Err(HttpError::RequestError {
                        ctx: format!("requesting {url}"),
                        source: "connection refused".into(),
                    }),
                }
            }
            .boxed()
        }));
        (client, calls)
    }
}

pub fn catalog_url() -> url::Url {
    url::Url::parse(CATALOG).unwrap()
}

pub fn predictor_url() -> url::Url {
    url::Url::parse(PREDICTOR).unwrap()
}

/// Crambin, 46 residues.
pub const CRAMBIN: &str = "TTCCPSIVARSNFNVCRLPGTPEAICATYTGCIIIPGATCPGDYAN";
