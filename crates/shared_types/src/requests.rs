// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use uuid::Uuid;

/// A unique per-submission ID. It tags every log line of one pipeline run and
/// is sent to the predictor as an HTTP header, so a failed prediction can be
/// found in the predictor's own logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub const FIELD: &'static str = "X-Request-ID";

    pub fn new_unique_with_prefix(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
