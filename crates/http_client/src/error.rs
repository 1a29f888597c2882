// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Bodies quoted in error messages are cut to this many characters.
const BODY_PREVIEW_LEN: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// No response was received at all (DNS, connect, TLS, reset, ...).
    #[error("while {ctx}: no response: {source}")]
    RequestError {
        ctx: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// The server responded, but not with a 2xx status.
    #[error("while {ctx}: status {status}: {body_preview}", body_preview=BodyPreview(body))]
    StatusError {
        ctx: String,
        status: u16,
        body: String,
    },
    #[error("decoding {decoding}: {source}")]
    DecodeError {
        decoding: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("encoding {encoding}: {source}")]
    EncodeError {
        encoding: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("protocol error: {error}")]
    ProtocolError { error: String },
    #[error("couldn't build http client: {source}")]
    BuildError {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl HttpError {
    /// True when the request failed before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::RequestError { .. })
    }

    /// The HTTP status of a non-success response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::StatusError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The body of a non-success response, if there was one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            HttpError::StatusError { body, .. } => Some(body),
            _ => None,
        }
    }
}

struct BodyPreview<'a>(&'a str);

impl std::fmt::Display for BodyPreview<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(empty body)");
        }
        match self.0.char_indices().nth(BODY_PREVIEW_LEN) {
            Some((cut, _)) => write!(f, "{}...", &self.0[..cut]),
            None => f.write_str(self.0),
        }
    }
}
