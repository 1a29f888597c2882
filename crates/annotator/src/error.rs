// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use http_client::HttpError;

/// Message used when the predictor rejects a request without saying why.
pub const GENERIC_REJECTION: &str = "Prediction failed";

/// Everything that can stop a submission. Each variant's `Display` is the
/// message shown to the user.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Enter either a protein sequence or a PDB ID, not both")]
    InputConflict,
    #[error("Please enter a sequence or a valid 4-character PDB ID (e.g., 1CRN)")]
    InputMissing,
    #[error("Sequence contains characters outside the 20 standard amino acids: {invalid}")]
    InvalidSequenceAlphabet { invalid: String },
    #[error("{identifier:?} is not a valid 4-character PDB ID (e.g., 1CRN)")]
    InvalidIdentifierFormat { identifier: String },
    #[error("PDB entry {identifier} not found")]
    EntryNotFound { identifier: String },
    #[error("Could not reach the structure catalog: {0}")]
    CatalogUnreachable(#[source] HttpError),
    #[error("No polymer entities found in entry {identifier}")]
    NoPolymerChains { identifier: String },
    #[error("No protein sequences found for entry {identifier}")]
    NoProteinSequencesFound { identifier: String },
    #[error("Network error: predictor not reachable ({0})")]
    PredictorUnreachable(#[source] HttpError),
    #[error("{detail}")]
    PredictionRejected { detail: String },
}

impl AnnotationError {
    /// True for errors raised before any network call was made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InputConflict
                | Self::InputMissing
                | Self::InvalidSequenceAlphabet { .. }
                | Self::InvalidIdentifierFormat { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history storage: {0}")]
    Storage(#[from] persistence::tokio_rusqlite::Error),
    #[error("couldn't open history db: {0}")]
    Open(#[from] persistence::OpenError),
    #[error("history is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),
}
