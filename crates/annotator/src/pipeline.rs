// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One user's annotation session: validates a submission, resolves PDB entries,
//! runs the predictor (or the synthetic generator) and keeps the history.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{select_primary_chain, EntryResolver};
use crate::config::{ConfigError, ServiceConfig};
use crate::error::AnnotationError;
use crate::history::{display_name_for, HistoryStore, SampleHistory};
use crate::normalize;
use crate::predictor::{PredictionClient, PredictionInput};
use crate::stats::AnnotationStatistics;
use crate::synthetic;
use http_client::{BaseApiClient, HttpError};
use shared_types::history::SampleRecord;
use shared_types::requests::RequestId;
use shared_types::ResidueAnnotation;

/// Raw text as the user typed it. Either field may be blank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Submission {
    pub sequence: String,
    pub identifier: String,
}

impl Submission {
    pub fn sequence(text: impl Into<String>) -> Self {
        Self {
            sequence: text.into(),
            identifier: String::new(),
        }
    }

    pub fn identifier(text: impl Into<String>) -> Self {
        Self {
            sequence: String::new(),
            identifier: text.into(),
        }
    }

    /// Normalize both fields and decide which one is being submitted.
    ///
    /// Never touches the network; every error here is the user's to fix.
    pub fn validate(&self) -> Result<PredictionInput, AnnotationError> {
        let sequence = normalize::normalize(&self.sequence);
        let identifier = normalize::normalize_identifier(&self.identifier);

        match (sequence.is_empty(), identifier.is_empty()) {
            (false, false) => Err(AnnotationError::InputConflict),
            (true, true) => Err(AnnotationError::InputMissing),
            (false, true) => {
                if normalize::validate(&sequence) {
                    Ok(PredictionInput::Sequence(sequence))
                } else {
                    Err(AnnotationError::InvalidSequenceAlphabet {
                        invalid: normalize::invalid_residues(&sequence),
                    })
                }
            }
            (true, false) => {
                if normalize::is_valid_identifier(&identifier) {
                    Ok(PredictionInput::Identifier(identifier))
                } else {
                    Err(AnnotationError::InvalidIdentifierFormat { identifier })
                }
            }
        }
    }
}

/// Where annotations come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// The remote predictor service.
    #[default]
    Remote,
    /// Locally generated labels. Demo only; never a stand-in for a failed prediction.
    Synthetic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub residue_count: usize,
    pub chain_count: usize,
}

/// Everything a finished submission produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotationRun {
    #[serde(serialize_with = "serialize_display")]
    pub request_id: RequestId,
    pub backend: Backend,
    pub annotations: Vec<ResidueAnnotation>,
    pub display_sequence: String,
    pub display_identifier: Option<String>,
    pub summary: EntrySummary,
    pub statistics: AnnotationStatistics,
}

fn serialize_display<S: serde::Serializer>(
    value: &RequestId,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PipelineState {
    #[default]
    Idle,
    Validating,
    Resolving,
    Predicting,
    Ready(Box<AnnotationRun>),
    /// The user-facing message of whatever went wrong.
    Failed(String),
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Validating => "validating",
            PipelineState::Resolving => "resolving",
            PipelineState::Predicting => "predicting",
            PipelineState::Ready(_) => "ready",
            PipelineState::Failed(_) => "failed",
        }
    }
}

/// Hands out the HTTP clients for one submission.
pub trait ClientFactory: Send + Sync {
    fn catalog_client(&self, request_id: &RequestId) -> Result<BaseApiClient, HttpError>;
    fn predictor_client(&self, request_id: &RequestId) -> Result<BaseApiClient, HttpError>;
}

/// reqwest-backed clients. Only the predictor gets the request ID header; the
/// catalog is a third-party API.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeClients;

impl ClientFactory for NativeClients {
    fn catalog_client(&self, _request_id: &RequestId) -> Result<BaseApiClient, HttpError> {
        BaseApiClient::new_external()
    }

    fn predictor_client(&self, request_id: &RequestId) -> Result<BaseApiClient, HttpError> {
        BaseApiClient::new(request_id.clone())
    }
}

// a prebuilt (usually mocked) client serves both services
impl ClientFactory for BaseApiClient {
    fn catalog_client(&self, _request_id: &RequestId) -> Result<BaseApiClient, HttpError> {
        Ok(self.clone())
    }

    fn predictor_client(&self, _request_id: &RequestId) -> Result<BaseApiClient, HttpError> {
        Ok(self.clone())
    }
}

/// A single-owner annotation context. `submit` takes `&mut self`, so only one
/// submission can be in flight at a time.
pub struct AnnotationSession<R = StdRng> {
    config: ServiceConfig,
    clients: Box<dyn ClientFactory>,
    backend: Backend,
    store: Arc<dyn HistoryStore>,
    history: SampleHistory,
    rng: R,
    state: PipelineState,
}

impl AnnotationSession<StdRng> {
    /// Validate `config` and load the stored history. A history that can't be
    /// loaded is logged and replaced by an empty one.
    pub async fn open(
        config: ServiceConfig,
        clients: impl ClientFactory + 'static,
        store: Arc<dyn HistoryStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let history = match store.load().await {
            Ok(records) => SampleHistory::from_records(records),
            Err(e) => {
                warn!("couldn't load history, starting empty: {e}");
                SampleHistory::default()
            }
        };

        Ok(Self {
            config,
            clients: Box::new(clients),
            backend: Backend::default(),
            store,
            history,
            rng: StdRng::from_entropy(),
            state: PipelineState::Idle,
        })
    }
}

impl<R: Rng> AnnotationSession<R> {
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Swap the random source, e.g. for a seeded one.
    pub fn with_rng<R2: Rng>(self, rng: R2) -> AnnotationSession<R2> {
        AnnotationSession {
            config: self.config,
            clients: self.clients,
            backend: self.backend,
            store: self.store,
            history: self.history,
            rng,
            state: self.state,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn history(&self) -> &[SampleRecord] {
        self.history.records()
    }

    /// The result of the last submission, if it succeeded.
    pub fn last_run(&self) -> Option<&AnnotationRun> {
        match &self.state {
            PipelineState::Ready(run) => Some(run),
            _ => None,
        }
    }

    /// Run one submission to completion. The previous result is discarded first.
    pub async fn submit(&mut self, submission: Submission) -> Result<AnnotationRun, AnnotationError> {
        let request_id = RequestId::new_unique_with_prefix("annotate");
        self.transition(&request_id, PipelineState::Validating);

        match self.run(&submission, &request_id).await {
            Ok(run) => {
                info!(
                    %request_id,
                    residues = run.annotations.len(),
                    chains = run.summary.chain_count,
                    "annotation ready"
                );
                self.remember(&submission).await;
                self.transition(&request_id, PipelineState::Ready(Box::new(run.clone())));
                Ok(run)
            }
            Err(e) => {
                if e.is_input_error() {
                    debug!(%request_id, "rejected submission: {e}");
                } else {
                    warn!(%request_id, "submission failed: {e}");
                }
                self.transition(&request_id, PipelineState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        submission: &Submission,
        request_id: &RequestId,
    ) -> Result<AnnotationRun, AnnotationError> {
        let input = submission.validate()?;

        let (working_sequence, chain_count) = match &input {
            PredictionInput::Sequence(sequence) => (sequence.clone(), 1),
            PredictionInput::Identifier(identifier) => {
                self.transition(request_id, PipelineState::Resolving);
                let client = self
                    .clients
                    .catalog_client(request_id)
                    .map_err(AnnotationError::CatalogUnreachable)?;
                let chains = EntryResolver::new(client, &self.config.catalog_url)
                    .resolve(identifier)
                    .await?;
                let primary = select_primary_chain(&chains).ok_or_else(|| {
                    AnnotationError::NoProteinSequencesFound {
                        identifier: identifier.clone(),
                    }
                })?;
                debug!(%request_id, entity = %primary.entity_id, len = primary.sequence.len(), "primary chain");
                (primary.sequence.clone(), chains.len())
            }
        };
        let summary = EntrySummary {
            residue_count: working_sequence.len(),
            chain_count,
        };

        self.transition(request_id, PipelineState::Predicting);
        let (annotations, display_sequence, echoed_identifier) = match self.backend {
            Backend::Remote => {
                let client = self
                    .clients
                    .predictor_client(request_id)
                    .map_err(AnnotationError::PredictorUnreachable)?;
                let outcome = PredictionClient::new(client, &self.config.predictor_url)
                    .predict(&input, &mut self.rng)
                    .await?;
                (
                    outcome.annotations,
                    outcome.used_sequence.unwrap_or(working_sequence),
                    outcome.found_pdb_id.or(outcome.pdb_id),
                )
            }
            Backend::Synthetic => {
                let annotations = synthetic::generate(working_sequence.len(), &mut self.rng);
                (annotations, working_sequence, None)
            }
        };

        let display_identifier = echoed_identifier.or(match input {
            PredictionInput::Identifier(identifier) => Some(identifier),
            PredictionInput::Sequence(_) => None,
        });
        let statistics = AnnotationStatistics::from_annotations(&annotations);

        Ok(AnnotationRun {
            request_id: request_id.clone(),
            backend: self.backend,
            annotations,
            display_sequence,
            display_identifier,
            summary,
            statistics,
        })
    }

    /// Add a successful submission to the history and persist it if it changed.
    /// Storage failures are logged; the prediction still stands.
    async fn remember(&mut self, submission: &Submission) {
        let sequence = normalize::normalize(&submission.sequence);
        let identifier = normalize::normalize_identifier(&submission.identifier);
        let record = SampleRecord::new(
            display_name_for(&identifier, &sequence),
            identifier,
            sequence,
        );
        if !self.history.record(record) {
            return;
        }
        if let Err(e) = self.store.save(self.history.records()).await {
            warn!("couldn't save history: {e}");
        }
    }

    fn transition(&mut self, request_id: &RequestId, next: PipelineState) {
        debug!(%request_id, from = self.state.name(), to = next.name(), "pipeline state");
        self.state = next;
    }
}
