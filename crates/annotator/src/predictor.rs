// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnnotationError, GENERIC_REJECTION};
use crate::synthetic::jittered_confidence3;
use http_client::{BaseApiClient, HttpError};
use shared_types::secondary_structure::clamp_confidence;
use shared_types::{ResidueAnnotation, State8};

/// Detail reported when the predictor answers 2xx with something unreadable.
pub const MALFORMED_RESPONSE: &str = "malformed predictor response";

/// What the predictor is asked about. Serializes to `{"sequence": ...}` or
/// `{"pdb_id": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PredictionInput {
    #[serde(rename = "sequence")]
    Sequence(String),
    #[serde(rename = "pdb_id")]
    Identifier(String),
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    pred_ss: Option<String>,
    #[serde(default)]
    confidences: Option<Vec<f64>>,
    #[serde(default)]
    used_sequence: Option<String>,
    #[serde(default)]
    pdb_id: Option<String>,
    #[serde(default)]
    found_pdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// A parsed predictor answer.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionOutcome {
    pub annotations: Vec<ResidueAnnotation>,
    /// The sequence the predictor says it actually used.
    pub used_sequence: Option<String>,
    pub pdb_id: Option<String>,
    pub found_pdb_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PredictionClient {
    client: BaseApiClient,
    predict_url: String,
}

impl PredictionClient {
    pub fn new(client: BaseApiClient, predictor_url: &url::Url) -> Self {
        Self {
            client,
            predict_url: format!("{}/predict", predictor_url.as_str().trim_end_matches('/')),
        }
    }

    pub async fn predict<R: Rng + ?Sized>(
        &self,
        input: &PredictionInput,
        rng: &mut R,
    ) -> Result<PredictionOutcome, AnnotationError> {
        let response: PredictResponse = self
            .client
            .json_json_post(&self.predict_url, input)
            .await
            .map_err(rejection_from_http)?;

        let labels = response.pred_ss.unwrap_or_default();
        let confidences = response.confidences.unwrap_or_default();
        let annotations = labels
            .chars()
            .zip(confidences)
            .enumerate()
            .map(|(i, (label, reported))| {
                let confidence8 = clamp_confidence(reported);
                ResidueAnnotation::new(
                    i + 1,
                    State8::from_symbol_or_coil(label),
                    confidence8,
                    jittered_confidence3(confidence8, rng),
                )
            })
            .collect();

        Ok(PredictionOutcome {
            annotations,
            used_sequence: response.used_sequence.filter(|s| !s.is_empty()),
            pdb_id: response.pdb_id.filter(|s| !s.is_empty()),
            found_pdb_id: response.found_pdb_id.filter(|s| !s.is_empty()),
        })
    }
}

fn rejection_from_http(error: HttpError) -> AnnotationError {
    if error.is_transport() {
        return AnnotationError::PredictorUnreachable(error);
    }
    if let Some(body) = error.response_body() {
        debug!(status = ?error.status(), "predictor rejected request");
        return AnnotationError::PredictionRejected {
            detail: rejection_detail(body),
        };
    }
    match error {
        e @ (HttpError::DecodeError { .. } | HttpError::ProtocolError { .. }) => {
            debug!(error = %e, "couldn't read predictor response");
            AnnotationError::PredictionRejected {
                detail: MALFORMED_RESPONSE.to_owned(),
            }
        }
        e => AnnotationError::PredictionRejected {
            detail: e.to_string(),
        },
    }
}

/// The server's `detail` message, or the generic one.
fn rejection_detail(body: &str) -> String {
    let detail = serde_json::from_str::<RejectionBody>(body)
        .ok()
        .and_then(|b| b.detail);
    match detail {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        _ => GENERIC_REJECTION.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::testing::{predictor_url, FakeServices, PREDICTOR};
    use shared_types::secondary_structure::{CONFIDENCE_CEILING, CONFIDENCE_FLOOR};
    use shared_types::State3;

    async fn predict_with(
        services: FakeServices,
        input: PredictionInput,
    ) -> Result<PredictionOutcome, AnnotationError> {
        let (client, _) = services.build();
        PredictionClient::new(client, &predictor_url())
            .predict(&input, &mut StdRng::seed_from_u64(1))
            .await
    }

    #[test]
    fn input_serializes_to_one_field() {
        assert_eq!(
            serde_json::to_string(&PredictionInput::Sequence("ACDE".into())).unwrap(),
            r#"{"sequence":"ACDE"}"#
        );
        assert_eq!(
            serde_json::to_string(&PredictionInput::Identifier("1CRN".into())).unwrap(),
            r#"{"pdb_id":"1CRN"}"#
        );
    }

    #[test]
    fn predict_url_has_no_double_slash() {
        let (client, _) = FakeServices::new().build();
        let url = url::Url::parse("http://127.0.0.1:8000/").unwrap();
        let p = PredictionClient::new(client, &url);
        assert_eq!(p.predict_url, "http://127.0.0.1:8000/predict");
    }

    #[tokio::test]
    async fn truncates_to_shorter_array() {
        let services = FakeServices::new().predictor(
            200,
            r#"{"pred_ss":"HHGEC","confidences":[0.9,0.7,0.6]}"#,
        );
        let outcome = predict_with(services, PredictionInput::Sequence("ACDEF".into()))
            .await
            .unwrap();
        let states: Vec<State8> = outcome.annotations.iter().map(|a| a.state8).collect();
        assert_eq!(
            states,
            vec![State8::AlphaHelix, State8::AlphaHelix, State8::Helix310]
        );
        let indices: Vec<usize> = outcome.annotations.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(outcome.annotations[0].confidence8, 0.9);
    }

    #[tokio::test]
    async fn coerces_labels_and_clamps_confidences() {
        let services = FakeServices::new().predictor(
            200,
            r#"{"pred_ss":"X-e","confidences":[1.5,0.1,0.8],"used_sequence":"ACD","found_pdb_id":"1CRN"}"#,
        );
        let outcome = predict_with(services, PredictionInput::Identifier("1CRN".into()))
            .await
            .unwrap();
        assert!(outcome.annotations.iter().all(|a| a.state8 == State8::Coil));
        assert!(outcome.annotations.iter().all(|a| a.state3() == State3::Coil));
        assert_eq!(outcome.annotations[0].confidence8, CONFIDENCE_CEILING);
        assert_eq!(outcome.annotations[1].confidence8, CONFIDENCE_FLOOR);
        for a in &outcome.annotations {
            assert!(a.confidence3 <= a.confidence8);
            assert!(a.confidence3 >= CONFIDENCE_FLOOR);
        }
        assert_eq!(outcome.used_sequence.as_deref(), Some("ACD"));
        assert_eq!(outcome.found_pdb_id.as_deref(), Some("1CRN"));
        assert_eq!(outcome.pdb_id, None);
    }

    #[tokio::test]
    async fn missing_arrays_mean_empty_annotation() {
        let services = FakeServices::new().predictor(200, "{}");
        let outcome = predict_with(services, PredictionInput::Sequence("ACDE".into()))
            .await
            .unwrap();
        assert!(outcome.annotations.is_empty());
    }

    #[tokio::test]
    async fn rejection_uses_server_detail() {
        let services = FakeServices::new().predictor(422, r#"{"detail":"Sequence too long"}"#);
        let err = predict_with(services, PredictionInput::Sequence("ACDE".into()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Sequence too long");
    }

    #[tokio::test]
    async fn rejection_without_detail_is_generic() {
        for body in ["", "Internal Server Error", r#"{"error":"x"}"#, r#"{"detail":[1,2]}"#] {
            let services = FakeServices::new().predictor(500, body);
            let err = predict_with(services, PredictionInput::Sequence("ACDE".into()))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), GENERIC_REJECTION, "body {body:?}");
        }
    }

    #[tokio::test]
    async fn undecodable_success_is_malformed() {
        let services = FakeServices::new().predictor(200, "<html>hello</html>");
        let err = predict_with(services, PredictionInput::Sequence("ACDE".into()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MALFORMED_RESPONSE);
    }

    #[tokio::test]
    async fn unreachable_predictor() {
        let err = predict_with(FakeServices::new(), PredictionInput::Sequence("ACDE".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnnotationError::PredictorUnreachable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn posts_to_predict_endpoint() {
        let (client, calls) = FakeServices::new()
            .predictor(200, r#"{"pred_ss":"H","confidences":[0.8]}"#)
            .build();
        PredictionClient::new(client, &predictor_url())
            .predict(
                &PredictionInput::Sequence("A".into()),
                &mut StdRng::seed_from_u64(2),
            )
            .await
            .unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, format!("{PREDICTOR}/predict"));
        assert_eq!(
            calls[0].body.as_deref(),
            Some(br#"{"sequence":"A"}"#.as_slice())
        );
    }
}
