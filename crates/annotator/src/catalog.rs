// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Looking up the protein chains of a PDB entry in the RCSB catalog.

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::AnnotationError;
use crate::normalize::normalize;
use http_client::{BaseApiClient, HttpError};

/// Default catalog: the RCSB data API.
pub const DEFAULT_CATALOG_URL: &str = "https://data.rcsb.org/rest/v1/core";

/// One protein chain of an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSequence {
    pub entity_id: String,
    /// Normalized one-letter sequence. Never empty.
    pub sequence: String,
}

#[derive(Debug, Deserialize)]
struct EntryDocument {
    #[serde(default)]
    rcsb_entry_container_identifiers: Option<ContainerIdentifiers>,
}

#[derive(Debug, Deserialize)]
struct ContainerIdentifiers {
    #[serde(default)]
    polymer_entity_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PolymerEntityDocument {
    #[serde(default)]
    entity_poly: Option<EntityPoly>,
}

#[derive(Debug, Deserialize)]
struct EntityPoly {
    #[serde(rename = "type", default)]
    poly_type: Option<String>,
    #[serde(default)]
    pdbx_seq_one_letter_code_can: Option<String>,
    #[serde(default)]
    pdbx_seq_one_letter_code: Option<String>,
}

impl EntityPoly {
    fn is_protein(&self) -> bool {
        self.poly_type.as_deref().is_some_and(|t| {
            let t = t.to_lowercase();
            t.contains("polypeptide") || t.contains("protein")
        })
    }

    /// The canonical sequence, or the modified-residue one if that's all there is.
    fn raw_sequence(&self) -> Option<&str> {
        self.pdbx_seq_one_letter_code_can
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.pdbx_seq_one_letter_code.as_deref())
    }
}

#[derive(Clone, Debug)]
pub struct EntryResolver {
    client: BaseApiClient,
    base_url: String,
}

impl EntryResolver {
    pub fn new(client: BaseApiClient, catalog_url: &url::Url) -> Self {
        Self {
            client,
            base_url: catalog_url.as_str().trim_end_matches('/').to_owned(),
        }
    }

    /// Fetch every polymer entity of `identifier` and keep the protein chains.
    ///
    /// All chain lookups run concurrently and are awaited before filtering. A
    /// chain that can't be fetched or decoded is skipped, not fatal. Chains come
    /// back in the entry's entity order.
    pub async fn resolve(&self, identifier: &str) -> Result<Vec<ChainSequence>, AnnotationError> {
        let entity_ids = self.polymer_entity_ids(identifier).await?;
        if entity_ids.is_empty() {
            return Err(AnnotationError::NoPolymerChains {
                identifier: identifier.to_owned(),
            });
        }

        let mut pending: FuturesUnordered<_> = entity_ids
            .iter()
            .enumerate()
            .map(|(position, entity_id)| async move {
                (position, self.fetch_chain(identifier, entity_id).await)
            })
            .collect();

        let mut found = Vec::with_capacity(entity_ids.len());
        while let Some((position, chain)) = pending.next().await {
            if let Some(chain) = chain {
                found.push((position, chain));
            }
        }
        found.sort_by_key(|(position, _)| *position);

        if found.is_empty() {
            return Err(AnnotationError::NoProteinSequencesFound {
                identifier: identifier.to_owned(),
            });
        }
        debug!(
            identifier,
            entities = entity_ids.len(),
            protein_chains = found.len(),
            "resolved entry"
        );
        Ok(found.into_iter().map(|(_, chain)| chain).collect())
    }

    async fn polymer_entity_ids(&self, identifier: &str) -> Result<Vec<String>, AnnotationError> {
        let url = format!("{}/entry/{identifier}", self.base_url);
        let entry: EntryDocument = self.client.json_get(&url).await.map_err(|e| {
            if e.is_transport() {
                AnnotationError::CatalogUnreachable(e)
            } else {
                debug!(identifier, error = %e, "entry lookup failed");
                AnnotationError::EntryNotFound {
                    identifier: identifier.to_owned(),
                }
            }
        })?;
        Ok(entry
            .rcsb_entry_container_identifiers
            .and_then(|c| c.polymer_entity_ids)
            .unwrap_or_default())
    }

    async fn fetch_chain(&self, identifier: &str, entity_id: &str) -> Option<ChainSequence> {
        let url = format!("{}/polymer_entity/{identifier}/{entity_id}", self.base_url);
        let document: PolymerEntityDocument = match self.client.json_get(&url).await {
            Ok(document) => document,
            Err(e) => {
                log_skipped(identifier, entity_id, &e);
                return None;
            }
        };

        let poly = document.entity_poly?;
        if !poly.is_protein() {
            debug!(identifier, entity_id, poly_type = ?poly.poly_type, "skipping non-protein entity");
            return None;
        }
        let sequence = normalize(poly.raw_sequence()?);
        if sequence.is_empty() {
            return None;
        }
        Some(ChainSequence {
            entity_id: entity_id.to_owned(),
            sequence,
        })
    }
}

fn log_skipped(identifier: &str, entity_id: &str, error: &HttpError) {
    debug!(identifier, entity_id, %error, "skipping polymer entity");
}

/// The longest chain; the earliest one wins a tie.
pub fn select_primary_chain(chains: &[ChainSequence]) -> Option<&ChainSequence> {
    chains
        .iter()
        .reduce(|best, chain| {
            if chain.sequence.len() > best.sequence.len() {
                chain
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog_url, FakeServices, CATALOG, CRAMBIN};

    fn resolver(services: FakeServices) -> EntryResolver {
        let (client, _) = services.build();
        EntryResolver::new(client, &catalog_url())
    }

    fn chain(entity_id: &str, sequence: &str) -> ChainSequence {
        ChainSequence {
            entity_id: entity_id.into(),
            sequence: sequence.into(),
        }
    }

    #[tokio::test]
    async fn resolves_single_chain_entry() {
        let r = resolver(
            FakeServices::new()
                .entry("1CRN", &["1"])
                .chain("1CRN", "1", "polypeptide(L)", CRAMBIN),
        );
        let chains = r.resolve("1CRN").await.unwrap();
        assert_eq!(chains, vec![chain("1", CRAMBIN)]);
        assert_eq!(chains[0].sequence.len(), 46);
    }

    #[tokio::test]
    async fn filters_out_nucleic_acids_and_normalizes() {
        let r = resolver(
            FakeServices::new()
                .entry("1ABC", &["1", "2", "3"])
                .chain("1ABC", "1", "polydeoxyribonucleotide", "ACGTACGT")
                .chain("1ABC", "2", "Protein", "mkv\nlaa;")
                .chain("1ABC", "3", "polypeptide(L)", "GSHM"),
        );
        let chains = r.resolve("1ABC").await.unwrap();
        assert_eq!(chains, vec![chain("2", "MKVLAA"), chain("3", "GSHM")]);
    }

    #[tokio::test]
    async fn falls_back_to_non_canonical_sequence() {
        let body = serde_json::json!({
            "entity_poly": {
                "type": "polypeptide(L)",
                "pdbx_seq_one_letter_code_can": "",
                "pdbx_seq_one_letter_code": "MK(MSE)V",
            }
        });
        let r = resolver(FakeServices::new().entry("2XYZ", &["1"]).route(
            format!("{CATALOG}/polymer_entity/2XYZ/1"),
            200,
            body.to_string(),
        ));
        let chains = r.resolve("2XYZ").await.unwrap();
        assert_eq!(chains[0].sequence, "MK(MSE)V");
    }

    #[tokio::test]
    async fn failing_chains_are_skipped() {
        let r = resolver(
            FakeServices::new()
                .entry("4HHB", &["1", "2", "3"])
                .chain("4HHB", "1", "polypeptide(L)", "VLSPADKTNV")
                .route(format!("{CATALOG}/polymer_entity/4HHB/2"), 500, "oops")
                .route(format!("{CATALOG}/polymer_entity/4HHB/3"), 200, "not json"),
        );
        let chains = r.resolve("4HHB").await.unwrap();
        assert_eq!(chains, vec![chain("1", "VLSPADKTNV")]);
    }

    #[tokio::test]
    async fn no_polymer_entities() {
        let r = resolver(FakeServices::new().entry("0EMP", &[]));
        let err = r.resolve("0EMP").await.unwrap_err();
        assert!(matches!(err, AnnotationError::NoPolymerChains { .. }), "{err:?}");

        let r = resolver(FakeServices::new().route(format!("{CATALOG}/entry/0NUL"), 200, "{}"));
        let err = r.resolve("0NUL").await.unwrap_err();
        assert!(matches!(err, AnnotationError::NoPolymerChains { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn no_protein_chains() {
        let r = resolver(
            FakeServices::new()
                .entry("1DNA", &["1", "2"])
                .chain("1DNA", "1", "polydeoxyribonucleotide", "ACGT")
                .chain("1DNA", "2", "polyribonucleotide", "ACGU"),
        );
        let err = r.resolve("1DNA").await.unwrap_err();
        assert!(
            matches!(err, AnnotationError::NoProteinSequencesFound { .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn missing_entry() {
        let r = resolver(FakeServices::new().route(
            format!("{CATALOG}/entry/9ZZZ"),
            404,
            r#"{"status":404,"message":"No data found"}"#,
        ));
        let err = r.resolve("9ZZZ").await.unwrap_err();
        assert!(matches!(err, AnnotationError::EntryNotFound { .. }), "{err:?}");
        assert_eq!(err.to_string(), "PDB entry 9ZZZ not found");
    }

    #[tokio::test]
    async fn unreachable_catalog() {
        let r = resolver(FakeServices::new());
        let err = r.resolve("1CRN").await.unwrap_err();
        assert!(matches!(err, AnnotationError::CatalogUnreachable(_)), "{err:?}");
    }

    #[test]
    fn primary_chain_is_longest_then_first() {
        assert_eq!(select_primary_chain(&[]), None);
        let chains = [chain("1", "AAA"), chain("2", "CCCCC"), chain("3", "DDDDD")];
        assert_eq!(select_primary_chain(&chains), Some(&chains[1]));
    }
}
