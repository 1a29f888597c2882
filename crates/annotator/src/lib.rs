// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-residue secondary-structure annotation of proteins, from a raw sequence
//! or a PDB entry.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod normalize;
pub mod pipeline;
pub mod predictor;
pub mod sampler;
pub mod stats;
pub mod synthetic;

#[cfg(feature = "native")]
pub mod shims;

#[cfg(test)]
mod testing;

pub use error::AnnotationError;
pub use pipeline::{AnnotationRun, AnnotationSession, Backend, PipelineState, Submission};
