// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthetic annotations for demo / offline use.
//!
//! Nothing here predicts anything: labels are drawn so that the output has the
//! rough shape of a real annotation (long helix and strand runs, short coil
//! runs, ordered regions more confident than coil). The pipeline only uses it
//! when the caller explicitly selects the synthetic backend.

use rand::Rng;

use crate::sampler::choose;
use shared_types::secondary_structure::clamp_confidence;
use shared_types::{ResidueAnnotation, State3, State8};

/// Largest downward offset applied to get the 3-state confidence.
pub const CONFIDENCE3_JITTER: f64 = 0.05;

/// Width of the uniform confidence draw above a family's baseline.
const CONFIDENCE_SPREAD: f64 = 0.28;

const FAMILIES: [State3; 3] = [State3::Coil, State3::Helix, State3::Strand];
const FAMILY_WEIGHTS: [f64; 3] = [0.45, 0.35, 0.20];

const HELIX_MEMBERS: [State8; 3] = [State8::AlphaHelix, State8::Helix310, State8::PiHelix];
const HELIX_WEIGHTS: [f64; 3] = [0.8, 0.15, 0.05];
const STRAND_MEMBERS: [State8; 2] = [State8::Strand, State8::Bridge];
const STRAND_WEIGHTS: [f64; 2] = [0.9, 0.1];
const COIL_MEMBERS: [State8; 3] = [State8::Coil, State8::Turn, State8::Bend];
const COIL_WEIGHTS: [f64; 3] = [0.7, 0.2, 0.1];

/// Inclusive run-length bounds for a family.
fn run_length_bounds(family: State3) -> (usize, usize) {
    match family {
        State3::Coil => (2, 10),
        State3::Helix | State3::Strand => (6, 20),
    }
}

fn confidence_baseline(family: State3) -> f64 {
    match family {
        State3::Helix | State3::Strand => 0.72,
        State3::Coil => 0.60,
    }
}

fn pick_member<R: Rng + ?Sized>(family: State3, rng: &mut R) -> State8 {
    match family {
        State3::Helix => HELIX_MEMBERS[choose(&HELIX_WEIGHTS, rng)],
        State3::Strand => STRAND_MEMBERS[choose(&STRAND_WEIGHTS, rng)],
        State3::Coil => COIL_MEMBERS[choose(&COIL_WEIGHTS, rng)],
    }
}

/// Derive the 3-state confidence: the 8-state value minus a jitter in
/// `[0, CONFIDENCE3_JITTER)`, reclamped. Never above `confidence8`.
pub fn jittered_confidence3<R: Rng + ?Sized>(confidence8: f64, rng: &mut R) -> f64 {
    let jitter = rng.gen::<f64>() * CONFIDENCE3_JITTER;
    clamp_confidence(confidence8 - jitter).min(confidence8)
}

/// Generate a synthetic annotation of exactly `len` residues, indexed `1..=len`.
pub fn generate<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<ResidueAnnotation> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let family = FAMILIES[choose(&FAMILY_WEIGHTS, rng)];
        let (min_run, max_run) = run_length_bounds(family);
        let run = rng.gen_range(min_run..=max_run).min(len - out.len());
        let baseline = confidence_baseline(family);

        for _ in 0..run {
            let state8 = pick_member(family, rng);
            let confidence8 = clamp_confidence(baseline + rng.gen::<f64>() * CONFIDENCE_SPREAD);
            let confidence3 = jittered_confidence3(confidence8, rng);
            out.push(ResidueAnnotation::new(
                out.len() + 1,
                state8,
                confidence8,
                confidence3,
            ));
        }
    }
    out
}
