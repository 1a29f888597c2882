// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Serialize;

use shared_types::{ResidueAnnotation, State3, State8};

/// Composition and mean confidences of a finished annotation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnnotationStatistics {
    pub residues: usize,
    /// Counts in `State8::ALL` order.
    pub counts8: [usize; 8],
    /// Counts in `State3::ALL` order.
    pub counts3: [usize; 3],
    pub mean_confidence8: f64,
    pub mean_confidence3: f64,
}

impl AnnotationStatistics {
    pub fn from_annotations(annotations: &[ResidueAnnotation]) -> Self {
        let mut stats = Self {
            residues: annotations.len(),
            ..Self::default()
        };
        if annotations.is_empty() {
            return stats;
        }

        let mut sum8 = 0.0;
        let mut sum3 = 0.0;
        for a in annotations {
            stats.counts8[position8(a.state8)] += 1;
            stats.counts3[position3(a.state3())] += 1;
            sum8 += a.confidence8;
            sum3 += a.confidence3;
        }
        let n = annotations.len() as f64;
        stats.mean_confidence8 = sum8 / n;
        stats.mean_confidence3 = sum3 / n;
        stats
    }

    pub fn count8(&self, state: State8) -> usize {
        self.counts8[position8(state)]
    }

    pub fn count3(&self, state: State3) -> usize {
        self.counts3[position3(state)]
    }

    /// Share of residues in `state`, 0 for an empty annotation.
    pub fn fraction8(&self, state: State8) -> f64 {
        fraction(self.count8(state), self.residues)
    }

    pub fn fraction3(&self, state: State3) -> f64 {
        fraction(self.count3(state), self.residues)
    }
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn position8(state: State8) -> usize {
    State8::ALL.iter().position(|s| *s == state).unwrap_or(State8::ALL.len() - 1)
}

fn position3(state: State3) -> usize {
    State3::ALL.iter().position(|s| *s == state).unwrap_or(State3::ALL.len() - 1)
}
