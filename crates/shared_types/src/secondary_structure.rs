// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-residue secondary-structure labels.
//!
//! The detailed alphabet has eight states (DSSP-style), the coarse one three.
//! The coarse label is always derived from the detailed one with
//! [`State8::reduce`]; it is never stored separately.

use serde::{Deserialize, Serialize};

/// Lowest confidence ever reported for a residue.
pub const CONFIDENCE_FLOOR: f64 = 0.5;
/// Highest confidence ever reported for a residue.
pub const CONFIDENCE_CEILING: f64 = 0.98;

/// Clamp a confidence value into `[CONFIDENCE_FLOOR, CONFIDENCE_CEILING]`.
///
/// NaN is mapped to the floor, so the output is always inside the interval.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return CONFIDENCE_FLOOR;
    }
    value.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

/// Detailed (8-state) secondary structure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State8 {
    /// α-helix
    #[serde(rename = "H")]
    AlphaHelix,
    /// 3₁₀-helix
    #[serde(rename = "G")]
    Helix310,
    /// π-helix
    #[serde(rename = "I")]
    PiHelix,
    /// Extended β-strand
    #[serde(rename = "E")]
    Strand,
    /// Isolated β-bridge
    #[serde(rename = "B")]
    Bridge,
    /// Turn
    #[serde(rename = "T")]
    Turn,
    /// Bend
    #[serde(rename = "S")]
    Bend,
    /// Coil / loop
    #[serde(rename = "C")]
    Coil,
}

serde_plain::derive_display_from_serialize!(State8);
serde_plain::derive_fromstr_from_deserialize!(State8);

impl State8 {
    /// Display order used by legends and composition tables.
    pub const ALL: [State8; 8] = [
        State8::AlphaHelix,
        State8::Helix310,
        State8::PiHelix,
        State8::Strand,
        State8::Bridge,
        State8::Turn,
        State8::Bend,
        State8::Coil,
    ];

    /// Parse a one-letter code. Returns `None` for anything outside the alphabet.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Some(match symbol {
            'H' => Self::AlphaHelix,
            'G' => Self::Helix310,
            'I' => Self::PiHelix,
            'E' => Self::Strand,
            'B' => Self::Bridge,
            'T' => Self::Turn,
            'S' => Self::Bend,
            'C' => Self::Coil,
            _ => return None,
        })
    }

    /// Like [`State8::from_symbol`], but anything unrecognized is coil.
    pub fn from_symbol_or_coil(symbol: char) -> Self {
        Self::from_symbol(symbol).unwrap_or(Self::Coil)
    }

    pub fn symbol(self) -> char {
        match self {
            Self::AlphaHelix => 'H',
            Self::Helix310 => 'G',
            Self::PiHelix => 'I',
            Self::Strand => 'E',
            Self::Bridge => 'B',
            Self::Turn => 'T',
            Self::Bend => 'S',
            Self::Coil => 'C',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AlphaHelix => "α-helix",
            Self::Helix310 => "3₁₀-helix",
            Self::PiHelix => "π-helix",
            Self::Strand => "β-strand",
            Self::Bridge => "β-bridge",
            Self::Turn => "turn",
            Self::Bend => "bend",
            Self::Coil => "coil",
        }
    }

    /// Collapse to the 3-state family: H, G, I are helix; E, B are strand;
    /// everything else is coil.
    pub fn reduce(self) -> State3 {
        match self {
            Self::AlphaHelix | Self::Helix310 | Self::PiHelix => State3::Helix,
            Self::Strand | Self::Bridge => State3::Strand,
            Self::Turn | Self::Bend | Self::Coil => State3::Coil,
        }
    }
}

/// Reduce a raw 8-state character to its family. Total: characters outside the
/// alphabet (including lowercase) are coil.
pub fn reduce_symbol(symbol: char) -> State3 {
    State8::from_symbol_or_coil(symbol).reduce()
}

/// Coarse (3-state) secondary structure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State3 {
    #[serde(rename = "H")]
    Helix,
    #[serde(rename = "E")]
    Strand,
    #[serde(rename = "C")]
    Coil,
}

serde_plain::derive_display_from_serialize!(State3);
serde_plain::derive_fromstr_from_deserialize!(State3);

impl State3 {
    pub const ALL: [State3; 3] = [State3::Helix, State3::Strand, State3::Coil];

    pub fn symbol(self) -> char {
        match self {
            Self::Helix => 'H',
            Self::Strand => 'E',
            Self::Coil => 'C',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Helix => "helix",
            Self::Strand => "strand",
            Self::Coil => "coil",
        }
    }
}

/// One residue of an annotation.
///
/// `index` is 1-based. Both confidences are within
/// `[CONFIDENCE_FLOOR, CONFIDENCE_CEILING]` when built through [`ResidueAnnotation::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueAnnotation {
    pub index: usize,
    pub state8: State8,
    pub confidence8: f64,
    pub confidence3: f64,
}

impl ResidueAnnotation {
    /// Build a record, clamping both confidences into the reportable interval.
    pub fn new(index: usize, state8: State8, confidence8: f64, confidence3: f64) -> Self {
        Self {
            index,
            state8,
            confidence8: clamp_confidence(confidence8),
            confidence3: clamp_confidence(confidence3),
        }
    }

    pub fn state3(&self) -> State3 {
        self.state8.reduce()
    }
}

#[derive(Serialize)]
struct ResidueAnnotationWire {
    index: usize,
    state8: State8,
    state3: State3,
    conf8: f64,
    conf3: f64,
}

// state3 is derived, so it is emitted on the way out but never read back in.
impl Serialize for ResidueAnnotation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResidueAnnotationWire {
            index: self.index,
            state8: self.state8,
            state3: self.state3(),
            conf8: self.confidence8,
            conf3: self.confidence3,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;

    #[test]
    fn reduce_is_stable_over_the_alphabet() {
        assert_eq!(reduce_symbol('H'), State3::Helix);
        assert_eq!(reduce_symbol('G'), State3::Helix);
        assert_eq!(reduce_symbol('I'), State3::Helix);
        assert_eq!(reduce_symbol('E'), State3::Strand);
        assert_eq!(reduce_symbol('B'), State3::Strand);
        assert_eq!(reduce_symbol('T'), State3::Coil);
        assert_eq!(reduce_symbol('S'), State3::Coil);
        assert_eq!(reduce_symbol('C'), State3::Coil);
    }

    #[test]
    fn unknown_symbols_are_coil() {
        for c in ['-', ' ', 'X', 'h', '?', 'é'] {
            assert_eq!(reduce_symbol(c), State3::Coil, "{c:?}");
        }
    }

    #[test]
    fn symbols_round_trip_through_display() {
        for state in State8::ALL {
            assert_eq!(state.to_string(), state.symbol().to_string());
            assert_eq!(state.to_string().parse::<State8>().unwrap(), state);
            assert_eq!(State8::from_symbol(state.symbol()), Some(state));
        }
        for state in State3::ALL {
            assert_eq!(state.to_string(), state.symbol().to_string());
        }
    }

    #[test]
    fn new_clamps_confidences() {
        let r = ResidueAnnotation::new(1, State8::Strand, 1.7, -3.0);
        assert_eq!(r.confidence8, CONFIDENCE_CEILING);
        assert_eq!(r.confidence3, CONFIDENCE_FLOOR);
        assert_eq!(r.state3(), State3::Strand);

        let r = ResidueAnnotation::new(2, State8::Turn, f64::NAN, 0.75);
        assert_eq!(r.confidence8, CONFIDENCE_FLOOR);
        assert_eq!(r.confidence3, 0.75);
    }

    #[test]
    fn serializes_derived_state3() {
        let r = ResidueAnnotation::new(3, State8::Helix310, 0.8, 0.75);
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"index": 3, "state8": "G", "state3": "H", "conf8": 0.8, "conf3": 0.75})
        );
    }

    quickcheck! {
        fn reduce_never_panics(c: char) -> bool {
            let family = reduce_symbol(c);
            State3::ALL.contains(&family)
        }

        fn clamp_stays_in_interval(v: f64) -> bool {
            let c = clamp_confidence(v);
            (CONFIDENCE_FLOOR..=CONFIDENCE_CEILING).contains(&c)
        }
    }
}
