// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// A past submission, as kept in the persisted history.
///
/// Two records are the same submission when their `(identifier, sequence)`
/// pairs match; `display_name` is only a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub display_name: String,
    /// Uppercased PDB ID, or empty for a raw-sequence submission.
    #[serde(default)]
    pub identifier: String,
    /// Normalized sequence, or empty for an identifier submission.
    #[serde(default)]
    pub sequence: String,
}

impl SampleRecord {
    pub fn new(
        display_name: impl Into<String>,
        identifier: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            identifier: identifier.into(),
            sequence: sequence.into(),
        }
    }

    pub fn same_submission(&self, other: &SampleRecord) -> bool {
        self.identifier == other.identifier && self.sequence == other.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_submission_ignores_display_name() {
        let a = SampleRecord::new("Crambin", "1CRN", "");
        let b = SampleRecord::new("1CRN", "1CRN", "");
        let c = SampleRecord::new("1CRN", "1CRN", "TTCC");
        assert!(a.same_submission(&b));
        assert!(!a.same_submission(&c));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let r: SampleRecord = serde_json::from_str(r#"{"display_name": "x"}"#).unwrap();
        assert_eq!(r, SampleRecord::new("x", "", ""));
    }
}
