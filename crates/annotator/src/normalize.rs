// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cleanup and validation of user-entered sequences and PDB IDs.

use once_cell::sync::Lazy;
use regex::Regex;

/// The 20 canonical amino acids, one-letter codes.
pub const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

static PDB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{4}$").unwrap());

/// Strip whitespace (including newlines) and semicolons, then uppercase.
///
/// Idempotent. An empty result means "no sequence given".
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != ';')
        .flat_map(char::to_uppercase)
        .collect()
}

/// True iff every character is one of [`AMINO_ACIDS`]. The empty string is valid.
pub fn validate(sequence: &str) -> bool {
    sequence.chars().all(is_amino_acid)
}

/// The distinct characters of `sequence` outside the amino-acid alphabet, in
/// order of first appearance.
pub fn invalid_residues(sequence: &str) -> String {
    let mut seen = String::new();
    for c in sequence.chars().filter(|c| !is_amino_acid(*c)) {
        if !seen.contains(c) {
            seen.push(c);
        }
    }
    seen
}

fn is_amino_acid(c: char) -> bool {
    c.is_ascii_uppercase() && AMINO_ACIDS.contains(c)
}

/// Trim and uppercase a PDB ID.
pub fn normalize_identifier(text: &str) -> String {
    text.trim().to_ascii_uppercase()
}

/// PDB IDs are exactly four word characters, e.g. `1CRN`.
pub fn is_valid_identifier(identifier: &str) -> bool {
    PDB_ID.is_match(identifier)
}
