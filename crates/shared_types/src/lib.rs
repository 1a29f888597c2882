// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! This crate is used for types that are shared within this repo's crates

// log and time crates are used in macros, so `pub use` here for easier referencing
pub use log;
pub use time;

pub mod history;
pub mod logging;
pub mod requests;
pub mod secondary_structure;

pub use secondary_structure::{ResidueAnnotation, State3, State8};
