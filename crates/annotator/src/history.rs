// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The short list of recent submissions, and where it is kept between runs.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HistoryError;
use persistence::kv;
use persistence::Connection;
use shared_types::history::SampleRecord;

/// Key the history is stored under.
pub const HISTORY_KEY: &str = "ss-annotator.history";

/// Number of submissions retained.
pub const HISTORY_LIMIT: usize = 5;

const DISPLAY_PREFIX_LEN: usize = 12;

/// A ready-made submission offered to new users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplePreset {
    pub display_name: &'static str,
    pub identifier: &'static str,
    pub sequence: &'static str,
}

pub const PRESETS: [SamplePreset; 3] = [
    SamplePreset {
        display_name: "Crambin",
        identifier: "1CRN",
        sequence: "",
    },
    SamplePreset {
        display_name: "Ubiquitin",
        identifier: "1UBQ",
        sequence: "",
    },
    SamplePreset {
        display_name: "Insulin B chain",
        identifier: "",
        sequence: "FVNQHLCGSHLVEALYLVCGERGFFYTPKT",
    },
];

/// True if `record` is one of [`PRESETS`], submitted as-is.
pub fn is_unmodified_preset(record: &SampleRecord) -> bool {
    PRESETS
        .iter()
        .any(|p| p.identifier == record.identifier && p.sequence == record.sequence)
}

/// Label for a submission: the PDB ID, or the start of the sequence.
pub fn display_name_for(identifier: &str, sequence: &str) -> String {
    if !identifier.is_empty() {
        return identifier.to_owned();
    }
    match sequence.char_indices().nth(DISPLAY_PREFIX_LEN) {
        Some((cut, _)) => format!("{}...", &sequence[..cut]),
        None => sequence.to_owned(),
    }
}

/// Most-recent-first list of distinct submissions, at most [`HISTORY_LIMIT`] long.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleHistory {
    records: Vec<SampleRecord>,
}

impl SampleHistory {
    /// Rebuild from a stored list, dropping duplicates and anything past the limit.
    pub fn from_records(stored: Vec<SampleRecord>) -> Self {
        let mut records: Vec<SampleRecord> = Vec::with_capacity(HISTORY_LIMIT);
        for record in stored {
            if records.len() == HISTORY_LIMIT {
                break;
            }
            if !records.iter().any(|r| r.same_submission(&record)) {
                records.push(record);
            }
        }
        Self { records }
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Put `record` at the front. Returns whether the list changed; unmodified
    /// presets and a repeat of the newest entry leave it alone.
    pub fn record(&mut self, record: SampleRecord) -> bool {
        if is_unmodified_preset(&record) || self.records.first() == Some(&record) {
            return false;
        }
        self.records.retain(|r| !r.same_submission(&record));
        self.records.insert(0, record);
        self.records.truncate(HISTORY_LIMIT);
        true
    }
}

/// Where the history lives between sessions.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self) -> Result<Vec<SampleRecord>, HistoryError>;
    async fn save(&self, records: &[SampleRecord]) -> Result<(), HistoryError>;
}

/// History kept as JSON in the key-value SQLite db.
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let conn = kv::open_kv_db(path).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn load(&self) -> Result<Vec<SampleRecord>, HistoryError> {
        match kv::get_value(&self.conn, HISTORY_KEY.to_owned()).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(vec![]),
        }
    }

    async fn save(&self, records: &[SampleRecord]) -> Result<(), HistoryError> {
        let json = serde_json::to_string(records)?;
        kv::put_value(&self.conn, HISTORY_KEY.to_owned(), json).await?;
        Ok(())
    }
}

/// Process-local store, for tests and `--no-history` runs.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<SampleRecord>>,
    saves: AtomicUsize,
}

impl InMemoryHistoryStore {
    pub fn with_records(records: Vec<SampleRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            saves: AtomicUsize::new(0),
        }
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<SampleRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self) -> Result<Vec<SampleRecord>, HistoryError> {
        Ok(self.snapshot())
    }

    async fn save(&self, records: &[SampleRecord]) -> Result<(), HistoryError> {
        if let Ok(mut stored) = self.records.lock() {
            *stored = records.to_vec();
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
