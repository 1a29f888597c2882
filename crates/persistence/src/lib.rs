// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local SQLite storage for state that outlives a single run.

use std::path::{Path, PathBuf};

pub use rusqlite;
pub use rusqlite_migration::{self, Migrations, M};
pub use tokio_rusqlite::{self, params, Connection};

pub mod kv;

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("couldn't open db at {path:?}: {source}")]
    Connecting {
        path: PathBuf,
        source: tokio_rusqlite::Error,
    },
    #[error("couldn't bring db at {path:?} up to the current schema: {source}")]
    Migrating {
        path: PathBuf,
        source: tokio_rusqlite::Error,
    },
}

/// Open (creating if needed) the db at `path` and apply `migrations`.
///
/// `":memory:"` gives a private in-memory db.
pub async fn open_db(
    path: impl AsRef<Path>,
    migrations: Migrations<'static>,
) -> Result<Connection, OpenError> {
    let path = path.as_ref();
    let connecting = |source| OpenError::Connecting {
        path: path.to_owned(),
        source,
    };

    let conn = Connection::open(path).await.map_err(connecting)?;
    conn.call(|sync_conn| {
        // WAL lets a reader see the last committed history while a write is pending
        sync_conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    })
    .await
    .map_err(connecting)?;

    conn.call(move |sync_conn| {
        migrations
            .to_latest(sync_conn)
            .map_err(|e| tokio_rusqlite::Error::Other(e.into()))
    })
    .await
    .map_err(|source| OpenError::Migrating {
        path: path.to_owned(),
        source,
    })?;

    tracing::debug!("opened db at {path:?}");
    Ok(conn)
}
