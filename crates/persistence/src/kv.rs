// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A tiny key-value table for application state that has to survive between
//! sessions. Values are opaque text; callers pick the encoding.

use std::path::Path;

use rusqlite::types::ToSqlOutput;
use rusqlite::{OptionalExtension, ToSql};
use time::OffsetDateTime;
use tokio_rusqlite::{params, Connection};

use crate::{Migrations, OpenError, M};

/// When a value was last written. Stored as unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct UpdatedAt(OffsetDateTime);

impl UpdatedAt {
    fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }
}

impl ToSql for UpdatedAt {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.unix_timestamp()))
    }
}

pub fn migrations() -> Migrations<'static> {
    // do not modify these migrations, instead create a new migration
    Migrations::from_iter([M::up(include_str!("migration-00.sql"))])
}

/// Open (creating if needed) a key-value db at `path`.
pub async fn open_kv_db(path: impl AsRef<Path>) -> Result<Connection, OpenError> {
    crate::open_db(path, migrations()).await
}

/// Insert or replace the value stored under `key`.
pub async fn put_value(
    conn: &Connection,
    key: String,
    value: String,
) -> Result<(), tokio_rusqlite::Error> {
    conn.call(move |conn| {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO kv (key, value, updated_utc)
            VALUES (?1, ?2, ?3);
            "#,
            params![key, value, UpdatedAt::now()],
        )?;
        Ok(())
    })
    .await
}

pub async fn get_value(
    conn: &Connection,
    key: String,
) -> Result<Option<String>, tokio_rusqlite::Error> {
    conn.call(move |conn| {
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1;", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    })
    .await
}
