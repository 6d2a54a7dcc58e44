use std::collections::{HashMap, HashSet};

use crate::Database;
use crate::models::AssetRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Assets --

    /// Insert an asset and its reader tags in one transaction.
    /// Returns `false` (and writes nothing) if the id is already taken.
    pub fn insert_asset(&self, row: &AssetRow) -> Result<bool> {
        self.insert_asset_with(row, || Ok(()))
    }

    /// Like [`Self::insert_asset`], but runs `before_commit` inside the
    /// transaction after the rows are written. An error from it rolls the
    /// insert back. The connection lock is held throughout, so no reader can
    /// see the row until `before_commit` has succeeded.
    pub fn insert_asset_with<F>(&self, row: &AssetRow, before_commit: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO assets (id, container, name, size, sha256, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    row.id,
                    row.container,
                    row.name,
                    row.size,
                    row.sha256,
                    row.created_at
                ],
            )?;
            if inserted == 0 {
                return Ok(false);
            }

            for scope in &row.readers {
                tx.execute(
                    "INSERT OR IGNORE INTO asset_readers (asset_id, scope) VALUES (?1, ?2)",
                    (&row.id, scope),
                )?;
            }
            before_commit()?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// All assets of a container in insertion order, reader tags attached.
    pub fn list_assets(&self, container: &str) -> Result<Vec<AssetRow>> {
        self.with_conn(|conn| {
            let mut readers = query_container_readers(conn, container)?;
            let mut stmt = conn.prepare(
                "SELECT id, container, name, size, sha256, created_at
                 FROM assets WHERE container = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([container], map_asset_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows
                .into_iter()
                .map(|mut row| {
                    row.readers = readers.remove(&row.id).unwrap_or_default();
                    row
                })
                .collect())
        })
    }

    pub fn get_asset(&self, container: &str, id: &str) -> Result<Option<AssetRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, container, name, size, sha256, created_at
                     FROM assets WHERE container = ?1 AND id = ?2",
                    [container, id],
                    map_asset_row,
                )
                .optional()?;

            let Some(mut row) = row else {
                return Ok(None);
            };
            let mut stmt = conn.prepare(
                "SELECT scope FROM asset_readers WHERE asset_id = ?1 ORDER BY scope",
            )?;
            row.readers = stmt
                .query_map([id], |r| r.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Some(row))
        })
    }

    /// Delete an asset (reader tags cascade). Returns `false` if it did not exist.
    pub fn delete_asset(&self, container: &str, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM assets WHERE container = ?1 AND id = ?2",
                [container, id],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Ids of every catalogued asset across all containers.
    pub fn asset_ids(&self) -> Result<HashSet<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM assets")?;
            let ids = stmt
                .query_map([], |r| r.get::<_, String>(0))?
                .collect::<std::result::Result<HashSet<_>, _>>()?;
            Ok(ids)
        })
    }
}

fn map_asset_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssetRow> {
    Ok(AssetRow {
        id: row.get(0)?,
        container: row.get(1)?,
        name: row.get(2)?,
        size: row.get(3)?,
        sha256: row.get(4)?,
        created_at: row.get(5)?,
        readers: Vec::new(),
    })
}

fn query_container_readers(
    conn: &Connection,
    container: &str,
) -> Result<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT r.asset_id, r.scope
         FROM asset_readers r
         JOIN assets a ON a.id = r.asset_id
         WHERE a.container = ?1
         ORDER BY r.asset_id, r.scope",
    )?;

    let mut readers: HashMap<String, Vec<String>> = HashMap::new();
    let pairs = stmt.query_map([container], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    for pair in pairs {
        let (asset_id, scope) = pair?;
        readers.entry(asset_id).or_default().push(scope);
    }
    Ok(readers)
}
