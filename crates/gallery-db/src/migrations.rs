use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Gallery DB: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE assets (
                id          TEXT PRIMARY KEY,
                container   TEXT NOT NULL,
                name        TEXT NOT NULL,
                size        INTEGER NOT NULL,
                sha256      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_assets_container ON assets(container);

            -- Reader tags are written once, in the same transaction as the asset.
            CREATE TABLE asset_readers (
                asset_id    TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
                scope       TEXT NOT NULL,
                PRIMARY KEY (asset_id, scope)
            );

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    Ok(())
}
