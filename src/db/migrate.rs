//! Schema migrations compiled into the binary.
//!
//! Each migration runs in its own transaction and is recorded by version in
//! `schema_migrations`, so a store opened from any working directory ends up
//! on the same schema.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "graph_store",
    sql: include_str!("../../migrations/001_graph_store.sql"),
}];

/// Highest applied version, 0 for a fresh database
pub fn schema_version(conn: &Connection) -> Result<u32> {
    ensure_version_table(conn)?;
    let version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Bring the schema up to date; returns how many migrations were applied
pub fn run_migrations(conn: &mut Connection) -> Result<usize> {
    apply(conn, MIGRATIONS)
}

fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;
    Ok(())
}

fn apply(conn: &mut Connection, migrations: &[Migration]) -> Result<usize> {
    let current = schema_version(conn)?;
    let mut applied = 0;

    for migration in migrations.iter().filter(|m| m.version > current) {
        log::info!("Applying migration {:03}_{}", migration.version, migration.name);

        let tx = conn.transaction()?;
        if let Err(e) = tx.execute_batch(migration.sql) {
            log::error!("Migration {:03}_{} failed: {}", migration.version, migration.name, e);
            return Err(e.into());
        }
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        applied += 1;
    }

    if applied == 0 {
        log::debug!("Schema already at version {}", current);
    }
    Ok(applied)
}
