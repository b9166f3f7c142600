//! Cache store schema migrations.
//!
//! A `_migrations` table records which versions have been applied; pending
//! ones run in order, each inside its own transaction.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// One schema step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Applied in ascending `version` order. SQL uses IF NOT EXISTS throughout.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "cache_stores", sql: include_str!("../../migrations/001_cache_stores.sql") },
    Migration {
        version: 2,
        name: "store_entry_order",
        sql: include_str!("../../migrations/002_store_entry_order.sql"),
    },
];

/// Run any pending migrations.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the step whose SQL failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name)))?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version = migration.version, name = migration.name, "applied cache migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
