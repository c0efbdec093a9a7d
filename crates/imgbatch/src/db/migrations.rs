//! Schema migrations for the job store, tracked in `_migrations`.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// Append only. Versions must increase.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_jobs_table",
        sql: "CREATE TABLE IF NOT EXISTS jobs (
                id          TEXT PRIMARY KEY NOT NULL,
                email       TEXT,
                status      TEXT NOT NULL DEFAULT 'PENDING',
                input_name  TEXT NOT NULL,
                input_path  TEXT NOT NULL,
                output_path TEXT,
                errors      TEXT NOT NULL DEFAULT '',
                webhook_url TEXT,
                message     TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );",
    },
    Migration {
        version: 2,
        description: "index_jobs_status_created_at",
        sql: "CREATE INDEX IF NOT EXISTS idx_jobs_status_created_at
                ON jobs (status, created_at);",
    },
];

/// Applies every migration newer than the recorded version. Each one runs
/// in its own transaction together with its `_migrations` entry.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let applied = applied_version(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        log::info!("Applying migration v{} ({})", migration.version, migration.description);
        apply(conn, migration).map_err(|e| DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
    }

    Ok(())
}

/// Highest applied migration version, 0 on a fresh store.
pub fn applied_version(conn: &Connection) -> Result<u32, DatabaseError> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

fn apply(conn: &Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
        rusqlite::params![migration.version, migration.description],
    )?;
    tx.commit()
}
