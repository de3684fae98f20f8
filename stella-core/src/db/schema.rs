//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 3;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: scoped key-value entries and the offline question queue
    r#"
    CREATE TABLE IF NOT EXISTS kv_entries (
        scope            TEXT NOT NULL,
        key              TEXT NOT NULL,
        value            JSON NOT NULL,
        updated_at       DATETIME NOT NULL,
        PRIMARY KEY (scope, key)
    );

    CREATE TABLE IF NOT EXISTS pending_questions (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        question         TEXT NOT NULL,
        context          JSON NOT NULL,
        queued_at        DATETIME NOT NULL
    );
    "#,
    // Version 2: submissions recorded without a remote endpoint
    r#"
    CREATE TABLE IF NOT EXISTS submissions (
        id               TEXT PRIMARY KEY,
        assessment_type  TEXT NOT NULL,
        idempotency_key  TEXT NOT NULL UNIQUE,
        payload          JSON NOT NULL,
        submitted_at     DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_submissions_type ON submissions(assessment_type);
    "#,
    // Version 3: JSON columns become TEXT. A declared type of JSON gets NUMERIC
    // affinity, which stores scalar documents like `42` as integers.
    r#"
    CREATE TABLE kv_entries_v3 (
        scope            TEXT NOT NULL,
        key              TEXT NOT NULL,
        value            TEXT NOT NULL,
        updated_at       DATETIME NOT NULL,
        PRIMARY KEY (scope, key)
    );
    INSERT INTO kv_entries_v3 (scope, key, value, updated_at)
        SELECT scope, key, CAST(value AS TEXT), updated_at FROM kv_entries;
    DROP TABLE kv_entries;
    ALTER TABLE kv_entries_v3 RENAME TO kv_entries;

    CREATE TABLE pending_questions_v3 (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        question         TEXT NOT NULL,
        context          TEXT NOT NULL,
        queued_at        DATETIME NOT NULL
    );
    INSERT INTO pending_questions_v3 (id, question, context, queued_at)
        SELECT id, question, CAST(context AS TEXT), queued_at FROM pending_questions;
    DROP TABLE pending_questions;
    ALTER TABLE pending_questions_v3 RENAME TO pending_questions;

    CREATE TABLE submissions_v3 (
        id               TEXT PRIMARY KEY,
        assessment_type  TEXT NOT NULL,
        idempotency_key  TEXT NOT NULL UNIQUE,
        payload          TEXT NOT NULL,
        submitted_at     DATETIME NOT NULL
    );
    INSERT INTO submissions_v3 (id, assessment_type, idempotency_key, payload, submitted_at)
        SELECT id, assessment_type, idempotency_key, CAST(payload AS TEXT), submitted_at
        FROM submissions;
    DROP TABLE submissions;
    ALTER TABLE submissions_v3 RENAME TO submissions;

    CREATE INDEX IF NOT EXISTS idx_submissions_type ON submissions(assessment_type);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::debug!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_json_columns_keep_scalar_text() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO kv_entries (scope, key, value, updated_at) VALUES ('s', 'k', '42', 'now')",
            [],
        )
        .unwrap();
        let stored_type: String = conn
            .query_row("SELECT typeof(value) FROM kv_entries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored_type, "text");
    }

    #[test]
    fn test_upgrade_from_v2_converts_numeric_values() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0]).unwrap();
        conn.execute_batch(MIGRATIONS[1]).unwrap();
        conn.execute("PRAGMA user_version = 2", []).unwrap();

        conn.execute(
            "INSERT INTO pending_questions (question, context, queued_at) VALUES ('q?', '7', 'now')",
            [],
        )
        .unwrap();
        let before: String = conn
            .query_row("SELECT typeof(context) FROM pending_questions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(before, "integer");

        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let (id, context): (i64, String) = conn
            .query_row("SELECT id, context FROM pending_questions", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(context, "7");
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in ["kv_entries", "pending_questions", "submissions"] {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }
}
