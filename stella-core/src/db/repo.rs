//! Database repository layer
//!
//! Scoped key-value entries, the offline question queue and locally recorded
//! submissions.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A question asked while the guidance backend was unreachable.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuestion {
    /// Queue position; replay goes in ascending id order
    pub id: i64,
    pub question: String,
    pub context: serde_json::Value,
    pub queued_at: DateTime<Utc>,
}

/// A submission recorded by the local endpoint.
#[derive(Debug, Clone)]
pub struct StoredSubmission {
    pub id: String,
    pub assessment_type: String,
    pub idempotency_key: String,
    pub payload: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        super::schema::run_migrations(&conn)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("database lock poisoned")))
    }

    // ============================================
    // Scoped key-value operations
    // ============================================

    /// Store a JSON-serializable value under `(scope, key)`, replacing any previous value
    pub fn put_json<T: Serialize>(&self, scope: &str, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO kv_entries (scope, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(scope, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![scope, key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load the value stored under `(scope, key)`
    pub fn get_json<T: DeserializeOwned>(&self, scope: &str, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT value FROM kv_entries WHERE scope = ?1 AND key = ?2",
                params![scope, key],
                |row| row.get(0),
            )
            .optional()?
        };

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Delete `(scope, key)`, returning whether it existed
    pub fn delete(&self, scope: &str, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM kv_entries WHERE scope = ?1 AND key = ?2",
            params![scope, key],
        )?;
        Ok(removed > 0)
    }

    /// Keys stored in a scope, sorted
    pub fn keys(&self, scope: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_entries WHERE scope = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map([scope], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    // ============================================
    // Offline question queue
    // ============================================

    /// Append a question to the back of the queue, returning its id
    pub fn enqueue_question(&self, question: &str, context: &serde_json::Value) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO pending_questions (question, context, queued_at) VALUES (?1, ?2, ?3)",
            params![question, context.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Queued questions, oldest first
    pub fn pending_questions(&self) -> Result<Vec<PendingQuestion>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, question, context, queued_at FROM pending_questions ORDER BY id ASC",
        )?;
        let pending = stmt
            .query_map([], Self::row_to_pending_question)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pending)
    }

    pub fn remove_pending_question(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM pending_questions WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn pending_question_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM pending_questions", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn row_to_pending_question(row: &Row) -> rusqlite::Result<PendingQuestion> {
        let context_str: String = row.get("context")?;
        let queued_at_str: String = row.get("queued_at")?;

        Ok(PendingQuestion {
            id: row.get("id")?,
            question: row.get("question")?,
            context: serde_json::from_str(&context_str).unwrap_or(serde_json::json!({})),
            queued_at: DateTime::parse_from_rfc3339(&queued_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ============================================
    // Local submissions
    // ============================================

    /// Record a submission; returns `false` if the idempotency key was already recorded
    pub fn insert_submission(
        &self,
        id: &str,
        assessment_type: &str,
        idempotency_key: &str,
        payload: &serde_json::Value,
        submitted_at: &DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO submissions (id, assessment_type, idempotency_key, payload, submitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(idempotency_key) DO NOTHING
            "#,
            params![
                id,
                assessment_type,
                idempotency_key,
                payload.to_string(),
                submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn get_submission_by_key(&self, idempotency_key: &str) -> Result<Option<StoredSubmission>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT * FROM submissions WHERE idempotency_key = ?1",
            [idempotency_key],
            Self::row_to_submission,
        )
        .optional()
        .map_err(Error::from)
    }

    /// All recorded submissions, newest first
    pub fn list_submissions(&self) -> Result<Vec<StoredSubmission>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT * FROM submissions ORDER BY submitted_at DESC")?;
        let submissions = stmt
            .query_map([], Self::row_to_submission)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(submissions)
    }

    fn row_to_submission(row: &Row) -> rusqlite::Result<StoredSubmission> {
        let payload_str: String = row.get("payload")?;
        let submitted_at_str: String = row.get("submitted_at")?;

        Ok(StoredSubmission {
            id: row.get("id")?,
            assessment_type: row.get("assessment_type")?,
            idempotency_key: row.get("idempotency_key")?,
            payload: serde_json::from_str(&payload_str).unwrap_or(serde_json::json!({})),
            submitted_at: DateTime::parse_from_rfc3339(&submitted_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
