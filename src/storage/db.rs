use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, Row};

use crate::{
    error::Result,
    storage::models::{BatchRun, FailedUpload, LedgerStats},
    upload::{BatchResult, UploadTarget},
};

/// Ledger of finished upload runs. Holds outcomes only, never image bytes.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS batch_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                assessment_id INTEGER,
                student_id INTEGER,
                attempted INTEGER NOT NULL,
                succeeded INTEGER NOT NULL,
                failed INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS batch_failures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                image_order INTEGER NOT NULL,
                error_detail TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES batch_runs(session_id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_failures_session ON batch_failures(session_id)",
            [],
        )?;

        Ok(())
    }

    /// Record a finished run and its failed items. Returns the run id.
    pub fn save_batch_result(
        &self,
        session_id: &str,
        target: &UploadTarget,
        result: &BatchResult,
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO batch_runs
             (session_id, assessment_id, student_id, attempted, succeeded, failed, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session_id,
                target.assessment_id,
                target.student_id,
                result.attempted as i64,
                result.succeeded as i64,
                result.failed() as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        for failure in &result.failures {
            tx.execute(
                "INSERT INTO batch_failures (session_id, image_order, error_detail)
                 VALUES (?1, ?2, ?3)",
                params![
                    session_id,
                    failure.image_order,
                    failure.error_detail.as_deref().unwrap_or("unknown error"),
                ],
            )?;
        }

        tx.commit()?;
        Ok(run_id)
    }

    /// Most recent runs first
    pub fn get_batch_history(&self, limit: Option<usize>) -> Result<Vec<BatchRun>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, assessment_id, student_id, attempted, succeeded, failed, completed_at
             FROM batch_runs
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let runs = stmt
            .query_map([limit], Self::row_to_run)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    pub fn get_failures(&self, session_id: &str) -> Result<Vec<FailedUpload>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, image_order, error_detail
             FROM batch_failures
             WHERE session_id = ?1
             ORDER BY image_order",
        )?;

        let failures = stmt
            .query_map([session_id], |row| {
                Ok(FailedUpload {
                    session_id: row.get(0)?,
                    image_order: row.get(1)?,
                    error_detail: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(failures)
    }

    pub fn get_stats(&self) -> Result<LedgerStats> {
        let stats = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(attempted), 0),
                    COALESCE(SUM(succeeded), 0),
                    COALESCE(SUM(failed), 0)
             FROM batch_runs",
            [],
            |row| {
                Ok(LedgerStats {
                    total_runs: row.get::<_, i64>(0)? as usize,
                    total_attempted: row.get::<_, i64>(1)? as usize,
                    total_succeeded: row.get::<_, i64>(2)? as usize,
                    total_failed: row.get::<_, i64>(3)? as usize,
                })
            },
        )?;

        Ok(stats)
    }

    fn row_to_run(row: &Row<'_>) -> rusqlite::Result<BatchRun> {
        let completed_at: String = row.get(7)?;
        let completed_at = completed_at
            .parse::<DateTime<Utc>>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

        Ok(BatchRun {
            id: row.get(0)?,
            session_id: row.get(1)?,
            assessment_id: row.get(2)?,
            student_id: row.get(3)?,
            attempted: row.get::<_, i64>(4)? as usize,
            succeeded: row.get::<_, i64>(5)? as usize,
            failed: row.get::<_, i64>(6)? as usize,
            completed_at,
        })
    }
}
