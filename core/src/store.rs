//! SQLite export of run output.
//!
//! RULE: Only store.rs talks to the database.
//! The core never writes implicitly; callers choose to export.

use crate::{
    dataset::AssessmentDataset,
    error::MaturityResult,
    pipeline::RunReport,
    types::Seed,
};
use rusqlite::{params, Connection};

pub struct AssessmentStore {
    conn: Connection,
}

impl AssessmentStore {
    /// Open (or create) the output database at `path`.
    pub fn open(path: &str) -> MaturityResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> MaturityResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> MaturityResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_assessment.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: Seed,
        company_count: usize,
        version: &str,
    ) -> MaturityResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, company_count, version, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                seed as i64,
                company_count as i64,
                version,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ── Dataset ────────────────────────────────────────────────

    /// Write every company row and category score in one transaction.
    pub fn insert_dataset(&self, run_id: &str, dataset: &AssessmentDataset) -> MaturityResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut company_stmt = tx.prepare(
                "INSERT INTO company
                 (run_id, company_id, company_name, sector,
                  before_aggregate, after_aggregate, aggregate_delta)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let mut score_stmt = tx.prepare(
                "INSERT INTO category_score
                 (run_id, company_id, category, position, before_score, after_score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in dataset.rows() {
                company_stmt.execute(params![
                    run_id,
                    row.company_id,
                    row.company_name,
                    row.sector,
                    row.before_aggregate,
                    row.after_aggregate,
                    row.aggregate_delta,
                ])?;
                for (position, pair) in row.scores.iter().enumerate() {
                    score_stmt.execute(params![
                        run_id,
                        row.company_id,
                        pair.category,
                        position as i64,
                        pair.before,
                        pair.after,
                    ])?;
                }
            }
        }
        tx.commit()?;
        log::debug!("stored {} companies for run {run_id}", dataset.len());
        Ok(())
    }

    pub fn save_report(&self, run_id: &str, report: &RunReport) -> MaturityResult<()> {
        let json = serde_json::to_string(report)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO run_report (run_id, report_json) VALUES (?1, ?2)",
            params![run_id, json],
        )?;
        Ok(())
    }

    // ── Test / summary helpers ─────────────────────────────────

    pub fn company_count(&self, run_id: &str) -> MaturityResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM company WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn category_score_count(&self, run_id: &str) -> MaturityResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM category_score WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// (before, after) aggregate columns in company id order.
    pub fn aggregate_columns(&self, run_id: &str) -> MaturityResult<(Vec<f64>, Vec<f64>)> {
        let mut stmt = self.conn.prepare(
            "SELECT before_aggregate, after_aggregate FROM company
             WHERE run_id = ?1 ORDER BY company_id ASC",
        )?;
        let pairs = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs.into_iter().unzip())
    }

    pub fn report_json(&self, run_id: &str) -> MaturityResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT report_json FROM run_report WHERE run_id = ?1")?;
        let mut rows = stmt.query(params![run_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}
