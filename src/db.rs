// 🗄️ Report History - every generated report, queryable over time
//
// Two tables:
//   reports      one row per generated report, unique on run_id
//   report_rows  the rows of each report, in report order
//
// Inserting the same report twice is a no-op, so re-running a writer over an
// existing database never duplicates history.

use crate::config::ProjectInfo;
use crate::report::{Report, ReportWriter, Row};
use crate::size::{CategorySizes, SizeMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Header of a stored report, without its rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub run_id: String,
    pub report_id: String,
    pub mode: SizeMode,
    pub generated_at: DateTime<Utc>,
    pub project: ProjectInfo,
    pub total: u64,
    pub row_count: usize,
}

/// Size of one named row across runs, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub size: u64,
}

pub fn open_database<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path.as_ref())
        .with_context(|| format!("Failed to open database: {:?}", path.as_ref()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            report_id TEXT NOT NULL,
            mode TEXT NOT NULL,
            generated_at TEXT NOT NULL,
            project_name TEXT NOT NULL,
            version_name TEXT NOT NULL,
            device_name TEXT NOT NULL,
            build_type TEXT NOT NULL,
            custom_properties TEXT NOT NULL,
            total INTEGER NOT NULL,
            row_count INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS report_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL REFERENCES reports(run_id),
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            size INTEGER NOT NULL,
            owner TEXT,
            tag TEXT,
            breakdown TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reports_report_id ON reports(report_id, generated_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_report_rows_run ON report_rows(run_id, position)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_report_rows_name ON report_rows(name)",
        [],
    )?;

    Ok(())
}

fn to_sql_size(size: u64) -> Result<i64> {
    i64::try_from(size).with_context(|| format!("Size {} does not fit in SQLite INTEGER", size))
}

/// Store a report and its rows. Returns false when the run id is already
/// stored.
pub fn insert_report(conn: &Connection, report: &Report) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let run_id = report.run_id.to_string();

    let result = tx.execute(
        "INSERT INTO reports (
            run_id, report_id, mode, generated_at,
            project_name, version_name, device_name, build_type,
            custom_properties, total, row_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            run_id,
            report.id,
            report.mode.as_str(),
            report.generated_at.to_rfc3339(),
            report.project.project_name,
            report.project.version_name,
            report.project.device_name,
            report.project.build_type,
            serde_json::to_string(&report.custom_properties)?,
            to_sql_size(report.total())?,
            report.rows.len() as i64,
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            tracing::debug!(run_id = %run_id, "Report already stored");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    }

    for (position, row) in report.rows.iter().enumerate() {
        let breakdown = row.breakdown.as_ref().map(serde_json::to_string).transpose()?;
        tx.execute(
            "INSERT INTO report_rows (run_id, position, name, size, owner, tag, breakdown)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                position as i64,
                row.name,
                to_sql_size(row.size)?,
                row.owner,
                row.tag,
                breakdown,
            ],
        )?;
    }

    tx.commit()?;
    tracing::info!(run_id = %run_id, report = %report.id, rows = report.rows.len(), "Stored report");
    Ok(true)
}

/// All stored reports, newest first
pub fn get_reports(conn: &Connection) -> Result<Vec<StoredReport>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, report_id, mode, generated_at,
                project_name, version_name, device_name, build_type,
                total, row_count
         FROM reports
         ORDER BY generated_at DESC, id DESC",
    )?;

    let reports = stmt
        .query_map([], |row| {
            let mode: String = row.get(2)?;
            let generated_at: String = row.get(3)?;
            let total: i64 = row.get(8)?;
            let row_count: i64 = row.get(9)?;

            Ok(StoredReport {
                run_id: row.get(0)?,
                report_id: row.get(1)?,
                mode: SizeMode::from_name(&mode),
                generated_at: parse_timestamp(&generated_at, 3)?,
                project: ProjectInfo {
                    project_name: row.get(4)?,
                    version_name: row.get(5)?,
                    device_name: row.get(6)?,
                    build_type: row.get(7)?,
                },
                total: total as u64,
                row_count: row_count as usize,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(reports)
}

/// Rows of one stored report, in report order
pub fn get_report_rows(conn: &Connection, run_id: &str) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(
        "SELECT name, size, owner, tag, breakdown
         FROM report_rows
         WHERE run_id = ?1
         ORDER BY position",
    )?;

    let rows = stmt
        .query_map(params![run_id], |row| {
            let size: i64 = row.get(1)?;
            let breakdown: Option<String> = row.get(4)?;
            let breakdown = breakdown
                .map(|json| serde_json::from_str::<CategorySizes>(&json))
                .transpose()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

            Ok(Row {
                name: row.get(0)?,
                size: size as u64,
                owner: row.get(2)?,
                tag: row.get(3)?,
                breakdown,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Size of one row name in one report kind across every stored run
pub fn get_row_history(conn: &Connection, report_id: &str, row_name: &str) -> Result<Vec<HistoryPoint>> {
    let mut stmt = conn.prepare(
        "SELECT r.run_id, r.generated_at, rr.size
         FROM report_rows rr
         JOIN reports r ON r.run_id = rr.run_id
         WHERE r.report_id = ?1 AND rr.name = ?2
         ORDER BY r.generated_at ASC, r.id ASC",
    )?;

    let points = stmt
        .query_map(params![report_id, row_name], |row| {
            let generated_at: String = row.get(1)?;
            let size: i64 = row.get(2)?;
            Ok(HistoryPoint {
                run_id: row.get(0)?,
                generated_at: parse_timestamp(&generated_at, 1)?,
                size: size as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(points)
}

pub fn count_reports(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
    Ok(count)
}

/// RFC 3339 text from column `idx`
fn parse_timestamp(value: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// DATABASE REPORT WRITER
// ============================================================================

pub struct DatabaseReportWriter {
    conn: Connection,
}

impl DatabaseReportWriter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(DatabaseReportWriter {
            conn: open_database(path)?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ReportWriter for DatabaseReportWriter {
    fn write(&self, report: &Report) -> Result<()> {
        insert_report(&self.conn, report)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
