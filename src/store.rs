// 🗄️ Result Store - Engagement-scoped, append-only analysis history
// Every run is a new row; "current" is simply the most recent entry.
// Scoping entries are the one keyed-upsert exception, so manual risk and
// strategy overrides survive re-classification.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::scoping::ScopingEntry;

// ============================================================================
// TEST TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "benford")]
    Benford,
    #[serde(rename = "duplicates")]
    Duplicates,
    #[serde(rename = "materiality")]
    Materiality,
    #[serde(rename = "sampling")]
    Sampling,
    #[serde(rename = "payroll_reconciliation")]
    PayrollReconciliation,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Benford => "benford",
            TestType::Duplicates => "duplicates",
            TestType::Materiality => "materiality",
            TestType::Sampling => "sampling",
            TestType::PayrollReconciliation => "payroll_reconciliation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "benford" => Some(TestType::Benford),
            "duplicates" => Some(TestType::Duplicates),
            "materiality" => Some(TestType::Materiality),
            "sampling" => Some(TestType::Sampling),
            "payroll_reconciliation" => Some(TestType::PayrollReconciliation),
            _ => None,
        }
    }
}

// ============================================================================
// ANALYSIS RECORD
// ============================================================================

/// One stored analysis run. The `result` payload is the subsystem's own
/// serialized output, kept as JSON so the reporting layer round-trips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub engagement_id: i64,
    pub test_type: TestType,
    pub executed_at: DateTime<Utc>,
    pub result: serde_json::Value,
}

impl AnalysisRecord {
    pub fn new(engagement_id: i64, test_type: TestType, result: serde_json::Value) -> Self {
        AnalysisRecord {
            id: uuid::Uuid::new_v4().to_string(),
            engagement_id,
            test_type,
            executed_at: Utc::now(),
            result,
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS analysis_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            result_uuid TEXT UNIQUE NOT NULL,
            engagement_id INTEGER NOT NULL,
            test_type TEXT NOT NULL,
            executed_at TEXT NOT NULL,
            result TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS scoping_entries (
            engagement_id INTEGER NOT NULL,
            account_code TEXT NOT NULL,
            entry TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (engagement_id, account_code)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_engagement
         ON analysis_results(engagement_id, test_type, executed_at)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ANALYSIS RESULTS (append-only)
// ============================================================================

/// Append one analysis run. History is never overwritten.
pub fn insert_result(conn: &Connection, record: &AnalysisRecord) -> Result<()> {
    let result_json =
        serde_json::to_string(&record.result).context("Failed to serialize analysis result")?;

    conn.execute(
        "INSERT INTO analysis_results (result_uuid, engagement_id, test_type, executed_at, result)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id,
            record.engagement_id,
            record.test_type.as_str(),
            record.executed_at.to_rfc3339(),
            result_json,
        ],
    )?;

    Ok(())
}

/// All runs for an engagement, newest first.
pub fn get_results(conn: &Connection, engagement_id: i64) -> Result<Vec<AnalysisRecord>> {
    let mut stmt = conn.prepare(
        "SELECT result_uuid, engagement_id, test_type, executed_at, result
         FROM analysis_results
         WHERE engagement_id = ?1
         ORDER BY executed_at DESC, id DESC",
    )?;

    let records = stmt
        .query_map(params![engagement_id], row_to_record)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Most recent run of one test type, if any.
pub fn latest_result(
    conn: &Connection,
    engagement_id: i64,
    test_type: TestType,
) -> Result<Option<AnalysisRecord>> {
    let mut stmt = conn.prepare(
        "SELECT result_uuid, engagement_id, test_type, executed_at, result
         FROM analysis_results
         WHERE engagement_id = ?1 AND test_type = ?2
         ORDER BY executed_at DESC, id DESC
         LIMIT 1",
    )?;

    let mut rows = stmt.query_map(params![engagement_id, test_type.as_str()], row_to_record)?;

    match rows.next() {
        Some(record) => Ok(Some(record?)),
        None => Ok(None),
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let test_type_str: String = row.get(2)?;
    let executed_at_str: String = row.get(3)?;
    let result_json: String = row.get(4)?;

    Ok(AnalysisRecord {
        id: row.get(0)?,
        engagement_id: row.get(1)?,
        test_type: TestType::from_str(&test_type_str).ok_or(rusqlite::Error::InvalidQuery)?,
        executed_at: DateTime::parse_from_rfc3339(&executed_at_str)
            .map_err(|_| rusqlite::Error::InvalidQuery)?
            .with_timezone(&Utc),
        result: serde_json::from_str(&result_json).map_err(|_| rusqlite::Error::InvalidQuery)?,
    })
}

// ============================================================================
// SCOPING ENTRIES (keyed upsert)
// ============================================================================

/// Upsert scoping entries keyed by (engagement, account_code).
pub fn upsert_scoping_entries(
    conn: &Connection,
    engagement_id: i64,
    entries: &[ScopingEntry],
) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    for entry in entries {
        let entry_json =
            serde_json::to_string(entry).context("Failed to serialize scoping entry")?;

        conn.execute(
            "INSERT INTO scoping_entries (engagement_id, account_code, entry, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(engagement_id, account_code)
             DO UPDATE SET entry = ?3, updated_at = ?4",
            params![engagement_id, entry.account_code, entry_json, now],
        )?;
    }

    Ok(())
}

/// Stored scoping entries for an engagement, ordered by account code.
pub fn get_scoping_entries(conn: &Connection, engagement_id: i64) -> Result<Vec<ScopingEntry>> {
    let mut stmt = conn.prepare(
        "SELECT entry FROM scoping_entries
         WHERE engagement_id = ?1
         ORDER BY account_code",
    )?;

    let entries = stmt
        .query_map(params![engagement_id], |row| {
            let entry_json: String = row.get(0)?;
            serde_json::from_str(&entry_json).map_err(|_| rusqlite::Error::InvalidQuery)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoping::{Classification, RiskLevel, TestStrategy};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_read_results() {
        let conn = test_conn();

        let record = AnalysisRecord::new(
            1,
            TestType::Benford,
            serde_json::json!({"anomalies": [9], "sample_size": 100}),
        );
        insert_result(&conn, &record).unwrap();

        let results = get_results(&conn, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].test_type, TestType::Benford);
        assert_eq!(results[0].result["sample_size"], 100);

        // Other engagement sees nothing.
        assert!(get_results(&conn, 2).unwrap().is_empty());
    }

    #[test]
    fn test_history_is_append_only() {
        let conn = test_conn();

        let first = AnalysisRecord::new(1, TestType::Materiality, serde_json::json!({"pm": 100}));
        let mut second =
            AnalysisRecord::new(1, TestType::Materiality, serde_json::json!({"pm": 80}));
        second.executed_at = first.executed_at + chrono::Duration::seconds(10);

        insert_result(&conn, &first).unwrap();
        insert_result(&conn, &second).unwrap();

        // Both runs kept; latest is the re-save.
        let all = get_results(&conn, 1).unwrap();
        assert_eq!(all.len(), 2);

        let latest = latest_result(&conn, 1, TestType::Materiality)
            .unwrap()
            .unwrap();
        assert_eq!(latest.result["pm"], 80);
    }

    #[test]
    fn test_latest_result_filters_by_test_type() {
        let conn = test_conn();

        insert_result(
            &conn,
            &AnalysisRecord::new(1, TestType::Benford, serde_json::json!({})),
        )
        .unwrap();

        assert!(latest_result(&conn, 1, TestType::Sampling).unwrap().is_none());
        assert!(latest_result(&conn, 1, TestType::Benford).unwrap().is_some());
    }

    #[test]
    fn test_scoping_upsert_keeps_one_row_per_account() {
        let conn = test_conn();

        let mut entry = ScopingEntry {
            account_code: "1.1".to_string(),
            account_name: "Caixa".to_string(),
            balance: 80_000.0,
            pct_materiality: 0.8,
            classification: Classification::Significant,
            risk: RiskLevel::Medium,
            strategy: TestStrategy::Substantive,
        };

        upsert_scoping_entries(&conn, 1, std::slice::from_ref(&entry)).unwrap();

        // Auditor overrides risk; same account upserts in place.
        entry.risk = RiskLevel::High;
        upsert_scoping_entries(&conn, 1, std::slice::from_ref(&entry)).unwrap();

        let stored = get_scoping_entries(&conn, 1).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].risk, RiskLevel::High);
    }
}
