use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::core::component::ComponentError;
use crate::model::{AccountProfile, Explanation, RiskAssessment, RiskDistribution, RiskLevel};
use crate::store::migrations::{apply_migrations, db_error};

/// One persisted assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub account_id: String,
    pub account_type: String,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub explanations: Vec<Explanation>,
    pub assessed_at: DateTime<Utc>,
    pub batch_id: Option<String>,
}

/// SQLite log of every assessment made by the service
#[derive(Debug)]
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

type RawRow = (i64, String, String, u8, String, String, String, Option<String>);

const SELECT_COLUMNS: &str =
    "SELECT id, account_id, account_type, risk_score, risk_level, explanations, assessed_at, batch_id FROM assessments";

impl HistoryStore {
    /// Open (or create) a history database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ComponentError> {
        let started_at = Instant::now();
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            error!("Failed to open history database {}: {}", path.display(), e);
            db_error(e)
        })?;
        let store = Self::bootstrap(conn)?;
        info!(
            "Opened history database {} in {} ms",
            path.display(),
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    /// Open a throwaway in-memory history
    pub fn open_in_memory() -> Result<Self, ComponentError> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        let store = Self::bootstrap(conn)?;
        info!("Opened in-memory history database");
        Ok(store)
    }

    fn bootstrap(mut conn: Connection) -> Result<Self, ComponentError> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ComponentError> {
        self.conn
            .lock()
            .map_err(|_| ComponentError::PersistenceError("History connection poisoned".to_string()))
    }

    /// Persist one assessment, returning its row id
    pub fn record(
        &self,
        account: &AccountProfile,
        assessment: &RiskAssessment,
        batch_id: Option<&str>,
    ) -> Result<i64, ComponentError> {
        let explanations = serde_json::to_string(&assessment.explanations)
            .map_err(|e| ComponentError::PersistenceError(format!("Failed to encode explanations: {}", e)))?;

        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO assessments (account_id, account_type, risk_score, risk_level, explanations, assessed_at, batch_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                assessment.account_id,
                account.account_type.label(),
                assessment.risk_score,
                assessment.risk_level.label(),
                explanations,
                assessment.assessed_at.to_rfc3339(),
                batch_id,
            ],
        )
        .map_err(db_error)?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent assessments across all accounts, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, ComponentError> {
        let sql = format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS);
        self.query(&sql, params![limit as i64])
    }

    /// Assessments of one account, newest first
    pub fn for_account(&self, account_id: &str, limit: usize) -> Result<Vec<HistoryEntry>, ComponentError> {
        let sql = format!("{} WHERE account_id = ?1 ORDER BY id DESC LIMIT ?2", SELECT_COLUMNS);
        self.query(&sql, params![account_id, limit as i64])
    }

    /// Level counts and mean score over the whole history
    pub fn distribution(&self) -> Result<RiskDistribution, ComponentError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT risk_level, COUNT(*), SUM(risk_score) FROM assessments GROUP BY risk_level")
            .map_err(db_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
            })
            .map_err(db_error)?;

        let mut distribution = RiskDistribution::default();
        let mut score_sum = 0i64;
        for row in rows {
            let (level, count, sum) = row.map_err(db_error)?;
            let count = count as u64;
            match parse_level(&level)? {
                RiskLevel::High => distribution.high_risk = count,
                RiskLevel::Moderate => distribution.moderate_risk = count,
                RiskLevel::Low => distribution.low_risk = count,
            }
            distribution.total += count;
            score_sum += sum;
        }
        if distribution.total > 0 {
            distribution.avg_score = score_sum as f64 / distribution.total as f64;
        }
        Ok(distribution)
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<HistoryEntry>, ComponentError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql).map_err(db_error)?;
        let rows = stmt
            .query_map(params, |row| -> rusqlite::Result<RawRow> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })
            .map_err(db_error)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(decode_row(row.map_err(db_error)?)?);
        }
        Ok(entries)
    }
}

fn decode_row(raw: RawRow) -> Result<HistoryEntry, ComponentError> {
    let (id, account_id, account_type, risk_score, level, explanations, assessed_at, batch_id) = raw;

    let explanations: Vec<Explanation> = serde_json::from_str(&explanations)
        .map_err(|e| ComponentError::PersistenceError(format!("Corrupt explanations in row {}: {}", id, e)))?;
    let assessed_at = DateTime::parse_from_rfc3339(&assessed_at)
        .map_err(|e| ComponentError::PersistenceError(format!("Corrupt timestamp in row {}: {}", id, e)))?
        .with_timezone(&Utc);

    Ok(HistoryEntry {
        id,
        account_id,
        account_type,
        risk_score,
        risk_level: parse_level(&level)?,
        explanations,
        assessed_at,
        batch_id,
    })
}

fn parse_level(label: &str) -> Result<RiskLevel, ComponentError> {
    label.parse().map_err(ComponentError::PersistenceError)
}
