use super::{page_size, retention_cutoff, AuditStore, InvocationLogEntry, SWEEP_BATCH_SIZE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::Arc;
use syncboard_core::{codes, SkillType, SyncboardError, SyncboardResult};
use tracing::info;
use uuid::Uuid;

const SCHEMA: &str = "PRAGMA journal_mode=WAL;\
    CREATE TABLE IF NOT EXISTS invocation_log (\
        id TEXT PRIMARY KEY NOT NULL,\
        skill_name TEXT NOT NULL,\
        skill_type TEXT NOT NULL,\
        thread_id TEXT,\
        user_id TEXT,\
        channel TEXT,\
        input TEXT NOT NULL,\
        output TEXT,\
        success INTEGER NOT NULL,\
        error_message TEXT,\
        security_check_result TEXT NOT NULL,\
        duration_ms INTEGER NOT NULL,\
        timestamp_ms INTEGER NOT NULL);\
    CREATE INDEX IF NOT EXISTS idx_invocation_log_skill ON invocation_log(skill_name, timestamp_ms);\
    CREATE INDEX IF NOT EXISTS idx_invocation_log_time ON invocation_log(timestamp_ms);\
    CREATE INDEX IF NOT EXISTS idx_invocation_log_security ON invocation_log(security_check_result, timestamp_ms);";

const COLUMNS: &str = "id, skill_name, skill_type, thread_id, user_id, channel, input, output, \
    success, error_message, security_check_result, duration_ms, timestamp_ms";

fn db_err(err: rusqlite::Error) -> SyncboardError {
    SyncboardError::Audit(err.to_string())
}

fn limit_param(limit: Option<usize>) -> Value {
    Value::Integer(i64::try_from(page_size(limit)).unwrap_or(i64::MAX))
}

/// SQLite-backed audit store.
///
/// Timestamps are stored as epoch milliseconds; reads order by timestamp and
/// then by insertion order, both descending. Every statement runs on the
/// blocking pool so runtime workers never wait on the connection lock.
pub struct SqliteAuditStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteAuditStore {
    /// Opens (and if needed creates) the audit database at `path`.
    pub fn open(path: &Path) -> SyncboardResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> SyncboardResult<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(db_err)?)
    }

    fn with_connection(conn: Connection) -> SyncboardResult<Self> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> SyncboardResult<T>
    where
        F: FnOnce(&Connection) -> SyncboardResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || op(&connection.lock()))
            .await
            .map_err(|e| SyncboardError::Audit(format!("Audit task failed: {e}")))?
    }
}

fn insert(conn: &Connection, entry: &InvocationLogEntry) -> SyncboardResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO invocation_log ({COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            entry.id.to_string(),
            entry.skill_name,
            entry.skill_type.as_str(),
            entry.thread_id,
            entry.user_id,
            entry.channel,
            entry.input,
            entry.output,
            entry.success,
            entry.error_message,
            entry.security_check_result,
            i64::try_from(entry.duration_ms).unwrap_or(i64::MAX),
            entry.timestamp.timestamp_millis(),
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

/// Runs a filtered, newest-first page query. The last arg binds the LIMIT.
fn query(
    conn: &Connection,
    filter: &str,
    args: Vec<Value>,
) -> SyncboardResult<Vec<InvocationLogEntry>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM invocation_log {filter} \
         ORDER BY timestamp_ms DESC, rowid DESC LIMIT ?{}",
        args.len()
    );
    let mut stmt = conn.prepare(&sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params_from_iter(args), row_to_entry)
        .map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

fn delete_expired(conn: &Connection, cutoff: DateTime<Utc>) -> SyncboardResult<usize> {
    conn.execute(
        "DELETE FROM invocation_log WHERE rowid IN (\
            SELECT rowid FROM invocation_log WHERE timestamp_ms < ?1 \
            ORDER BY timestamp_ms LIMIT ?2)",
        params![
            cutoff.timestamp_millis(),
            i64::try_from(SWEEP_BATCH_SIZE).unwrap_or(i64::MAX),
        ],
    )
    .map_err(db_err)
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        Box::new(SyncboardError::Audit(message)),
    )
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<InvocationLogEntry> {
    let id: String = row.get(0)?;
    let skill_type: String = row.get(2)?;
    let duration_ms: i64 = row.get(11)?;
    let timestamp_ms: i64 = row.get(12)?;

    Ok(InvocationLogEntry {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e.to_string()))?,
        skill_name: row.get(1)?,
        skill_type: SkillType::parse_type(&skill_type)
            .ok_or_else(|| conversion_error(2, format!("unknown skill type '{skill_type}'")))?,
        thread_id: row.get(3)?,
        user_id: row.get(4)?,
        channel: row.get(5)?,
        input: row.get(6)?,
        output: row.get(7)?,
        success: row.get(8)?,
        error_message: row.get(9)?,
        security_check_result: row.get(10)?,
        duration_ms: u64::try_from(duration_ms).unwrap_or_default(),
        timestamp: DateTime::from_timestamp_millis(timestamp_ms)
            .ok_or_else(|| conversion_error(12, format!("invalid timestamp {timestamp_ms}")))?,
    })
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, entry: InvocationLogEntry) -> SyncboardResult<()> {
        self.with_conn(move |conn| insert(conn, &entry)).await
    }

    async fn by_skill(
        &self,
        skill_name: &str,
        limit: Option<usize>,
    ) -> SyncboardResult<Vec<InvocationLogEntry>> {
        let args = vec![Value::Text(skill_name.to_string()), limit_param(limit)];
        self.with_conn(move |conn| query(conn, "WHERE skill_name = ?1", args))
            .await
    }

    async fn recent(&self, limit: Option<usize>) -> SyncboardResult<Vec<InvocationLogEntry>> {
        let args = vec![limit_param(limit)];
        self.with_conn(move |conn| query(conn, "", args)).await
    }

    async fn security_failures(
        &self,
        limit: Option<usize>,
    ) -> SyncboardResult<Vec<InvocationLogEntry>> {
        let args = vec![Value::Text(codes::PASSED.to_string()), limit_param(limit)];
        self.with_conn(move |conn| query(conn, "WHERE security_check_result != ?1", args))
            .await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> SyncboardResult<usize> {
        let cutoff = retention_cutoff(now);
        let deleted = self
            .with_conn(move |conn| delete_expired(conn, cutoff))
            .await?;
        if deleted > 0 {
            info!(deleted, "Swept expired audit entries");
        }
        Ok(deleted)
    }
}
