//! Append-only record of every skill invocation attempt.
//!
//! Each attempt, whether it ran, failed or was denied by the security
//! checker, produces exactly one [`InvocationLogEntry`]. Entries are never
//! updated; the only deletion path is the retention sweep.

mod memory;
mod sqlite;

pub use memory::MemoryAuditStore;
pub use sqlite::SqliteAuditStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use syncboard_core::{
    codes, truncate, InvocationContext, SkillType, SyncboardResult, MAX_LOGGED_CHARS,
};
use uuid::Uuid;

/// Page size used when a read does not specify a limit.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Upper bound applied to every read, whatever the caller asks for.
pub const MAX_PAGE_SIZE: usize = 500;
/// Entries older than this many days are removed by the sweep.
pub const RETENTION_DAYS: i64 = 30;
/// Maximum number of entries a single sweep deletes.
pub const SWEEP_BATCH_SIZE: usize = 1000;

/// Resolves an optional caller limit to the effective page size.
pub fn page_size(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
}

/// Timestamp before which entries are expired at `now`.
pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - ChronoDuration::days(RETENTION_DAYS)
}

/// One invocation attempt and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationLogEntry {
    pub id: Uuid,
    pub skill_name: String,
    pub skill_type: SkillType,
    pub thread_id: Option<String>,
    pub user_id: Option<String>,
    pub channel: Option<String>,
    /// Input as received, truncated to [`MAX_LOGGED_CHARS`].
    pub input: String,
    /// Output on success, truncated to [`MAX_LOGGED_CHARS`].
    pub output: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    /// Verdict code from the security checker.
    pub security_check_result: String,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl InvocationLogEntry {
    /// Starts an entry for a failed attempt; call [`Self::succeeded`] to flip it.
    pub fn new(
        skill_name: impl Into<String>,
        skill_type: SkillType,
        context: &InvocationContext,
        input: &str,
        security_check_result: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            skill_name: skill_name.into(),
            skill_type,
            thread_id: context.thread_id.clone(),
            user_id: context.user_id.clone(),
            channel: context.channel.clone(),
            input: truncate(input, MAX_LOGGED_CHARS),
            output: None,
            success: false,
            error_message: None,
            security_check_result: security_check_result.into(),
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn succeeded(mut self, output: &str) -> Self {
        self.success = true;
        self.output = Some(truncate(output, MAX_LOGGED_CHARS));
        self.error_message = None;
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error.into());
        self
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_security_failure(&self) -> bool {
        self.security_check_result != codes::PASSED
    }
}

/// Durable storage for invocation log entries.
///
/// All reads return entries newest-first and never more than
/// [`page_size`] of the requested limit.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends one entry. Existing entries are never modified.
    async fn append(&self, entry: InvocationLogEntry) -> SyncboardResult<()>;

    async fn by_skill(
        &self,
        skill_name: &str,
        limit: Option<usize>,
    ) -> SyncboardResult<Vec<InvocationLogEntry>>;

    async fn recent(&self, limit: Option<usize>) -> SyncboardResult<Vec<InvocationLogEntry>>;

    /// Entries whose security check did not pass.
    async fn security_failures(
        &self,
        limit: Option<usize>,
    ) -> SyncboardResult<Vec<InvocationLogEntry>>;

    /// Deletes at most [`SWEEP_BATCH_SIZE`] entries older than
    /// [`RETENTION_DAYS`] relative to `now` and returns how many were removed.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> SyncboardResult<usize>;

    /// Retention sweep against the current time.
    async fn sweep(&self) -> SyncboardResult<usize> {
        self.sweep_expired(Utc::now()).await
    }
}
