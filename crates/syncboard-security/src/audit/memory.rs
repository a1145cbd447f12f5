use super::{page_size, retention_cutoff, AuditStore, InvocationLogEntry, SWEEP_BATCH_SIZE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashSet;
use syncboard_core::SyncboardResult;
use tracing::info;

/// Audit store kept in process memory. Used in tests and for ephemeral runs.
#[derive(Default)]
pub struct MemoryAuditStore {
    entries: RwLock<Vec<InvocationLogEntry>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn select<F>(&self, limit: Option<usize>, filter: F) -> Vec<InvocationLogEntry>
    where
        F: Fn(&InvocationLogEntry) -> bool,
    {
        let entries = self.entries.read();
        // Reverse first so that equal timestamps keep later appends in front.
        let mut matching: Vec<&InvocationLogEntry> =
            entries.iter().rev().filter(|e| filter(e)).collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching
            .into_iter()
            .take(page_size(limit))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, entry: InvocationLogEntry) -> SyncboardResult<()> {
        self.entries.write().push(entry);
        Ok(())
    }

    async fn by_skill(
        &self,
        skill_name: &str,
        limit: Option<usize>,
    ) -> SyncboardResult<Vec<InvocationLogEntry>> {
        Ok(self.select(limit, |e| e.skill_name == skill_name))
    }

    async fn recent(&self, limit: Option<usize>) -> SyncboardResult<Vec<InvocationLogEntry>> {
        Ok(self.select(limit, |_| true))
    }

    async fn security_failures(
        &self,
        limit: Option<usize>,
    ) -> SyncboardResult<Vec<InvocationLogEntry>> {
        Ok(self.select(limit, InvocationLogEntry::is_security_failure))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> SyncboardResult<usize> {
        let cutoff = retention_cutoff(now);
        let mut entries = self.entries.write();

        // Oldest expired entries go first, matching the SQLite batch order.
        let mut expired: Vec<(DateTime<Utc>, usize)> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.timestamp < cutoff)
            .map(|(i, e)| (e.timestamp, i))
            .collect();
        expired.sort_unstable();
        expired.truncate(SWEEP_BATCH_SIZE);
        let doomed: HashSet<usize> = expired.into_iter().map(|(_, i)| i).collect();

        let mut index = 0;
        entries.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
        let deleted = doomed.len();
        if deleted > 0 {
            info!(deleted, "Swept expired audit entries");
        }
        Ok(deleted)
    }
}
