//! `syncboard.toml` configuration and the runtime it wires up.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use syncboard_core::{SkillRecord, SyncboardError, SyncboardResult};
use syncboard_security::{
    AuditStore, MemoryAuditStore, PolicyChecker, SecurityPolicy, SqliteAuditStore,
};
use syncboard_skills::{code, CodeHandlers, DispatchContext, SkillRegistry, WebhookCaller};
use tracing::info;

/// File the skill registry is persisted to, relative to `data_dir`.
pub const REGISTRY_FILE: &str = "skills.json";
/// Default audit database file, relative to `data_dir`.
pub const AUDIT_DB_FILE: &str = "audit.db";

#[derive(Debug, Deserialize)]
pub struct SyncboardConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub security: SecurityPolicy,
    #[serde(default)]
    pub audit: AuditConfig,
    /// Seed records, used only when no registry file exists yet.
    #[serde(default)]
    pub skills: Vec<SkillRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub backend: AuditBackend,
    /// Overrides `<data_dir>/audit.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl SyncboardConfig {
    pub fn from_toml(text: &str) -> SyncboardResult<Self> {
        toml::from_str(text).map_err(|e| SyncboardError::Config(e.to_string()))
    }

    pub async fn load(path: &Path) -> SyncboardResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            SyncboardError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&text)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(REGISTRY_FILE)
    }

    pub fn audit_path(&self) -> PathBuf {
        self.audit
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(AUDIT_DB_FILE))
    }

    /// Opens the persisted registry, seeding it from `[[skills]]` on first run.
    pub async fn open_registry(&self) -> SyncboardResult<SkillRegistry> {
        let path = self.registry_path();
        if tokio::fs::try_exists(&path).await? {
            let registry = SkillRegistry::load(&path).await?;
            info!(path = %path.display(), count = registry.len(), "Skill registry loaded");
            return Ok(registry);
        }

        let registry = SkillRegistry::from_records(self.skills.iter().cloned())?;
        registry.save(&path).await?;
        info!(path = %path.display(), count = registry.len(), "Skill registry seeded from config");
        Ok(registry)
    }

    pub fn open_audit(&self) -> SyncboardResult<Arc<dyn AuditStore>> {
        Ok(match self.audit.backend {
            AuditBackend::Sqlite => Arc::new(SqliteAuditStore::open(&self.audit_path())?),
            AuditBackend::Memory => Arc::new(MemoryAuditStore::new()),
        })
    }

    /// Builds the dispatch collaborators: policy checker, audit store,
    /// webhook client and the built-in code handlers.
    pub fn dispatch(&self, audit: Arc<dyn AuditStore>) -> SyncboardResult<DispatchContext> {
        let handlers = CodeHandlers::new();
        code::register_builtins(&handlers)?;
        Ok(DispatchContext {
            checker: Arc::new(PolicyChecker::new(&self.security)?),
            audit,
            webhooks: WebhookCaller::new()?,
            handlers: Arc::new(handlers),
        })
    }
}
