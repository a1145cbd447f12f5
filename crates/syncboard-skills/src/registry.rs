use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use syncboard_core::{SkillRecord, SyncboardError, SyncboardResult};
use tracing::info;

/// Longest name accepted for a skill; tool names are sent to LLM APIs as-is.
pub const MAX_SKILL_NAME_LEN: usize = 64;

/// Anything that can hand the tool loader a snapshot of skill records.
pub trait SkillSource: Send + Sync {
    fn snapshot(&self) -> Vec<SkillRecord>;
}

impl SkillSource for Vec<SkillRecord> {
    fn snapshot(&self) -> Vec<SkillRecord> {
        self.clone()
    }
}

/// Central registry of administrator-managed skills, keyed by name.
///
/// Only the administrator operations here mutate records; the dispatch path
/// reads snapshots.
#[derive(Default)]
pub struct SkillRegistry {
    skills: RwLock<BTreeMap<String, SkillRecord>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from records, rejecting the first invalid or duplicate one.
    pub fn from_records(records: impl IntoIterator<Item = SkillRecord>) -> SyncboardResult<Self> {
        let registry = Self::new();
        for record in records {
            registry.create(record)?;
        }
        Ok(registry)
    }

    /// Adds a new skill. Names must be unique.
    pub fn create(&self, record: SkillRecord) -> SyncboardResult<()> {
        validate_name(&record.name)?;
        if !record.config.is_object() {
            return Err(SyncboardError::Registry(format!(
                "Skill '{}' config must be a JSON object",
                record.name
            )));
        }

        let mut skills = self.skills.write();
        if skills.contains_key(&record.name) {
            return Err(SyncboardError::Registry(format!(
                "Skill '{}' already exists",
                record.name
            )));
        }
        info!(skill = %record.name, skill_type = %record.skill_type, "Registered skill");
        skills.insert(record.name.clone(), record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<SkillRecord> {
        self.skills.read().get(name).cloned()
    }

    /// All records in name order.
    pub fn list(&self) -> Vec<SkillRecord> {
        self.skills.read().values().cloned().collect()
    }

    /// Records that are both approved and active, in name order.
    pub fn eligible(&self) -> Vec<SkillRecord> {
        self.skills
            .read()
            .values()
            .filter(|s| s.is_eligible())
            .cloned()
            .collect()
    }

    pub fn approve(&self, name: &str) -> SyncboardResult<SkillRecord> {
        self.update(name, |s| s.approved = true)
    }

    pub fn revoke(&self, name: &str) -> SyncboardResult<SkillRecord> {
        self.update(name, |s| s.approved = false)
    }

    pub fn activate(&self, name: &str) -> SyncboardResult<SkillRecord> {
        self.update(name, |s| s.active = true)
    }

    pub fn deactivate(&self, name: &str) -> SyncboardResult<SkillRecord> {
        self.update(name, |s| s.active = false)
    }

    pub fn remove(&self, name: &str) -> SyncboardResult<SkillRecord> {
        let removed = self
            .skills
            .write()
            .remove(name)
            .ok_or_else(|| unknown(name))?;
        info!(skill = %name, "Removed skill");
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.skills.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.read().is_empty()
    }

    fn update<F>(&self, name: &str, change: F) -> SyncboardResult<SkillRecord>
    where
        F: FnOnce(&mut SkillRecord),
    {
        let mut skills = self.skills.write();
        let record = skills.get_mut(name).ok_or_else(|| unknown(name))?;
        change(record);
        record.updated_at = Utc::now();
        info!(
            skill = %name,
            approved = record.approved,
            active = record.active,
            "Updated skill flags"
        );
        Ok(record.clone())
    }

    /// Loads a registry previously written with [`SkillRegistry::save`].
    pub async fn load(path: &Path) -> SyncboardResult<Self> {
        let data = tokio::fs::read_to_string(path).await?;
        let records: Vec<SkillRecord> = serde_json::from_str(&data).map_err(|e| {
            SyncboardError::Registry(format!(
                "Failed to parse skill registry {}: {e}",
                path.display()
            ))
        })?;
        Self::from_records(records)
    }

    /// Writes every record to `path` as a JSON array.
    pub async fn save(&self, path: &Path) -> SyncboardResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&self.list())?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

impl SkillSource for SkillRegistry {
    fn snapshot(&self) -> Vec<SkillRecord> {
        self.list()
    }
}

fn unknown(name: &str) -> SyncboardError {
    SyncboardError::Registry(format!("Unknown skill: {name}"))
}

fn validate_name(name: &str) -> SyncboardResult<()> {
    if name.is_empty() || name.len() > MAX_SKILL_NAME_LEN {
        return Err(SyncboardError::Registry(format!(
            "Skill name must be 1-{MAX_SKILL_NAME_LEN} characters, got '{name}'"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(SyncboardError::Registry(format!(
            "Skill name '{name}' may only contain letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}
