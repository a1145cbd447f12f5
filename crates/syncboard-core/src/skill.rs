use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of action a skill performs when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    /// Renders a stored text template with the caller's input.
    Template,
    /// Calls a configured HTTP endpoint.
    Webhook,
    /// Runs a handler registered in-process.
    Code,
}

impl SkillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillType::Template => "template",
            SkillType::Webhook => "webhook",
            SkillType::Code => "code",
        }
    }

    pub fn parse_type(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "template" => Some(SkillType::Template),
            "webhook" => Some(SkillType::Webhook),
            "code" => Some(SkillType::Code),
            _ => None,
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An administrator-managed skill definition.
///
/// `config` is kept as opaque JSON here; its shape depends on `skill_type`
/// and is only interpreted when a tool is built from the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Unique name, also used as the tool name.
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    /// Shown to the model as the tool's purpose.
    pub description: String,
    #[serde(default = "empty_config")]
    pub config: serde_json::Value,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl SkillRecord {
    /// Creates an unapproved, inactive record.
    pub fn new(
        name: impl Into<String>,
        skill_type: SkillType,
        description: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            skill_type,
            description: description.into(),
            config,
            approved: false,
            active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style shortcut that marks the record approved and active.
    pub fn enabled(mut self) -> Self {
        self.approved = true;
        self.active = true;
        self
    }

    /// Whether a tool may be built from this record.
    pub fn is_eligible(&self) -> bool {
        self.approved && self.active
    }
}
