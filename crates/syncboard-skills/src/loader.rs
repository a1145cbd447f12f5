use crate::action::SkillAction;
use crate::registry::SkillSource;
use crate::tool::{DispatchContext, Tool, ToolDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use syncboard_core::{InvocationContext, ToolCall, ToolOutput};
use tracing::{info, warn};

/// A skill that was eligible but could not be turned into a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSkill {
    pub name: String,
    pub reason: String,
}

/// Builds the set of tools available for one conversational turn.
pub struct ToolLoader {
    source: Arc<dyn SkillSource>,
    dispatch: DispatchContext,
}

impl ToolLoader {
    pub fn new(source: Arc<dyn SkillSource>, dispatch: DispatchContext) -> Self {
        Self { source, dispatch }
    }

    /// Reads a fresh snapshot and wraps every approved, active skill.
    ///
    /// A skill whose config cannot be interpreted is skipped on its own; the
    /// remaining skills still load. When two eligible records share a name the
    /// first one in name order wins and the other is reported as skipped.
    pub fn load(&self) -> ToolSet {
        let mut snapshot: Vec<_> = self
            .source
            .snapshot()
            .into_iter()
            .filter(|record| record.is_eligible())
            .collect();
        // Stable sort keeps source order among equal names.
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tools = BTreeMap::new();
        let mut skipped = Vec::new();

        for record in snapshot {
            if tools.contains_key(&record.name) {
                warn!(skill = %record.name, "Duplicate skill name, keeping the first definition");
                skipped.push(SkippedSkill {
                    reason: format!("Duplicate skill name '{}'", record.name),
                    name: record.name,
                });
                continue;
            }

            match SkillAction::from_record(&record) {
                Ok(action) => {
                    tools.insert(
                        record.name.clone(),
                        Tool::new(record, action, self.dispatch.clone()),
                    );
                }
                Err(e) => {
                    warn!(skill = %record.name, error = %e, "Failed to build tool, skipping");
                    skipped.push(SkippedSkill {
                        name: record.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(loaded = tools.len(), skipped = skipped.len(), "Tools loaded");
        ToolSet { tools, skipped }
    }
}

/// Tools available for one turn, keyed by tool name.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Tool>,
    skipped: Vec<SkippedSkill>,
}

impl ToolSet {
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().map(Tool::descriptor).collect()
    }

    pub fn skipped(&self) -> &[SkippedSkill] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    /// Dispatches a model tool call by name.
    ///
    /// An unknown name never reaches a skill, so it is answered with an error
    /// payload and leaves no audit entry.
    pub async fn invoke(&self, call: &ToolCall, context: &InvocationContext) -> ToolOutput {
        match self.tools.get(&call.name) {
            Some(tool) => tool.invoke(&call.input_text(), context).await,
            None => {
                warn!(tool = %call.name, call_id = %call.id, "Unknown tool requested");
                ToolOutput::error(format!("Unknown tool: {}", call.name))
            }
        }
    }
}
