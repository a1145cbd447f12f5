use crate::action::SkillAction;
use crate::code::CodeHandlers;
use crate::template;
use crate::webhook::WebhookCaller;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use syncboard_core::{
    tool::INPUT_FIELD, InvocationContext, SecurityContext, SkillRecord, SyncboardResult,
    ToolOutput,
};
use syncboard_security::{AuditStore, InvocationLogEntry, SecurityChecker};
use tracing::{error, info, warn};

/// Metadata describing a tool's interface, as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

impl ToolDescriptor {
    fn for_skill(record: &SkillRecord) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    INPUT_FIELD: {
                        "type": "string",
                        "description": "Free-text instruction for this skill"
                    }
                },
                "required": [INPUT_FIELD]
            }),
        }
    }
}

/// Collaborators every tool invocation runs against.
///
/// Passed explicitly so dispatch can be exercised without a live backend.
#[derive(Clone)]
pub struct DispatchContext {
    pub checker: Arc<dyn SecurityChecker>,
    pub audit: Arc<dyn AuditStore>,
    pub webhooks: WebhookCaller,
    pub handlers: Arc<CodeHandlers>,
}

/// A skill wrapped for invocation: security check, execution and audit.
#[derive(Clone)]
pub struct Tool {
    descriptor: ToolDescriptor,
    record: SkillRecord,
    action: SkillAction,
    dispatch: DispatchContext,
}

impl Tool {
    /// Wraps `record`, which the loader has already checked for eligibility.
    pub(crate) fn new(record: SkillRecord, action: SkillAction, dispatch: DispatchContext) -> Self {
        Self {
            descriptor: ToolDescriptor::for_skill(&record),
            record,
            action,
            dispatch,
        }
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// The registry snapshot this tool was built from.
    pub fn record(&self) -> &SkillRecord {
        &self.record
    }

    /// Runs one invocation.
    ///
    /// Always resolves to a [`ToolOutput`] and always appends exactly one
    /// audit entry before returning, whether the call was denied, failed or
    /// succeeded.
    pub async fn invoke(&self, input: &str, context: &InvocationContext) -> ToolOutput {
        let started = Instant::now();
        let security = SecurityContext {
            target_domain: self.action.target_domain(),
            invocation: context.clone(),
        };

        let verdict = self
            .dispatch
            .checker
            .check(&self.record, input, &security)
            .await;
        let entry = InvocationLogEntry::new(
            &self.record.name,
            self.record.skill_type,
            context,
            input,
            &verdict.code,
        );

        if !verdict.allowed {
            let message = verdict.denial_message();
            warn!(skill = %self.record.name, code = %verdict.code, "Skill invocation denied");
            self.record_entry(entry.failed(&message).with_duration(started.elapsed()))
                .await;
            return ToolOutput::error(message);
        }

        match self.execute(input).await {
            Ok(value) => {
                let text = match &value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let entry = entry.succeeded(&text).with_duration(started.elapsed());
                info!(
                    skill = %self.record.name,
                    elapsed_ms = entry.duration_ms,
                    "Skill invocation succeeded"
                );
                self.record_entry(entry).await;
                ToolOutput::Value(value)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(skill = %self.record.name, error = %message, "Skill invocation failed");
                self.record_entry(entry.failed(&message).with_duration(started.elapsed()))
                    .await;
                ToolOutput::error(message)
            }
        }
    }

    async fn execute(&self, input: &str) -> SyncboardResult<serde_json::Value> {
        match &self.action {
            SkillAction::Template(cfg) => template::render(cfg, input).map(serde_json::Value::String),
            SkillAction::Webhook(cfg) => {
                self.dispatch
                    .webhooks
                    .call(&self.record.name, cfg, input)
                    .await
            }
            SkillAction::Code(cfg) => self.dispatch.handlers.run(&cfg.handler, input).await,
        }
    }

    /// Write failures are logged and swallowed; the invocation result stands.
    async fn record_entry(&self, entry: InvocationLogEntry) {
        let skill = entry.skill_name.clone();
        if let Err(e) = self.dispatch.audit.append(entry).await {
            error!(skill = %skill, error = %e, "Failed to write audit entry");
        }
    }
}
