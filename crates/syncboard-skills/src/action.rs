use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use syncboard_core::{SkillRecord, SkillType, SyncboardError, SyncboardResult};

/// Typed form of a skill's stored config, one variant per [`SkillType`].
#[derive(Debug, Clone, PartialEq)]
pub enum SkillAction {
    Template(TemplateConfig),
    Webhook(WebhookConfig),
    Code(CodeConfig),
}

impl SkillAction {
    /// Interprets `record.config` according to `record.skill_type`.
    pub fn from_record(record: &SkillRecord) -> SyncboardResult<Self> {
        let invalid = |e: serde_json::Error| {
            SyncboardError::SkillConfig(format!(
                "Invalid {} config for skill '{}': {e}",
                record.skill_type, record.name
            ))
        };

        match record.skill_type {
            SkillType::Template => {
                let config: TemplateConfig =
                    serde_json::from_value(record.config.clone()).map_err(invalid)?;
                Ok(SkillAction::Template(config))
            }
            SkillType::Webhook => {
                let raw: RawWebhookConfig =
                    serde_json::from_value(record.config.clone()).map_err(invalid)?;
                Ok(SkillAction::Webhook(WebhookConfig::from_raw(&record.name, raw)?))
            }
            SkillType::Code => {
                let config: CodeConfig =
                    serde_json::from_value(record.config.clone()).map_err(invalid)?;
                if config.handler.trim().is_empty() {
                    return Err(SyncboardError::SkillConfig(format!(
                        "Code skill '{}' has an empty handler name",
                        record.name
                    )));
                }
                Ok(SkillAction::Code(config))
            }
        }
    }

    /// Host the action will contact, if any.
    pub fn target_domain(&self) -> Option<String> {
        match self {
            SkillAction::Webhook(cfg) => cfg.host(),
            SkillAction::Template(_) | SkillAction::Code(_) => None,
        }
    }
}

/// Config for [`SkillType::Template`] skills.
///
/// `template` may reference `{{input}}` and any key of `variables`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateConfig {
    pub template: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// HTTP method used to call a webhook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    Get,
    #[default]
    Post,
}

#[derive(Debug, Deserialize)]
struct RawWebhookConfig {
    url: String,
    #[serde(default)]
    method: WebhookMethod,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

/// Config for [`SkillType::Webhook`] skills, with the URL already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    pub url: Url,
    pub method: WebhookMethod,
    pub headers: BTreeMap<String, String>,
}

impl WebhookConfig {
    fn from_raw(skill: &str, raw: RawWebhookConfig) -> SyncboardResult<Self> {
        let url = Url::parse(&raw.url).map_err(|e| {
            SyncboardError::SkillConfig(format!(
                "Webhook skill '{skill}' has invalid url '{}': {e}",
                raw.url
            ))
        })?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(SyncboardError::SkillConfig(format!(
                    "Webhook skill '{skill}' uses unsupported scheme '{scheme}'"
                )));
            }
        }
        if url.host_str().is_none() {
            return Err(SyncboardError::SkillConfig(format!(
                "Webhook skill '{skill}' url has no host"
            )));
        }
        Ok(Self {
            url,
            method: raw.method,
            headers: raw.headers,
        })
    }

    pub fn host(&self) -> Option<String> {
        self.url.host_str().map(str::to_lowercase)
    }
}

/// Config for [`SkillType::Code`] skills.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodeConfig {
    /// Name the handler was registered under.
    pub handler: String,
}
