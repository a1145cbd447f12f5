use crate::allowlist::DomainAllowlist;
use crate::sanitizer::{SanitizeResult, Sanitizer};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use syncboard_core::{
    codes, SecurityContext, SecurityVerdict, SkillRecord, SkillType, SyncboardError,
    SyncboardResult,
};
use tracing::debug;

/// Policy gate consulted before every skill invocation.
///
/// Implementations must be free of side effects visible to the caller and
/// must give every denial a stable [`SecurityVerdict::code`].
#[async_trait]
pub trait SecurityChecker: Send + Sync {
    async fn check(
        &self,
        skill: &SkillRecord,
        input: &str,
        context: &SecurityContext,
    ) -> SecurityVerdict;
}

/// Policy settings for [`PolicyChecker`], usually read from the `[security]`
/// table of the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityPolicy {
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub blocked_patterns: Vec<String>,
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
}

fn default_max_input_length() -> usize {
    20_000
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            allowed_domains: vec![],
            blocked_patterns: vec![],
            max_input_length: default_max_input_length(),
        }
    }
}

/// The built-in checker: registry flags, webhook domain allow-list, input
/// sanitization and content block patterns, evaluated in that order.
pub struct PolicyChecker {
    allowlist: DomainAllowlist,
    sanitizer: Sanitizer,
    blocked: Vec<Regex>,
}

impl PolicyChecker {
    pub fn new(policy: &SecurityPolicy) -> SyncboardResult<Self> {
        let blocked = policy
            .blocked_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    SyncboardError::Security(format!("Invalid blocked pattern '{p}': {e}"))
                })
            })
            .collect::<SyncboardResult<Vec<_>>>()?;

        Ok(Self {
            allowlist: DomainAllowlist::new(policy.allowed_domains.iter().cloned()),
            sanitizer: Sanitizer::new(policy.max_input_length),
            blocked,
        })
    }

    fn evaluate(
        &self,
        skill: &SkillRecord,
        input: &str,
        context: &SecurityContext,
    ) -> SecurityVerdict {
        if !skill.approved {
            return SecurityVerdict::deny(
                codes::NOT_APPROVED,
                format!("Skill '{}' has not been approved", skill.name),
            );
        }
        if !skill.active {
            return SecurityVerdict::deny(
                codes::INACTIVE,
                format!("Skill '{}' is not active", skill.name),
            );
        }

        if skill.skill_type == SkillType::Webhook {
            let Some(host) = context.target_domain.as_deref() else {
                return SecurityVerdict::deny(
                    codes::MISSING_DOMAIN,
                    format!("Webhook skill '{}' has no target host", skill.name),
                );
            };
            if !self.allowlist.is_allowed(host) {
                return SecurityVerdict::deny(
                    codes::DOMAIN_NOT_ALLOWLISTED,
                    format!("Host '{host}' is not on the webhook allow-list"),
                );
            }
        }

        let cleaned = match self.sanitizer.sanitize(input) {
            SanitizeResult::Rejected(reason) => {
                return SecurityVerdict::deny(codes::INPUT_REJECTED, reason);
            }
            SanitizeResult::Clean(s) | SanitizeResult::Cleaned(s) => s,
        };

        if let Some(pattern) = self.blocked.iter().find(|re| re.is_match(&cleaned)) {
            debug!(skill = %skill.name, pattern = %pattern.as_str(), "Input matched block pattern");
            return SecurityVerdict::deny(
                codes::BLOCKED_CONTENT,
                "Input contains disallowed content",
            );
        }

        SecurityVerdict::pass()
    }
}

#[async_trait]
impl SecurityChecker for PolicyChecker {
    async fn check(
        &self,
        skill: &SkillRecord,
        input: &str,
        context: &SecurityContext,
    ) -> SecurityVerdict {
        self.evaluate(skill, input, context)
    }
}

/// Checker that returns the same verdict for every call.
///
/// Handy for wiring tests and for trusted local setups.
pub struct StaticChecker {
    verdict: SecurityVerdict,
}

impl StaticChecker {
    pub fn new(verdict: SecurityVerdict) -> Self {
        Self { verdict }
    }

    pub fn allow_all() -> Self {
        Self::new(SecurityVerdict::pass())
    }
}

#[async_trait]
impl SecurityChecker for StaticChecker {
    async fn check(&self, _: &SkillRecord, _: &str, _: &SecurityContext) -> SecurityVerdict {
        self.verdict.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn webhook(url: &str) -> SkillRecord {
        SkillRecord::new(
            "ping",
            SkillType::Webhook,
            "Ping",
            serde_json::json!({ "url": url }),
        )
        .enabled()
    }

    fn ctx(host: Option<&str>) -> SecurityContext {
        SecurityContext {
            target_domain: host.map(str::to_string),
            ..Default::default()
        }
    }

    fn checker() -> PolicyChecker {
        PolicyChecker::new(&SecurityPolicy {
            allowed_domains: vec!["example.com".to_string()],
            blocked_patterns: vec![r"(?i)rm\s+-rf".to_string()],
            max_input_length: 50,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_passes_allowlisted_webhook() {
        let verdict = checker()
            .check(&webhook("https://example.com/hook"), "hello", &ctx(Some("example.com")))
            .await;
        assert_eq!(verdict, SecurityVerdict::pass());
    }

    #[tokio::test]
    async fn test_denies_unlisted_domain() {
        let verdict = checker()
            .check(&webhook("https://evil.net/x"), "hello", &ctx(Some("evil.net")))
            .await;
        assert!(!verdict.allowed);
        assert_eq!(verdict.code, codes::DOMAIN_NOT_ALLOWLISTED);
    }

    #[tokio::test]
    async fn test_denies_webhook_without_host() {
        let verdict = checker().check(&webhook("x"), "hello", &ctx(None)).await;
        assert_eq!(verdict.code, codes::MISSING_DOMAIN);
    }

    #[tokio::test]
    async fn test_flag_checks_come_first() {
        let mut skill = webhook("https://evil.net/x");
        skill.approved = false;
        let verdict = checker().check(&skill, "hello", &ctx(Some("evil.net"))).await;
        assert_eq!(verdict.code, codes::NOT_APPROVED);

        skill.approved = true;
        skill.active = false;
        let verdict = checker().check(&skill, "hello", &ctx(Some("evil.net"))).await;
        assert_eq!(verdict.code, codes::INACTIVE);
    }

    #[tokio::test]
    async fn test_input_rules() {
        let skill = SkillRecord::new(
            "greet",
            SkillType::Template,
            "Greets",
            serde_json::json!({"template": "Hi {{input}}"}),
        )
        .enabled();

        let long = "x".repeat(51);
        let verdict = checker().check(&skill, &long, &ctx(None)).await;
        assert_eq!(verdict.code, codes::INPUT_REJECTED);

        let verdict = checker().check(&skill, "please RM  -rf /", &ctx(None)).await;
        assert_eq!(verdict.code, codes::BLOCKED_CONTENT);

        let verdict = checker().check(&skill, "Ada", &ctx(None)).await;
        assert!(verdict.allowed);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let result = PolicyChecker::new(&SecurityPolicy {
            blocked_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        });
        assert!(matches!(result, Err(SyncboardError::Security(_))));
    }

    #[tokio::test]
    async fn test_static_checker() {
        let checker = StaticChecker::new(SecurityVerdict::deny("custom", "nope"));
        let verdict = checker.check(&webhook("https://a.b"), "", &ctx(None)).await;
        assert_eq!(verdict.code, "custom");
        assert!(StaticChecker::allow_all()
            .check(&webhook("https://a.b"), "", &ctx(None))
            .await
            .allowed);
    }
}
