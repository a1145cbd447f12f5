use serde::{Deserialize, Serialize};

/// Stable reason codes carried by [`SecurityVerdict::code`].
///
/// These strings are persisted in the audit log and used to group failures,
/// so existing values must never change.
pub mod codes {
    pub const PASSED: &str = "passed";
    pub const NOT_APPROVED: &str = "not_approved";
    pub const INACTIVE: &str = "inactive";
    pub const DOMAIN_NOT_ALLOWLISTED: &str = "domain_not_allowlisted";
    pub const MISSING_DOMAIN: &str = "missing_domain";
    pub const INPUT_REJECTED: &str = "input_rejected";
    pub const BLOCKED_CONTENT: &str = "blocked_content";
}

/// Outcome of a security check for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityVerdict {
    pub allowed: bool,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SecurityVerdict {
    /// An allowing verdict with the `passed` code.
    pub fn pass() -> Self {
        Self {
            allowed: true,
            code: codes::PASSED.to_string(),
            reason: None,
        }
    }

    pub fn deny(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            code: code.into(),
            reason: Some(reason.into()),
        }
    }

    /// Text surfaced to the caller when the verdict denies.
    pub fn denial_message(&self) -> String {
        self.reason
            .clone()
            .unwrap_or_else(|| format!("Security check failed: {}", self.code))
    }
}

/// Caller-supplied context for an invocation, copied into the audit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub thread_id: Option<String>,
    pub user_id: Option<String>,
    pub channel: Option<String>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// Extra facts handed to the security checker alongside the skill and input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    /// Host a webhook skill would call.
    pub target_domain: Option<String>,
    pub invocation: InvocationContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_message_falls_back_to_code() {
        let verdict = SecurityVerdict {
            allowed: false,
            code: codes::INACTIVE.to_string(),
            reason: None,
        };
        assert_eq!(verdict.denial_message(), "Security check failed: inactive");

        let verdict = SecurityVerdict::deny(codes::DOMAIN_NOT_ALLOWLISTED, "host not permitted");
        assert_eq!(verdict.denial_message(), "host not permitted");
    }

    #[test]
    fn test_pass_verdict() {
        let verdict = SecurityVerdict::pass();
        assert!(verdict.allowed);
        assert_eq!(verdict.code, "passed");
        assert!(verdict.reason.is_none());
    }
}
