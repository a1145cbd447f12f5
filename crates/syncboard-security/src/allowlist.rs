use serde::{Deserialize, Serialize};

/// Set of hosts webhook skills are permitted to call.
///
/// An entry matches the host itself and any subdomain of it. The entry `*`
/// matches every host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainAllowlist {
    domains: Vec<String>,
}

impl DomainAllowlist {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for domain in domains {
            list.allow(domain);
        }
        list
    }

    pub fn allow(&mut self, domain: impl Into<String>) {
        let domain = normalize(&domain.into());
        if !domain.is_empty() && !self.domains.contains(&domain) {
            self.domains.push(domain);
        }
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        let host = normalize(host);
        self.domains.iter().any(|d| {
            d == "*"
                || host == *d
                || (host.len() > d.len()
                    && host.ends_with(d.as_str())
                    && host.as_bytes()[host.len() - d.len() - 1] == b'.')
        })
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.domains.iter()
    }
}

/// Lower-cases and drops surrounding whitespace and a trailing root dot.
fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_subdomain_match() {
        let list = DomainAllowlist::new(["example.com"]);
        assert!(list.is_allowed("example.com"));
        assert!(list.is_allowed("hooks.example.com"));
        assert!(list.is_allowed("Hooks.Example.COM"));
        assert!(!list.is_allowed("evilexample.com"));
        assert!(!list.is_allowed("example.com.evil.net"));
    }

    #[test]
    fn test_wildcard() {
        let list = DomainAllowlist::new(["*"]);
        assert!(list.is_allowed("any-host.io"));
    }

    #[test]
    fn test_empty_denies_everything() {
        let list = DomainAllowlist::default();
        assert!(list.is_empty());
        assert!(!list.is_allowed("example.com"));
    }

    #[test]
    fn test_allow_deduplicates() {
        let mut list = DomainAllowlist::new(["n8n.example.org"]);
        list.allow("N8N.example.org");
        list.allow("api.agentmail.to");
        assert_eq!(list.iter().count(), 2);
        assert!(list.is_allowed("api.agentmail.to"));
    }

    #[test]
    fn test_trailing_dot_entries_match_after_allow() {
        let mut list = DomainAllowlist::default();
        list.allow(" Example.com. ");
        assert!(list.is_allowed("example.com"));
        assert!(list.is_allowed("hooks.example.com."));

        list.allow("example.com");
        assert_eq!(list.iter().count(), 1);
    }
}
