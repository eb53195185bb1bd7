//! Per-domain answering policy
//!
//! Everything domain-specific lives here as data: fail-safe mode,
//! citation-id format, trailing question, observation fast path, and the
//! keywords the intent classifier matches on. Nodes look the policy up
//! instead of branching on domain names.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

/// How generation behaves when no citations are available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailSafeMode {
    /// Refuse with a fixed template
    Strict,
    /// Answer from general knowledge behind a fixed warning prefix
    Relaxed,
}

/// Answering policy for one domain
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    pub name: String,
    pub fail_safe: FailSafeMode,
    /// Required citation-id format, validated by the guardrail
    pub citation_pattern: Option<Regex>,
    /// Question appended to every generated answer in this domain
    pub trailing_question: Option<String>,
    /// Skip the LLM sufficiency judgment when citations are plentiful
    pub auto_sufficient: bool,
    /// Keywords the intent classifier matches against the query
    pub keywords: Vec<&'static str>,
}

/// Lookup table of domain policies with a default for unknown domains
#[derive(Debug)]
pub struct DomainPolicies {
    policies: HashMap<String, DomainPolicy>,
    default_domain: String,
}

impl DomainPolicies {
    /// Built-in policy set
    pub fn builtin() -> Self {
        let mut policies = HashMap::new();

        policies.insert(
            "it".to_string(),
            DomainPolicy {
                name: "it".to_string(),
                fail_safe: FailSafeMode::Strict,
                citation_pattern: Some(Regex::new(r"^[A-Z]+-[A-Z]+-\d+$").expect("citation pattern")),
                trailing_question: Some(
                    "Is there anything else I can help you with regarding your IT setup?".to_string(),
                ),
                auto_sufficient: false,
                keywords: vec![
                    "vpn", "password", "laptop", "wifi", "email", "login", "account", "printer", "software",
                    "install", "network", "mfa", "2fa",
                ],
            },
        );

        policies.insert(
            "hr".to_string(),
            DomainPolicy {
                name: "hr".to_string(),
                fail_safe: FailSafeMode::Strict,
                citation_pattern: None,
                trailing_question: None,
                auto_sufficient: false,
                keywords: vec![
                    "leave", "vacation", "pto", "benefits", "payroll", "salary", "onboarding", "holiday",
                    "insurance", "parental",
                ],
            },
        );

        policies.insert(
            "finance".to_string(),
            DomainPolicy {
                name: "finance".to_string(),
                fail_safe: FailSafeMode::Strict,
                citation_pattern: None,
                trailing_question: None,
                auto_sufficient: true,
                keywords: vec![
                    "expense", "invoice", "reimbursement", "budget", "receipt", "procurement", "purchase",
                    "corporate card",
                ],
            },
        );

        policies.insert(
            "general".to_string(),
            DomainPolicy {
                name: "general".to_string(),
                fail_safe: FailSafeMode::Relaxed,
                citation_pattern: None,
                trailing_question: None,
                auto_sufficient: false,
                keywords: vec![],
            },
        );

        Self {
            policies,
            default_domain: "general".to_string(),
        }
    }

    /// Policy for a domain, falling back to the default domain
    pub fn policy_for(&self, domain: &str) -> &DomainPolicy {
        debug!(%domain, "DomainPolicies::policy_for: called");
        self.policies
            .get(domain)
            .unwrap_or_else(|| &self.policies[&self.default_domain])
    }

    /// Name of the default domain
    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    /// All known domain names, sorted
    pub fn domains(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Iterate policies in domain-name order
    pub fn iter(&self) -> impl Iterator<Item = &DomainPolicy> {
        let mut entries: Vec<&DomainPolicy> = self.policies.values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.into_iter()
    }
}

impl Default for DomainPolicies {
    fn default() -> Self {
        Self::builtin()
    }
}
