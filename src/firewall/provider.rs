//! Firewall rule provider abstraction
//!
//! The allow-list core only talks to the remote firewall through
//! [`FirewallProvider`]. The Alibaba Cloud client implements it for
//! production; tests use an in-memory fake.

/// A firewall rule as reported by the provider. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirewallRule {
    pub rule_id: Option<String>,
    pub remark: Option<String>,
    pub source_cidr_ip: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<String>,
}

/// The rule contents sent on create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub port: String,
    pub remark: String,
    pub protocol: String,
    pub source_cidr_ip: String,
}

/// Upstream failure with the most useful message the provider gave us
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Remote firewall operations needed by the allow-list service
#[async_trait::async_trait]
pub trait FirewallProvider: Send + Sync {
    /// List the rules of an instance, in provider order
    async fn list_rules(
        &self,
        region: &str,
        instance: &str,
        page_size: u32,
    ) -> Result<Vec<FirewallRule>, ProviderError>;

    /// Add a new rule to an instance
    async fn create_rule(
        &self,
        region: &str,
        instance: &str,
        rule: &RuleSpec,
    ) -> Result<(), ProviderError>;

    /// Replace the contents of an existing rule
    async fn update_rule(
        &self,
        rule_id: &str,
        region: &str,
        instance: &str,
        rule: &RuleSpec,
    ) -> Result<(), ProviderError>;

    /// Get the name of this provider for logging
    fn name(&self) -> &'static str;
}
