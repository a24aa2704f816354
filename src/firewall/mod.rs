//! Firewall allow-list core
//!
//! This module holds the decision logic that sits between the HTTP front end
//! and the cloud provider:
//! - IP classification (public vs. private/loopback/link-local/CGNAT)
//! - Matching a validated request against the provider's existing rules
//! - The provider abstraction and the service that drives it
//!
//! Nothing in here knows about HTTP or about a specific vendor API.

pub mod classifier;
pub mod matcher;
pub mod provider;
pub mod service;

pub use classifier::is_public;
pub use matcher::{decide, RuleAction};
pub use provider::{FirewallProvider, FirewallRule, ProviderError, RuleSpec};
pub use service::{AllowOutcome, FirewallService};

/// Kind of allow-list operation requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Add a rule for the request's IP unless one already exists
    Create,
    /// Re-point the rule identified by the request's remark at the request's IP
    Update,
}

impl RuleKind {
    /// Map the wire `type` field. Only `"update"` selects [`RuleKind::Update`].
    pub fn from_wire(value: &str) -> Self {
        if value == "update" {
            RuleKind::Update
        } else {
            RuleKind::Create
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Create => "create",
            RuleKind::Update => "update",
        }
    }
}

/// A validated, normalized allow-list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowRequest {
    /// Canonical textual form of a public IP address
    pub ip: String,
    pub port: u16,
    pub protocol: String,
    pub kind: RuleKind,
    pub region: String,
    pub instance: String,
    pub remark: String,
}

impl AllowRequest {
    /// The rule the provider should end up holding for this request
    pub fn rule_spec(&self) -> RuleSpec {
        RuleSpec {
            port: self.port.to_string(),
            remark: self.remark.clone(),
            protocol: self.protocol.clone(),
            source_cidr_ip: self.ip.clone(),
        }
    }
}
