//! Allow-list service: fetch current rules, decide, mutate

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{decide, AllowRequest, FirewallProvider, ProviderError, RuleAction};

/// Result of applying an allow-list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowOutcome {
    /// A matching rule already exists; nothing was changed
    AlreadyExists { rule_id: String },
    /// The rule identified by the request's remark now points at its IP
    Updated { rule_id: String },
    /// A new rule was added
    Created,
}

impl AllowOutcome {
    /// Plain-text body returned to the client
    pub fn message(&self) -> &'static str {
        match self {
            AllowOutcome::AlreadyExists { .. } => "Rule already exists",
            AllowOutcome::Updated { .. } => "Rule updated",
            AllowOutcome::Created => "Rule added",
        }
    }

    /// Metrics label
    pub fn label(&self) -> &'static str {
        match self {
            AllowOutcome::AlreadyExists { .. } => "exists",
            AllowOutcome::Updated { .. } => "updated",
            AllowOutcome::Created => "created",
        }
    }
}

/// Drives a [`FirewallProvider`] for validated requests
#[derive(Clone)]
pub struct FirewallService {
    provider: Arc<dyn FirewallProvider>,
    page_size: u32,
}

impl FirewallService {
    pub fn new(provider: Arc<dyn FirewallProvider>, page_size: u32) -> Self {
        Self {
            provider,
            page_size,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Apply one request. Rules are listed fresh on every call.
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn allow(&self, request: &AllowRequest) -> Result<AllowOutcome, ProviderError> {
        let rules = self
            .provider
            .list_rules(&request.region, &request.instance, self.page_size)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list firewall rules");
                e
            })?;

        debug!(rule_count = rules.len(), "Fetched firewall rules");

        match decide(&rules, request) {
            RuleAction::AlreadyExists(rule) => {
                let rule_id = rule.rule_id.clone().unwrap_or_default();
                info!(rule_id = %rule_id, ip = %request.ip, "Matching rule already exists");
                Ok(AllowOutcome::AlreadyExists { rule_id })
            }
            RuleAction::Update(rule) => {
                let rule_id = rule.rule_id.clone().unwrap_or_default();
                self.provider
                    .update_rule(
                        &rule_id,
                        &request.region,
                        &request.instance,
                        &request.rule_spec(),
                    )
                    .await?;
                info!(
                    rule_id = %rule_id,
                    previous_ip = rule.source_cidr_ip.as_deref().unwrap_or(""),
                    ip = %request.ip,
                    "Firewall rule updated"
                );
                Ok(AllowOutcome::Updated { rule_id })
            }
            RuleAction::Create => {
                self.provider
                    .create_rule(&request.region, &request.instance, &request.rule_spec())
                    .await?;
                info!(ip = %request.ip, port = request.port, "Firewall rule created");
                Ok(AllowOutcome::Created)
            }
        }
    }
}
