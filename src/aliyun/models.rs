//! Wire shapes of the Simple Application Server API

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::firewall::{FirewallRule, RuleSpec};

/// `ListFirewallRules` response body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListFirewallRulesResponse {
    #[serde(default)]
    pub firewall_rules: Vec<SwasFirewallRule>,
}

/// Body of `CreateFirewallRules` and `ModifyFirewallRule`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionResponse {
    #[serde(default)]
    pub request_id: Option<String>,
}

/// One rule as reported by the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SwasFirewallRule {
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub source_cidr_ip: Option<String>,
    #[serde(default)]
    pub rule_protocol: Option<String>,
}

impl From<SwasFirewallRule> for FirewallRule {
    fn from(rule: SwasFirewallRule) -> Self {
        FirewallRule {
            rule_id: rule.rule_id,
            remark: rule.remark,
            source_cidr_ip: rule.source_cidr_ip,
            protocol: rule.rule_protocol,
            port: rule.port,
        }
    }
}

/// Element of the JSON array passed as the `FirewallRules` parameter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FirewallRuleParam<'a> {
    pub rule_protocol: &'a str,
    pub port: &'a str,
    pub source_cidr_ip: &'a str,
    pub remark: &'a str,
}

impl<'a> From<&'a RuleSpec> for FirewallRuleParam<'a> {
    fn from(spec: &'a RuleSpec) -> Self {
        Self {
            rule_protocol: &spec.protocol,
            port: &spec.port,
            source_cidr_ip: &spec.source_cidr_ip,
            remark: &spec.remark,
        }
    }
}

/// Best diagnostic for a failed call: `Recommend`, then `Message`, then the raw body
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) {
        for key in ["Recommend", "Message"] {
            if let Some(serde_json::Value::String(text)) = fields.get(key) {
                if !text.is_empty() {
                    return text.clone();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    } else {
        format!("HTTP {}: {}", status.as_u16(), body)
    }
}
