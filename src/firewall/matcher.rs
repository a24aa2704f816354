//! Matching requests against existing provider rules

use super::{AllowRequest, FirewallRule, RuleKind};

/// What to do with a request given the rules the provider currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction<'a> {
    /// A matching rule already covers the request; nothing to change
    AlreadyExists(&'a FirewallRule),
    /// Re-point the matched rule at the request's IP
    Update(&'a FirewallRule),
    /// No rule matched; add one
    Create,
}

/// Find the first rule, in provider order, that matches the request.
///
/// Identity is the remark for updates and the source IP for creates. In both
/// cases the rule must also carry an id, the same protocol (ignoring case),
/// and the same port compared as text.
pub fn find_match<'a>(rules: &'a [FirewallRule], request: &AllowRequest) -> Option<&'a FirewallRule> {
    let port = request.port.to_string();
    let protocol = request.protocol.to_lowercase();

    rules.iter().find(|rule| {
        let identity = match request.kind {
            RuleKind::Update => rule.remark.as_deref() == Some(request.remark.as_str()),
            RuleKind::Create => rule.source_cidr_ip.as_deref() == Some(request.ip.as_str()),
        };

        identity
            && rule.rule_id.is_some()
            && rule
                .protocol
                .as_deref()
                .is_some_and(|p| p.to_lowercase() == protocol)
            && rule.port.as_deref() == Some(port.as_str())
    })
}

/// Decide between no-op, update and create.
///
/// A match is a no-op for creates, and for updates whose rule already points
/// at the request's IP.
pub fn decide<'a>(rules: &'a [FirewallRule], request: &AllowRequest) -> RuleAction<'a> {
    match find_match(rules, request) {
        Some(rule)
            if request.kind == RuleKind::Create
                || rule.source_cidr_ip.as_deref() == Some(request.ip.as_str()) =>
        {
            RuleAction::AlreadyExists(rule)
        }
        Some(rule) => RuleAction::Update(rule),
        None => RuleAction::Create,
    }
}
