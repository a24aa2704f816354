//! Signed RPC client for the Simple Application Server firewall API

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::models::{
    error_message, ActionResponse, FirewallRuleParam, ListFirewallRulesResponse,
};
use super::signer::{RpcSigner, SIGNATURE_METHOD, SIGNATURE_VERSION};
use crate::config::AliConfig;
use crate::firewall::{FirewallProvider, FirewallRule, ProviderError, RuleSpec};
use crate::metrics;
use crate::secrets::SecretString;
use crate::types::Result;

pub const API_VERSION: &str = "2020-06-01";

const HTTP_METHOD: &str = "POST";

/// Alibaba Cloud SWAS firewall client
#[derive(Clone)]
pub struct SwasClient {
    client: Client,
    base_url: String,
    access_key_id: SecretString,
    signer: Arc<RpcSigner>,
    timeout: Duration,
}

impl SwasClient {
    /// Create a client for the configured endpoint and credentials
    pub fn new(config: &AliConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout);
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            crate::types::Error::Application(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url(&config.endpoint),
            access_key_id: config.key.clone(),
            signer: Arc::new(RpcSigner::new(config.secret.clone())),
            timeout,
        })
    }

    fn common_params(&self, action: &str) -> BTreeMap<String, String> {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        [
            ("Format", "JSON".to_string()),
            ("Version", API_VERSION.to_string()),
            ("AccessKeyId", self.access_key_id.expose().to_string()),
            ("SignatureMethod", SIGNATURE_METHOD.to_string()),
            ("SignatureVersion", SIGNATURE_VERSION.to_string()),
            ("SignatureNonce", uuid::Uuid::new_v4().to_string()),
            ("Timestamp", timestamp),
            ("Action", action.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Sign and send one action, recording its latency under `operation`
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        action: &str,
        params: Vec<(&str, String)>,
    ) -> std::result::Result<T, ProviderError> {
        let started = Instant::now();
        let result = self.send(action, params).await;
        metrics::record_provider_call(operation, result.is_ok(), started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            warn!(action = %action, error = %e, "SWAS API call failed");
        }
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Vec<(&str, String)>,
    ) -> std::result::Result<T, ProviderError> {
        let mut all_params = self.common_params(action);
        for (key, value) in params {
            all_params.insert(key.to_string(), value);
        }

        let query = self.signer.signed_query(HTTP_METHOD, &all_params);
        let url = format!("{}/?{}", self.base_url, query);
        debug!(action = %action, endpoint = %self.base_url, "Calling SWAS API");

        let response = self.client.post(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::new(format!(
                    "{} timed out after {}s",
                    action,
                    self.timeout.as_secs()
                ))
            } else if e.is_connect() {
                ProviderError::new(format!("Failed to connect to {}: {}", self.base_url, e))
            } else {
                ProviderError::new(format!("{} request failed: {}", action, e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to read {} response: {}", action, e)))?;

        if !status.is_success() {
            return Err(ProviderError::new(error_message(status, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::new(format!("Invalid {} response: {}", action, e)))
    }
}

/// Endpoints are bare hosts; an explicit scheme is kept as given
fn base_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

#[async_trait]
impl FirewallProvider for SwasClient {
    async fn list_rules(
        &self,
        region: &str,
        instance: &str,
        page_size: u32,
    ) -> std::result::Result<Vec<FirewallRule>, ProviderError> {
        let response: ListFirewallRulesResponse = self
            .call(
                "list",
                "ListFirewallRules",
                vec![
                    ("RegionId", region.to_string()),
                    ("InstanceId", instance.to_string()),
                    ("PageSize", page_size.to_string()),
                ],
            )
            .await?;

        Ok(response
            .firewall_rules
            .into_iter()
            .map(FirewallRule::from)
            .collect())
    }

    async fn create_rule(
        &self,
        region: &str,
        instance: &str,
        rule: &RuleSpec,
    ) -> std::result::Result<(), ProviderError> {
        let rules = serde_json::to_string(&[FirewallRuleParam::from(rule)])
            .map_err(|e| ProviderError::new(format!("Failed to encode firewall rule: {}", e)))?;

        let response: ActionResponse = self
            .call(
                "create",
                "CreateFirewallRules",
                vec![
                    ("RegionId", region.to_string()),
                    ("InstanceId", instance.to_string()),
                    ("FirewallRules", rules),
                ],
            )
            .await?;

        debug!(request_id = ?response.request_id, "CreateFirewallRules accepted");
        Ok(())
    }

    async fn update_rule(
        &self,
        rule_id: &str,
        region: &str,
        instance: &str,
        rule: &RuleSpec,
    ) -> std::result::Result<(), ProviderError> {
        let response: ActionResponse = self
            .call(
                "update",
                "ModifyFirewallRule",
                vec![
                    ("RegionId", region.to_string()),
                    ("InstanceId", instance.to_string()),
                    ("RuleId", rule_id.to_string()),
                    ("RuleProtocol", rule.protocol.clone()),
                    ("Port", rule.port.clone()),
                    ("SourceCidrIp", rule.source_cidr_ip.clone()),
                    ("Remark", rule.remark.clone()),
                ],
            )
            .await?;

        debug!(request_id = ?response.request_id, "ModifyFirewallRule accepted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "aliyun-swas"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

    #[derive(Clone)]
    struct MockState {
        captured: Captured,
        status: StatusCode,
        body: String,
    }

    async fn mock_api(
        State(state): State<MockState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, String) {
        state.captured.lock().unwrap().push(params);
        (state.status, state.body.clone())
    }

    /// Serve one canned response on a random local port
    async fn spawn_mock(status: StatusCode, body: &str) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            captured: captured.clone(),
            status,
            body: body.to_string(),
        };
        let app = Router::new().route("/", post(mock_api)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), captured)
    }

    fn client_for(endpoint: &str) -> SwasClient {
        let config = AliConfig {
            key: SecretString::new("test-key-id"),
            secret: SecretString::new("test-secret"),
            endpoint: endpoint.to_string(),
            timeout: 5,
            page_size: 100,
        };
        SwasClient::new(&config).unwrap()
    }

    fn spec() -> RuleSpec {
        RuleSpec {
            port: "22".to_string(),
            remark: "home".to_string(),
            protocol: "tcp".to_string(),
            source_cidr_ip: "1.2.3.4".to_string(),
        }
    }

    #[test]
    fn test_base_url() {
        assert_eq!(
            base_url("swas.cn-shanghai.aliyuncs.com"),
            "https://swas.cn-shanghai.aliyuncs.com"
        );
        assert_eq!(base_url("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_common_params() {
        let client = client_for("swas.cn-shanghai.aliyuncs.com");
        let params = client.common_params("ListFirewallRules");

        assert_eq!(params["Format"], "JSON");
        assert_eq!(params["Version"], "2020-06-01");
        assert_eq!(params["AccessKeyId"], "test-key-id");
        assert_eq!(params["SignatureMethod"], "HMAC-SHA1");
        assert_eq!(params["SignatureVersion"], "1.0");
        assert_eq!(params["Action"], "ListFirewallRules");
        assert!(params["Timestamp"].ends_with('Z'));
        assert!(uuid::Uuid::parse_str(&params["SignatureNonce"]).is_ok());

        // Fresh nonce per request
        let again = client.common_params("ListFirewallRules");
        assert_ne!(params["SignatureNonce"], again["SignatureNonce"]);
    }

    #[tokio::test]
    async fn test_list_rules() {
        let (endpoint, captured) = spawn_mock(
            StatusCode::OK,
            r#"{"RequestId":"req","FirewallRules":[
                {"RuleId":"r-1","Remark":"home","Port":"22","SourceCidrIp":"1.2.3.4","RuleProtocol":"TCP"}
            ]}"#,
        )
        .await;

        let rules = client_for(&endpoint)
            .list_rules("cn-shanghai", "i-abc", 100)
            .await
            .unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule_id.as_deref(), Some("r-1"));
        assert_eq!(rules[0].protocol.as_deref(), Some("TCP"));

        let requests = captured.lock().unwrap();
        let params = &requests[0];
        assert_eq!(params["Action"], "ListFirewallRules");
        assert_eq!(params["RegionId"], "cn-shanghai");
        assert_eq!(params["InstanceId"], "i-abc");
        assert_eq!(params["PageSize"], "100");
    }

    #[tokio::test]
    async fn test_request_signature_verifies() {
        let (endpoint, captured) = spawn_mock(StatusCode::OK, r#"{"FirewallRules":[]}"#).await;

        client_for(&endpoint)
            .list_rules("cn-shanghai", "i-abc", 10)
            .await
            .unwrap();

        let mut params: BTreeMap<String, String> = captured.lock().unwrap()[0]
            .clone()
            .into_iter()
            .collect();
        let signature = params.remove("Signature").unwrap();

        let signer = RpcSigner::new(SecretString::new("test-secret"));
        assert_eq!(signer.sign("POST", &params), signature);
    }

    #[tokio::test]
    async fn test_create_rule_sends_rule_array() {
        let (endpoint, captured) = spawn_mock(StatusCode::OK, r#"{"RequestId":"req"}"#).await;

        client_for(&endpoint)
            .create_rule("cn-shanghai", "i-abc", &spec())
            .await
            .unwrap();

        let requests = captured.lock().unwrap();
        let params = &requests[0];
        assert_eq!(params["Action"], "CreateFirewallRules");
        assert_eq!(
            params["FirewallRules"],
            r#"[{"RuleProtocol":"tcp","Port":"22","SourceCidrIp":"1.2.3.4","Remark":"home"}]"#
        );
    }

    #[tokio::test]
    async fn test_update_rule_sends_rule_fields() {
        let (endpoint, captured) = spawn_mock(StatusCode::OK, r#"{"RequestId":"req"}"#).await;

        client_for(&endpoint)
            .update_rule("r-9", "cn-shanghai", "i-abc", &spec())
            .await
            .unwrap();

        let requests = captured.lock().unwrap();
        let params = &requests[0];
        assert_eq!(params["Action"], "ModifyFirewallRule");
        assert_eq!(params["RuleId"], "r-9");
        assert_eq!(params["RuleProtocol"], "tcp");
        assert_eq!(params["Port"], "22");
        assert_eq!(params["SourceCidrIp"], "1.2.3.4");
        assert_eq!(params["Remark"], "home");
    }

    #[tokio::test]
    async fn test_error_response_uses_recommend() {
        let (endpoint, _) = spawn_mock(
            StatusCode::NOT_FOUND,
            r#"{"Code":"InvalidInstanceId.NotFound","Message":"not found","Recommend":"check the instance id"}"#,
        )
        .await;

        let err = client_for(&endpoint)
            .list_rules("cn-shanghai", "i-missing", 100)
            .await
            .unwrap_err();

        assert_eq!(err.message, "check the instance id");
    }

    #[tokio::test]
    async fn test_error_response_raw_text() {
        let (endpoint, _) = spawn_mock(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;

        let err = client_for(&endpoint)
            .create_rule("cn-shanghai", "i-abc", &spec())
            .await
            .unwrap_err();

        assert_eq!(err.message, "HTTP 500: boom");
    }

    #[tokio::test]
    async fn test_connection_failure() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{}", addr))
            .list_rules("cn-shanghai", "i-abc", 100)
            .await
            .unwrap_err();

        assert!(!err.message.is_empty());
    }
}
