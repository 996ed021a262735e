//! Doma protocol data: the GraphQL name record and the event poll feed.

use crate::config::SourcesConfig;
use crate::error::TaskError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const SOURCE: &str = "doma";

const NAME_QUERY: &str = r#"
query GetDomainDeepDive($name: String!) {
  name(name: $name) {
    name
    expiresAt
    tokenizedAt
    transferLock
    claimedBy
    registrar { name ianaId }
    activities {
      __typename
      ... on NameRenewedActivity { createdAt expiresAt }
      ... on NameClaimedActivity { createdAt }
    }
    tokens {
      tokenId
      networkId
      ownerAddress
      type
      activities {
        __typename
        ... on TokenTransferredActivity { createdAt transferredFrom transferredTo }
        ... on TokenPurchasedActivity { createdAt seller buyer payment { price currencySymbol } }
      }
    }
  }
}
"#;

/// An activity on a name or one of its tokens.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "__typename")]
    pub typename: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn is_transfer(&self) -> bool {
        self.typename == "TokenTransferredActivity"
    }

    pub fn is_renewal(&self) -> bool {
        self.typename == "NameRenewedActivity"
    }
}

/// A tokenized instance of a name on one chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameToken {
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
}

/// The on-chain record of a domain name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameRecord {
    pub name: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tokenized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transfer_lock: Option<bool>,
    #[serde(default)]
    pub claimed_by: Option<String>,
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
    #[serde(default)]
    pub tokens: Option<Vec<NameToken>>,
}

impl NameRecord {
    pub fn tokens(&self) -> &[NameToken] {
        self.tokens.as_deref().unwrap_or_default()
    }

    /// Transfer activities across all tokens.
    pub fn transfers(&self) -> impl Iterator<Item = &Activity> {
        self.tokens()
            .iter()
            .flat_map(|t| t.activities.as_deref().unwrap_or_default())
            .filter(|a| a.is_transfer())
    }

    /// Renewal activities on the name.
    pub fn renewals(&self) -> impl Iterator<Item = &Activity> {
        self.activities
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|a| a.is_renewal())
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<NameData>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct NameData {
    #[serde(default)]
    name: Option<NameRecord>,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(default)]
    events: Vec<Value>,
}

/// Source of on-chain name data.
#[async_trait]
pub trait OnChainSource: Send + Sync {
    /// The name record, or `None` if Doma has no record of it.
    async fn name_record(&self, domain: &str) -> Result<Option<NameRecord>, TaskError>;

    /// The most recent protocol events, newest first.
    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, TaskError>;
}

/// HTTP client for the Doma API.
pub struct DomaClient {
    graphql_url: String,
    poll_url: String,
    api_key_env: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl DomaClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, TaskError> {
        let api_key = std::env::var(&config.doma_api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &SourcesConfig, api_key: Option<String>) -> Result<Self, TaskError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TaskError::source(SOURCE, e.to_string()))?;

        Ok(Self {
            graphql_url: config.doma_graphql_url.clone(),
            poll_url: config.doma_poll_url.clone(),
            api_key_env: config.doma_api_key_env.clone(),
            api_key,
            http_client,
        })
    }

    fn api_key(&self) -> Result<&str, TaskError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| TaskError::MissingCredentials(self.api_key_env.clone()))
    }
}

fn http_error(e: reqwest::Error) -> TaskError {
    TaskError::source(SOURCE, e.to_string())
}

#[async_trait]
impl OnChainSource for DomaClient {
    async fn name_record(&self, domain: &str) -> Result<Option<NameRecord>, TaskError> {
        info!("Querying Doma for {}", domain);
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .post(&self.graphql_url)
            .header("Api-Key", api_key)
            .json(&json!({ "query": NAME_QUERY, "variables": { "name": domain } }))
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;

        let body: GraphQlResponse = response.json().await.map_err(http_error)?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            warn!("Doma returned {} GraphQL error(s) for {}", errors.len(), domain);
            debug!("GraphQL errors: {:?}", errors);
            return Ok(None);
        }

        let record = body.data.and_then(|d| d.name);
        if record.is_none() {
            info!("No on-chain record for {}", domain);
        }
        Ok(record)
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, TaskError> {
        info!("Fetching last {} Doma events", limit);
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(&self.poll_url)
            .header("Api-Key", api_key)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;

        let body: PollResponse = response.json().await.map_err(http_error)?;
        debug!("Fetched {} events", body.events.len());
        Ok(body.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn config(server: &Server) -> SourcesConfig {
        SourcesConfig {
            doma_graphql_url: format!("{}/graphql", server.url()),
            doma_poll_url: format!("{}/v1/poll", server.url()),
            timeout_seconds: 5,
            ..SourcesConfig::default()
        }
    }

    #[tokio::test]
    async fn test_name_record() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("api-key", "doma-key")
            .match_body(Matcher::PartialJson(json!({ "variables": { "name": "crypto.ai" } })))
            .with_status(200)
            .with_body(
                json!({
                    "data": { "name": {
                        "name": "crypto.ai",
                        "tokenizedAt": "2024-01-01T00:00:00Z",
                        "transferLock": false,
                        "claimedBy": "0xabc",
                        "activities": [
                            { "__typename": "NameRenewedActivity", "createdAt": "2024-06-01T00:00:00Z" },
                            { "__typename": "NameClaimedActivity", "createdAt": "2024-01-02T00:00:00Z" }
                        ],
                        "tokens": [
                            { "networkId": "eip155:1", "activities": [
                                { "__typename": "TokenTransferredActivity", "createdAt": "2024-03-01T00:00:00Z" },
                                { "__typename": "TokenPurchasedActivity", "createdAt": "2024-03-01T00:00:00Z" }
                            ]},
                            { "networkId": "eip155:8453", "activities": null }
                        ]
                    }}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = DomaClient::with_api_key(&config(&server), Some("doma-key".to_string())).unwrap();
        let record = client.name_record("crypto.ai").await.unwrap().unwrap();

        assert_eq!(record.name, "crypto.ai");
        assert_eq!(record.transfers().count(), 1);
        assert_eq!(record.renewals().count(), 1);
        assert_eq!(record.tokens().len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_errors_mean_no_record() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(json!({ "data": null, "errors": [{ "message": "Name not found" }] }).to_string())
            .create_async()
            .await;

        let client = DomaClient::with_api_key(&config(&server), Some("k".to_string())).unwrap();
        assert!(client.name_record("nothing.ai").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_http_failure_is_source_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/poll")
            .match_query(Matcher::UrlEncoded("limit".into(), "1000".into()))
            .with_status(502)
            .create_async()
            .await;

        let client = DomaClient::with_api_key(&config(&server), Some("k".to_string())).unwrap();
        let err = client.recent_events(1000).await.unwrap_err();
        assert!(matches!(err, TaskError::Source { source_name: "doma", .. }));
    }

    #[tokio::test]
    async fn test_recent_events() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/poll")
            .match_query(Matcher::UrlEncoded("limit".into(), "2".into()))
            .with_status(200)
            .with_body(
                json!({ "events": [
                    { "type": "NAME_TOKEN_SOLD", "name": "a.ai" },
                    { "type": "NAME_TOKEN_LISTED", "name": "b.com" }
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let client = DomaClient::with_api_key(&config(&server), Some("k".to_string())).unwrap();
        let events = client.recent_events(2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["type"], "NAME_TOKEN_SOLD");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = DomaClient::with_api_key(&SourcesConfig::default(), None).unwrap();
        let err = client.name_record("crypto.ai").await.unwrap_err();
        assert!(matches!(err, TaskError::MissingCredentials(ref var) if var == "DOMA_API_KEY"));
    }
}
