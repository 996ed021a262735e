//! On-chain health and liquidity from the Doma name record.

use super::{validated, Analyst};
use crate::error::TaskError;
use crate::llm::structured::structured;
use crate::llm::ChatModel;
use crate::models::{AnalystKind, Findings, OnChainReport, Subject};
use crate::sources::doma::NameRecord;
use crate::sources::OnChainSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

const SYSTEM_PROMPT: &str = "You are an analyst specializing in on-chain digital assets. You \
interpret blockchain data to uncover signals of value, liquidity and risk.

Principles:
1. History as proof of confidence: a long on-chain history (>365 days) and consistent renewals \
signal holder conviction. A claimed name is the minimum bar for a legitimate asset.
2. Velocity as a proxy for liquidity: transfers are a transparent record of demand. Many \
transfers and recent activity indicate liquidity.
3. Cross-chain presence signals a sophisticated owner and broader market exposure.";

const SHAPE: &str = r#"{
  "on_chain_health_score": 7,
  "on_chain_health_reasoning": "...",
  "liquidity_score": 5,
  "liquidity_reasoning": "..."
}"#;

/// Pre-computed facts about a name record.
#[derive(Debug, Clone, PartialEq)]
pub struct OnChainSummary {
    pub name: String,
    pub age_days: i64,
    pub claimed: bool,
    pub transfer_locked: bool,
    pub transfers: usize,
    pub renewals: usize,
    pub days_since_last_activity: i64,
    /// Negative once the registration has lapsed.
    pub days_until_expiry: Option<i64>,
    pub chains: Vec<String>,
}

impl OnChainSummary {
    pub fn from_record(record: &NameRecord, now: DateTime<Utc>) -> Self {
        let age_days = record
            .tokenized_at
            .map(|t| (now - t).num_days())
            .unwrap_or(0);

        let last_activity = record
            .transfers()
            .chain(record.renewals())
            .filter_map(|a| a.created_at)
            .max();

        let chains: BTreeSet<String> = record
            .tokens()
            .iter()
            .filter_map(|t| t.network_id.clone())
            .collect();

        Self {
            name: record.name.clone(),
            age_days,
            claimed: record.claimed_by.is_some(),
            transfer_locked: record.transfer_lock.unwrap_or(false),
            transfers: record.transfers().count(),
            renewals: record.renewals().count(),
            days_since_last_activity: last_activity
                .map(|t| (now - t).num_days())
                .unwrap_or(age_days),
            days_until_expiry: record.expires_at.map(|t| (t - now).num_days()),
            chains: chains.into_iter().collect(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Analysis for domain: {}\n\
             - On-Chain Age: {} days\n\
             - Claim Status: {}\n\
             - Transfer Lock Status: {}\n\
             - Total On-Chain Transfers: {}\n\
             - Total On-Chain Renewals: {}\n\
             - Days Since Last On-Chain Activity: {}\n\
             - Days Until Expiry: {}\n\
             - Chain Presence: [{}]",
            self.name,
            self.age_days,
            if self.claimed { "Claimed" } else { "Unclaimed" },
            if self.transfer_locked { "Locked" } else { "Unlocked" },
            self.transfers,
            self.renewals,
            self.days_since_last_activity,
            self.days_until_expiry
                .map(|d| d.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            self.chains.join(", "),
        )
    }
}

pub struct OnChainAnalyst {
    source: Arc<dyn OnChainSource>,
    model: Arc<dyn ChatModel>,
}

impl OnChainAnalyst {
    pub fn new(source: Arc<dyn OnChainSource>, model: Arc<dyn ChatModel>) -> Self {
        Self { source, model }
    }
}

#[async_trait]
impl Analyst for OnChainAnalyst {
    fn kind(&self) -> AnalystKind {
        AnalystKind::OnChain
    }

    async fn analyze(&self, subject: &Subject) -> Result<Option<Findings>, TaskError> {
        let Some(record) = self.source.name_record(subject.id()).await? else {
            info!("No on-chain data for {}", subject);
            return Ok(None);
        };

        let summary = OnChainSummary::from_record(&record, Utc::now());
        let prompt = format!(
            "Based on your principles and the following live data summary, score the domain.\n\n\
             Data Summary:\n{}\n\n\
             Provide on_chain_health_score and liquidity_score (1-10) with reasoning for each.",
            summary.render()
        );

        let report: OnChainReport =
            structured(self.model.as_ref(), SYSTEM_PROMPT, &prompt, SHAPE).await?;
        validated(Findings::OnChain(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use crate::sources::testing::StubOnChain;
    use chrono::TimeZone;
    use serde_json::json;

    fn record() -> NameRecord {
        serde_json::from_value(json!({
            "name": "crypto.ai",
            "tokenizedAt": "2024-01-01T00:00:00Z",
            "expiresAt": "2026-01-01T00:00:00Z",
            "transferLock": true,
            "claimedBy": "0xabc",
            "activities": [
                { "__typename": "NameRenewedActivity", "createdAt": "2024-12-01T00:00:00Z" },
                { "__typename": "NameClaimedActivity", "createdAt": "2025-02-01T00:00:00Z" }
            ],
            "tokens": [
                { "networkId": "eip155:8453", "activities": [
                    { "__typename": "TokenTransferredActivity", "createdAt": "2024-06-01T00:00:00Z" },
                    { "__typename": "TokenTransferredActivity", "createdAt": "2024-07-01T00:00:00Z" }
                ]},
                { "networkId": "eip155:1" },
                { "networkId": "eip155:8453" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_from_record() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let summary = OnChainSummary::from_record(&record(), now);

        assert_eq!(summary.age_days, 366);
        assert!(summary.claimed);
        assert!(summary.transfer_locked);
        assert_eq!(summary.transfers, 2);
        assert_eq!(summary.renewals, 1);
        assert_eq!(summary.days_since_last_activity, 31);
        assert_eq!(summary.days_until_expiry, Some(365));
        assert_eq!(summary.chains, vec!["eip155:1", "eip155:8453"]);

        let text = summary.render();
        assert!(text.contains("Claim Status: Claimed"));
        assert!(text.contains("Transfer Lock Status: Locked"));
        assert!(text.contains("Days Until Expiry: 365"));
        assert!(text.contains("Chain Presence: [eip155:1, eip155:8453]"));
    }

    #[test]
    fn test_summary_without_activity_uses_age() {
        let record: NameRecord = serde_json::from_value(json!({
            "name": "quiet.io",
            "tokenizedAt": "2024-12-22T00:00:00Z"
        }))
        .unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let summary = OnChainSummary::from_record(&record, now);

        assert_eq!(summary.age_days, 10);
        assert_eq!(summary.days_since_last_activity, 10);
        assert!(!summary.claimed);
        assert_eq!(summary.days_until_expiry, None);
        assert!(summary.chains.is_empty());
        assert!(summary.render().contains("Days Until Expiry: Unknown"));
    }

    #[tokio::test]
    async fn test_analyze() {
        let model = Arc::new(ScriptedModel::replying(
            r#"{"on_chain_health_score": 8, "on_chain_health_reasoning": "Old and renewed",
                "liquidity_score": 6, "liquidity_reasoning": "Two transfers"}"#,
        ));
        let analyst = OnChainAnalyst::new(Arc::new(StubOnChain::with_record(record())), model.clone());

        let findings = analyst
            .analyze(&Subject::parse("crypto.ai").unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(findings.score("on_chain_health_score"), Some(8.0));
        assert!(model.prompts()[0].1.contains("Total On-Chain Transfers: 2"));
    }

    #[tokio::test]
    async fn test_missing_record_is_no_data() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let analyst = OnChainAnalyst::new(Arc::new(StubOnChain::empty()), model.clone());

        let result = analyst.analyze(&Subject::parse("nothing.ai").unwrap()).await;
        assert!(matches!(result, Ok(None)));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let analyst = OnChainAnalyst::new(
            Arc::new(StubOnChain::failing()),
            Arc::new(ScriptedModel::new(vec![])),
        );

        let result = analyst.analyze(&Subject::parse("crypto.ai").unwrap()).await;
        assert!(matches!(result, Err(TaskError::Source { .. })));
    }
}
