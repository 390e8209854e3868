//! Usage log records and aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One logged API call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub token: String,
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub metadata: Option<UsageMetadata>,
}

impl UsageRecord {
    pub fn new(token: &str, endpoint: &str, method: &str, status_code: u16) -> Self {
        Self {
            token: token.to_string(),
            endpoint: endpoint.to_string(),
            timestamp: Utc::now(),
            method: method.to_string(),
            status_code: Some(status_code),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: UsageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Upload details attached to moderation usage records
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_safe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated view over the usage log
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_requests: u64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
    /// Keyed by UTC date, `YYYY-MM-DD`
    pub requests_by_day: BTreeMap<String, u64>,
    /// Top tokens by request count
    pub most_active_tokens: BTreeMap<String, u64>,
}

pub const MOST_ACTIVE_TOKEN_LIMIT: usize = 10;

impl UsageStats {
    /// Aggregate a sequence of usage records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Self {
        let mut stats = UsageStats::default();
        let mut by_token: BTreeMap<String, u64> = BTreeMap::new();

        for record in records {
            stats.total_requests += 1;
            *stats
                .requests_by_endpoint
                .entry(record.endpoint.clone())
                .or_default() += 1;
            *stats
                .requests_by_day
                .entry(record.timestamp.format("%Y-%m-%d").to_string())
                .or_default() += 1;
            *by_token.entry(record.token.clone()).or_default() += 1;
        }

        let mut ranked: Vec<(String, u64)> = by_token.into_iter().collect();
        // Highest count first; ties resolved by token for stable output
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stats.most_active_tokens = ranked.into_iter().take(MOST_ACTIVE_TOKEN_LIMIT).collect();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(token: &str, endpoint: &str, day: u32) -> UsageRecord {
        let mut r = UsageRecord::new(token, endpoint, "POST", 200);
        r.timestamp = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        r
    }

    #[test]
    fn test_stats_aggregation() {
        let records = vec![
            record("a", "/moderate", 1),
            record("a", "/moderate", 1),
            record("b", "/moderate", 2),
            record("b", "/other", 2),
            record("a", "/moderate", 2),
        ];
        let stats = UsageStats::from_records(&records);

        assert_eq!(stats.total_requests, 5);
        assert_eq!(stats.requests_by_endpoint["/moderate"], 4);
        assert_eq!(stats.requests_by_endpoint["/other"], 1);
        assert_eq!(stats.requests_by_day["2024-03-01"], 2);
        assert_eq!(stats.requests_by_day["2024-03-02"], 3);
        assert_eq!(stats.most_active_tokens["a"], 3);
        assert_eq!(stats.most_active_tokens["b"], 2);
    }

    #[test]
    fn test_most_active_tokens_is_capped() {
        let records: Vec<UsageRecord> = (0..15)
            .flat_map(|i| {
                // token i appears i + 1 times
                (0..=i).map(move |_| record(&format!("t{i:02}"), "/moderate", 1))
            })
            .collect();
        let stats = UsageStats::from_records(&records);

        assert_eq!(stats.most_active_tokens.len(), MOST_ACTIVE_TOKEN_LIMIT);
        assert!(stats.most_active_tokens.contains_key("t14"));
        assert!(!stats.most_active_tokens.contains_key("t00"));
    }

    #[test]
    fn test_metadata_omits_empty_fields() {
        let json = serde_json::to_value(UsageMetadata {
            filename: Some("cat.png".to_string()),
            ..UsageMetadata::default()
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"filename": "cat.png"}));
    }
}
