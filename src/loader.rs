//! Retrieval and validation of the companies list and dashboard payloads.
//!
//! Resources follow the layout written by the static data generator:
//! `companies.json`, `company_<id>.json`, and `dashboard_data.json` for the
//! default company. Each call performs one retrieval per attempt; retries only
//! happen when a [`RetryPolicy`] allows them and the failure is retryable.

use crate::errors::LoadError;
use crate::models::{Company, DashboardPayload};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::{collections::HashSet, future::Future, time::Duration};
use tracing::{debug, warn};

pub const COMPANIES_RESOURCE: &str = "companies.json";
pub const DEFAULT_DASHBOARD_RESOURCE: &str = "dashboard_data.json";

pub fn dashboard_resource(company_id: Option<i64>) -> String {
    match company_id {
        Some(id) => format!("company_{id}.json"),
        None => DEFAULT_DASHBOARD_RESOURCE.to_string(),
    }
}

/// Where the controller gets its data from.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn load_companies(&self) -> Result<Vec<Company>, LoadError>;

    async fn load_dashboard(&self, company_id: Option<i64>) -> Result<DashboardPayload, LoadError>;
}

#[async_trait]
impl<T: DashboardSource + ?Sized> DashboardSource for Box<T> {
    async fn load_companies(&self) -> Result<Vec<Company>, LoadError> {
        (**self).load_companies().await
    }

    async fn load_dashboard(&self, company_id: Option<i64>) -> Result<DashboardPayload, LoadError> {
        (**self).load_dashboard(company_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, resource: &str, mut attempt: F) -> Result<T, LoadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    warn!("retrying {resource} ({retries}/{}): {err}", self.max_retries);
                    tokio::time::sleep(self.backoff * retries).await;
                }
                result => return result,
            }
        }
    }
}

pub struct HttpSource {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl HttpSource {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, LoadError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LoadError::Transport {
                resource: base_url.clone(),
                message: err.to_string(),
            })?;

        Ok(Self {
            base_url,
            client,
            retry,
        })
    }

    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, LoadError> {
        let url = format!("{}/{resource}", self.base_url);
        let url = url.as_str();
        self.retry
            .run(resource, move || async move {
                debug!("GET {url}");
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|err| transport_error(resource, err))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Fetch {
                        resource: resource.to_string(),
                        status: status.as_u16(),
                    });
                }

                let body = response
                    .bytes()
                    .await
                    .map_err(|err| transport_error(resource, err))?;
                Ok(body.to_vec())
            })
            .await
    }
}

fn transport_error(resource: &str, err: reqwest::Error) -> LoadError {
    if err.is_timeout() {
        LoadError::Timeout {
            resource: resource.to_string(),
        }
    } else {
        LoadError::Transport {
            resource: resource.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl DashboardSource for HttpSource {
    async fn load_companies(&self) -> Result<Vec<Company>, LoadError> {
        let body = self.fetch(COMPANIES_RESOURCE).await?;
        parse_companies(COMPANIES_RESOURCE, &body)
    }

    async fn load_dashboard(&self, company_id: Option<i64>) -> Result<DashboardPayload, LoadError> {
        let resource = dashboard_resource(company_id);
        let body = self.fetch(&resource).await?;
        parse_dashboard(&resource, &body)
    }
}

pub fn parse_companies(resource: &str, body: &[u8]) -> Result<Vec<Company>, LoadError> {
    let companies: Vec<Company> = serde_json::from_slice(body)
        .map_err(|err| LoadError::validation(resource, err.to_string()))?;

    let mut seen = HashSet::with_capacity(companies.len());
    for company in &companies {
        if !seen.insert(company.id) {
            return Err(LoadError::validation(
                resource,
                format!("duplicate company id {}", company.id),
            ));
        }
    }
    Ok(companies)
}

pub fn parse_dashboard(resource: &str, body: &[u8]) -> Result<DashboardPayload, LoadError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| LoadError::validation(resource, err.to_string()))?;

    let Some(object) = value.as_object() else {
        return Err(LoadError::validation(resource, "expected a JSON object"));
    };
    for field in ["stats", "timeline", "mentions"] {
        if object.get(field).is_none_or(Value::is_null) {
            return Err(LoadError::validation(resource, format!("missing field `{field}`")));
        }
    }

    let payload: DashboardPayload = serde_json::from_value(value)
        .map_err(|err| LoadError::validation(resource, err.to_string()))?;
    validate_payload(&payload).map_err(|reason| LoadError::validation(resource, reason))?;
    Ok(payload)
}

fn validate_payload(payload: &DashboardPayload) -> Result<(), String> {
    let stats = &payload.stats;
    let counted = stats
        .positive
        .checked_add(stats.neutral)
        .and_then(|sum| sum.checked_add(stats.negative))
        .ok_or_else(|| "sentiment counts overflow".to_string())?;
    if counted != stats.total {
        return Err(format!(
            "sentiment counts sum to {counted} but TOTAL is {}",
            stats.total
        ));
    }
    check_score("AVG_SCORE", stats.avg_score)?;

    for (index, point) in payload.timeline.iter().enumerate() {
        check_score(&format!("timeline[{index}].score"), point.score)?;
    }
    for (index, mention) in payload.mentions.iter().enumerate() {
        check_score(&format!("mentions[{index}].sentiment_score"), mention.sentiment_score)?;
    }
    Ok(())
}

fn check_score(field: &str, score: f64) -> Result<(), String> {
    if score.is_finite() && (-1.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(format!("{field} must be within [-1, 1], got {score}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const VALID: &str = r#"{
        "company": {"id": 1, "name": "Acme Corp", "aliases": ["Acme"]},
        "stats": {"TOTAL": 3, "AVG_SCORE": 0.2, "POSITIVE": 1, "NEUTRAL": 1, "NEGATIVE": 1},
        "timeline": [
            {"date": "2024-01-01", "score": 0.6, "sentiment": "POSITIVE"},
            {"date": "2024-01-02", "score": 0.0, "sentiment": "NEUTRAL"}
        ],
        "mentions": []
    }"#;

    #[test]
    fn resource_names_follow_generator_layout() {
        assert_eq!(dashboard_resource(Some(7)), "company_7.json");
        assert_eq!(dashboard_resource(None), "dashboard_data.json");
    }

    #[test]
    fn valid_payload_parses() {
        let payload = parse_dashboard("company_1.json", VALID.as_bytes()).unwrap();
        assert_eq!(payload.company.unwrap().name, "Acme Corp");
        assert_eq!(payload.timeline.len(), 2);
    }

    #[test]
    fn missing_sections_are_validation_errors() {
        for field in ["stats", "timeline", "mentions"] {
            let mut value: Value = serde_json::from_str(VALID).unwrap();
            value.as_object_mut().unwrap().remove(field);
            let body = serde_json::to_vec(&value).unwrap();

            let err = parse_dashboard("company_1.json", &body).unwrap_err();
            assert_eq!(
                err,
                LoadError::validation("company_1.json", format!("missing field `{field}`"))
            );
        }
    }

    #[test]
    fn inconsistent_counts_are_rejected() {
        let body = VALID.replace("\"TOTAL\": 3", "\"TOTAL\": 5");
        let err = parse_dashboard("company_1.json", body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("sum to 3 but TOTAL is 5"), "{err}");
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let body = VALID
            .replace("\"POSITIVE\": 1", "\"POSITIVE\": 18446744073709551615")
            .replace("\"NEUTRAL\": 1", "\"NEUTRAL\": 2");
        let err = parse_dashboard("company_1.json", body.as_bytes()).unwrap_err();
        assert_eq!(err, LoadError::validation("company_1.json", "sentiment counts overflow"));
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let body = VALID.replace("\"score\": 0.6", "\"score\": 1.6");
        let err = parse_dashboard("company_1.json", body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("timeline[0].score"), "{err}");
    }

    #[test]
    fn unknown_sentiment_is_rejected() {
        let body = VALID.replace("\"NEUTRAL\"}", "\"MIXED\"}");
        assert!(parse_dashboard("company_1.json", body.as_bytes()).is_err());
    }

    #[test]
    fn companies_reject_duplicates_and_default_aliases() {
        let companies = parse_companies(
            COMPANIES_RESOURCE,
            br#"[{"id": 2, "name": "Globex"}, {"id": 1, "name": "Acme", "aliases": ["ACME Inc"]}]"#,
        )
        .unwrap();
        assert!(companies[0].aliases.is_empty());

        let err = parse_companies(
            COMPANIES_RESOURCE,
            br#"[{"id": 2, "name": "Globex"}, {"id": 2, "name": "Globex again"}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate company id 2"));
    }

    #[tokio::test]
    async fn retry_policy_only_repeats_retryable_failures() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(1),
        };

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), LoadError> = policy
            .run("companies.json", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LoadError::Fetch {
                    resource: "companies.json".into(),
                    status: 503,
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), LoadError> = policy
            .run("companies.json", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LoadError::Fetch {
                    resource: "companies.json".into(),
                    status: 404,
                })
            })
            .await;
        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn default_policy_makes_one_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), LoadError> = RetryPolicy::default()
            .run("company_1.json", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LoadError::Timeout {
                    resource: "company_1.json".into(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
