//! Assessment submission endpoints.
//!
//! A completed assessment is packaged as an [`AssessmentSubmission`] and handed
//! to a [`SubmissionEndpoint`]. The HTTP endpoint posts it to a server; the
//! local endpoint records it in the SQLite store when no server is configured.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::SubmissionConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::types::AssessmentType;

use super::responses::ResponseRecord;

/// Payload sent once per completed assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    pub responses: ResponseRecord,
    pub timestamp: DateTime<Utc>,
}

impl AssessmentSubmission {
    /// Content hash of the payload (64-char hex)
    ///
    /// Retries resend the identical payload, so the key lets a server
    /// recognise duplicates.
    pub fn idempotency_key(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&json);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// What the endpoint returns for an accepted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub assessment_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<serde_json::Value>,
}

/// Accepts completed assessments.
pub trait SubmissionEndpoint {
    fn submit(
        &self,
        submission: &AssessmentSubmission,
    ) -> impl Future<Output = Result<SubmissionReceipt>> + Send;
}

// ============================================
// HTTP endpoint
// ============================================

/// Posts submissions to `{server_url}/assessments`
pub struct HttpSubmissionClient {
    http_client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpSubmissionClient {
    /// Create a client from configuration
    ///
    /// Returns an error if `submission.server_url` is missing or a header value is invalid.
    pub fn new(config: &SubmissionConfig) -> Result<Self> {
        let base_url = config
            .server_url
            .clone()
            .ok_or_else(|| Error::Config("submission.server_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid submission api_key: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            retry: config.retry_policy(),
        })
    }

    async fn submit_once(
        &self,
        submission: &AssessmentSubmission,
        idempotency_key: &str,
    ) -> Result<SubmissionReceipt> {
        let url = format!("{}/assessments", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Idempotency-Key", idempotency_key)
            .json(submission)
            .send()
            .await
            .map_err(|e| Error::Submission(format!("request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Submission(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Submission(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

impl SubmissionEndpoint for HttpSubmissionClient {
    async fn submit(&self, submission: &AssessmentSubmission) -> Result<SubmissionReceipt> {
        let key = submission.idempotency_key()?;
        let receipt = self
            .retry
            .run("assessment submission", || self.submit_once(submission, &key))
            .await?;

        tracing::info!(
            assessment_id = %receipt.assessment_id,
            assessment_type = %submission.assessment_type,
            "Assessment submitted"
        );
        Ok(receipt)
    }
}

// ============================================
// Local endpoint
// ============================================

/// Records submissions in the local store
///
/// Resubmitting an identical payload returns the receipt of the first one.
pub struct LocalSubmissionEndpoint {
    db: Arc<Database>,
}

impl LocalSubmissionEndpoint {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn record(&self, submission: &AssessmentSubmission) -> Result<SubmissionReceipt> {
        let key = submission.idempotency_key()?;
        let summary = format!(
            "Recorded {} answers for the {} assessment",
            submission.responses.len(),
            submission.assessment_type
        );

        if let Some(existing) = self.db.get_submission_by_key(&key)? {
            return Ok(SubmissionReceipt {
                assessment_id: existing.id,
                summary,
                scores: None,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let payload = serde_json::to_value(submission)?;
        self.db.insert_submission(
            &id,
            submission.assessment_type.as_str(),
            &key,
            &payload,
            &submission.timestamp,
        )?;

        tracing::info!(assessment_id = %id, "Assessment recorded locally");
        Ok(SubmissionReceipt {
            assessment_id: id,
            summary,
            scores: None,
        })
    }
}

impl SubmissionEndpoint for LocalSubmissionEndpoint {
    async fn submit(&self, submission: &AssessmentSubmission) -> Result<SubmissionReceipt> {
        self.record(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::responses::AnswerValue;

    fn submission() -> AssessmentSubmission {
        let mut responses = ResponseRecord::new();
        responses.insert("cardio-fitness", AnswerValue::Integer(7));
        AssessmentSubmission {
            assessment_type: AssessmentType::Initial,
            responses,
            timestamp: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_payload_json_shape() {
        let json = serde_json::to_value(submission()).unwrap();
        assert_eq!(json["type"], "initial");
        assert_eq!(json["responses"]["cardio-fitness"], 7);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_idempotency_key_is_stable() {
        let a = submission().idempotency_key().unwrap();
        let b = submission().idempotency_key().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut other = submission();
        other.responses.insert("cardio-fitness", AnswerValue::Integer(8));
        assert_ne!(other.idempotency_key().unwrap(), a);
    }

    #[test]
    fn test_receipt_parses_server_shape() {
        let json = r#"{"assessmentId":"abc","summary":"ok","scores":{"physical":0.8}}"#;
        let receipt: SubmissionReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.assessment_id, "abc");
        assert!(receipt.scores.is_some());
    }

    #[test]
    fn test_http_client_requires_server_url() {
        assert!(HttpSubmissionClient::new(&SubmissionConfig::default()).is_err());

        let config = SubmissionConfig {
            server_url: Some("https://stella.example.com/".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let client = HttpSubmissionClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://stella.example.com");
    }

    #[tokio::test]
    async fn test_local_endpoint_deduplicates_resubmission() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.migrate().unwrap();
        let endpoint = LocalSubmissionEndpoint::new(db.clone());

        let first = endpoint.submit(&submission()).await.unwrap();
        let second = endpoint.submit(&submission()).await.unwrap();

        assert_eq!(first.assessment_id, second.assessment_id);
        assert_eq!(db.list_submissions().unwrap().len(), 1);
    }
}
