//! HTTP client for the remote guidance backend.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::GuidanceConfig;
use crate::error::{Error, Result};
use crate::metrics::MetricsRecord;
use crate::retry::RetryPolicy;
use crate::types::GuidanceRecord;

use super::activity::Activity;

/// Where the trainee is in their program, sent along with guidance requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidanceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission: Option<String>,
}

impl GuidanceContext {
    pub fn module(id: impl Into<String>) -> Self {
        Self {
            module: Some(id.into()),
            mission: None,
        }
    }
}

#[derive(Serialize)]
struct GuidanceRequest<'a> {
    activity: &'a Activity,
    metrics: &'a MetricsRecord,
    module: Option<&'a str>,
    mission: Option<&'a str>,
}

#[derive(Deserialize)]
struct GuidanceResponse {
    guidance: GuidanceRecord,
}

#[derive(Serialize)]
struct QuestionRequest<'a> {
    question: &'a str,
    context: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct QuestionResponse {
    answer: String,
}

/// A source of remote guidance
pub trait GuidanceBackend: Send + Sync {
    fn guidance(
        &self,
        activity: &Activity,
        metrics: &MetricsRecord,
        context: &GuidanceContext,
    ) -> impl Future<Output = Result<GuidanceRecord>> + Send;

    fn ask(
        &self,
        question: &str,
        context: &serde_json::Value,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Whether the backend is reachable right now
    fn health(&self) -> impl Future<Output = bool> + Send;
}

pub struct GuidanceClient {
    http_client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GuidanceClient {
    /// Create a client from configuration
    ///
    /// Returns an error if `guidance.server_url` is missing or the api key is
    /// not a valid header value.
    pub fn new(config: &GuidanceConfig) -> Result<Self> {
        let base_url = config
            .server_url
            .clone()
            .ok_or_else(|| Error::Config("guidance.server_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .map_err(|e| Error::Config(format!("invalid guidance api_key: {}", e)))?,
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Guidance(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Guidance(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Guidance(format!("failed to parse response: {}", e)))
    }
}

impl GuidanceBackend for GuidanceClient {
    async fn guidance(
        &self,
        activity: &Activity,
        metrics: &MetricsRecord,
        context: &GuidanceContext,
    ) -> Result<GuidanceRecord> {
        let request = GuidanceRequest {
            activity,
            metrics,
            module: context.module.as_deref(),
            mission: context.mission.as_deref(),
        };
        let response: GuidanceResponse = self
            .retry
            .run("guidance request", || self.post("/guidance", &request))
            .await?;
        Ok(response.guidance)
    }

    async fn ask(&self, question: &str, context: &serde_json::Value) -> Result<String> {
        let request = QuestionRequest { question, context };
        let response: QuestionResponse = self
            .retry
            .run("guidance question", || self.post("/questions", &request))
            .await?;
        Ok(response.answer)
    }

    async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Guidance backend health check failed: {}", e);
                false
            }
        }
    }
}
