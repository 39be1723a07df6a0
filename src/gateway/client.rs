use super::types::*;
use super::ExperimentGateway;
use crate::catalog::{BasisSetInfo, CatalogKind, ExperimentTypeInfo, SystemInfo};
use crate::config::ApiConfig;
use crate::error::{FieldError, LabError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// Client for the quantum computation service
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_prefix: String,
}

impl HttpGateway {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| LabError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_prefix: config.api_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Gateway with default timeouts against `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(&ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        debug!(url = url, "GET {}", what);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LabError::Network(format!("Failed to fetch {}: {}", what, e)))?;
        parse_json(check_response(resp).await?, what).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: Option<&B>,
        what: &str,
    ) -> Result<T> {
        debug!(url = url, "POST {}", what);
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| LabError::Network(format!("Failed to {}: {}", what, e)))?;
        parse_json(check_response(resp).await?, what).await
    }

    /// All stored results, paged
    pub async fn list_results(&self, skip: u32, limit: u32) -> Result<Vec<ExperimentRun>> {
        let url = format!("{}?skip={}&limit={}", self.api_url("/results"), skip, limit);
        self.get_json(&url, "results").await
    }

    pub async fn get_result(&self, result_id: i64) -> Result<ExperimentRun> {
        let url = self.api_url(&format!("/results/{}", result_id));
        self.get_json(&url, "result").await
    }

    /// Every run recorded for one experiment
    pub async fn experiment_results(&self, experiment_id: i64) -> Result<Vec<ExperimentRun>> {
        let url = self.api_url(&format!("/experiments/{}/results", experiment_id));
        self.get_json(&url, "experiment results").await
    }

    pub async fn result_details(&self, result_id: i64) -> Result<ResultDetails> {
        let url = self.api_url(&format!("/results/{}/details", result_id));
        self.get_json(&url, "result details").await
    }

    /// Service health, served at the server root
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        self.get_json(&url, "health").await
    }
}

#[async_trait]
impl ExperimentGateway for HttpGateway {
    async fn list_systems(&self) -> Result<Vec<SystemInfo>> {
        let resp: SystemsResponse = self
            .get_json(&self.api_url(CatalogKind::Systems.path()), "systems")
            .await?;
        Ok(resp.systems)
    }

    async fn list_basis_sets(&self) -> Result<Vec<BasisSetInfo>> {
        let resp: BasisSetsResponse = self
            .get_json(&self.api_url(CatalogKind::BasisSets.path()), "basis sets")
            .await?;
        Ok(resp.basis_sets)
    }

    async fn list_experiment_types(&self) -> Result<Vec<ExperimentTypeInfo>> {
        let resp: ExperimentTypesResponse = self
            .get_json(&self.api_url(CatalogKind::ExperimentTypes.path()), "experiment types")
            .await?;
        Ok(resp.experiment_types)
    }

    async fn create_experiment(&self, request: &CreateExperimentRequest) -> Result<ExperimentRecord> {
        let record: ExperimentRecord = self
            .post_json(&self.api_url("/experiments"), Some(request), "create experiment")
            .await?;
        info!(experiment_id = record.id, system = %record.system_id, "Experiment created");
        Ok(record)
    }

    async fn run_experiment(&self, experiment_id: i64) -> Result<ExperimentRun> {
        let url = self.api_url(&format!("/experiments/{}/run", experiment_id));
        let run: ExperimentRun = self
            .post_json::<Value, _>(&url, None, "run experiment")
            .await?;
        info!(experiment_id, run_id = run.id, energy = run.energy, "Experiment finished");
        Ok(run)
    }
}

async fn parse_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let body = resp
        .text()
        .await
        .map_err(|e| LabError::Network(format!("Failed to read {} response: {}", what, e)))?;
    serde_json::from_str(&body)
        .map_err(|e| LabError::Parse(format!("Failed to parse {} response: {}", what, e)))
}

/// Pass successful responses through; turn everything else into a
/// [`LabError`]
async fn check_response(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}

/// Normalize an error body.
///
/// Structured validation errors (`{"detail": [{"loc": [...], "msg": ...}]}`)
/// become [`LabError::Validation`]; a string `detail` or any other body
/// becomes [`LabError::Api`].
pub fn error_from_body(status: u16, body: &str) -> LabError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let detail = parsed.as_ref().and_then(|v| v.get("detail"));

    match detail {
        Some(Value::Array(items)) => {
            let errors: Vec<FieldError> = items.iter().map(field_error).collect();
            if errors.is_empty() {
                LabError::Api {
                    status,
                    message: "validation failed".to_string(),
                }
            } else {
                LabError::Validation(errors)
            }
        }
        Some(Value::String(message)) => LabError::Api {
            status,
            message: message.clone(),
        },
        _ => {
            let trimmed = body.trim();
            let message = if trimmed.is_empty() {
                generic_message(status)
            } else {
                trimmed.chars().take(200).collect()
            };
            LabError::Api { status, message }
        }
    }
}

fn field_error(item: &Value) -> FieldError {
    let path = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default();
    let message = item
        .get("msg")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| item.to_string());
    FieldError { path, message }
}

fn generic_message(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed")
        .to_string()
}
