//! Client for the remote script-management service.
//!
//! The service is a black box reached over HTTP: three JSON endpoints,
//! one per pipeline stage, each authenticated with a bearer credential.

use crate::error::{Error, ErrorCode, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn http_error(e: reqwest::Error) -> Error {
    Error::new(
        ErrorCode::ApiRequestFailed,
        format!("HTTP request failed: {}", e),
        json!({ "error": e.to_string() }),
    )
}

fn api_error(status: u16, body: &str) -> Error {
    Error::new(
        ErrorCode::ApiStatusError,
        format!("API error: HTTP {}", status),
        json!({ "status": status, "body": body }),
    )
}

fn parse_error(msg: impl Into<String>) -> Error {
    Error::new(ErrorCode::InternalJsonError, msg, Value::Null)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub passed: u32,
    #[serde(default)]
    pub failures: Vec<TestFailure>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFailure {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcome {
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub script_content: String,
    pub environment: String,
    pub business_unit_id: String,
    pub script_name: String,
    pub description: String,
}

/// Remote service operations, one per pipeline stage. The pipeline only
/// sees this seam, so tests can substitute an in-memory service.
pub trait ScriptService {
    fn validate_script(&self, content: &str) -> Result<ValidationOutcome>;
    fn run_tests(&self, suite: &Value) -> Result<TestReport>;
    fn deploy_script(&self, request: &DeployRequest) -> Result<DeployOutcome>;
}

/// Blocking HTTP client for the script-management API.
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Makes a POST request with JSON body and bearer auth.
    fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &impl Serialize) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(http_error)?;

        parse_json_response(response)
    }
}

impl ScriptService for ApiClient {
    fn validate_script(&self, content: &str) -> Result<ValidationOutcome> {
        self.post("scripts/validate", &json!({ "content": content }))
    }

    fn run_tests(&self, suite: &Value) -> Result<TestReport> {
        self.post("tests/run", suite)
    }

    fn deploy_script(&self, request: &DeployRequest) -> Result<DeployOutcome> {
        self.post("scripts/deploy", request)
    }
}

fn parse_json_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().map_err(http_error)?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| parse_error(format!("Invalid JSON response: {}", e)))
}
