use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config;
use crate::error::{GenError, Result};
use crate::types::{JobHandle, JobSpec, JobStatus, PollOptions};
use crate::ImageTaskService;

/// Default DashScope API root.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";

/// Default text-to-image model.
pub const DEFAULT_MODEL: &str = "wanx-v1";

/// Default style tag. DashScope accepts a fixed set of angle-bracketed
/// style names (`<flat illustration>`, `<watercolor>`, `<anime>`, ...).
pub const DEFAULT_STYLE: &str = "<flat illustration>";

const USER_AGENT: &str = "wanx-gen/feature-image-generator";
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

fn normalize(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Async client for DashScope's asynchronous text-to-image API.
///
/// Task creation goes through the image-synthesis endpoint with the
/// `X-DashScope-Async` header; completion is observed by polling the
/// tasks endpoint; the finished image is fetched from the result URL.
///
/// # Example
/// ```no_run
/// use wanx_gen::{JobSpec, WanxClient};
///
/// # async fn example() -> wanx_gen::Result<()> {
/// let client = WanxClient::from_env()?;
/// let handle = client.create_task(&JobSpec::new("hero", "abstract world map")).await?;
/// println!("task id: {}", handle.task_id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WanxClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    style: String,
}

impl WanxClient {
    /// Create a client with the given API key and default endpoint/model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            style: DEFAULT_STYLE.to_string(),
        }
    }

    /// Create a client from the environment (`DASHSCOPE_API_KEY`, then
    /// `QWEN_API_KEY`; first non-empty wins). Fails with
    /// [`GenError::MissingApiKey`] when neither is set.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(config::api_key_from_env()?))
    }

    /// Point the client at a different API root (trailing slashes are
    /// stripped).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize(base_url.into());
        self
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Override the generation model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the style tag sent with every request.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Returns the configured API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ensure_api_key(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(GenError::MissingApiKey);
        }
        Ok(())
    }

    // ── Task creation ───────────────────────────────────────────────

    /// Submit a generation task. Returns the service-assigned handle.
    ///
    /// The credential is checked before any network traffic.
    pub async fn create_task(&self, spec: &JobSpec) -> Result<JobHandle> {
        self.ensure_api_key()?;

        let url = format!(
            "{}/services/aigc/text2image/image-synthesis",
            self.base_url
        );
        let mut body = serde_json::json!({
            "model": self.model,
            "input": {
                "prompt": spec.prompt,
            },
            "parameters": {
                "style": self.style,
                "size": spec.size,
                "n": 1,
            },
        });
        if let Some(negative) = &spec.negative_prompt {
            body["input"]["negative_prompt"] = serde_json::json!(negative);
        }

        let resp = self
            .http
            .post(&url)
            .timeout(SUBMIT_TIMEOUT)
            .bearer_auth(&self.api_key)
            .header("X-DashScope-Async", "enable")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenError::Network {
                context: format!("cannot reach DashScope at {}", self.base_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenError::Submission { status, body });
        }

        let json: Value = resp.json().await.map_err(|e| GenError::Network {
            context: "failed to parse task creation response".into(),
            source: e,
        })?;

        let task_id = parse_submit_response(&json)?;
        Ok(JobHandle { task_id })
    }

    // ── Status polling ──────────────────────────────────────────────

    /// Issue one status check for a submitted task.
    pub async fn task_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        self.ensure_api_key()?;

        let url = format!("{}/tasks/{}", self.base_url, handle.task_id);
        let resp = self
            .http
            .get(&url)
            .timeout(POLL_TIMEOUT)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| GenError::Network {
                context: format!("failed to poll task {}", handle.task_id),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenError::Poll { status, body });
        }

        let json: Value = resp.json().await.map_err(|e| GenError::Network {
            context: format!("failed to parse status of task {}", handle.task_id),
            source: e,
        })?;

        Ok(parse_task_status(&json))
    }

    /// Poll until the task reaches a terminal status or the budget in
    /// `opts` runs out. See [`crate::pipeline::await_completion`].
    pub async fn wait_for_completion(
        &self,
        handle: &JobHandle,
        opts: &PollOptions,
    ) -> Result<JobStatus> {
        crate::pipeline::await_completion(self, handle, opts).await
    }

    // ── Artifact download ───────────────────────────────────────────

    /// Download the artifact at `url`. Single attempt; callers wanting
    /// retries wrap this themselves.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| GenError::Network {
                context: format!("failed to fetch artifact from {}", url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenError::Download { status, body });
        }

        let bytes = resp.bytes().await.map_err(|e| GenError::Network {
            context: "failed to read artifact bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

impl ImageTaskService for WanxClient {
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle> {
        self.create_task(spec).await
    }

    async fn poll_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        self.task_status(handle).await
    }

    async fn fetch_artifact(&self, url: &str) -> Result<Vec<u8>> {
        self.download(url).await
    }
}

/// Extract the task id from a creation response.
///
/// An absent or empty `output.task_id` is an error; a handle must never
/// exist without a usable id.
pub fn parse_submit_response(json: &Value) -> Result<String> {
    json.pointer("/output/task_id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| GenError::InvalidResponse(format!("no task id in response: {}", json)))
}

/// Map a task-status response onto [`JobStatus`].
///
/// `SUCCEEDED` counts only when at least one result carries a non-empty
/// URL (earliest in the list wins); `FAILED` is terminal with the
/// service's message, or the whole payload when no message is present;
/// everything else, including unrecognized status strings, is pending.
pub fn parse_task_status(json: &Value) -> JobStatus {
    let status = json
        .pointer("/output/task_status")
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN");

    match status {
        "SUCCEEDED" => {
            let url = json
                .pointer("/output/results")
                .and_then(|r| r.as_array())
                .and_then(|results| {
                    results.iter().find_map(|r| {
                        r.get("url")
                            .and_then(|u| u.as_str())
                            .filter(|u| !u.is_empty())
                            .map(String::from)
                    })
                });
            match url {
                Some(url) => JobStatus::Succeeded { url },
                None => JobStatus::Pending,
            }
        }
        "FAILED" => {
            let reason = json
                .pointer("/output/message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| json.to_string());
            JobStatus::Failed { reason }
        }
        _ => JobStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize("https://dashscope.aliyuncs.com/api/v1/".into()),
            "https://dashscope.aliyuncs.com/api/v1"
        );
        assert_eq!(normalize("http://host/api///".into()), "http://host/api");
    }

    #[test]
    fn test_client_builder() {
        let client = WanxClient::new("sk-test")
            .with_base_url("http://localhost:9999/")
            .with_model("wanx-v2")
            .with_style("<watercolor>");
        assert_eq!(client.base_url(), "http://localhost:9999");
        assert_eq!(client.model, "wanx-v2");
        assert_eq!(client.style, "<watercolor>");
    }

    #[tokio::test]
    async fn test_create_task_requires_api_key() {
        // Empty key fails up front; no request is ever issued.
        let client = WanxClient::new("");
        let err = client
            .create_task(&JobSpec::new("discover", "a city skyline"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenError::MissingApiKey));
    }

    #[test]
    fn test_parse_submit_response_ok() {
        let json: Value = serde_json::from_str(
            r#"{"output":{"task_id":"T1","task_status":"PENDING"},"request_id":"r-1"}"#,
        )
        .unwrap();
        assert_eq!(parse_submit_response(&json).unwrap(), "T1");
    }

    #[test]
    fn test_parse_submit_response_missing_id() {
        let json: Value = serde_json::from_str(r#"{"output":{}}"#).unwrap();
        assert!(matches!(
            parse_submit_response(&json),
            Err(GenError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_submit_response_empty_id() {
        let json: Value = serde_json::from_str(r#"{"output":{"task_id":""}}"#).unwrap();
        assert!(matches!(
            parse_submit_response(&json),
            Err(GenError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_status_succeeded_first_url_wins() {
        let json: Value = serde_json::from_str(
            r#"{
            "output": {
                "task_status": "SUCCEEDED",
                "results": [
                    {"url": "https://example/a.png"},
                    {"url": "https://example/b.png"}
                ]
            }
        }"#,
        )
        .unwrap();
        assert_eq!(
            parse_task_status(&json),
            JobStatus::Succeeded {
                url: "https://example/a.png".into()
            }
        );
    }

    #[test]
    fn test_parse_status_succeeded_skips_empty_urls() {
        let json: Value = serde_json::from_str(
            r#"{
            "output": {
                "task_status": "SUCCEEDED",
                "results": [{"url": ""}, {"url": "https://example/b.png"}]
            }
        }"#,
        )
        .unwrap();
        assert_eq!(
            parse_task_status(&json),
            JobStatus::Succeeded {
                url: "https://example/b.png".into()
            }
        );
    }

    #[test]
    fn test_parse_status_succeeded_without_results_is_pending() {
        let json: Value =
            serde_json::from_str(r#"{"output":{"task_status":"SUCCEEDED","results":[]}}"#)
                .unwrap();
        assert_eq!(parse_task_status(&json), JobStatus::Pending);
    }

    #[test]
    fn test_parse_status_failed_with_message() {
        let json: Value = serde_json::from_str(
            r#"{"output":{"task_status":"FAILED","code":"DataInspection","message":"content policy violation"}}"#,
        )
        .unwrap();
        assert_eq!(
            parse_task_status(&json),
            JobStatus::Failed {
                reason: "content policy violation".into()
            }
        );
    }

    #[test]
    fn test_parse_status_failed_without_message_keeps_raw_payload() {
        let json: Value =
            serde_json::from_str(r#"{"output":{"task_status":"FAILED"}}"#).unwrap();
        match parse_task_status(&json) {
            JobStatus::Failed { reason } => assert!(reason.contains("FAILED")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_status_running_and_unknown_are_pending() {
        for status in ["PENDING", "RUNNING", "SOME_NEW_STATE"] {
            let json: Value = serde_json::from_str(&format!(
                r#"{{"output":{{"task_status":"{}"}}}}"#,
                status
            ))
            .unwrap();
            assert_eq!(parse_task_status(&json), JobStatus::Pending);
        }
    }
}
