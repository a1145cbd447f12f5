use crate::action::{WebhookConfig, WebhookMethod};
use syncboard_core::{truncate, SyncboardError, SyncboardResult};
use tracing::info;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB
const ERROR_BODY_CHARS: usize = 200;

/// Calls webhook skills over HTTP.
///
/// POST sends `{"input": ..., "skill": ...}` as JSON; GET passes `input` as a
/// query parameter. A JSON response body is returned as JSON, anything else
/// as a string.
#[derive(Clone)]
pub struct WebhookCaller {
    client: reqwest::Client,
}

impl WebhookCaller {
    pub fn new() -> SyncboardResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("syncboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncboardError::Http(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn call(
        &self,
        skill: &str,
        config: &WebhookConfig,
        input: &str,
    ) -> SyncboardResult<serde_json::Value> {
        info!(skill = %skill, url = %config.url, method = ?config.method, "Calling webhook");

        let mut request = match config.method {
            WebhookMethod::Post => self
                .client
                .post(config.url.clone())
                .json(&serde_json::json!({ "input": input, "skill": skill })),
            WebhookMethod::Get => self
                .client
                .get(config.url.clone())
                .query(&[("input", input)]),
        };
        for (key, value) in &config.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncboardError::Http(format!("Webhook request failed: {e}")))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncboardError::Http(format!("Failed to read webhook response: {e}")))?;

        if body.len() > MAX_RESPONSE_SIZE {
            return Err(SyncboardError::Http(format!(
                "Webhook response too large: {} bytes (max: {MAX_RESPONSE_SIZE} bytes)",
                body.len()
            )));
        }
        let text = String::from_utf8_lossy(&body).into_owned();

        if !status.is_success() {
            return Err(SyncboardError::Http(format!(
                "Webhook returned status {}: {}",
                status.as_u16(),
                truncate(&text, ERROR_BODY_CHARS)
            )));
        }

        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}
