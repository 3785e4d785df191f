/// LLM Client — the single point of contact with the model host.
///
/// ARCHITECTURAL RULE: No other module may call the model host directly.
/// Everything goes through a `TextGenerator`.
///
/// Exactly one outbound call per translation. Failures are never retried;
/// callers re-issue the request themselves.
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Wait ceiling for a single generation call.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream NL generation timed out")]
    Timeout,

    #[error("Upstream network error: {0}")]
    Network(String),

    #[error("Upstream error {0}")]
    Status(u16),

    #[error("Upstream returned non-JSON response")]
    NonJson,
}

impl UpstreamError {
    /// Status code the pipeline reports for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Network(_) | UpstreamError::Status(_) | UpstreamError::NonJson => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Network(e.to_string())
        }
    }
}

/// Anything that turns a prompt into generated text.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>` so tests can swap the
/// HTTP client out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// HTTP client for an Ollama-compatible `/api/generate` endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    generate_url: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_timeout(
            config.generate_url(),
            config.ollama_model.clone(),
            config.ollama_api_key.clone(),
            UPSTREAM_TIMEOUT,
        )
    }

    pub fn with_timeout(
        generate_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            generate_url,
            model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let mut request = self.client.post(&self.generate_url).json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            let err = UpstreamError::from(e);
            warn!("Generation call to {} failed: {err}", self.generate_url);
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Model host returned {status}");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        // A body that times out mid-read is still a timeout.
        let body = response.text().await?;
        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            warn!("Model host returned non-JSON body: {e}");
            UpstreamError::NonJson
        })?;

        let text = parsed
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        debug!("Generation succeeded: {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::HeaderMap,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Serves `router` on an ephemeral port and returns the generate URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api/generate")
    }

    fn client(url: String, api_key: Option<&str>, timeout: Duration) -> LlmClient {
        LlmClient::with_timeout(
            url,
            "llama3".to_string(),
            api_key.map(str::to_string),
            timeout,
        )
        .unwrap()
    }

    #[test]
    fn test_upstream_error_statuses() {
        assert_eq!(UpstreamError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            UpstreamError::Network("reset".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(UpstreamError::Status(500).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(UpstreamError::NonJson.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_error_messages() {
        assert_eq!(
            UpstreamError::Timeout.to_string(),
            "Upstream NL generation timed out"
        );
        assert!(UpstreamError::Status(503).to_string().contains("503"));
        assert!(UpstreamError::Network("connection refused".into())
            .to_string()
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn test_generate_posts_model_prompt_and_reads_response() {
        let seen = Arc::new(Mutex::new(None::<(Value, Option<String>)>));
        let seen_in_handler = seen.clone();
        let router = Router::new().route(
            "/api/generate",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = seen_in_handler.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *seen.lock().unwrap() = Some((body, auth));
                    Json(json!({"model": "llama3", "response": "query { jobs { title } }", "done": true}))
                }
            }),
        );
        let url = serve(router).await;

        let text = client(url, Some("k-123"), UPSTREAM_TIMEOUT)
            .generate("list jobs")
            .await
            .unwrap();
        assert_eq!(text, "query { jobs { title } }");

        let (body, auth) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(
            body,
            json!({"model": "llama3", "prompt": "list jobs", "stream": false})
        );
        assert_eq!(auth.as_deref(), Some("Bearer k-123"));
    }

    #[tokio::test]
    async fn test_generate_omits_auth_header_without_key() {
        let saw_auth = Arc::new(Mutex::new(true));
        let saw_auth_in_handler = saw_auth.clone();
        let router = Router::new().route(
            "/api/generate",
            post(move |headers: HeaderMap| {
                let saw_auth = saw_auth_in_handler.clone();
                async move {
                    *saw_auth.lock().unwrap() = headers.contains_key("authorization");
                    Json(json!({"response": "INVALID"}))
                }
            }),
        );
        let url = serve(router).await;

        client(url, None, UPSTREAM_TIMEOUT)
            .generate("hi")
            .await
            .unwrap();
        assert!(!*saw_auth.lock().unwrap());
    }

    #[tokio::test]
    async fn test_missing_response_field_is_empty_text() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { Json(json!({"done": true})) }),
        );
        let url = serve(router).await;

        let text = client(url, None, UPSTREAM_TIMEOUT)
            .generate("hi")
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_non_success_status_is_status_error() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model loading") }),
        );
        let url = serve(router).await;

        let err = client(url, None, UPSTREAM_TIMEOUT)
            .generate("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Status(503)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_non_json_error() {
        let router = Router::new().route("/api/generate", post(|| async { "<html>oops</html>" }));
        let url = serve(router).await;

        let err = client(url, None, UPSTREAM_TIMEOUT)
            .generate("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::NonJson));
    }

    #[tokio::test]
    async fn test_slow_host_is_timeout() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"response": "too late"}))
            }),
        );
        let url = serve(router).await;

        let err = client(url, None, Duration::from_millis(200))
            .generate("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(
            format!("http://{addr}/api/generate"),
            None,
            UPSTREAM_TIMEOUT,
        )
        .generate("hi")
        .await
        .unwrap_err();
        assert!(matches!(err, UpstreamError::Network(_)));
    }
}
