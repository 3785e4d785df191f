//! Query execution boundary.
//!
//! The translation pipeline never runs queries itself. It receives a
//! `QueryExecutor` and only looks at what comes back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

use crate::llm_client::UPSTREAM_TIMEOUT;

/// What an executor hands back: a success flag plus the raw result document.
/// The result is opaque apart from an optional `errors` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub success: bool,
    pub result: Value,
}

impl Execution {
    /// A failed execution whose result carries a single error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: json!({ "errors": [{ "message": message.into() }] }),
        }
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Execution;
}

/// Runs queries against the job portal's GraphQL endpoint over HTTP.
#[derive(Clone)]
pub struct GraphqlClient {
    client: Client,
    url: String,
    bearer: Option<String>,
}

impl GraphqlClient {
    pub fn new(url: String) -> anyhow::Result<Self> {
        Self::with_timeout(url, UPSTREAM_TIMEOUT)
    }

    pub fn with_timeout(url: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url,
            bearer: None,
        })
    }

    /// Returns a copy that forwards `token` so the endpoint can authorize
    /// the caller. Authorization is enforced there, not here.
    pub fn with_bearer(&self, token: Option<&str>) -> Self {
        Self {
            client: self.client.clone(),
            url: self.url.clone(),
            bearer: token.map(str::to_string),
        }
    }
}

#[async_trait]
impl QueryExecutor for GraphqlClient {
    async fn execute(&self, query: &str) -> Execution {
        let mut request = self.client.post(&self.url).json(&json!({ "query": query }));
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!("GraphQL endpoint {} timed out", self.url);
                return Execution::failed("Query execution timed out");
            }
            Err(e) => {
                warn!("GraphQL endpoint {} unreachable: {e}", self.url);
                return Execution::failed(format!("Query execution failed: {e}"));
            }
        };

        let success = response.status().is_success();
        match response.json::<Value>().await {
            Ok(result) => Execution { success, result },
            Err(e) if e.is_timeout() => {
                warn!("GraphQL endpoint {} timed out mid-body", self.url);
                Execution::failed("Query execution timed out")
            }
            Err(e) => {
                warn!("GraphQL endpoint returned an unreadable body: {e}");
                Execution::failed("Query execution returned a non-JSON response")
            }
        }
    }
}
