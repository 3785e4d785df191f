//! Axum route handlers for the NL → GraphQL API.

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::bearer_token;
use crate::errors::AppError;
use crate::nl2gql::normalize::Outcome;
use crate::nl2gql::pipeline::{require_user_text, translate, ExecutionMode, TranslationRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RunParams {
    pub run: Option<String>,
}

impl RunParams {
    /// Live unless `run=false` (any casing).
    fn mode(&self) -> ExecutionMode {
        match self.run.as_deref() {
            Some(run) if run.trim().eq_ignore_ascii_case("false") => ExecutionMode::Dry,
            _ => ExecutionMode::Live,
        }
    }
}

/// POST /nl2gql?run=<bool>
///
/// Body: `{"query": "<natural language request>"}`.
/// Translates the request, optionally runs it, and returns the pipeline
/// outcome with its own status code. An `Authorization: Bearer` header is
/// verified and forwarded to the GraphQL endpoint.
pub async fn handle_nl2gql(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Result<Outcome, AppError> {
    let user_text = require_user_text(
        body.as_ref()
            .and_then(|Json(body)| body.get("query"))
            .and_then(Value::as_str)
            .unwrap_or_default(),
    )?;

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);
    let identity = token
        .map(|t| state.tokens.verify(t))
        .transpose()?
        .map(|claims| claims.identity());

    let schema_sdl = tokio::fs::read_to_string(&state.config.schema_path)
        .await
        .with_context(|| {
            format!(
                "Failed to read schema from {}",
                state.config.schema_path.display()
            )
        })?;

    let request = TranslationRequest::new(user_text, schema_sdl, params.mode(), identity)?;
    let executor = state.graphql.with_bearer(token);

    Ok(translate(
        &request,
        state.config.prompt_policy,
        state.generator.as_ref(),
        &executor,
    )
    .await)
}
