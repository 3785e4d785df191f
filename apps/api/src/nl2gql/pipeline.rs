//! NL → GraphQL orchestration.
//!
//! Flow: build prompt → call model → extract → reject? → dry run? →
//!       execute → normalize.
//!
//! Single pass per request, no retained state. Every exit is an `Outcome`;
//! nothing is raised past `translate`.

use axum::http::StatusCode;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::graphql::QueryExecutor;
use crate::llm_client::TextGenerator;
use crate::models::identity::IdentityContext;
use crate::nl2gql::extract::{extract_graphql, is_rejection};
use crate::nl2gql::normalize::{normalize_execution, Outcome};
use crate::nl2gql::prompts::{build_prompt, PromptPolicy};

pub const OUT_OF_SCOPE_MESSAGE: &str = "Out of scope. Your request could not be mapped to a valid operation. Try asking about users or jobs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Return the translated operation without running it.
    Dry,
    Live,
}

/// Fails when the user text is blank after trimming.
pub fn require_user_text(user_text: &str) -> Result<&str, AppError> {
    if user_text.trim().is_empty() {
        return Err(AppError::Validation("Missing 'query' in body".to_string()));
    }
    Ok(user_text)
}

/// One translation call. Built per request and dropped afterwards.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    user_text: String,
    schema_sdl: String,
    mode: ExecutionMode,
    identity: Option<IdentityContext>,
}

impl TranslationRequest {
    /// Rejects user text that is blank after trimming.
    pub fn new(
        user_text: impl Into<String>,
        schema_sdl: impl Into<String>,
        mode: ExecutionMode,
        identity: Option<IdentityContext>,
    ) -> Result<Self, AppError> {
        let user_text = user_text.into();
        require_user_text(&user_text)?;
        Ok(Self {
            user_text,
            schema_sdl: schema_sdl.into(),
            mode,
            identity,
        })
    }

    pub fn identity(&self) -> Option<&IdentityContext> {
        self.identity.as_ref()
    }
}

/// Runs the full translation pipeline for one request.
///
/// The executor is only touched in live mode, after a usable operation was
/// extracted. Authorization is left to the executor.
pub async fn translate(
    request: &TranslationRequest,
    policy: PromptPolicy,
    generator: &dyn TextGenerator,
    executor: &dyn QueryExecutor,
) -> Outcome {
    let request_id = Uuid::new_v4();

    let prompt = build_prompt(
        &request.user_text,
        &request.schema_sdl,
        policy,
        request.identity(),
    );
    info!(
        %request_id,
        policy = %policy,
        mode = ?request.mode,
        "Translating NL request ({} prompt chars)",
        prompt.len()
    );
    debug!(%request_id, "User text: {}", request.user_text);

    let generated = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(%request_id, "Upstream generation failed: {e}");
            return Outcome::error(e.to_string(), e.status());
        }
    };

    let query = extract_graphql(&generated);
    if is_rejection(&query) {
        info!(%request_id, "Model declined to map the request");
        return Outcome::error(OUT_OF_SCOPE_MESSAGE, StatusCode::BAD_REQUEST);
    }
    debug!(%request_id, "Extracted operation: {query}");

    if request.mode == ExecutionMode::Dry {
        info!(%request_id, "Dry run, skipping execution");
        return Outcome::dry_run(&query);
    }

    let execution = executor.execute(&query).await;
    let outcome = normalize_execution(&query, execution);
    if outcome.is_error() {
        info!(
            %request_id,
            "Execution reported an error: {}",
            outcome.error_message().unwrap_or_default()
        );
    }
    info!(%request_id, status = outcome.status.as_u16(), "Translation complete");
    outcome
}
