use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::graphql::GraphqlClient;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model backend. Default: `LlmClient` against the configured Ollama host.
    pub generator: Arc<dyn TextGenerator>,
    /// Base executor; handlers derive a per-request copy carrying the caller's token.
    pub graphql: GraphqlClient,
    pub tokens: TokenService,
    pub config: Config,
}
