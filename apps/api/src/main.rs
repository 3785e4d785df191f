mod auth;
mod config;
mod errors;
mod graphql;
mod llm_client;
mod models;
mod nl2gql;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenService;
use crate::config::Config;
use crate::graphql::GraphqlClient;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting portal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model client
    let llm = LlmClient::new(&config)?;
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        llm.model(),
        config.generate_url()
    );

    let graphql = GraphqlClient::new(config.graphql_url.clone())?;
    info!("GraphQL executor targeting {}", config.graphql_url);
    info!(
        "Prompt policy: {}, schema: {}",
        config.prompt_policy,
        config.schema_path.display()
    );

    // Build app state
    let state = AppState {
        generator: Arc::new(llm),
        graphql,
        tokens: TokenService::new(&config.jwt_secret),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the React frontend has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
