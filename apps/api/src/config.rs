use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::nl2gql::prompts::PromptPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the model host. Generation requests go to `<host>/api/generate`.
    pub ollama_host: String,
    pub ollama_model: String,
    /// Sent as `Authorization: Bearer <key>` to the model host when set.
    pub ollama_api_key: Option<String>,
    /// Query-execution service the translated operations are run against.
    pub graphql_url: String,
    /// Schema description handed to the model. Re-read on every request.
    pub schema_path: PathBuf,
    pub jwt_secret: String,
    pub prompt_policy: PromptPolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            ollama_host: env_or("OLLAMA_HOST", "http://localhost:11434"),
            ollama_model: env_or("OLLAMA_MODEL", "llama3"),
            ollama_api_key: lookup("OLLAMA_API_KEY").filter(|v| !v.trim().is_empty()),
            graphql_url: env_or("GRAPHQL_URL", "http://localhost:8000/graphql"),
            schema_path: PathBuf::from(env_or("SCHEMA_PATH", "schema.graphql")),
            jwt_secret: lookup("JWT_SECRET")
                .context("Required environment variable 'JWT_SECRET' is not set")?,
            prompt_policy: env_or("NL2GQL_PROMPT_POLICY", "public")
                .parse::<PromptPolicy>()
                .map_err(anyhow::Error::msg)
                .context("NL2GQL_PROMPT_POLICY must be 'public' or 'role_aware'")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Full URL of the model host's generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.ollama_host.trim_end_matches('/'))
    }
}
