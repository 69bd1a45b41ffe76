//! Room Service chat
//!
//! A small web chat that relays guest messages, behind a fixed hotel
//! assistant prompt, to an OpenAI-compatible completion service.

mod api;
mod config;
mod conversation;
mod credentials;
mod llm;
mod session;
mod system_prompt;

use api::{create_router, AppState};
use config::AppConfig;
use conversation::ConversationTurnProcessor;
use credentials::{ChainedCredentials, CredentialStore};
use llm::{LoggingService, OpenAIService, API_KEY_NAME};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "room_service_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // A missing key is not fatal; the first turn reports it
    let credentials = ChainedCredentials::env_then_file(&config.secrets_path);
    let api_key = match credentials.lookup(API_KEY_NAME) {
        Ok(key) => {
            tracing::info!(key = API_KEY_NAME, "API key found");
            Some(key)
        }
        Err(e) => {
            tracing::warn!(key = API_KEY_NAME, error = %e, "API key not found");
            None
        }
    };
    let api_key_found = api_key.is_some();

    let service = OpenAIService::new(api_key, config.api_base_url.as_deref())?;
    tracing::info!(
        endpoint = %service.endpoint(),
        model = %llm::DEFAULT_MODEL,
        "Completion service configured"
    );
    let llm = Arc::new(LoggingService::new(Arc::new(service)));

    let state = AppState::new(ConversationTurnProcessor::new(llm), api_key_found);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(cors).layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Room service chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
