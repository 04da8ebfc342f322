//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        FileStore, OpenAiChatAdapter, OpenAiGenerationAdapter, PdfExtractionAdapter,
        YoutubeTranscriptAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        self,
        rest::ApiDoc,
        state::{Adapters, AppState},
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Local Storage ---
    info!("Opening data directory {}", config.data_dir.display());
    let storage = Arc::new(FileStore::open(&config.data_dir)?);

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(config.require_openai_api_key()?);
    let openai_client = Client::with_config(openai_config);
    let http_client = reqwest::Client::builder()
        .user_agent(concat!("study-guide/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let generation_adapter = Arc::new(OpenAiGenerationAdapter::new(
        openai_client.clone(),
        config.generation_model.clone(),
    ));
    let chat_adapter = Arc::new(OpenAiChatAdapter::new(
        openai_client,
        config.chat_model.clone(),
    ));
    let extraction_adapter = Arc::new(PdfExtractionAdapter::new(http_client.clone()));
    let transcript_adapter = Arc::new(
        YoutubeTranscriptAdapter::new(http_client, &config.transcript_service_url)
            .map_err(|e| ApiError::Internal(format!("Invalid video id pattern: {}", e)))?,
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        Adapters {
            storage,
            extraction: extraction_adapter,
            transcripts: transcript_adapter,
            generation: generation_adapter,
            chat: chat_adapter.clone(),
            assistant: chat_adapter,
        },
    ));
    info!(
        "Loaded {} stored session(s)",
        app_state.controller.sessions().len()
    );

    // --- 5. Create the Web Router ---
    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .layer(cors)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        info!("Shutdown signal received");
        signal_token.cancel();
    });

    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
