//! SpectraLink Server Library
//!
//! Collaborator for the SpectraLink client: roster, message store,
//! attachment storage and groups over plain JSON/HTTP.

pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod store;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{AppState, ServerConfig};
use handlers::{
    create_group, get_file, get_messages, health_check, list_groups, list_users, login, register,
    send_message, upload_file,
};

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "spectralink_server=debug,tower_http=info".into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Build the router over an opened state.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        // Accounts
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/users", get(list_users))
        // Messages
        .route("/messages", get(get_messages))
        .route("/send", post(send_message))
        // Attachments
        .route("/upload", post(upload_file))
        .route("/files/{hash}/{filename}", get(get_file))
        // Groups
        .route("/groups", get(list_groups).post(create_group))
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

pub async fn run() -> anyhow::Result<()> {
    init_tracing();
    let config = ServerConfig::from_env()?;
    serve(config).await
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!("=== SpectraLink Server ===");
    info!("Data root: {:?}", config.layout.root);

    let state = AppState::open(&config).await?;
    let app = app(state, config.max_upload_bytes());

    let addr = config.addr()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
