//! services/api/src/bin/api.rs

use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use scripture_api_lib::{
    adapters::{load_raw_records, run_migrations, FileLocalStore, PgDocumentStore, PgIdentityProvider},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use scripture_core::{CanonIndex, ReadStateStore, SessionManager};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the Canon Index ---
    let raw = load_raw_records(&config.scriptures_path)?;
    let canon = Arc::new(CanonIndex::build(&raw));
    info!(
        total = canon.total(),
        dropped = canon.dropped().len(),
        "Canon index built"
    );

    // --- 3. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Running database migrations...");
    run_migrations(&db_pool).await?;
    info!("Database migrations complete.");

    // --- 4. Initialize Adapters & Core Services ---
    let local = Arc::new(FileLocalStore::open(&config.local_store_path)?);
    let remote = Arc::new(PgDocumentStore::new(db_pool.clone()));
    let accounts = Arc::new(PgIdentityProvider::new(db_pool));

    let store = Arc::new(ReadStateStore::new(remote, local));
    let sessions = Arc::new(SessionManager::new(accounts.clone(), store.clone()));

    // The observer loads the provider's current identity before following changes.
    let shutdown = CancellationToken::new();
    let observer = sessions.spawn(shutdown.clone());

    let app_state = Arc::new(AppState {
        canon,
        store: store.clone(),
        sessions,
        accounts,
        shutdown: shutdown.clone(),
    });

    // --- 5. Create the Web Router ---
    let origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let api_router = web::router(app_state).layer(cors);

    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
                // Ends open event streams so in-flight connections can drain.
                shutdown.cancel();
            }
        })
        .await?;

    // --- 7. Flush State ---
    shutdown.cancel();
    if let Err(e) = observer.await {
        tracing::warn!("Session observer ended abnormally: {e}");
    }
    store.save().await;
    info!("Progress saved. Goodbye.");

    Ok(())
}
