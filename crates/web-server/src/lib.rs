use analytics::AnalyticsAggregator;
use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use configuration::{Config, ServerConfig};
use database::ItemRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ItemRepository>,
    pub aggregator: AnalyticsAggregator,
}

impl AppState {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self {
            repo,
            aggregator: AnalyticsAggregator::new(),
        }
    }
}

/// Builds the application router: the JSON API under `/api`, plus the
/// static client from `server.static_dir` for every other path.
pub fn router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    let mut app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/api/items/:id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/api/analytics", get(handlers::get_analytics))
        .route(
            "/api/analytics/breakdown",
            get(handlers::get_analytics_breakdown),
        )
        .with_state(state);

    if let Some(dir) = &server.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static files.");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(server.body_limit))
}

/// Opens the configured store and serves the API until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let repo = database::open_repository(config.storage.backend, &config.database).await?;
    let app = router(Arc::new(AppState::new(repo)), &config.server);

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
