/// HTTP server assembly and lifecycle
use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{self, AppState};
use crate::api::session;
use crate::error::Result;
use crate::types::Config;

pub struct ApiServer {
    config: Arc<Config>,
}

impl ApiServer {
    pub fn new(config: Config) -> Self {
        ApiServer {
            config: Arc::new(config),
        }
    }

    /// Build the full route table around shared state.
    ///
    /// Kite-facing routes sit behind the token-resolution middleware;
    /// /health, /login and /swagger.json stay open.
    pub fn router(state: Arc<AppState>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let protected = Router::new()
            .route("/instruments", get(handlers::instruments))
            .route("/historical-data", get(handlers::historical_data))
            .route("/quote", get(handlers::quote))
            .route("/ltp", get(handlers::ltp))
            .route("/place-order", post(handlers::place_order))
            .route("/modify-order", put(handlers::modify_order))
            .route("/cancel-order", delete(handlers::cancel_order))
            .route("/orders", get(handlers::orders))
            .route("/positions", get(handlers::positions))
            .route("/holdings", get(handlers::holdings))
            .route("/margins", get(handlers::margins))
            .route("/profile", get(handlers::profile))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                session::resolve_enctoken,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/login", post(handlers::login))
            .route("/swagger.json", get(handlers::swagger))
            .merge(protected)
            .with_state(state)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    pub async fn run(&self) -> Result<()> {
        let state = Arc::new(AppState::new(Arc::clone(&self.config)));
        let app = Self::router(state);

        let address = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&address).await?;
        info!("🚀 Kite bridge listening on {}", address);
        info!("📘 API description at http://{}/swagger.json", address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("🛑 Shutdown signal received, draining connections");
    }
}
