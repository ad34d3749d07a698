//! Web application router and middleware setup.

use crate::error::Result;
use crate::metrics::traits::MetricSampler;
use crate::web::{handlers, websocket, AppState};
use axum::{routing::get, Router};
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Create the main axum application with all routes and middleware.
pub fn create_app<S>(state: AppState<S>) -> Result<Router>
where
    S: MetricSampler + 'static,
{
    let config = state.config.clone();

    let mut app = Router::new()
        // API routes
        .route("/api/health", get(handlers::get_health::<S>))
        .route("/api/figures", get(handlers::get_figures::<S>))
        .route("/api/summary", get(handlers::get_summary::<S>))
        .route("/api/status", get(handlers::service_status::<S>))
        // WebSocket route
        .route("/ws", get(websocket::websocket_handler::<S>));

    // Serve a custom dashboard when the static directory has one
    match config.static_path.as_deref().map(PathBuf::from) {
        Some(static_path) if static_path.exists() => {
            info!("Serving static files from: {:?}", static_path);
            app = app.nest_service("/static", ServeDir::new(&static_path));

            if static_path.join("index.html").exists() {
                app = app.route("/", get(handlers::serve_index::<S>));
            } else {
                app = app.route("/", get(handlers::default_index));
            }
        }
        Some(static_path) => {
            tracing::warn!(
                "Static path {:?} does not exist, serving default index",
                static_path
            );
            app = app.route("/", get(handlers::default_index));
        }
        None => {
            app = app.route("/", get(handlers::default_index));
        }
    }

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let app = app
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    Ok(app)
}
