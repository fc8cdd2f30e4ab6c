//! Axum router configuration with middleware.
//!
//! Routes: `POST /chat` (and its `/api/chat` alias), `DELETE
//! /chat/sessions/{id}`, and `GET /health`. Middleware: CORS, tracing.
//!
//! When `static_dir` is configured and exists, the site is served from it;
//! API routes take priority and unknown paths fall through to `index.html`.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete relay router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();

    let mut router: Router<AppState> = Router::new()
        .route("/chat", post(handlers::chat::relay_chat))
        .route("/api/chat", post(handlers::chat::relay_chat))
        .route("/chat/sessions/{id}", delete(handlers::session::reset_session))
        .route("/health", get(handlers::health::health_check));

    if let Some(dir) = static_dir {
        if dir.is_dir() {
            let serve_dir = ServeDir::new(&dir).fallback(ServeFile::new(dir.join("index.html")));
            router = router.fallback_service(serve_dir);
            tracing::info!(path = %dir.display(), "Static file serving enabled");
        } else {
            tracing::warn!(path = %dir.display(), "Static directory not found; serving the API only");
        }
    }

    // Layers go on last so static responses get CORS and tracing too.
    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
