use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::api;
use super::app_state::AppState;

/// Build the axum router with the page, the JSON API and static assets.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/dashboard", get(api::get_dashboard))
        .route(
            "/api/lists/{list_id}/members/{user_id}",
            put(api::set_membership),
        )
        .route("/api/save", post(api::save))
        .route("/api/reload", post(api::reload))
        .route("/api/session", axum::routing::delete(api::close_session));

    Router::new()
        .route("/", get(api::index))
        .merge(api_routes)
        .nest_service("/assets", ServeDir::new(&state.assets_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
