use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/select", post(handlers::select_form))
        .route("/api/view", get(handlers::get_view))
        .route("/api/select", post(handlers::select))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/resize", post(handlers::resize))
        .route("/api/mentions", get(handlers::mentions))
        .route("/assets/data/:file", get(handlers::data_asset))
        .with_state(state)
}
