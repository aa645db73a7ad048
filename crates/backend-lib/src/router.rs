// ============================
// campus-backend/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::meetings, middleware::rate_limit, AppState};

/// Create the meetings router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/meetings", post(meetings::schedule))
        .route("/meetings/public", get(meetings::list_public))
        .route("/meetings/mine", get(meetings::list_mine))
        .route(
            "/meetings/{id}",
            get(meetings::get_meeting)
                .patch(meetings::update_details)
                .delete(meetings::delete_meeting),
        )
        .route("/meetings/{id}/schedule", put(meetings::reschedule))
        .route("/meetings/{id}/start", post(meetings::start))
        .route("/meetings/{id}/end", post(meetings::end))
        .route("/meetings/{id}/cancel", post(meetings::cancel))
        .route(
            "/meetings/{id}/participation",
            post(meetings::join).delete(meetings::leave),
        )
        .route(
            "/meetings/{id}/participants/{user_id}",
            delete(meetings::remove_participant),
        )
        .route("/meetings/{id}/participants", post(meetings::add_participants))
        .route("/meetings/{id}/stats", get(meetings::stats))
        .route("/meetings/{id}/recording/start", post(meetings::start_recording))
        .route("/meetings/{id}/recording/stop", post(meetings::stop_recording))
        .route(
            "/meetings/{id}/recordings",
            get(meetings::list_recordings).post(meetings::add_recording),
        )
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
