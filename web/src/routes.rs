//! Router assembly: routes, CORS, request tracing.

use crate::state::AppState;
use crate::{api, ws};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build the gateway router over shared state.
pub fn router(state: AppState) -> Router {
    let origin = state
        .config
        .server
        .cors_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| {
            warn!(
                origin = %state.config.server.cors_origin,
                "unparseable CORS origin, falling back to localhost"
            );
            HeaderValue::from_static("http://localhost:5173")
        });
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/input-presensi", post(api::input_check_in))
        .route("/api/input-undangan", post(api::input_invitation))
        .route("/api/input-acara", post(api::input_event))
        .route("/api/admin/input-subgroup-group", post(api::input_group))
        .route("/api/get-initial-data", get(api::get_initial_data))
        .route("/api/admin/data-presensi", get(api::admin_roster))
        .route("/api/admin/data-undangan", get(api::admin_invitations))
        .route("/api/admin/get-all-subgroups", get(api::admin_groups))
        .route("/api/auth/login", post(api::login))
        .route("/api/auth/logout", post(api::logout))
        .route("/api/auth/verify-session", get(api::verify_session))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
