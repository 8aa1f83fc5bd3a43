//! REST handlers: the fact write path, admin reads, and session auth.
//!
//! Write handlers follow one rule without exception: insert first, signal
//! the partition actor only after the row is durable. A failed signal is
//! logged and swallowed — the write succeeded, and dashboards converge on
//! reconnect because actors rehydrate from the store.

use crate::auth;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use rollcall_core::{
    AttendanceCache, EventId, NewCheckIn, NewEvent, NewInvitation, SummaryStore,
};
use rollcall_runtime::Fact;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

/// `?acara=<id>` query parameter on per-event routes.
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Event identifier, decimal.
    pub acara: String,
}

fn parse_event_id(raw: &str) -> Result<EventId, AppError> {
    raw.parse::<i64>()
        .map(EventId)
        .map_err(|_| AppError::BadRequest(format!("invalid event id: {raw}")))
}

/// Resolve the fact's partition and signal it, swallowing failures.
async fn signal(state: &AppState, fact: Fact) {
    let partition = fact.partition();
    let handle = state.registry.resolve(partition).await;
    if let Err(source) = handle.signal(fact).await {
        warn!(
            %partition,
            error = %source,
            "realtime signal failed, dashboards converge on reconnect"
        );
    }
}

// ============================================================================
// Fact write path
// ============================================================================

/// `POST /api/input-presensi` — public check-in submission.
pub async fn input_check_in(
    State(state): State<AppState>,
    Json(input): Json<NewCheckIn>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.store.insert_check_in(input).await?;
    info!(event = %entry.event_id, check_in = entry.id, "check-in recorded");
    signal(&state, Fact::CheckIn(entry.clone())).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": entry })),
    ))
}

/// `POST /api/input-undangan` — admin-only invitation submission.
pub async fn input_invitation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewInvitation>,
) -> Result<impl IntoResponse, AppError> {
    auth::require_admin(&state.config.auth, &headers)?;
    let entry = state.store.insert_invitation(input).await?;
    signal(&state, Fact::Invitation(entry.clone())).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": entry })),
    ))
}

/// `POST /api/input-acara` — admin-only event creation; notifies the
/// `"all"` partition.
pub async fn input_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewEvent>,
) -> Result<impl IntoResponse, AppError> {
    auth::require_admin(&state.config.auth, &headers)?;
    let record = state.store.insert_event(input).await?;
    info!(event = %record.id, name = %record.name, "event created");
    signal(&state, Fact::EventCreated(record.clone())).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": record })),
    ))
}

/// Body of the admin "add group" form.
#[derive(Debug, Deserialize)]
pub struct NewGroupRequest {
    /// Parent category name.
    #[serde(rename = "nama_group")]
    pub category: String,
    /// Group name.
    #[serde(rename = "nama_subgroup")]
    pub name: String,
}

/// `POST /api/admin/input-subgroup-group` — upsert a category and a group
/// under it.
pub async fn input_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth::require_admin(&state.config.auth, &headers)?;
    let category_id = state.store.find_or_create_category(&input.category).await?;
    let group_id = state
        .store
        .find_or_create_group(category_id, &input.name)
        .await?;
    Ok(Json(json!({
        "success": true,
        "id_group": category_id,
        "id_subgroup": group_id,
    })))
}

// ============================================================================
// Reads
// ============================================================================

/// `GET /api/get-initial-data?acara=<id>` — event record, a fresh summary,
/// and the lookup lists the public form needs.
pub async fn get_initial_data(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, AppError> {
    let event_id = parse_event_id(&query.acara)?;
    let snapshot = state.store.load_summary(event_id).await?;
    if snapshot.event.is_none() {
        return Err(AppError::NotFound);
    }

    let mut cache = AttendanceCache::new();
    cache.hydrate(snapshot);
    let genders = state.store.genders().await?;
    let staff_types = state.store.staff_types().await?;
    Ok(Json(json!({
        "success": true,
        "acara": cache.event(),
        "stats": cache.summary(),
        "genders": genders,
        "jenis_kepegawaian": staff_types,
    })))
}

/// `GET /api/admin/data-presensi?acara=<id>` — full roster.
pub async fn admin_roster(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth::require_admin(&state.config.auth, &headers)?;
    let event_id = parse_event_id(&query.acara)?;
    let results = state.store.roster(event_id).await?;
    Ok(Json(json!({ "success": true, "results": results })))
}

/// `GET /api/admin/data-undangan?acara=<id>` — full invitation list.
pub async fn admin_invitations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth::require_admin(&state.config.auth, &headers)?;
    let event_id = parse_event_id(&query.acara)?;
    let results = state.store.invitation_list(event_id).await?;
    Ok(Json(json!({ "success": true, "results": results })))
}

/// `GET /api/admin/get-all-subgroups` — every group with its category, for
/// the admin form dropdowns.
pub async fn admin_groups(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    auth::require_admin(&state.config.auth, &headers)?;
    let results = state.store.all_groups().await?;
    Ok(Json(json!({ "success": true, "results": results })))
}

// ============================================================================
// Sessions
// ============================================================================

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plaintext password, verified against the stored PBKDF2 hash.
    pub password: String,
}

/// `POST /api/auth/login` — verify credentials, install the session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .store
        .admin_by_username(&request.username)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let verified = auth::verify_password(&admin.password_hash, &request.password)
        .map_err(|_| AppError::Unauthorized)?;
    if !verified {
        warn!(username = %request.username, "login rejected");
        return Err(AppError::Unauthorized);
    }

    let token = auth::issue_token(&state.config.auth, admin.id, &admin.username, admin.role)
        .map_err(|_| AppError::Unauthorized)?;
    info!(username = %admin.username, role = %admin.role, "admin logged in");
    Ok((
        [(
            header::SET_COOKIE,
            auth::session_cookie(&token, state.config.auth.session_ttl_hours),
        )],
        Json(json!({
            "success": true,
            "username": admin.username,
            "role": admin.role,
        })),
    ))
}

/// `POST /api/auth/logout` — clear the session cookie.
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Json(json!({ "success": true })),
    )
}

/// `GET /api/auth/verify-session` — echo valid claims or 401.
pub async fn verify_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let claims = auth::require_admin(&state.config.auth, &headers)?;
    Ok(Json(json!({
        "valid": true,
        "username": claims.username,
        "role": claims.role,
    })))
}
