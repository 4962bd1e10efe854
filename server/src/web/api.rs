use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dashboard::{DashboardView, SaveReport};
use crate::model::{ListId, UserId};

use super::app_state::AppState;
use super::error::ApiError;
use super::session::{self, CurrentSession};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /: open a new session for this page load and serve the page. The
/// page polls for the load result.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let session = state.open_session();
    let cookie = session::session_cookie(session.id);
    state.start_load(session);

    ([(header::SET_COOKIE, cookie)], Html(INDEX_HTML)).into_response()
}

/// GET /api/dashboard: current view; notifications are handed out once.
pub async fn get_dashboard(CurrentSession(session): CurrentSession) -> Json<DashboardView> {
    Json(session.view().await)
}

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub member: bool,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub changed: bool,
}

/// PUT /api/lists/{list_id}/members/{user_id}: toggle one checkbox.
pub async fn set_membership(
    CurrentSession(session): CurrentSession,
    Path((list_id, user_id)): Path<(u64, u64)>,
    Json(body): Json<MembershipRequest>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let changed = session
        .set_membership(UserId(user_id), ListId(list_id), body.member)
        .await?;
    Ok(Json(MembershipResponse { changed }))
}

/// POST /api/save: push all unsaved list edits to Twitter.
pub async fn save(CurrentSession(session): CurrentSession) -> Result<Json<SaveReport>, ApiError> {
    let report = session.save().await?;
    info!(session = %session.id, saved = report.saved, failed = report.failed, "save finished");
    Ok(Json(report))
}

/// POST /api/reload: discard local state and load everything again.
pub async fn reload(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> StatusCode {
    state.start_load(session);
    StatusCode::ACCEPTED
}

/// DELETE /api/session: drop the session and clear its cookie.
pub async fn close_session(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(id) = session::session_id(&jar) {
        state.close_session(id);
    }
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session::expired_session_cookie())],
    )
        .into_response()
}
