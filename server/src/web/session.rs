use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::dashboard::{Session, SessionId};

use super::app_state::AppState;
use super::error::ApiError;

pub const SESSION_COOKIE: &str = "twilikt_session";

/// Session id carried by the request's cookie, if it parses.
pub fn session_id(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

pub fn session_cookie(id: SessionId) -> String {
    format!("{SESSION_COOKIE}={id}; HttpOnly; Path=/; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

/// Extractor resolving the `twilikt_session` cookie to an open session.
pub struct CurrentSession(pub Session);

impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        session_id(&jar)
            .and_then(|id| state.session(id))
            .map(CurrentSession)
            .ok_or(ApiError::NoSession)
    }
}
