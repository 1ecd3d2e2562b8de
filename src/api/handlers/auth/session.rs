//! Session introspection and logout.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::gate::cookies;

use super::state::AuthState;
use super::types::SessionResponse;

/// Resolve the current session from the request cookies.
///
/// Returns 204 when there is no session, the tokens are stale, or the
/// provider cannot be reached; the caller only ever learns "signed in" or
/// "not signed in".
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Active session", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(tokens) = cookies::read_session(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let lookup = match auth_state.provider().get_user(&tokens).await {
        Ok(lookup) => lookup,
        Err(err) => {
            debug!("Session lookup failed: {err}");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    let Some(user) = lookup.user else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let mut response = (
        StatusCode::OK,
        Json(SessionResponse {
            user_id: user.id,
            email: user.email,
        }),
    )
        .into_response();

    if let Some(session) = &lookup.rotated {
        cookies::append_session(&mut response, session, auth_state.cookie_settings());
    }

    response
}

/// Sign out: revoke the session with the provider and clear the cookies.
///
/// The cookies are cleared even when the provider call fails, so the browser
/// never keeps tokens the gateway considers dead.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(tokens) = cookies::read_session(&headers) {
        if let Err(err) = auth_state.provider().sign_out(&tokens).await {
            error!("Provider sign-out failed: {err}");
        }
    }

    let mut response: Response = StatusCode::NO_CONTENT.into_response();
    for cookie in cookies::clear_session_cookies(auth_state.cookie_settings()) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    response
}
