//! Social sign-in: authorize redirect and the provider callback.

use axum::{
    extract::{Extension, Query},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::IntoParams;

use crate::gate::cookies;
use crate::provider::OAuthProvider;

use super::state::AuthState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct OAuthQuery {
    /// Social provider name, "google" or "github".
    pub provider: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    /// Authorization code handed back by the provider.
    pub code: Option<String>,
}

/// Redirect the browser to the provider's consent screen.
#[utoipa::path(
    get,
    path = "/v1/auth/oauth",
    params(OAuthQuery),
    responses(
        (status = 302, description = "Redirect to the provider"),
        (status = 400, description = "Unknown provider", body = String)
    ),
    tag = "auth"
)]
pub async fn oauth_start(
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<OAuthQuery>,
) -> impl IntoResponse {
    let provider: OAuthProvider = match query.provider.parse() {
        Ok(provider) => provider,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    let callback_url = auth_state.config().callback_url();
    match auth_state.provider().authorize_url(provider, &callback_url) {
        Ok(url) => redirect(url.as_str()),
        Err(err) => {
            error!("Could not build authorize URL: {err}");
            (StatusCode::BAD_GATEWAY, err.to_string()).into_response()
        }
    }
}

/// Exchange the callback code for a session and land on the dashboard.
///
/// Any failure sends the browser back to the login page rather than
/// surfacing a provider error mid-redirect.
#[utoipa::path(
    get,
    path = "/api/auth/callback",
    params(CallbackQuery),
    responses(
        (status = 302, description = "Redirect to the dashboard or back to login")
    ),
    tag = "auth"
)]
pub async fn oauth_callback(
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let Some(code) = query.code else {
        debug!("OAuth callback without a code");
        return redirect("/login");
    };

    match auth_state.provider().exchange_code(&code).await {
        Ok(session) => {
            let mut response = redirect("/dashboard");
            cookies::append_session(&mut response, &session, auth_state.cookie_settings());
            response
        }
        Err(err) => {
            error!("Code exchange failed: {err}");
            redirect("/login")
        }
    }
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_uses_found_with_location() {
        let response = redirect("/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION.as_str()], "/login");
    }
}
