//! Page endpoints sitting behind the session gate.
//!
//! The gateway renders no HTML; each page is a JSON document the front-end
//! hydrates. What matters here is which pages the gate exempts and which it
//! protects.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::flow::{FlowKind, Stage};
use crate::gate::CurrentUser;

use super::auth::types::{FlowResponse, SessionResponse};

fn entry_page(kind: FlowKind) -> Json<FlowResponse> {
    Json(FlowResponse {
        flow: kind.as_str().to_string(),
        stage: Stage::Identity.ordinal(),
        flow_id: None,
        masked_email: None,
        redirect_to: None,
    })
}

pub async fn login() -> impl IntoResponse {
    entry_page(FlowKind::Login)
}

pub async fn signup() -> impl IntoResponse {
    entry_page(FlowKind::Signup)
}

pub async fn reset_password() -> impl IntoResponse {
    entry_page(FlowKind::PasswordReset)
}

/// The protected landing page. The gate resolves the user before the request
/// reaches this handler; a missing extension means the gate was bypassed.
pub async fn dashboard(user: Option<Extension<CurrentUser>>) -> impl IntoResponse {
    match user {
        Some(Extension(CurrentUser(user))) => (
            StatusCode::OK,
            Json(SessionResponse {
                user_id: user.id,
                email: user.email,
            }),
        )
            .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_pages_start_at_the_identity_stage() {
        let Json(page) = entry_page(FlowKind::PasswordReset);
        assert_eq!(page.flow, "reset-password");
        assert_eq!(page.stage, 1);
        assert!(page.flow_id.is_none());
    }
}
