//! Endpoints driving the multi-stage auth flows.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::flow::{Flow, FlowAdvance, FlowError, FlowKind};
use crate::gate::cookies;
use crate::provider::ProviderSession;

use super::state::AuthState;
use super::types::{
    FlowNewPasswordRequest, FlowOtpRequest, FlowResendRequest, FlowResponse, FlowStartRequest,
};

/// Start a flow by submitting the identity form.
#[utoipa::path(
    post,
    path = "/v1/auth/flow",
    request_body = FlowStartRequest,
    responses(
        (status = 200, description = "Flow advanced or completed", body = FlowResponse),
        (status = 400, description = "Validation or provider error", body = String)
    ),
    tag = "auth"
)]
pub async fn flow_start(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<FlowStartRequest>>,
) -> impl IntoResponse {
    let request: FlowStartRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let kind: FlowKind = match request.flow.parse() {
        Ok(kind) => kind,
        Err(err) => return (StatusCode::BAD_REQUEST, err).into_response(),
    };

    let mut flow = Flow::new(kind);
    match flow
        .submit_identity(
            auth_state.provider(),
            &request.email,
            request.password.as_deref(),
        )
        .await
    {
        Ok(FlowAdvance::Complete(session)) => {
            completed_response(&auth_state, kind, flow.stage(), session, "/dashboard")
        }
        Ok(_) => {
            let snapshot = snapshot(&flow, None);
            let flow_id = auth_state.flows().insert(flow).await;
            (
                StatusCode::OK,
                Json(FlowResponse {
                    flow_id: Some(flow_id.to_string()),
                    ..snapshot
                }),
            )
                .into_response()
        }
        Err(err) => flow_error_response(&err),
    }
}

/// Submit the one-time code for a pending flow.
#[utoipa::path(
    post,
    path = "/v1/auth/flow/otp",
    request_body = FlowOtpRequest,
    responses(
        (status = 200, description = "Code accepted", body = FlowResponse),
        (status = 400, description = "Validation or provider error", body = String),
        (status = 404, description = "Unknown or expired flow", body = String)
    ),
    tag = "auth"
)]
pub async fn flow_otp(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<FlowOtpRequest>>,
) -> impl IntoResponse {
    let request: FlowOtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let (flow_id, mut flow) = match checkout_flow(&auth_state, &request.flow_id).await {
        Ok(flow) => flow,
        Err(response) => return response,
    };

    let kind = flow.kind();
    match flow.submit_otp(auth_state.provider(), &request.code).await {
        Ok(FlowAdvance::Complete(session)) => {
            // Flow is finished; it is not put back into the store.
            completed_response(&auth_state, kind, flow.stage(), session, "/dashboard")
        }
        Ok(_) => {
            let snapshot = snapshot(&flow, Some(flow_id));
            auth_state.flows().put(flow_id, flow).await;
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        Err(err) => {
            let response = flow_error_response(&err);
            auth_state.flows().put(flow_id, flow).await;
            response
        }
    }
}

/// Re-send the one-time code; the provider invalidates the previous one.
#[utoipa::path(
    post,
    path = "/v1/auth/flow/resend",
    request_body = FlowResendRequest,
    responses(
        (status = 200, description = "Fresh code sent", body = FlowResponse),
        (status = 400, description = "Provider error", body = String),
        (status = 404, description = "Unknown or expired flow", body = String)
    ),
    tag = "auth"
)]
pub async fn flow_resend(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<FlowResendRequest>>,
) -> impl IntoResponse {
    let request: FlowResendRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let (flow_id, mut flow) = match checkout_flow(&auth_state, &request.flow_id).await {
        Ok(flow) => flow,
        Err(response) => return response,
    };

    let result = flow.request_new_code(auth_state.provider()).await;
    let response = match result {
        Ok(_) => (StatusCode::OK, Json(snapshot(&flow, Some(flow_id)))).into_response(),
        Err(err) => flow_error_response(&err),
    };
    auth_state.flows().put(flow_id, flow).await;
    response
}

/// Submit the replacement password for a reset flow.
#[utoipa::path(
    post,
    path = "/v1/auth/flow/password",
    request_body = FlowNewPasswordRequest,
    responses(
        (status = 200, description = "Password accepted, flow complete", body = FlowResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 404, description = "Unknown or expired flow", body = String)
    ),
    tag = "auth"
)]
pub async fn flow_password(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<FlowNewPasswordRequest>>,
) -> impl IntoResponse {
    let request: FlowNewPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let (flow_id, mut flow) = match checkout_flow(&auth_state, &request.flow_id).await {
        Ok(flow) => flow,
        Err(response) => return response,
    };

    let kind = flow.kind();
    match flow.submit_new_password(&request.password, &request.confirm_password) {
        // The reset flow ends at the login page; the recovery session is not
        // turned into cookies since the credential update is not wired yet.
        Ok(FlowAdvance::Complete(_)) => {
            completed_response(&auth_state, kind, flow.stage(), None, "/login")
        }
        Ok(_) => {
            let snapshot = snapshot(&flow, Some(flow_id));
            auth_state.flows().put(flow_id, flow).await;
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        Err(err) => {
            let response = flow_error_response(&err);
            auth_state.flows().put(flow_id, flow).await;
            response
        }
    }
}

async fn checkout_flow(
    auth_state: &AuthState,
    flow_id: &str,
) -> Result<(Uuid, Flow), Response> {
    let flow_id = Uuid::parse_str(flow_id).map_err(|_| {
        (StatusCode::BAD_REQUEST, "Invalid flow id".to_string()).into_response()
    })?;

    match auth_state.flows().take(flow_id).await {
        Some(flow) => Ok((flow_id, flow)),
        None => {
            debug!("Flow {flow_id} not found or expired");
            Err((
                StatusCode::NOT_FOUND,
                "Flow not found or expired".to_string(),
            )
                .into_response())
        }
    }
}

fn snapshot(flow: &Flow, flow_id: Option<Uuid>) -> FlowResponse {
    FlowResponse {
        flow: flow.kind().as_str().to_string(),
        stage: flow.stage().ordinal(),
        flow_id: flow_id.map(|id| id.to_string()),
        masked_email: flow.masked_email().map(ToString::to_string),
        redirect_to: None,
    }
}

fn completed_response(
    auth_state: &AuthState,
    kind: FlowKind,
    stage: crate::flow::Stage,
    session: Option<ProviderSession>,
    redirect_to: &str,
) -> Response {
    let mut response = (
        StatusCode::OK,
        Json(FlowResponse {
            flow: kind.as_str().to_string(),
            stage: stage.ordinal(),
            flow_id: None,
            masked_email: None,
            redirect_to: Some(redirect_to.to_string()),
        }),
    )
        .into_response();

    if let Some(session) = &session {
        cookies::append_session(&mut response, session, auth_state.cookie_settings());
    }

    response
}

fn flow_error_response(err: &FlowError) -> Response {
    let status = match err {
        FlowError::Validation(_) => StatusCode::BAD_REQUEST,
        FlowError::Stage { .. } => StatusCode::CONFLICT,
        // Provider 5xx means the provider is down, not that the input is bad.
        FlowError::Provider(provider_err) => {
            if provider_err.status().is_some_and(|status| status >= 500) {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::BAD_REQUEST
            }
        }
    };
    (status, err.to_string()).into_response()
}
