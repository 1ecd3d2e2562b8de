use crate::{
    gate::{self, ExemptPaths, SessionGate},
    provider::AuthProvider,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub(crate) mod handlers;

use handlers::{auth, health, pages};
pub use handlers::auth::{AuthConfig, AuthState};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::flow::flow_start,
        auth::flow::flow_otp,
        auth::flow::flow_resend,
        auth::flow::flow_password,
        auth::oauth::oauth_start,
        auth::oauth::oauth_callback,
        auth::session::session,
        auth::session::logout,
    ),
    components(schemas(
        health::Health,
        auth::types::FlowStartRequest,
        auth::types::FlowOtpRequest,
        auth::types::FlowResendRequest,
        auth::types::FlowNewPasswordRequest,
        auth::types::FlowResponse,
        auth::types::SessionResponse,
    )),
    tags(
        (name = "auth", description = "Authentication flows and sessions"),
        (name = "health", description = "Provider reachability")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the full application router: gated pages, the auth API, and docs.
///
/// # Errors
/// Returns an error when the frontend base URL cannot be parsed into a CORS
/// origin.
pub fn router(config: AuthConfig, provider: Arc<dyn AuthProvider>) -> Result<Router> {
    let auth_state = Arc::new(AuthState::new(config, provider));

    let gate = Arc::new(
        SessionGate::new(
            auth_state.provider_handle(),
            ExemptPaths::new(auth_state.config().exempt_paths().iter().cloned()),
            auth_state.cookie_settings(),
        )
        .with_login_path(auth_state.config().login_path().to_string())
        .with_authenticated_path(auth_state.config().authenticated_path().to_string()),
    );

    // The gate wraps the page routes only; the JSON API, health probe and
    // docs answer without a session. The fallback sits inside the gated
    // router so unknown paths are still challenged for a session.
    let page_routes = Router::new()
        .route("/login", get(pages::login))
        .route("/signup", get(pages::signup))
        .route("/reset-password", get(pages::reset_password))
        .route("/dashboard", get(pages::dashboard))
        .route("/api/auth/callback", get(auth::oauth::oauth_callback))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(gate, gate::enforce));

    let api_routes = Router::new()
        .route("/v1/auth/flow", post(auth::flow::flow_start))
        .route("/v1/auth/flow/otp", post(auth::flow::flow_otp))
        .route("/v1/auth/flow/resend", post(auth::flow::flow_resend))
        .route("/v1/auth/flow/password", post(auth::flow::flow_password))
        .route("/v1/auth/oauth", get(auth::oauth::oauth_start))
        .route("/v1/auth/session", get(auth::session::session))
        .route("/v1/auth/logout", post(auth::session::logout));

    let frontend_origin = frontend_origin(auth_state.config().frontend_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let app = page_routes
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state.clone())),
        )
        .route("/health", get(health::health).options(health::health))
        .layer(Extension(auth_state));

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, config: AuthConfig, provider: Arc<dyn AuthProvider>) -> Result<()> {
    let app = router(config, provider)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_origin_strips_path_and_keeps_port() {
        let origin = frontend_origin("https://app.example.com:8443/some/path");
        assert_eq!(
            origin.ok(),
            Some(HeaderValue::from_static("https://app.example.com:8443"))
        );
    }

    #[test]
    fn frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
    }

    #[test]
    fn openapi_lists_the_auth_paths() {
        let doc = openapi();
        assert!(doc.paths.paths.contains_key("/v1/auth/flow"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
