//! Edge session gate.
//!
//! Runs before page routes: resolves the current user from the session
//! cookies, redirects unauthenticated requests away from protected paths and
//! authenticated requests away from the public auth pages, and persists any
//! rotated session onto the outgoing response. Provider failures during the
//! lookup are treated as "no user" so protected routes stay protected.

use axum::{
    extract::{Request, State},
    http::{
        header::{HOST, LOCATION},
        HeaderMap, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::provider::{AuthProvider, ProviderUser, UserLookup};

pub mod cookies;

pub use cookies::CookieSettings;

/// Routes reachable without a session. Membership is an exact string match;
/// a path not literally listed is protected.
#[derive(Debug, Clone)]
pub struct ExemptPaths {
    paths: HashSet<String>,
}

impl ExemptPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

/// The authenticated user, inserted into request extensions for handlers
/// behind the gate.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub ProviderUser);

/// State for the gate middleware.
pub struct SessionGate {
    provider: Arc<dyn AuthProvider>,
    exempt: ExemptPaths,
    settings: CookieSettings,
    login_path: String,
    authenticated_path: String,
}

impl SessionGate {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>, exempt: ExemptPaths, settings: CookieSettings) -> Self {
        Self {
            provider,
            exempt,
            settings,
            login_path: "/login".to_string(),
            authenticated_path: "/dashboard".to_string(),
        }
    }

    #[must_use]
    pub fn with_login_path(mut self, path: String) -> Self {
        self.login_path = path;
        self
    }

    #[must_use]
    pub fn with_authenticated_path(mut self, path: String) -> Self {
        self.authenticated_path = path;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateDecision {
    PassThrough,
    RedirectToLogin,
    RedirectToAuthenticated,
}

const fn decide(user_present: bool, path_exempt: bool) -> GateDecision {
    match (user_present, path_exempt) {
        (false, false) => GateDecision::RedirectToLogin,
        (true, true) => GateDecision::RedirectToAuthenticated,
        _ => GateDecision::PassThrough,
    }
}

/// Middleware entry point, layered over the page routes with
/// `axum::middleware::from_fn_with_state`.
pub async fn enforce(
    State(gate): State<Arc<SessionGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let lookup = match cookies::read_session(request.headers()) {
        Some(tokens) => match gate.provider.get_user(&tokens).await {
            Ok(lookup) => lookup,
            // Fail closed: an unreachable provider means no user.
            Err(err) => {
                debug!("Session lookup failed, treating request as unauthenticated: {err}");
                UserLookup::none()
            }
        },
        None => UserLookup::none(),
    };

    let path = request.uri().path().to_string();
    let origin = request_origin(request.headers());
    let decision = decide(lookup.user.is_some(), gate.exempt.contains(&path));

    let mut response = match decision {
        GateDecision::PassThrough => {
            if let Some(user) = lookup.user.clone() {
                request.extensions_mut().insert(CurrentUser(user));
            }
            next.run(request).await
        }
        GateDecision::RedirectToLogin => redirect(origin.as_deref(), &gate.login_path),
        GateDecision::RedirectToAuthenticated => {
            redirect(origin.as_deref(), &gate.authenticated_path)
        }
    };

    // A rotated session is persisted on every outcome, redirects included.
    if let Some(rotated) = &lookup.rotated {
        cookies::append_session(&mut response, rotated, gate.settings);
    }

    response
}

/// Reconstruct the request origin for absolute redirects, honoring the proxy
/// protocol header. Falls back to a relative redirect when the host is
/// unknown.
fn request_origin(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    Some(format!("{scheme}://{host}"))
}

fn redirect(origin: Option<&str>, path: &str) -> Response {
    let location = match origin {
        Some(origin) => format!("{origin}{path}"),
        None => path.to_string(),
    };
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}
