//! Capability object for the hosted auth provider.
//!
//! Everything durable (users, credentials, OTP codes, sessions) lives on the
//! provider side; this module only shapes requests to it. The gate and the
//! flow handlers hold an `Arc<dyn AuthProvider>` so tests can substitute an
//! in-memory implementation.

use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use url::Url;

pub mod http;

pub use http::HttpAuthProvider;

/// Boxed future returned by provider operations, keeping the trait object safe.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Error reported by the provider; the message is surfaced to the user as-is.
#[derive(Debug, Clone)]
pub struct ProviderError {
    status: Option<u16>,
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "provider error ({status}): {}", self.message),
            None => write!(f, "provider error: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|status| status.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Session issued by the provider, held client-side only as cookies.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Provider-owned user identity.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: Option<String>,
}

/// Token pair as carried by the session cookies.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Result of a session lookup; `rotated` carries a refreshed session that must
/// be re-serialized into response cookies.
#[derive(Debug, Clone, Default)]
pub struct UserLookup {
    pub user: Option<ProviderUser>,
    pub rotated: Option<ProviderSession>,
}

impl UserLookup {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Outcome of a sign-up; the provider returns a session directly when email
/// confirmation is disabled, otherwise the user must verify a code first.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: Option<ProviderUser>,
    pub session: Option<ProviderSession>,
}

/// OAuth identity providers offered on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }
}

impl FromStr for OAuthProvider {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            other => Err(ProviderError::new(format!(
                "unsupported OAuth provider: {other}"
            ))),
        }
    }
}

/// The six SDK operations the original surface exposes, plus the password
/// grant and code exchange that back the login form and the OAuth callback.
pub trait AuthProvider: Send + Sync {
    /// Send a one-time code to the email (passwordless path).
    fn send_otp<'a>(&'a self, email: &'a str) -> ProviderFuture<'a, ()>;

    /// Verify a one-time code previously sent to the email.
    fn verify_otp<'a>(&'a self, email: &'a str, code: &'a str)
        -> ProviderFuture<'a, ProviderSession>;

    /// Create a new user with email and password.
    fn sign_up<'a>(&'a self, email: &'a str, password: &'a str)
        -> ProviderFuture<'a, SignUpOutcome>;

    /// Password grant for an existing user.
    fn sign_in_with_password<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> ProviderFuture<'a, ProviderSession>;

    /// Build the provider authorize URL the browser is redirected to.
    fn authorize_url(&self, provider: OAuthProvider, redirect_to: &str)
        -> Result<Url, ProviderError>;

    /// Exchange the OAuth callback code for a session.
    fn exchange_code<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, ProviderSession>;

    /// Revoke the session on the provider side.
    fn sign_out<'a>(&'a self, tokens: &'a SessionTokens) -> ProviderFuture<'a, ()>;

    /// Resolve the current user from the session tokens, refreshing the
    /// session when the access token has expired.
    fn get_user<'a>(&'a self, tokens: &'a SessionTokens) -> ProviderFuture<'a, UserLookup>;

    /// Reachability probe used by the health endpoint.
    fn health<'a>(&'a self) -> ProviderFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display_includes_status() {
        let err = ProviderError::with_status(422, "Signups not allowed");
        assert_eq!(err.to_string(), "provider error (422): Signups not allowed");
        assert_eq!(err.status(), Some(422));

        let err = ProviderError::new("connection reset");
        assert_eq!(err.to_string(), "provider error: connection reset");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn oauth_provider_parses_case_insensitive() {
        assert_eq!(
            "Google".parse::<OAuthProvider>().ok(),
            Some(OAuthProvider::Google)
        );
        assert_eq!(
            "github".parse::<OAuthProvider>().ok(),
            Some(OAuthProvider::Github)
        );
        assert!("facebook".parse::<OAuthProvider>().is_err());
    }

    #[test]
    fn user_lookup_none_is_empty() {
        let lookup = UserLookup::none();
        assert!(lookup.user.is_none());
        assert!(lookup.rotated.is_none());
    }
}
