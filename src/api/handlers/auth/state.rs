//! Auth state and configuration shared by the flow handlers and the gate.

use std::sync::Arc;
use std::time::Duration;

use crate::flow::FlowStore;
use crate::gate::CookieSettings;
use crate::provider::AuthProvider;

/// Public routes reachable without a session; everything else is protected.
pub const DEFAULT_EXEMPT_PATHS: [&str; 4] =
    ["/login", "/signup", "/reset-password", "/api/auth/callback"];

// Abandoned flows age out of the store after this long.
const DEFAULT_FLOW_TTL_SECONDS: u64 = 15 * 60;

/// Gate redirect targets.
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_AUTHENTICATED_PATH: &str = "/dashboard";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    exempt_paths: Vec<String>,
    flow_ttl_seconds: u64,
    login_path: String,
    authenticated_path: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            exempt_paths: DEFAULT_EXEMPT_PATHS.iter().map(ToString::to_string).collect(),
            flow_ttl_seconds: DEFAULT_FLOW_TTL_SECONDS,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            authenticated_path: DEFAULT_AUTHENTICATED_PATH.to_string(),
        }
    }

    /// Replace the exempt path list entirely.
    #[must_use]
    pub fn with_exempt_paths(mut self, paths: Vec<String>) -> Self {
        self.exempt_paths = paths;
        self
    }

    /// Add paths on top of the defaults.
    #[must_use]
    pub fn with_extra_exempt_paths<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.exempt_paths.extend(paths);
        self
    }

    #[must_use]
    pub fn with_flow_ttl_seconds(mut self, seconds: u64) -> Self {
        self.flow_ttl_seconds = seconds;
        self
    }

    /// Where the gate sends requests that lack a session.
    #[must_use]
    pub fn with_login_path(mut self, path: String) -> Self {
        self.login_path = path;
        self
    }

    /// Where the gate sends authenticated requests landing on public pages.
    #[must_use]
    pub fn with_authenticated_path(mut self, path: String) -> Self {
        self.authenticated_path = path;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn exempt_paths(&self) -> &[String] {
        &self.exempt_paths
    }

    #[must_use]
    pub fn flow_ttl_seconds(&self) -> u64 {
        self.flow_ttl_seconds
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn authenticated_path(&self) -> &str {
        &self.authenticated_path
    }

    /// OAuth redirect target: the frontend's callback route.
    #[must_use]
    pub fn callback_url(&self) -> String {
        let base = self.frontend_base_url.trim_end_matches('/');
        format!("{base}/api/auth/callback")
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    provider: Arc<dyn AuthProvider>,
    flows: FlowStore,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, provider: Arc<dyn AuthProvider>) -> Self {
        let flows = FlowStore::new(Duration::from_secs(config.flow_ttl_seconds()));
        Self {
            config,
            provider,
            flows,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn provider(&self) -> &dyn AuthProvider {
        self.provider.as_ref()
    }

    #[must_use]
    pub fn provider_handle(&self) -> Arc<dyn AuthProvider> {
        Arc::clone(&self.provider)
    }

    #[must_use]
    pub fn flows(&self) -> &FlowStore {
        &self.flows
    }

    #[must_use]
    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.config.session_cookie_secure(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("https://app.pordego.dev".to_string());

        assert_eq!(config.frontend_base_url(), "https://app.pordego.dev");
        assert_eq!(config.exempt_paths().len(), DEFAULT_EXEMPT_PATHS.len());
        assert!(config.exempt_paths().contains(&"/login".to_string()));
        assert_eq!(config.flow_ttl_seconds(), DEFAULT_FLOW_TTL_SECONDS);
        assert_eq!(config.login_path(), "/login");
        assert_eq!(config.authenticated_path(), "/dashboard");
        assert!(config.session_cookie_secure());

        let config = config
            .with_extra_exempt_paths(vec!["/pricing".to_string()])
            .with_flow_ttl_seconds(60)
            .with_login_path("/signin".to_string())
            .with_authenticated_path("/home".to_string());

        assert!(config.exempt_paths().contains(&"/pricing".to_string()));
        assert_eq!(config.flow_ttl_seconds(), 60);
        assert_eq!(config.login_path(), "/signin");
        assert_eq!(config.authenticated_path(), "/home");
    }

    #[test]
    fn callback_url_trims_trailing_slash() {
        let config = AuthConfig::new("https://app.pordego.dev/".to_string());
        assert_eq!(
            config.callback_url(),
            "https://app.pordego.dev/api/auth/callback"
        );
    }

    #[test]
    fn plain_http_frontend_disables_secure_cookies() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        assert!(!config.session_cookie_secure());
    }
}
