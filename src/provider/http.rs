//! GoTrue-style HTTP implementation of the provider capability.

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{
    AuthProvider, OAuthProvider, ProviderError, ProviderFuture, ProviderSession, ProviderUser,
    SessionTokens, SignUpOutcome, UserLookup,
};

/// HTTP client for the hosted provider's REST auth API, authenticated with
/// the public API key from the environment.
pub struct HttpAuthProvider {
    base_url: Url,
    api_key: SecretString,
    client: Client,
}

impl HttpAuthProvider {
    /// Build the client; `base_url` is the provider project URL.
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid provider base URL: {base_url}"))?;

        // Url::join drops the last path segment without a trailing slash.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build provider HTTP client")?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|err| ProviderError::new(format!("invalid provider endpoint {path}: {err}")))
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Response, ProviderError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .header("apikey", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from(response).await)
        }
    }

    async fn token_request(
        &self,
        grant_type: &str,
        body: Value,
    ) -> Result<ProviderSession, ProviderError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .client
            .post(url)
            .header("apikey", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        response
            .json::<ProviderSession>()
            .await
            .map_err(ProviderError::from)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .client
            .get(url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        response
            .json::<ProviderUser>()
            .await
            .map_err(ProviderError::from)
    }
}

/// Decode the provider's error body; the message text is shown to the user.
async fn error_from(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| body[*key].as_str().map(str::to_string))
        })
        .unwrap_or_else(|| format!("provider returned HTTP {status}"));

    ProviderError::with_status(status, message)
}

impl AuthProvider for HttpAuthProvider {
    fn send_otp<'a>(&'a self, email: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.post_json(
                "auth/v1/otp",
                json!({ "email": email, "create_user": true }),
            )
            .await?;
            Ok(())
        })
    }

    fn verify_otp<'a>(
        &'a self,
        email: &'a str,
        code: &'a str,
    ) -> ProviderFuture<'a, ProviderSession> {
        Box::pin(async move {
            let response = self
                .post_json(
                    "auth/v1/verify",
                    json!({ "email": email, "token": code, "type": "email" }),
                )
                .await?;

            response
                .json::<ProviderSession>()
                .await
                .map_err(ProviderError::from)
        })
    }

    fn sign_up<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> ProviderFuture<'a, SignUpOutcome> {
        Box::pin(async move {
            let response = self
                .post_json(
                    "auth/v1/signup",
                    json!({ "email": email, "password": password }),
                )
                .await?;

            let body: Value = response.json().await.map_err(ProviderError::from)?;

            // With email confirmation disabled the provider returns the session
            // inline; otherwise only the pending user record comes back.
            if body.get("access_token").is_some() {
                let session: ProviderSession = serde_json::from_value(body.clone())
                    .map_err(|err| ProviderError::new(format!("malformed session: {err}")))?;
                let user = body
                    .get("user")
                    .cloned()
                    .and_then(|user| serde_json::from_value(user).ok());
                Ok(SignUpOutcome {
                    user,
                    session: Some(session),
                })
            } else {
                let user = serde_json::from_value(body).ok();
                Ok(SignUpOutcome {
                    user,
                    session: None,
                })
            }
        })
    }

    fn sign_in_with_password<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> ProviderFuture<'a, ProviderSession> {
        Box::pin(async move {
            self.token_request("password", json!({ "email": email, "password": password }))
                .await
        })
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Url, ProviderError> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to);
        Ok(url)
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, ProviderSession> {
        Box::pin(async move {
            self.token_request("pkce", json!({ "auth_code": code }))
                .await
        })
    }

    fn sign_out<'a>(&'a self, tokens: &'a SessionTokens) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint("auth/v1/logout")?;
            let response = self
                .client
                .post(url)
                .header("apikey", self.api_key.expose_secret())
                .bearer_auth(&tokens.access_token)
                .send()
                .await?;

            // A token the provider no longer recognizes is already signed out.
            if response.status().is_success() || response.status().as_u16() == 401 {
                Ok(())
            } else {
                Err(error_from(response).await)
            }
        })
    }

    fn get_user<'a>(&'a self, tokens: &'a SessionTokens) -> ProviderFuture<'a, UserLookup> {
        Box::pin(async move {
            match self.fetch_user(&tokens.access_token).await {
                Ok(user) => Ok(UserLookup {
                    user: Some(user),
                    rotated: None,
                }),
                Err(err) if err.status() == Some(401) => {
                    let Some(refresh_token) = tokens.refresh_token.as_deref() else {
                        return Ok(UserLookup::none());
                    };
                    debug!("Access token expired, refreshing session");
                    let session = self
                        .token_request(
                            "refresh_token",
                            json!({ "refresh_token": refresh_token }),
                        )
                        .await?;
                    let user = self.fetch_user(&session.access_token).await?;
                    Ok(UserLookup {
                        user: Some(user),
                        rotated: Some(session),
                    })
                }
                Err(err) => Err(err),
            }
        })
    }

    fn health<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint("auth/v1/health")?;
            let response = self
                .client
                .get(url)
                .header("apikey", self.api_key.expose_secret())
                .send()
                .await?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(error_from(response).await)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> HttpAuthProvider {
        HttpAuthProvider::new(
            "https://project.supabase.co",
            SecretString::from("anon-key".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_url() {
        let result = HttpAuthProvider::new("not a url", SecretString::from("k".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn endpoint_preserves_base_path() {
        let provider = HttpAuthProvider::new(
            "https://auth.example.com/tenant",
            SecretString::from("k".to_string()),
        )
        .unwrap();
        let url = provider.endpoint("auth/v1/otp").unwrap();
        assert_eq!(url.as_str(), "https://auth.example.com/tenant/auth/v1/otp");
    }

    #[test]
    fn authorize_url_carries_provider_and_redirect() {
        let url = provider()
            .authorize_url(OAuthProvider::Github, "https://app.example.com/api/auth/callback")
            .unwrap();
        assert_eq!(url.path(), "/auth/v1/authorize");
        assert!(url.query_pairs().any(|(k, v)| k == "provider" && v == "github"));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "redirect_to" && v == "https://app.example.com/api/auth/callback"));
    }
}
