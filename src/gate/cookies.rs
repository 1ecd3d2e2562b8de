//! Session cookie serialization for the provider token pair.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use axum::response::Response;
use tracing::error;

use crate::provider::{ProviderSession, SessionTokens};

pub const ACCESS_COOKIE_NAME: &str = "pordego-access-token";
pub const REFRESH_COOKIE_NAME: &str = "pordego-refresh-token";

// Refresh tokens outlive access tokens; the provider enforces real expiry.
const REFRESH_COOKIE_MAX_AGE_SECONDS: u64 = 60 * 60 * 24 * 30;

#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    /// Only mark cookies secure when the frontend is served over HTTPS.
    pub secure: bool,
}

/// Read the session token pair from the request cookies.
#[must_use]
pub fn read_session(headers: &HeaderMap) -> Option<SessionTokens> {
    let access_token = cookie_value(headers, ACCESS_COOKIE_NAME)?;
    let refresh_token = cookie_value(headers, REFRESH_COOKIE_NAME);
    Some(SessionTokens {
        access_token,
        refresh_token,
    })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next().map(str::trim);
        let val = parts.next().map(str::trim);
        if key == Some(name) {
            return val.map(ToString::to_string);
        }
    }
    None
}

/// Build `Set-Cookie` values serializing the session.
///
/// # Errors
/// Returns an error if a token is not a valid header value.
pub fn session_cookies(
    session: &ProviderSession,
    settings: CookieSettings,
) -> Result<Vec<HeaderValue>, InvalidHeaderValue> {
    Ok(vec![
        build_cookie(
            ACCESS_COOKIE_NAME,
            &session.access_token,
            session.expires_in,
            settings,
        )?,
        build_cookie(
            REFRESH_COOKIE_NAME,
            &session.refresh_token,
            REFRESH_COOKIE_MAX_AGE_SECONDS,
            settings,
        )?,
    ])
}

/// Build `Set-Cookie` values that clear the session on sign-out.
#[must_use]
pub fn clear_session_cookies(settings: CookieSettings) -> Vec<HeaderValue> {
    [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME]
        .iter()
        .filter_map(|name| build_cookie(name, "", 0, settings).ok())
        .collect()
}

/// Append the (possibly rotated) session onto an outgoing response.
pub fn append_session(response: &mut Response, session: &ProviderSession, settings: CookieSettings) {
    match session_cookies(session, settings) {
        Ok(cookies) => {
            for cookie in cookies {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
        }
        Err(err) => {
            error!("Failed to serialize session cookies: {err}");
        }
    }
}

fn build_cookie(
    name: &str,
    value: &str,
    max_age: u64,
    settings: CookieSettings,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if settings.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ProviderSession {
        ProviderSession {
            access_token: "access-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            expires_in: 3600,
        }
    }

    #[test]
    fn read_session_parses_both_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static(
                "pordego-access-token=abc; other=1; pordego-refresh-token=def",
            ),
        );

        let tokens = read_session(&headers).unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.refresh_token.as_deref(), Some("def"));
    }

    #[test]
    fn read_session_requires_access_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("pordego-refresh-token=def"),
        );
        assert!(read_session(&headers).is_none());

        let headers = HeaderMap::new();
        assert!(read_session(&headers).is_none());
    }

    #[test]
    fn session_cookies_are_http_only_and_lax() {
        let cookies = session_cookies(&session(), CookieSettings { secure: false }).unwrap();
        assert_eq!(cookies.len(), 2);

        let access = cookies[0].to_str().unwrap();
        assert!(access.starts_with("pordego-access-token=access-token"));
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("SameSite=Lax"));
        assert!(access.contains("Max-Age=3600"));
        assert!(!access.contains("Secure"));
    }

    #[test]
    fn secure_flag_follows_settings() {
        let cookies = session_cookies(&session(), CookieSettings { secure: true }).unwrap();
        assert!(cookies[0].to_str().unwrap().contains("; Secure"));
    }

    #[test]
    fn clear_cookies_expire_immediately() {
        let cookies = clear_session_cookies(CookieSettings { secure: false });
        assert_eq!(cookies.len(), 2);
        for cookie in cookies {
            assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
        }
    }
}
