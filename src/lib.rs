//! # Pordego (Authentication Gateway & Session Middleware)
//!
//! `pordego` sits between browsers and a hosted auth provider. It owns two
//! jobs and nothing else:
//!
//! - **Auth flows:** login, signup, and password reset advance through a
//!   strict identity, code verification, new credential stage order. A stage
//!   only advances after the provider confirms the step, and an invalid code
//!   never reaches the provider.
//! - **Session gate:** every page request is checked for a provider-backed
//!   session. Authenticated users are bounced away from the auth pages,
//!   anonymous users are bounced away from everything that is not exempt,
//!   and refreshed sessions are rotated into cookies on the way out.
//!
//! All durable state (users, credentials, one-time codes, sessions) lives on
//! the provider; the gateway keeps only short-lived, in-memory flow state.

pub mod api;
pub mod cli;
pub mod flow;
pub mod gate;
pub mod provider;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
