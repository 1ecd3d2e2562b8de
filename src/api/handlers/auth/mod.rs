//! Authentication endpoints: flows, social sign-in, session and logout.

pub mod flow;
pub mod oauth;
pub mod session;
pub mod state;
pub mod types;

pub use state::{AuthConfig, AuthState};
