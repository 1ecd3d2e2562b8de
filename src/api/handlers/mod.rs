//! Route handlers for the gateway.
//!
//! `auth` drives the multi-stage flows and session endpoints, `pages` serves
//! the gated page documents, and `health` probes the upstream provider.

pub mod auth;
pub mod health;
pub mod pages;
