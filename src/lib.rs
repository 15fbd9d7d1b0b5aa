//! # Fineprint.ai web gateway
//!
//! `fineprint` serves the Fineprint.ai web surface: the marketing landing page, the
//! hosted sign-in/sign-up pages and the authenticated dashboard.
//!
//! ## Startup
//!
//! The environment is validated exactly once, before the listener binds. Every invalid
//! field is reported together and the process refuses to start.
//!
//! ## Authentication
//!
//! Sessions are owned by the hosted identity provider. The gateway only verifies the
//! session token attached to each request and observes the user id it carries. Every
//! path not explicitly listed as public requires a session; unauthenticated requests are
//! redirected to `/sign-in?redirect_url=<original>`.

pub mod cli;
pub mod config;
pub mod identity;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
