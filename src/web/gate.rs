//! Request-level authentication gate.
//!
//! Every request is identified once. The resulting [`Session`] lands in the request
//! extensions; the gate then decides whether the request may continue or must be
//! redirected to sign-in (anonymous on a protected path) or to the dashboard (signed in
//! on a sign-in/sign-up page).

use super::routes::{should_gate, RouteTable, DASHBOARD_PATH, SIGN_IN_PATH};
use crate::identity::{Session, SessionVerifier, UserId};
use anyhow::{bail, Context, Result};
use axum::{
    extract::Request,
    http::{header::LOCATION, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use std::sync::Arc;
use tracing::{debug, error};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToSignIn,
    RedirectToDashboard,
}

/// Decide what happens to a request for `path` made by `user`.
#[must_use]
pub fn decide(routes: &RouteTable, path: &str, user: Option<&UserId>) -> Decision {
    match user {
        None if !routes.is_public_route(path) => Decision::RedirectToSignIn,
        Some(_) if routes.is_auth_page(path) => Decision::RedirectToDashboard,
        _ => Decision::Allow,
    }
}

/// `<app_url>/sign-in?redirect_url=<original>`
#[must_use]
pub fn sign_in_location(app_url: &Url, original: &str) -> String {
    let mut location = app_url.clone();
    location.set_path(SIGN_IN_PATH);
    location.set_query(None);
    location
        .query_pairs_mut()
        .append_pair("redirect_url", original);
    location.into()
}

#[must_use]
pub fn dashboard_location(app_url: &Url) -> String {
    let mut location = app_url.clone();
    location.set_path(DASHBOARD_PATH);
    location.set_query(None);
    location.into()
}

pub struct Gate {
    routes: Arc<RouteTable>,
    verifier: Arc<dyn SessionVerifier>,
    app_url: Url,
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("routes", &self.routes)
            .field("app_url", &self.app_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Gate {
    /// # Errors
    /// Returns an error if `app_url` is not an absolute http(s) URL.
    pub fn new(
        routes: Arc<RouteTable>,
        verifier: Arc<dyn SessionVerifier>,
        app_url: &str,
    ) -> Result<Self> {
        let app_url =
            Url::parse(app_url).with_context(|| format!("Invalid app URL: {app_url}"))?;
        if app_url.cannot_be_a_base() || !matches!(app_url.scheme(), "http" | "https") {
            bail!("App URL must be an absolute http(s) URL: {app_url}");
        }

        Ok(Self {
            routes,
            verifier,
            app_url,
        })
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Absolute URL of the request as seen through the public app origin.
    #[must_use]
    pub fn original_url(&self, uri: &Uri) -> String {
        let mut url = self.app_url.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        url.into()
    }

    fn redirect(&self, decision: Decision, uri: &Uri) -> Option<String> {
        match decision {
            Decision::Allow => None,
            Decision::RedirectToSignIn => {
                Some(sign_in_location(&self.app_url, &self.original_url(uri)))
            }
            Decision::RedirectToDashboard => Some(dashboard_location(&self.app_url)),
        }
    }
}

/// Identify the caller, store the session and enforce the route decision.
pub async fn gate(Extension(gate): Extension<Arc<Gate>>, mut request: Request, next: Next) -> Response {
    let session = Session::from(gate.verifier.identify(request.headers()));
    let path = request.uri().path().to_string();

    let decision = if should_gate(&path) {
        decide(&gate.routes, &path, session.user_id())
    } else {
        Decision::Allow
    };

    debug!(
        path = %path,
        authenticated = session.is_authenticated(),
        ?decision,
        "gate"
    );

    if let Some(location) = gate.redirect(decision, request.uri()) {
        return match HeaderValue::try_from(location) {
            Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
            Err(err) => {
                error!("Failed to build redirect location: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
    }

    request.extensions_mut().insert(session);
    next.run(request).await
}
