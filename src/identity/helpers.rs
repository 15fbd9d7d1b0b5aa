//! Guards for handlers and sub-routers that need (or must not have) a signed-in user.

use super::{Session, UserId};
use crate::web::routes::{DASHBOARD_PATH, SIGN_IN_PATH};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header::LOCATION, request::Parts, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use url::form_urlencoded;

/// Redirect issued by the guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    location: String,
}

impl AuthRedirect {
    #[must_use]
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Sign-in page, remembering where to come back to.
    #[must_use]
    pub fn sign_in(redirect_to: Option<&str>) -> Self {
        match redirect_to {
            Some(target) => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("redirect_url", target)
                    .finish();
                Self::to(format!("{SIGN_IN_PATH}?{query}"))
            }
            None => Self::to(SIGN_IN_PATH),
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        match HeaderValue::try_from(self.location) {
            Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// The caller's user id, or a redirect to sign-in.
///
/// # Errors
/// Returns [`AuthRedirect::sign_in`] when the session is anonymous.
pub fn require_auth(session: &Session, redirect_to: Option<&str>) -> Result<UserId, AuthRedirect> {
    session
        .user_id()
        .cloned()
        .ok_or_else(|| AuthRedirect::sign_in(redirect_to))
}

#[must_use]
pub fn current_user_id(session: &Session) -> Option<UserId> {
    session.user_id().cloned()
}

#[must_use]
pub fn is_authenticated(session: &Session) -> bool {
    session.is_authenticated()
}

/// Send signed-in users away from guest-only pages, to `redirect_to` or the dashboard.
///
/// # Errors
/// Returns the redirect when the session is authenticated.
pub fn redirect_if_authenticated(
    session: &Session,
    redirect_to: Option<&str>,
) -> Result<(), AuthRedirect> {
    if session.is_authenticated() {
        return Err(AuthRedirect::to(redirect_to.unwrap_or(DASHBOARD_PATH)));
    }
    Ok(())
}

fn session_of(parts: &Parts) -> Session {
    parts.extensions.get::<Session>().cloned().unwrap_or_default()
}

fn path_and_query(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string)
}

/// Extracts the signed-in user or redirects to sign-in with the requested URL attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_of(parts);
        let target = path_and_query(parts);
        require_auth(&session, Some(&target)).map(Self)
    }
}

/// Succeeds only for anonymous callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequireGuest;

#[async_trait]
impl<S> FromRequestParts<S> for RequireGuest
where
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        redirect_if_authenticated(&session_of(parts), None).map(|()| Self)
    }
}

pub async fn require_session(_user: RequireUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

pub async fn require_guest(_guest: RequireGuest, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Every route of `router` requires a signed-in user.
pub fn protect<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn(require_session))
}

/// Every route of `router` is for anonymous visitors only.
pub fn guest_only<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn(require_guest))
}
