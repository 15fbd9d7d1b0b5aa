//! Sign-in and sign-up pages. The provider's browser SDK renders the actual forms.

use super::respond;
use crate::web::{
    routes::{DASHBOARD_PATH, SIGN_IN_PATH, SIGN_UP_PATH},
    AppState,
};
use axum::{extract::Query, response::Response, Extension};
use minijinja::context;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    redirect_url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Widget {
    SignIn,
    SignUp,
}

impl Widget {
    const fn title(self) -> &'static str {
        match self {
            Self::SignIn => "Sign in",
            Self::SignUp => "Create your account",
        }
    }

    const fn mount(self) -> &'static str {
        match self {
            Self::SignIn => "mountSignIn",
            Self::SignUp => "mountSignUp",
        }
    }

    const fn alternate(self) -> (&'static str, &'static str) {
        match self {
            Self::SignIn => (SIGN_UP_PATH, "No account yet? Sign up"),
            Self::SignUp => (SIGN_IN_PATH, "Already have an account? Sign in"),
        }
    }
}

/// Post-auth target as a local path. Targets on other origins are dropped.
fn local_target(app_url: &str, target: &str) -> Option<String> {
    if target.starts_with('/') {
        return (!target.starts_with("//")).then(|| target.to_string());
    }

    let app = Url::parse(app_url).ok()?;
    let target = Url::parse(target).ok()?;
    if target.origin() != app.origin() {
        return None;
    }

    Some(match target.query() {
        Some(query) => format!("{}?{query}", target.path()),
        None => target.path().to_string(),
    })
}

fn render(
    state: &AppState,
    widget: Widget,
    redirect_url: Option<&str>,
) -> Result<String, minijinja::Error> {
    let app = &state.config.app;
    let (alternate_href, alternate_text) = widget.alternate();
    let after = redirect_url
        .and_then(|target| local_target(&app.url, target))
        .unwrap_or_else(|| DASHBOARD_PATH.to_string());

    state.pages.render(
        "auth.html",
        context! {
            app_name => app.name,
            description => app.description,
            title => widget.title(),
            frontend_api => state.frontend_api,
            publishable_key => state.config.api.clerk.publishable_key,
            mount => widget.mount(),
            alternate_href => alternate_href,
            alternate_text => alternate_text,
            options => context! {
                fallbackRedirectUrl => after,
                signInUrl => SIGN_IN_PATH,
                signUpUrl => SIGN_UP_PATH,
            },
        },
    )
}

pub async fn sign_in(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<AuthQuery>,
) -> Response {
    respond(render(&state, Widget::SignIn, query.redirect_url.as_deref()))
}

pub async fn sign_up(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<AuthQuery>,
) -> Response {
    respond(render(&state, Widget::SignUp, query.redirect_url.as_deref()))
}
