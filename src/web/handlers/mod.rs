pub mod auth_pages;
pub mod dashboard;
pub mod health;
pub mod landing;
pub mod pages;
pub mod seo;

use crate::web::AppState;
use axum::{
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Extension,
};
use minijinja::context;
use std::sync::Arc;
use tracing::error;

/// Turn a rendered page into a response, logging template failures as a 500.
pub fn respond(page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(page) => Html(page).into_response(),
        Err(err) => {
            error!("Failed to render page: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn not_found_page(state: &AppState, path: &str) -> Result<String, minijinja::Error> {
    state.pages.render(
        "not_found.html",
        context! {
            app_name => state.config.app.name,
            description => "The requested page does not exist.",
            path => path,
        },
    )
}

pub async fn not_found(Extension(state): Extension<Arc<AppState>>, uri: Uri) -> Response {
    match not_found_page(&state, uri.path()) {
        Ok(page) => (StatusCode::NOT_FOUND, Html(page)).into_response(),
        Err(err) => respond(Err(err)),
    }
}
