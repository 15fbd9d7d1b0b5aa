use super::respond;
use crate::web::AppState;
use axum::{response::Response, Extension};
use minijinja::context;
use std::sync::Arc;

const FEATURES: [(&str, &str); 4] = [
    ("Upload", "Drop in a PDF or text file and we take it from there."),
    ("Analyze", "Key clauses, obligations and risks, pulled out and explained."),
    ("Chat", "Ask questions about the document in plain language."),
    ("Export", "Share a clean summary with your team or your lawyer."),
];

fn page(state: &AppState) -> Result<String, minijinja::Error> {
    let app = &state.config.app;
    state.pages.render(
        "landing.html",
        context! {
            app_name => app.name,
            description => app.description,
            features => FEATURES,
        },
    )
}

pub async fn landing(Extension(state): Extension<Arc<AppState>>) -> Response {
    respond(page(&state))
}
