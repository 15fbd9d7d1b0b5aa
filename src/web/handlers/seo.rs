//! Crawler metadata.

use super::respond;
use crate::web::{routes::MARKETING_ROUTES, AppState};
use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Extension,
};
use minijinja::context;
use std::sync::Arc;

fn base_url(state: &AppState) -> &str {
    state.config.app.url.trim_end_matches('/')
}

fn with_content_type(content_type: &'static str, page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(body) => ([(CONTENT_TYPE, content_type)], body).into_response(),
        Err(err) => respond(Err(err)),
    }
}

fn robots_txt(state: &AppState) -> Result<String, minijinja::Error> {
    let disallow: Vec<&str> = state.routes.protected().collect();
    state.pages.render(
        "robots.txt",
        context! {
            disallow => disallow,
            base_url => base_url(state),
        },
    )
}

fn sitemap_xml(state: &AppState) -> Result<String, minijinja::Error> {
    let base = base_url(state);
    let locations: Vec<String> = MARKETING_ROUTES
        .iter()
        .map(|route| format!("{base}{route}"))
        .collect();
    state
        .pages
        .render("sitemap.xml", context! { locations => locations })
}

pub async fn robots(Extension(state): Extension<Arc<AppState>>) -> Response {
    with_content_type("text/plain; charset=utf-8", robots_txt(&state))
}

pub async fn sitemap(Extension(state): Extension<Arc<AppState>>) -> Response {
    with_content_type("application/xml", sitemap_xml(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::tests::test_state;
    use http_body_util::BodyExt;

    async fn text(response: Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn robots_disallows_protected_routes() {
        let response = robots(Extension(test_state())).await;
        assert_eq!(
            response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/plain; charset=utf-8")
        );
        let body = text(response).await;
        assert!(body.starts_with("User-agent: *\nAllow: /\n"));
        assert!(body.contains("Disallow: /dashboard\n"));
        assert!(body.contains("Disallow: /api/documents\n"));
        assert!(body.ends_with("Sitemap: https://fineprint.test/sitemap.xml\n"));
    }

    #[tokio::test]
    async fn sitemap_lists_marketing_pages() {
        let response = sitemap(Extension(test_state())).await;
        assert_eq!(
            response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/xml")
        );
        let body = text(response).await;
        assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(body.contains("pricing</loc>"));
        assert!(!body.contains("dashboard"));
        assert_eq!(body.matches("<url>").count(), MARKETING_ROUTES.len());
    }
}
