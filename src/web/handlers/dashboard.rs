use super::respond;
use crate::{
    config::upload::rounded_mib,
    identity::{helpers::RequireUser, Session},
    web::AppState,
};
use axum::{response::Response, Extension};
use minijinja::context;
use std::sync::Arc;

fn page(state: &AppState, name: &str) -> Result<String, minijinja::Error> {
    // Billing is not wired in yet; every account sees the freemium tier.
    let limits = state.config.upload_limits(false);

    state.pages.render(
        "dashboard.html",
        context! {
            app_name => state.config.app.name,
            description => state.config.app.description,
            name => name,
            documents_per_month => limits.documents_per_month.to_string(),
            pages_per_document => limits.pages_per_document.to_string(),
            max_file_size_mb => rounded_mib(limits.max_file_size),
            allowed_types => limits.allowed_types,
        },
    )
}

pub async fn dashboard(
    Extension(state): Extension<Arc<AppState>>,
    RequireUser(user_id): RequireUser,
    session: Session,
) -> Response {
    let name = match &state.users {
        Some(users) => users
            .current_user(&session)
            .await
            .map_or_else(|| user_id.to_string(), |user| user.display_name()),
        None => user_id.to_string(),
    };

    respond(page(&state, &name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::tests::test_config,
        identity::UserId,
        web::{routes::RouteTable, tests::test_state},
    };
    use axum::http::StatusCode;

    #[tokio::test]
    async fn greets_user_with_limits() {
        let user = UserId::new("user_2abc");
        let response = dashboard(
            Extension(test_state()),
            RequireUser(user.clone()),
            Session::authenticated(user),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let page = page(&test_state(), "user_2abc").expect("dashboard");
        assert!(page.contains("<title>Dashboard | Fineprint.ai</title>"));
        assert!(page.contains("<h1>Welcome back, user_2abc</h1>"));
        assert!(page.contains("<li>Documents per month: 5</li>"));
        assert!(page.contains("<li>Pages per document: 20</li>"));
        assert!(page.contains("<li>Maximum file size: 10MB</li>"));
        assert!(page.contains("Accepted formats: application"));
    }

    #[test]
    fn file_size_matches_upload_message() {
        let mut config = test_config();
        config.documents.max_file_size = 5_000_000;
        let state = AppState::new(Arc::new(config), Arc::new(RouteTable::default()), None)
            .expect("state");

        let page = page(&state, "user_2abc").expect("dashboard");
        assert!(page.contains("<li>Maximum file size: 5MB</li>"));
        assert_eq!(
            state.config.validate_file_upload(&crate::config::upload::FileMeta::new(
                5_000_001,
                "application/pdf"
            ))
            .errors,
            vec!["File size must be less than 5MB"]
        );
    }

    #[test]
    fn names_are_escaped() {
        let page = page(&test_state(), "<b>Mallory</b>").expect("dashboard");
        assert!(!page.contains("<b>Mallory"));
        assert!(page.contains("&lt;b&gt;Mallory"));
    }
}
