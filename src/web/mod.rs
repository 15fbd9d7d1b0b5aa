pub mod gate;
pub mod handlers;
pub mod routes;

use crate::{
    config::Config,
    identity::{
        clerk::{self, JwtVerifier},
        helpers::{guest_only, protect},
        SessionVerifier,
    },
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
    Extension, Router,
};
use gate::Gate;
use handlers::{auth_pages, dashboard, health, landing, pages::Pages, seo};
use routes::RouteTable;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, info_span, warn, Level, Span};
use ulid::Ulid;

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub routes: Arc<RouteTable>,
    pub users: Option<clerk::Client>,
    /// Host serving the provider's browser SDK, decoded from the publishable key.
    pub frontend_api: Option<String>,
    pub pages: Pages,
}

impl AppState {
    /// # Errors
    /// Returns an error if the page templates fail to compile.
    pub fn new(
        config: Arc<Config>,
        routes: Arc<RouteTable>,
        users: Option<clerk::Client>,
    ) -> Result<Self> {
        let pages = Pages::new().context("Failed to compile page templates")?;

        let frontend_api = clerk::frontend_api(&config.api.clerk.publishable_key);
        if frontend_api.is_none() {
            warn!("Clerk publishable key could not be decoded, sign-in widgets are disabled");
        }

        Ok(Self {
            config,
            routes,
            users,
            frontend_api,
            pages,
        })
    }
}

/// Build the application router.
///
/// # Errors
/// Returns an error if the configured app URL is not an absolute http(s) URL or the page
/// templates fail to compile.
pub fn app(
    config: Arc<Config>,
    verifier: Arc<dyn SessionVerifier>,
    users: Option<clerk::Client>,
) -> Result<Router> {
    let routes = Arc::new(RouteTable::default());
    let gate = Arc::new(Gate::new(routes.clone(), verifier, &config.app.url)?);

    let response_level = if config.dev.log_api_requests {
        Level::INFO
    } else {
        Level::DEBUG
    };

    let state = Arc::new(AppState::new(config, routes, users)?);

    let guests = guest_only(
        Router::new()
            .route(routes::SIGN_IN_PATH, get(auth_pages::sign_in))
            .route(routes::SIGN_UP_PATH, get(auth_pages::sign_up)),
    );
    let members = protect(Router::new().route(routes::DASHBOARD_PATH, get(dashboard::dashboard)));

    let app = Router::new()
        .route("/", get(landing::landing))
        .route("/health", get(health::health))
        .route("/api/health", get(health::health))
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
        .merge(guests)
        .merge(members)
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(make_span)
                        .on_response(DefaultOnResponse::new().level(response_level)),
                )
                .layer(Extension(state))
                .layer(Extension(gate))
                .layer(middleware::from_fn(gate::gate)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if the session keys cannot be loaded or the server fails to start
pub async fn new(port: u16, config: Config) -> Result<()> {
    let config = Arc::new(config);

    let users = clerk::Client::new(&config.api.clerk)?;
    let verifier = JwtVerifier::discover(&config, &users)
        .await
        .context("Failed to load session verification keys")?;

    let app = app(config, Arc::new(verifier), Some(users))?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gracefully shutdown");

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
