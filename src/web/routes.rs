//! Route classification.
//!
//! One [`RouteTable`] is the single source of truth for which paths are public. The gate,
//! the auth helpers and the crawler metadata all read from it.

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const SIGN_UP_PATH: &str = "/sign-up";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Landing and marketing pages.
pub const MARKETING_ROUTES: &[&str] = &[
    "/",
    "/about",
    "/pricing",
    "/features",
    "/contact",
    "/privacy",
    "/terms",
];

pub const AUTH_ROUTES: &[&str] = &[SIGN_IN_PATH, SIGN_UP_PATH, "/auth/login", "/auth/signup"];

pub const ASSET_ROUTES: &[&str] = &["/favicon.ico", "/robots.txt", "/sitemap.xml"];

pub const PROTECTED_ROUTES: &[&str] = &[
    DASHBOARD_PATH,
    "/document",
    "/profile",
    "/settings",
    "/billing",
];

pub const PROTECTED_API_ROUTES: &[&str] = &[
    "/api/documents",
    "/api/ai",
    "/api/ocr",
    "/api/payments/create-subscription",
];

pub const PUBLIC_API_ROUTES: &[&str] = &[
    "/api/webhooks/stripe",
    "/api/webhooks/clerk",
    "/api/health",
];

// `[^?]*\.(ext)` prefix semantics: `.woff` also covers `.woff2`, `.doc` covers `.docx`.
const STATIC_EXTENSIONS: &[&str] = &[
    "htm", "css", "js", "jpg", "jpeg", "webp", "png", "gif", "svg", "ttf", "woff", "ico", "csv",
    "doc", "xls", "zip", "webmanifest",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    PublicApi,
    Protected,
    ProtectedApi,
    /// Not listed anywhere; protected by default.
    ImplicitProtected,
}

impl RouteClass {
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public | Self::PublicApi)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    public: Vec<String>,
    public_api: Vec<String>,
    protected: Vec<String>,
    protected_api: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let public = MARKETING_ROUTES
            .iter()
            .chain(AUTH_ROUTES)
            .chain(ASSET_ROUTES)
            .copied();
        Self::new(
            public,
            PUBLIC_API_ROUTES.iter().copied(),
            PROTECTED_ROUTES.iter().copied(),
            PROTECTED_API_ROUTES.iter().copied(),
        )
    }
}

fn owned<'a>(routes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    routes.into_iter().map(ToString::to_string).collect()
}

/// `path == route` or `path` is below `route`. The root only matches itself.
fn matches_route(route: &str, path: &str) -> bool {
    if route == "/" {
        return path == "/";
    }
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl RouteTable {
    #[must_use]
    pub fn new<'a>(
        public: impl IntoIterator<Item = &'a str>,
        public_api: impl IntoIterator<Item = &'a str>,
        protected: impl IntoIterator<Item = &'a str>,
        protected_api: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            public: owned(public),
            public_api: owned(public_api),
            protected: owned(protected),
            protected_api: owned(protected_api),
        }
    }

    /// First matching list wins, checked public first; unlisted paths are protected.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let lists = [
            (&self.public, RouteClass::Public),
            (&self.public_api, RouteClass::PublicApi),
            (&self.protected, RouteClass::Protected),
            (&self.protected_api, RouteClass::ProtectedApi),
        ];

        lists
            .into_iter()
            .find(|(routes, _)| routes.iter().any(|route| matches_route(route, path)))
            .map_or(RouteClass::ImplicitProtected, |(_, class)| class)
    }

    #[must_use]
    pub fn is_public_route(&self, path: &str) -> bool {
        self.classify(path).is_public()
    }

    /// Explicitly listed as protected, page or API.
    #[must_use]
    pub fn is_protected_route(&self, path: &str) -> bool {
        matches!(
            self.classify(path),
            RouteClass::Protected | RouteClass::ProtectedApi
        )
    }

    /// Pages an authenticated user has no business seeing.
    #[must_use]
    pub fn is_auth_page(&self, path: &str) -> bool {
        path == SIGN_IN_PATH || path == SIGN_UP_PATH
    }

    /// Explicitly protected prefixes, pages then API.
    pub fn protected(&self) -> impl Iterator<Item = &str> {
        self.protected
            .iter()
            .chain(&self.protected_api)
            .map(String::as_str)
    }
}

/// Whether the gate makes a decision for `path`.
///
/// Framework internals and static files are skipped; API routes and the root always run.
#[must_use]
pub fn should_gate(path: &str) -> bool {
    if path == "/" || path.starts_with("/api") || path.starts_with("/trpc") {
        return true;
    }

    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.starts_with("_next") {
        return false;
    }

    !has_static_extension(rest)
}

fn has_static_extension(path: &str) -> bool {
    path.match_indices('.').any(|(index, _)| {
        let tail = &path[index + 1..];
        STATIC_EXTENSIONS.iter().any(|ext| {
            tail.strip_prefix(ext)
                .is_some_and(|after| !(*ext == "js" && after.starts_with("on")))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_public_route_is_public() {
        let table = RouteTable::default();
        for route in MARKETING_ROUTES.iter().chain(AUTH_ROUTES).chain(ASSET_ROUTES) {
            assert_eq!(table.classify(route), RouteClass::Public, "{route}");
        }
        for route in PUBLIC_API_ROUTES {
            assert_eq!(table.classify(route), RouteClass::PublicApi, "{route}");
        }
    }

    #[test]
    fn sub_paths_inherit_classification() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/document"), RouteClass::Protected);
        assert_eq!(table.classify("/document/42"), RouteClass::Protected);
        assert_eq!(table.classify("/api/ai/summarize"), RouteClass::ProtectedApi);
        assert_eq!(table.classify("/pricing/teams"), RouteClass::Public);
        assert_eq!(table.classify("/api/webhooks/stripe/retry"), RouteClass::PublicApi);
    }

    #[test]
    fn no_prefix_false_positives() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/documents"), RouteClass::ImplicitProtected);
        assert_eq!(table.classify("/about-us"), RouteClass::ImplicitProtected);
        assert_eq!(table.classify("/sign-inx"), RouteClass::ImplicitProtected);
        assert_eq!(table.classify("/api/healthz"), RouteClass::ImplicitProtected);
        assert!(!table.is_public_route("/about-us"));
    }

    #[test]
    fn root_matches_only_itself() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/"), RouteClass::Public);
        assert_eq!(table.classify("//dashboard"), RouteClass::ImplicitProtected);
        assert_eq!(table.classify("/anything"), RouteClass::ImplicitProtected);
    }

    #[test]
    fn protected_helpers() {
        let table = RouteTable::default();
        assert!(table.is_protected_route("/settings/billing"));
        assert!(table.is_protected_route("/api/ocr"));
        assert!(!table.is_protected_route("/unknown"));
        assert!(!table.is_protected_route("/"));
        assert!(table.is_auth_page("/sign-in"));
        assert!(table.is_auth_page("/sign-up"));
        assert!(!table.is_auth_page("/sign-in/factor-one"));
        assert!(!table.is_auth_page("/auth/login"));
    }

    #[test]
    fn public_wins_over_protected() {
        let table = RouteTable::new(["/shared"], [], ["/shared"], []);
        assert_eq!(table.classify("/shared/item"), RouteClass::Public);
    }

    #[test]
    fn protected_lists_both_kinds() {
        let table = RouteTable::default();
        let protected: Vec<&str> = table.protected().collect();
        assert!(protected.contains(&"/dashboard"));
        assert!(protected.contains(&"/api/payments/create-subscription"));
        assert_eq!(
            protected.len(),
            PROTECTED_ROUTES.len() + PROTECTED_API_ROUTES.len()
        );
    }

    #[test]
    fn matcher_skips_static_files_and_internals() {
        assert!(!should_gate("/_next/static/chunk.js"));
        assert!(!should_gate("/_next/data/build/index.json"));
        assert!(!should_gate("/logo.png"));
        assert!(!should_gate("/fonts/inter.woff2"));
        assert!(!should_gate("/styles/site.css"));
        assert!(!should_gate("/files/report.docx"));
        assert!(!should_gate("/favicon.ico"));
        assert!(!should_gate("/app.jsx"));
    }

    #[test]
    fn matcher_runs_for_pages_api_and_json() {
        assert!(should_gate("/"));
        assert!(should_gate("/dashboard"));
        assert!(should_gate("/document/42"));
        assert!(should_gate("/manifest.json"));
        assert!(should_gate("/api/avatar.png"));
        assert!(should_gate("/trpc/documents.list"));
        assert!(should_gate("/robots.txt"));
    }
}
