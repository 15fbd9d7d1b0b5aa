//! Compiled page templates.
//!
//! Names ending in `.html` or `.xml` are HTML-escaped, `robots.txt` is rendered verbatim.

use minijinja::Environment;
use serde::Serialize;

const TEMPLATES: [(&str, &str); 7] = [
    ("layout.html", include_str!("../templates/layout.html")),
    ("landing.html", include_str!("../templates/landing.html")),
    ("auth.html", include_str!("../templates/auth.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
    ("robots.txt", include_str!("../templates/robots.txt")),
    ("sitemap.xml", include_str!("../templates/sitemap.xml")),
];

#[derive(Debug, Clone)]
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    /// # Errors
    /// Returns an error if a template fails to parse.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// # Errors
    /// Returns an error if `name` is unknown or rendering fails.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}
