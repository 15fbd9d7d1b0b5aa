//! Environment loading and validation.
//!
//! [`Env::parse`] reads every expected variable, applies coercions and defaults, and
//! collects *all* field-level failures into one [`EnvError`]. Empty values are treated
//! as unset. Required secrets never fall back to a default.

use regex::Regex;
use secrecy::SecretString;
use std::{fmt, str::FromStr};
use thiserror::Error;
use url::Url;

pub const DEFAULT_APP_NAME: &str = "Fineprint.ai";
pub const DEFAULT_APP_DESCRIPTION: &str = "AI-Powered Legal Document Simplification";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_485_760;
pub const DEFAULT_ALLOWED_FILE_TYPES: &str = "application/pdf,text/plain";
pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com";

/// Deployment environment, `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl AppEnv {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "Invalid enum value. Expected 'development' | 'production' | 'test', received '{other}'"
            )),
        }
    }
}

/// A subscription usage limit: a fixed count or the `unlimited` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Count(u32),
    Unlimited,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl FromStr for Limit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "unlimited" {
            return Ok(Self::Unlimited);
        }
        s.parse::<u32>()
            .map(Self::Count)
            .map_err(|_| format!("Expected number or 'unlimited', received '{s}'"))
    }
}

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Aggregated startup configuration failure.
#[derive(Debug, Error)]
#[error("Environment validation failed:\n{}", render_issues(.issues))]
pub struct EnvError {
    pub issues: Vec<Issue>,
}

impl EnvError {
    /// Whether `field` is among the failed fields.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

fn render_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The validated environment record. Built once at boot, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Env {
    pub app_env: AppEnv,
    pub app_url: String,
    pub app_name: String,
    pub app_description: String,

    pub openai_api_key: SecretString,
    pub openai_model: String,
    pub openai_embedding_model: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,

    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: SecretString,
    pub supabase_db_password: Option<SecretString>,

    pub clerk_publishable_key: String,
    pub clerk_secret_key: SecretString,
    pub clerk_webhook_secret: Option<SecretString>,
    pub clerk_jwt_key: Option<String>,
    pub clerk_api_url: String,

    pub stripe_secret_key: SecretString,
    pub stripe_publishable_key: String,
    pub stripe_webhook_secret: Option<SecretString>,
    pub stripe_price_id_premium: Option<String>,

    pub max_file_size: u64,
    pub allowed_file_types: String,
    pub auto_delete_hours: u32,

    pub freemium_documents_per_month: u32,
    pub freemium_pages_per_document: u32,
    pub premium_documents_per_month: Limit,
    pub premium_pages_per_document: Limit,

    pub nextauth_secret: SecretString,
    pub encryption_key: SecretString,
    pub jwt_secret: SecretString,

    pub sentry_dsn: Option<String>,
    pub sentry_auth_token: Option<SecretString>,
    pub posthog_key: Option<String>,
    pub posthog_host: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<SecretString>,

    pub debug_mode: bool,
    pub log_api_requests: bool,
    pub telemetry_disabled: bool,
}

impl Env {
    /// Validate the process environment.
    ///
    /// # Errors
    /// Returns every invalid or missing field at once.
    pub fn from_process() -> Result<Self, EnvError> {
        Self::parse(|key| std::env::var(key).ok())
    }

    /// Validate variables supplied by `lookup`.
    ///
    /// # Errors
    /// Returns every invalid or missing field at once.
    pub fn parse<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut r = Reader::new(lookup);

        let env = Self {
            app_env: r.value_or("APP_ENV", AppEnv::Development),
            app_url: r.url("NEXT_PUBLIC_APP_URL"),
            app_name: r.string_or("NEXT_PUBLIC_APP_NAME", DEFAULT_APP_NAME),
            app_description: r.string_or("NEXT_PUBLIC_APP_DESCRIPTION", DEFAULT_APP_DESCRIPTION),

            openai_api_key: r.secret("OPENAI_API_KEY", 1, Some("OpenAI API key is required")),
            openai_model: r.string_or("OPENAI_MODEL", "gpt-4-turbo-preview"),
            openai_embedding_model: r.string_or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-large"),
            openai_max_tokens: r.number_or("OPENAI_MAX_TOKENS", 4000),
            openai_temperature: r.temperature("OPENAI_TEMPERATURE", 0.1),

            supabase_url: r.url("NEXT_PUBLIC_SUPABASE_URL"),
            supabase_anon_key: r.required("NEXT_PUBLIC_SUPABASE_ANON_KEY", 1, None),
            supabase_service_role_key: r.secret("SUPABASE_SERVICE_ROLE_KEY", 1, None),
            supabase_db_password: r.optional_secret("SUPABASE_DB_PASSWORD"),

            clerk_publishable_key: r.required("NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY", 1, None),
            clerk_secret_key: r.secret("CLERK_SECRET_KEY", 1, None),
            clerk_webhook_secret: r.optional_secret("CLERK_WEBHOOK_SECRET"),
            clerk_jwt_key: r.optional("CLERK_JWT_KEY"),
            clerk_api_url: r.url_or("CLERK_API_URL", DEFAULT_CLERK_API_URL),

            stripe_secret_key: r.secret("STRIPE_SECRET_KEY", 1, None),
            stripe_publishable_key: r.required("NEXT_PUBLIC_STRIPE_PUBLISHABLE_KEY", 1, None),
            stripe_webhook_secret: r.optional_secret("STRIPE_WEBHOOK_SECRET"),
            stripe_price_id_premium: r.optional("STRIPE_PRICE_ID_PREMIUM"),

            max_file_size: r.number_or("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE),
            allowed_file_types: r.string_or("ALLOWED_FILE_TYPES", DEFAULT_ALLOWED_FILE_TYPES),
            auto_delete_hours: r.number_or("AUTO_DELETE_HOURS", 72),

            freemium_documents_per_month: r.number_or("FREEMIUM_DOCUMENTS_PER_MONTH", 5),
            freemium_pages_per_document: r.number_or("FREEMIUM_PAGES_PER_DOCUMENT", 20),
            premium_documents_per_month: r.value_or("PREMIUM_DOCUMENTS_PER_MONTH", Limit::Unlimited),
            premium_pages_per_document: r.value_or("PREMIUM_PAGES_PER_DOCUMENT", Limit::Unlimited),

            nextauth_secret: r.secret(
                "NEXTAUTH_SECRET",
                32,
                Some("NextAuth secret must be at least 32 characters"),
            ),
            encryption_key: r.secret(
                "ENCRYPTION_KEY",
                32,
                Some("Encryption key must be at least 32 characters"),
            ),
            jwt_secret: r.secret("JWT_SECRET", 1, None),

            sentry_dsn: r.optional_url("NEXT_PUBLIC_SENTRY_DSN"),
            sentry_auth_token: r.optional_secret("SENTRY_AUTH_TOKEN"),
            posthog_key: r.optional("NEXT_PUBLIC_POSTHOG_KEY"),
            posthog_host: r.optional_url("NEXT_PUBLIC_POSTHOG_HOST"),
            smtp_host: r.optional("SMTP_HOST"),
            smtp_port: r.optional_number("SMTP_PORT"),
            smtp_user: r.optional_email("SMTP_USER"),
            smtp_pass: r.optional_secret("SMTP_PASS"),

            debug_mode: r.value_or("DEBUG_MODE", Flag(false)).0,
            log_api_requests: r.value_or("LOG_API_REQUESTS", Flag(false)).0,
            telemetry_disabled: r.value_or("TELEMETRY_DISABLED", Flag(true)).0,
        };

        r.finish(env)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.app_env == AppEnv::Production
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.app_env == AppEnv::Development
    }

    #[must_use]
    pub fn is_test(&self) -> bool {
        self.app_env == AppEnv::Test
    }
}

/// Boolean coercion wrapper so flags share the `FromStr` path with enums and limits.
#[derive(Debug, Clone, Copy)]
struct Flag(bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            "false" | "0" | "no" | "off" => Ok(Self(false)),
            other => Err(format!("Expected boolean, received '{other}'")),
        }
    }
}

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Field reader that records failures instead of stopping at the first one.
struct Reader<F> {
    lookup: F,
    issues: Vec<Issue>,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    const fn new(lookup: F) -> Self {
        Self {
            lookup,
            issues: Vec::new(),
        }
    }

    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(Issue {
            field,
            message: message.into(),
        });
    }

    fn finish(self, env: Env) -> Result<Env, EnvError> {
        if self.issues.is_empty() {
            Ok(env)
        } else {
            Err(EnvError {
                issues: self.issues,
            })
        }
    }

    fn required(&mut self, key: &'static str, min: usize, message: Option<&str>) -> String {
        match self.raw(key) {
            None => {
                self.fail(key, message.unwrap_or("Required"));
                String::new()
            }
            Some(value) if value.chars().count() < min => {
                let message = message.map_or_else(
                    || format!("String must contain at least {min} character(s)"),
                    ToString::to_string,
                );
                self.fail(key, message);
                String::new()
            }
            Some(value) => value,
        }
    }

    fn secret(&mut self, key: &'static str, min: usize, message: Option<&str>) -> SecretString {
        SecretString::from(self.required(key, min, message))
    }

    fn optional(&mut self, key: &'static str) -> Option<String> {
        self.raw(key)
    }

    fn optional_secret(&mut self, key: &'static str) -> Option<SecretString> {
        self.raw(key).map(SecretString::from)
    }

    fn string_or(&mut self, key: &'static str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn check_url(&mut self, key: &'static str, value: String) -> Option<String> {
        if Url::parse(&value).is_ok() {
            Some(value)
        } else {
            self.fail(key, "Invalid url");
            None
        }
    }

    fn url(&mut self, key: &'static str) -> String {
        match self.raw(key) {
            Some(value) => self.check_url(key, value).unwrap_or_default(),
            None => {
                self.fail(key, "Required");
                String::new()
            }
        }
    }

    fn url_or(&mut self, key: &'static str, default: &str) -> String {
        match self.raw(key) {
            Some(value) => self.check_url(key, value).unwrap_or_default(),
            None => default.to_string(),
        }
    }

    fn optional_url(&mut self, key: &'static str) -> Option<String> {
        let value = self.raw(key)?;
        self.check_url(key, value)
    }

    fn optional_email(&mut self, key: &'static str) -> Option<String> {
        let value = self.raw(key)?;
        if valid_email(&value) {
            Some(value)
        } else {
            self.fail(key, "Invalid email");
            None
        }
    }

    fn number_or<T: FromStr>(&mut self, key: &'static str, default: T) -> T {
        match self.raw(key) {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                self.fail(key, format!("Expected number, received '{value}'"));
                default
            }),
            None => default,
        }
    }

    fn optional_number<T: FromStr>(&mut self, key: &'static str) -> Option<T> {
        let value = self.raw(key)?;
        match value.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.fail(key, format!("Expected number, received '{value}'"));
                None
            }
        }
    }

    fn temperature(&mut self, key: &'static str, default: f32) -> f32 {
        let value = self.number_or(key, default);
        if (0.0..=2.0).contains(&value) {
            value
        } else {
            self.fail(key, "Number must be between 0 and 2");
            default
        }
    }

    fn value_or<T>(&mut self, key: &'static str, default: T) -> T
    where
        T: FromStr<Err = String>,
    {
        match self.raw(key) {
            Some(value) => value.parse().unwrap_or_else(|message| {
                self.fail(key, message);
                default
            }),
            None => default,
        }
    }
}
