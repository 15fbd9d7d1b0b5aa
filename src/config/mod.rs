//! Application configuration.
//!
//! [`Env`] is the flat, validated environment record. [`Config`] regroups it by concern
//! and offers the small derived helpers used by handlers (upload limits, file checks,
//! feature toggles).

pub mod env;
pub mod upload;

pub use env::{AppEnv, Env, EnvError, Issue, Limit};
pub use upload::{FileMeta, FileValidation};

use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: &'static str,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub embedding_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: SecretString,
    pub db_password: Option<SecretString>,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub publishable_key: String,
    pub secret_key: SecretString,
    pub webhook_secret: Option<SecretString>,
    pub premium_price_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClerkConfig {
    pub publishable_key: String,
    pub secret_key: SecretString,
    pub webhook_secret: Option<SecretString>,
    /// PEM public key for networkless session verification.
    pub jwt_key: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub openai: OpenAiConfig,
    pub supabase: SupabaseConfig,
    pub stripe: StripeConfig,
    pub clerk: ClerkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentsConfig {
    pub max_file_size: u64,
    pub allowed_types: Vec<String>,
    pub auto_delete_hours: u32,
}

impl DocumentsConfig {
    #[must_use]
    pub fn is_type_allowed(&self, mime: &str) -> bool {
        self.allowed_types.iter().any(|allowed| allowed == mime)
    }

    #[must_use]
    pub const fn is_size_allowed(&self, size: u64) -> bool {
        size <= self.max_file_size
    }
}

/// Document and page allowances of one subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLimits {
    pub documents_per_month: Limit,
    pub pages_per_document: Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitsConfig {
    pub freemium: UsageLimits,
    pub premium: UsageLimits,
}

impl LimitsConfig {
    #[must_use]
    pub const fn for_tier(&self, is_premium: bool) -> UsageLimits {
        if is_premium {
            self.premium
        } else {
            self.freemium
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub nextauth_secret: SecretString,
    pub encryption_key: SecretString,
    pub jwt_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub auth_token: Option<SecretString>,
}

#[derive(Debug, Clone)]
pub struct PosthogConfig {
    pub key: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<SecretString>,
}

#[derive(Debug, Clone)]
pub struct ServicesConfig {
    pub sentry: SentryConfig,
    pub posthog: PosthogConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevConfig {
    pub debug: bool,
    pub log_api_requests: bool,
    pub telemetry_disabled: bool,
}

/// Optional external integrations that can be switched on by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Sentry,
    Posthog,
    Smtp,
}

/// Limits that apply to a single upload for a given tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub documents_per_month: Limit,
    pub pages_per_document: Limit,
    pub max_file_size: u64,
    pub allowed_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub app: AppConfig,
    pub api: ApiConfig,
    pub documents: DocumentsConfig,
    pub limits: LimitsConfig,
    pub security: SecurityConfig,
    pub services: ServicesConfig,
    pub dev: DevConfig,
}

impl Config {
    /// Validate the process environment and build the grouped configuration.
    ///
    /// # Errors
    /// Returns every invalid or missing environment field at once.
    pub fn load() -> Result<Self, EnvError> {
        Env::from_process().map(Self::from_env)
    }

    #[must_use]
    pub fn from_env(env: Env) -> Self {
        let allowed_types = env
            .allowed_file_types
            .split(',')
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .map(ToString::to_string)
            .collect();

        Self {
            app_env: env.app_env,
            app: AppConfig {
                name: env.app_name,
                description: env.app_description,
                url: env.app_url,
                version: env!("CARGO_PKG_VERSION"),
            },
            api: ApiConfig {
                openai: OpenAiConfig {
                    api_key: env.openai_api_key,
                    model: env.openai_model,
                    embedding_model: env.openai_embedding_model,
                    max_tokens: env.openai_max_tokens,
                    temperature: env.openai_temperature,
                },
                supabase: SupabaseConfig {
                    url: env.supabase_url,
                    anon_key: env.supabase_anon_key,
                    service_role_key: env.supabase_service_role_key,
                    db_password: env.supabase_db_password,
                },
                stripe: StripeConfig {
                    publishable_key: env.stripe_publishable_key,
                    secret_key: env.stripe_secret_key,
                    webhook_secret: env.stripe_webhook_secret,
                    premium_price_id: env.stripe_price_id_premium,
                },
                clerk: ClerkConfig {
                    publishable_key: env.clerk_publishable_key,
                    secret_key: env.clerk_secret_key,
                    webhook_secret: env.clerk_webhook_secret,
                    jwt_key: env.clerk_jwt_key,
                    api_url: env.clerk_api_url,
                },
            },
            documents: DocumentsConfig {
                max_file_size: env.max_file_size,
                allowed_types,
                auto_delete_hours: env.auto_delete_hours,
            },
            limits: LimitsConfig {
                freemium: UsageLimits {
                    documents_per_month: Limit::Count(env.freemium_documents_per_month),
                    pages_per_document: Limit::Count(env.freemium_pages_per_document),
                },
                premium: UsageLimits {
                    documents_per_month: env.premium_documents_per_month,
                    pages_per_document: env.premium_pages_per_document,
                },
            },
            security: SecurityConfig {
                nextauth_secret: env.nextauth_secret,
                encryption_key: env.encryption_key,
                jwt_secret: env.jwt_secret,
            },
            services: ServicesConfig {
                sentry: SentryConfig {
                    dsn: env.sentry_dsn,
                    auth_token: env.sentry_auth_token,
                },
                posthog: PosthogConfig {
                    key: env.posthog_key,
                    host: env.posthog_host,
                },
                smtp: SmtpConfig {
                    host: env.smtp_host,
                    port: env.smtp_port,
                    user: env.smtp_user,
                    pass: env.smtp_pass,
                },
            },
            dev: DevConfig {
                debug: env.debug_mode,
                log_api_requests: env.log_api_requests,
                telemetry_disabled: env.telemetry_disabled,
            },
        }
    }

    /// Absolute URL of an API path, e.g. `api_url("health")`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        let base = self.app.url.trim_end_matches('/');
        let separator = if path.starts_with('/') { "" } else { "/" };
        format!("{base}/api{separator}{path}")
    }

    /// True if any credential or setting of the integration is present.
    #[must_use]
    pub fn is_feature_enabled(&self, service: Service) -> bool {
        let services = &self.services;
        match service {
            Service::Sentry => services.sentry.dsn.is_some() || services.sentry.auth_token.is_some(),
            Service::Posthog => services.posthog.key.is_some() || services.posthog.host.is_some(),
            Service::Smtp => {
                services.smtp.host.is_some()
                    || services.smtp.port.is_some_and(|port| port != 0)
                    || services.smtp.user.is_some()
                    || services.smtp.pass.is_some()
            }
        }
    }

    #[must_use]
    pub const fn rate_limit(&self, is_premium: bool) -> UsageLimits {
        self.limits.for_tier(is_premium)
    }

    #[must_use]
    pub fn upload_limits(&self, is_premium: bool) -> UploadLimits {
        let tier = self.limits.for_tier(is_premium);
        UploadLimits {
            documents_per_month: tier.documents_per_month,
            pages_per_document: tier.pages_per_document,
            max_file_size: self.documents.max_file_size,
            allowed_types: self.documents.allowed_types.clone(),
        }
    }

    #[must_use]
    pub fn is_file_type_allowed(&self, mime: &str) -> bool {
        self.documents.is_type_allowed(mime)
    }

    #[must_use]
    pub const fn is_file_size_allowed(&self, size: u64) -> bool {
        self.documents.is_size_allowed(size)
    }

    #[must_use]
    pub fn validate_file_upload(&self, file: &FileMeta) -> FileValidation {
        upload::validate(&self.documents, file)
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

    /// Non-secret settings for startup logs and `fineprint check`.
    #[must_use]
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let enabled = |service: Service| {
            if self.is_feature_enabled(service) {
                "enabled".to_string()
            } else {
                "disabled".to_string()
            }
        };
        let tier = |limits: UsageLimits| {
            format!(
                "{} documents/month, {} pages/document",
                limits.documents_per_month, limits.pages_per_document
            )
        };
        let session_keys = if self.api.clerk.jwt_key.is_some() {
            "CLERK_JWT_KEY".to_string()
        } else {
            format!("{}/v1/jwks", self.api.clerk.api_url.trim_end_matches('/'))
        };

        vec![
            ("app_env", self.app_env.as_str().to_string()),
            ("app_name", self.app.name.clone()),
            ("app_url", self.app.url.clone()),
            ("version", self.app.version.to_string()),
            ("openai_model", self.api.openai.model.clone()),
            ("supabase_url", self.api.supabase.url.clone()),
            ("session_keys", session_keys),
            ("max_file_size", self.documents.max_file_size.to_string()),
            ("allowed_types", self.documents.allowed_types.join(",")),
            (
                "auto_delete_hours",
                self.documents.auto_delete_hours.to_string(),
            ),
            ("freemium", tier(self.limits.freemium)),
            ("premium", tier(self.limits.premium)),
            ("sentry", enabled(Service::Sentry)),
            ("posthog", enabled(Service::Posthog)),
            ("smtp", enabled(Service::Smtp)),
            ("debug", self.dev.debug.to_string()),
            ("log_api_requests", self.dev.log_api_requests.to_string()),
        ]
    }
}
