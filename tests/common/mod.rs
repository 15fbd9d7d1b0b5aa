#![allow(dead_code)]

use axum::{body::Body, http::Response};
use fineprint::config::{env::Env, Config};
use http_body_util::BodyExt;
use std::collections::HashMap;

pub const APP_URL: &str = "https://fineprint.test";

pub fn vars() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("NEXT_PUBLIC_APP_URL", APP_URL),
        ("OPENAI_API_KEY", "sk-test-openai"),
        ("NEXT_PUBLIC_SUPABASE_URL", "https://db.supabase.test"),
        ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon-key"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service-role-key"),
        (
            "NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY",
            "pk_test_Y2xlcmsuZmluZXByaW50LnRlc3Qk",
        ),
        ("CLERK_SECRET_KEY", "sk_test_clerk"),
        ("STRIPE_SECRET_KEY", "sk_test_stripe"),
        ("NEXT_PUBLIC_STRIPE_PUBLISHABLE_KEY", "pk_test_stripe"),
        ("NEXTAUTH_SECRET", "0123456789abcdef0123456789abcdef"),
        ("ENCRYPTION_KEY", "fedcba9876543210fedcba9876543210"),
        ("JWT_SECRET", "jwt-secret"),
    ])
}

pub fn config() -> Config {
    config_with(&[])
}

pub fn config_with(extra: &[(&'static str, &'static str)]) -> Config {
    let mut vars = vars();
    vars.extend(extra.iter().copied());
    let env = Env::parse(|key| vars.get(key).map(ToString::to_string)).expect("valid env");
    Config::from_env(env)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
