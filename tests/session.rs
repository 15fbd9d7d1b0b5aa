mod common;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, HeaderValue, Request, StatusCode,
    },
};
use common::{body_text, config, APP_URL};
use fineprint::{
    identity::{clerk::JwtVerifier, SessionVerifier},
    web,
};
use jsonwebtoken::{encode, jwk::JwkSet, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

const PRIVATE_KEY: &str = include_str!("fixtures/session_private.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/session_public.pem");
const OTHER_PRIVATE_KEY: &str = include_str!("fixtures/other_private.pem");

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn sign(claims: &Value, private_key: &str) -> String {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).expect("private key");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("ins_test".to_string());
    encode(&header, claims, &key).expect("token")
}

fn claims(sub: &str) -> Value {
    json!({
        "sub": sub,
        "iat": now(),
        "nbf": now() - 10,
        "exp": now() + 60,
        "azp": APP_URL,
        "sid": "sess_123",
    })
}

fn verifier() -> JwtVerifier {
    JwtVerifier::from_pem(PUBLIC_KEY, vec![APP_URL.to_string()]).expect("verifier")
}

#[test]
fn valid_token_yields_subject() {
    let token = sign(&claims("user_2abc"), PRIVATE_KEY);
    let user = verifier().verify(&token).expect("valid token");
    assert_eq!(user.as_str(), "user_2abc");
}

#[test]
fn token_without_azp_is_accepted() {
    let token = sign(
        &json!({ "sub": "user_1", "exp": now() + 60 }),
        PRIVATE_KEY,
    );
    assert!(verifier().verify(&token).is_ok());
}

#[test]
fn expired_token_is_rejected() {
    let mut claims = claims("user_1");
    claims["exp"] = json!(now() - 120);
    let token = sign(&claims, PRIVATE_KEY);
    assert!(verifier().verify(&token).is_err());
}

#[test]
fn not_yet_valid_token_is_rejected() {
    let mut claims = claims("user_1");
    claims["nbf"] = json!(now() + 120);
    let token = sign(&claims, PRIVATE_KEY);
    assert!(verifier().verify(&token).is_err());
}

#[test]
fn token_signed_by_other_key_is_rejected() {
    let token = sign(&claims("user_1"), OTHER_PRIVATE_KEY);
    assert!(verifier().verify(&token).is_err());
}

#[test]
fn foreign_authorized_party_is_rejected() {
    let mut claims = claims("user_1");
    claims["azp"] = json!("https://evil.test");
    let token = sign(&claims, PRIVATE_KEY);
    let err = verifier().verify(&token).expect_err("foreign azp");
    assert!(err.to_string().contains("Unauthorized party"));
}

#[test]
fn missing_or_empty_subject_is_rejected() {
    let token = sign(&json!({ "exp": now() + 60 }), PRIVATE_KEY);
    assert!(verifier().verify(&token).is_err());

    let token = sign(&claims(""), PRIVATE_KEY);
    assert!(verifier().verify(&token).is_err());
}

#[test]
fn garbage_is_rejected() {
    assert!(verifier().verify("not.a.jwt").is_err());
    assert!(verifier().verify("").is_err());
}

#[test]
fn invalid_pem_is_an_error() {
    assert!(JwtVerifier::from_pem("-----BEGIN PUBLIC KEY-----\nnope\n-----END PUBLIC KEY-----", vec![]).is_err());
}

#[test]
fn empty_jwks_is_an_error() {
    let set: JwkSet = serde_json::from_value(json!({ "keys": [] })).expect("jwks");
    assert!(JwtVerifier::from_jwks(&set, vec![]).is_err());
}

#[test]
fn identify_reads_bearer_then_cookie() {
    let verifier = verifier();
    let token = sign(&claims("user_cookie"), PRIVATE_KEY);

    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("__session={token}")).expect("cookie"),
    );
    assert_eq!(
        verifier.identify(&headers).map(|user| user.to_string()),
        Some("user_cookie".to_string())
    );

    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_static("Bearer invalid-token"),
    );
    assert_eq!(verifier.identify(&headers), None);
}

#[tokio::test]
async fn session_cookie_opens_the_dashboard() {
    let app = web::app(Arc::new(config()), Arc::new(verifier()), None).expect("router");
    let token = sign(&claims("user_live"), PRIVATE_KEY);

    let request = Request::builder()
        .uri("/dashboard")
        .header(COOKIE, format!("__session={token}"))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Welcome back, user_live"));

    let mut expired = claims("user_live");
    expired["exp"] = json!(now() - 120);
    let request = Request::builder()
        .uri("/dashboard")
        .header(COOKIE, format!("__session={}", sign(&expired, PRIVATE_KEY)))
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::FOUND);
}
