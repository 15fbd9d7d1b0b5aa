//! Clerk, the hosted identity provider.
//!
//! Three concerns live here:
//! - decoding the publishable key into the instance's Frontend API host, which serves
//!   the browser SDK used by the sign-in/sign-up pages;
//! - the Backend API client (JWKS discovery, user lookup);
//! - [`JwtVerifier`], the [`SessionVerifier`] that checks RS256 session tokens.

use super::{session_token, Session, SessionVerifier, UserId};
use crate::config::{ClerkConfig, Config};
use anyhow::{anyhow, bail, Context, Result};
use base64ct::{Base64, Base64Unpadded, Encoding};
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client as HttpClient;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const CLOCK_SKEW_SECONDS: u64 = 5;

/// Frontend API host encoded in a publishable key (`pk_test_<base64("host$")>`).
#[must_use]
pub fn frontend_api(publishable_key: &str) -> Option<String> {
    let encoded = publishable_key
        .strip_prefix("pk_test_")
        .or_else(|| publishable_key.strip_prefix("pk_live_"))?;

    let bytes = Base64::decode_vec(encoded)
        .or_else(|_| Base64Unpadded::decode_vec(encoded))
        .ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let host = decoded.strip_suffix('$')?;

    if host.is_empty() || host.contains(['/', ' ']) {
        return None;
    }

    Some(host.to_string())
}

/// Scheme, host and port of `url`; session tokens name it in their `azp` claim.
///
/// # Errors
/// Returns an error if the URL cannot be parsed or has no host.
pub fn origin(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid app URL: {url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("App URL must include a valid host: {url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    Ok(format!("{}://{}{}", parsed.scheme(), host, port))
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub id: String,
    pub email_address: String,
}

/// The subset of the Backend API user object the pages use.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl User {
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref();
        self.email_addresses
            .iter()
            .find(|email| Some(email.id.as_str()) == primary)
            .or_else(|| self.email_addresses.first())
            .map(|email| email.email_address.as_str())
    }

    /// Full name when known, then primary email, then the raw id.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !name.is_empty() {
            return name;
        }

        self.primary_email()
            .map_or_else(|| self.id.clone(), ToString::to_string)
    }
}

/// Backend API client, authenticated with the instance secret key.
#[derive(Clone)]
pub struct Client {
    http: HttpClient,
    api_url: String,
    secret_key: SecretString,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClerkConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    #[instrument(skip(self))]
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.api_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);

            return Err(anyhow!(
                "{} - {}, {}",
                url,
                status,
                body["errors"][0]["message"].as_str().unwrap_or("")
            ));
        }

        Ok(response.json().await?)
    }

    /// Public keys used to sign session tokens.
    ///
    /// # Errors
    /// Returns an error if the request fails or the key set cannot be parsed.
    pub async fn jwks(&self) -> Result<JwkSet> {
        self.get_json("/v1/jwks").await
    }

    /// # Errors
    /// Returns an error if the request fails or the user cannot be parsed.
    pub async fn user(&self, user_id: &UserId) -> Result<User> {
        self.get_json(&format!("/v1/users/{}", user_id.as_str()))
            .await
    }

    /// The signed-in user's profile, or `None` when anonymous or on any provider failure.
    pub async fn current_user(&self, session: &Session) -> Option<User> {
        let user_id = session.user_id()?;
        match self.user(user_id).await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Could not fetch user {}: {}", user_id, e);
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default)]
    azp: Option<String>,
}

struct VerificationKey {
    kid: Option<String>,
    key: DecodingKey,
}

/// Verifies RS256 session tokens against a fixed key set loaded at boot.
pub struct JwtVerifier {
    keys: Vec<VerificationKey>,
    authorized_parties: Vec<String>,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("keys", &self.keys.len())
            .field("authorized_parties", &self.authorized_parties)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    fn with_keys(keys: Vec<VerificationKey>, authorized_parties: Vec<String>) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_SECONDS;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys,
            authorized_parties,
            validation,
        }
    }

    /// Networkless verification with a PEM encoded RSA public key.
    ///
    /// # Errors
    /// Returns an error if the PEM is not an RSA public key.
    pub fn from_pem(pem: &str, authorized_parties: Vec<String>) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes()).context("Invalid CLERK_JWT_KEY")?;
        Ok(Self::with_keys(
            vec![VerificationKey { kid: None, key }],
            authorized_parties,
        ))
    }

    /// # Errors
    /// Returns an error if no key of the set is usable.
    pub fn from_jwks(set: &JwkSet, authorized_parties: Vec<String>) -> Result<Self> {
        let keys: Vec<VerificationKey> = set
            .keys
            .iter()
            .filter_map(|jwk| match DecodingKey::from_jwk(jwk) {
                Ok(key) => Some(VerificationKey {
                    kid: jwk.common.key_id.clone(),
                    key,
                }),
                Err(e) => {
                    warn!("Skipping unusable JWK {:?}: {}", jwk.common.key_id, e);
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            bail!("JWKS contains no usable keys");
        }

        Ok(Self::with_keys(keys, authorized_parties))
    }

    /// Build the verifier from `CLERK_JWT_KEY`, or fetch the instance JWKS.
    ///
    /// # Errors
    /// Returns an error if the key is invalid or the JWKS cannot be fetched.
    pub async fn discover(config: &Config, client: &Client) -> Result<Self> {
        let authorized_parties = vec![origin(&config.app.url)?];

        if let Some(pem) = &config.api.clerk.jwt_key {
            debug!("Using networkless session verification");
            return Self::from_pem(pem, authorized_parties);
        }

        let set = client
            .jwks()
            .await
            .context("Failed to fetch session signing keys")?;

        Self::from_jwks(&set, authorized_parties)
    }

    /// Verify a session token and return its subject.
    ///
    /// # Errors
    /// Returns an error for bad signatures, expired or not-yet-valid tokens, unknown key
    /// ids and unauthorized parties.
    pub fn verify(&self, token: &str) -> Result<UserId> {
        let header = decode_header(token)?;

        let key = self
            .keys
            .iter()
            .find(|candidate| candidate.kid.is_none() || candidate.kid == header.kid)
            .ok_or_else(|| anyhow!("No signing key for kid {:?}", header.kid))?;

        let data = decode::<SessionClaims>(token, &key.key, &self.validation)?;
        let claims = data.claims;

        if let Some(azp) = &claims.azp {
            if !self.authorized_parties.is_empty() && !self.authorized_parties.contains(azp) {
                bail!("Unauthorized party: {azp}");
            }
        }

        if claims.sub.is_empty() {
            bail!("Session token has an empty subject");
        }

        Ok(UserId::new(claims.sub))
    }
}

impl SessionVerifier for JwtVerifier {
    fn identify(&self, headers: &axum::http::HeaderMap) -> Option<UserId> {
        let token = session_token(headers)?;
        match self.verify(&token) {
            Ok(user_id) => Some(user_id),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_api_from_test_key() {
        assert_eq!(
            frontend_api("pk_test_Y2xlcmsuZmluZXByaW50LnRlc3Qk").as_deref(),
            Some("clerk.fineprint.test")
        );
    }

    #[test]
    fn frontend_api_accepts_unpadded_live_key() {
        // base64("clerk.example.co$") with the trailing '=' dropped
        assert_eq!(
            frontend_api("pk_live_Y2xlcmsuZXhhbXBsZS5jbyQ").as_deref(),
            Some("clerk.example.co")
        );
    }

    #[test]
    fn frontend_api_rejects_malformed_keys() {
        assert_eq!(frontend_api("pk_test_"), None);
        assert_eq!(frontend_api("sk_test_Y2xlcmsuZmluZXByaW50LnRlc3Qk"), None);
        assert_eq!(frontend_api("pk_test_!!!"), None);
        // base64("no-terminator")
        assert_eq!(frontend_api("pk_test_bm8tdGVybWluYXRvcg=="), None);
    }

    #[test]
    fn origin_keeps_explicit_port() {
        assert_eq!(
            origin("http://localhost:3000/some/path").ok().as_deref(),
            Some("http://localhost:3000")
        );
        assert_eq!(
            origin("https://fineprint.ai/").ok().as_deref(),
            Some("https://fineprint.ai")
        );
        assert!(origin("not a url").is_err());
    }

    #[test]
    fn display_name_prefers_full_name() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "user_1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email_addresses": [{"id": "idn_1", "email_address": "ada@example.com"}],
            "primary_email_address_id": "idn_1"
        }))
        .expect("user json");
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.primary_email(), Some("ada@example.com"));
    }

    #[test]
    fn display_name_falls_back_to_email_then_id() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "user_2",
            "first_name": null,
            "email_addresses": [
                {"id": "idn_a", "email_address": "old@example.com"},
                {"id": "idn_b", "email_address": "primary@example.com"}
            ],
            "primary_email_address_id": "idn_b"
        }))
        .expect("user json");
        assert_eq!(user.display_name(), "primary@example.com");

        let bare: User = serde_json::from_value(serde_json::json!({"id": "user_3"}))
            .expect("user json");
        assert_eq!(bare.display_name(), "user_3");
    }

    #[test]
    fn jwks_without_usable_keys_is_rejected() {
        let set: JwkSet = serde_json::from_value(serde_json::json!({"keys": []})).expect("jwks");
        assert!(JwtVerifier::from_jwks(&set, Vec::new()).is_err());
    }
}
