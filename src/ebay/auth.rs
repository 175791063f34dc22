use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use urlencoding::encode;

use crate::ebay::env::EbayEnv;
use crate::ebay::store::TokenStore;
use crate::http::build_client;

pub const SELL_SCOPES: &[&str] = &[
    "https://api.ebay.com/oauth/api_scope/sell.inventory",
    "https://api.ebay.com/oauth/api_scope/sell.account",
];

/// Base scope is all the read-only metadata endpoints need.
const METADATA_SCOPES: &[&str] = &["https://api.ebay.com/oauth/api_scope"];

/// Application credentials for one environment, threaded explicitly from the
/// config file.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub dev_id: String,
    pub redirect_uri: String,
}

/// Token endpoint response, persisted verbatim. Replaced wholesale on every
/// successful exchange, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Error)]
pub enum EbayAuthError {
    #[error("missing ebay app credentials")]
    MissingCredentials,
    #[error("oauth request failed: {0}")]
    Request(String),
    #[error("redirect url carried no authorization code")]
    MissingAuthCode,
    #[error("no refresh token on record")]
    NoRefreshToken,
    #[error("token store: {0}")]
    Store(String),
}

/// Owns the user token from first authorization through refreshes, keeping
/// the on-disk record in step with the in-memory one.
pub struct TokenLifecycle {
    env: EbayEnv,
    credentials: Credentials,
    store: TokenStore,
    http: Client,
    current: Option<TokenRecord>,
}

impl TokenLifecycle {
    pub fn new(env: EbayEnv, credentials: Credentials, store: TokenStore) -> Self {
        Self {
            env,
            credentials,
            store,
            http: build_client(),
            current: None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.current.as_ref().map(|record| record.access_token.as_str())
    }

    /// Explicit initialization step: load the persisted record and refresh it,
    /// or walk the interactive consent flow when nothing is persisted yet.
    ///
    /// A failed refresh is logged and the stored token kept; the access token
    /// may still be inside its expiry window. A failed interactive
    /// authorization is fatal, nothing can be listed without a token.
    pub async fn load_or_authorize(&mut self) -> Result<(), EbayAuthError> {
        if let Some(record) = self.store.load() {
            info!(
                target = "lister.auth",
                env = self.env.name(),
                "stored token loaded, refreshing"
            );
            self.current = Some(record);
            if let Err(err) = self.refresh().await {
                warn!(
                    target = "lister.auth",
                    error = %err,
                    "token refresh failed, continuing with stored token"
                );
            }
            Ok(())
        } else {
            self.authorize_interactive().await
        }
    }

    /// Exchange the refresh token for a fresh record and persist it. eBay may
    /// rotate or omit the refresh token in the response; an omitted one keeps
    /// its previous value.
    pub async fn refresh(&mut self) -> Result<(), EbayAuthError> {
        let refresh_token = self
            .current
            .as_ref()
            .and_then(|record| record.refresh_token.clone())
            .ok_or(EbayAuthError::NoRefreshToken)?;
        let scope = SELL_SCOPES.join(" ");
        let fresh = self
            .exchange(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &refresh_token),
                ("scope", &scope),
            ])
            .await?;
        let merged = carry_refresh(self.current.as_ref(), fresh);
        self.persist(merged)
    }

    /// Short-lived application token for read-only metadata endpoints. Never
    /// persisted.
    pub async fn client_credentials_token(&self) -> Result<String, EbayAuthError> {
        let scope = METADATA_SCOPES.join(" ");
        let record = self
            .exchange(&[("grant_type", "client_credentials"), ("scope", &scope)])
            .await?;
        Ok(record.access_token)
    }

    async fn authorize_interactive(&mut self) -> Result<(), EbayAuthError> {
        println!("No stored token for {}.", self.env.name());
        println!("Open this URL in a browser, sign in and grant access:\n");
        println!("  {}\n", self.consent_url());
        println!("Then paste the full redirect URL here and press enter:");

        let mut pasted = String::new();
        std::io::stdin()
            .read_line(&mut pasted)
            .map_err(|err| EbayAuthError::Request(err.to_string()))?;
        let code = extract_auth_code(pasted.trim()).ok_or(EbayAuthError::MissingAuthCode)?;

        let record = self
            .exchange(&[
                ("grant_type", "authorization_code"),
                ("code", &code),
                ("redirect_uri", &self.credentials.redirect_uri),
            ])
            .await?;
        info!(target = "lister.auth", env = self.env.name(), "authorization complete");
        self.persist(record)
    }

    fn consent_url(&self) -> String {
        let scope = SELL_SCOPES.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            self.env.authorize_url(),
            encode(&self.credentials.client_id),
            encode(&self.credentials.redirect_uri),
            encode(&scope),
        )
    }

    fn persist(&mut self, record: TokenRecord) -> Result<(), EbayAuthError> {
        self.store
            .save(&record)
            .map_err(|err| EbayAuthError::Store(err.to_string()))?;
        self.current = Some(record);
        Ok(())
    }

    async fn exchange(&self, params: &[(&str, &str)]) -> Result<TokenRecord, EbayAuthError> {
        let response = self
            .http
            .post(self.env.token_url())
            .header("Authorization", self.basic_auth_header()?)
            .form(&params)
            .send()
            .await
            .map_err(|err| EbayAuthError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EbayAuthError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json::<TokenRecord>()
            .await
            .map_err(|err| EbayAuthError::Request(err.to_string()))
    }

    fn basic_auth_header(&self) -> Result<String, EbayAuthError> {
        if self.credentials.client_id.is_empty() || self.credentials.client_secret.is_empty() {
            return Err(EbayAuthError::MissingCredentials);
        }
        let raw = format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        );
        Ok(format!("Basic {}", BASE64.encode(raw)))
    }
}

fn carry_refresh(previous: Option<&TokenRecord>, mut fresh: TokenRecord) -> TokenRecord {
    if fresh.refresh_token.is_none() {
        fresh.refresh_token = previous.and_then(|record| record.refresh_token.clone());
    }
    fresh
}

/// Pull the `code` query parameter out of a pasted redirect URL.
fn extract_auth_code(redirect: &str) -> Option<String> {
    let url = reqwest::Url::parse(redirect).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            client_id: "app-id".into(),
            client_secret: "app-secret".into(),
            dev_id: "dev-id".into(),
            redirect_uri: "Seller-App-SBX-runame".into(),
        }
    }

    fn record(access: &str, refresh: Option<&str>) -> TokenRecord {
        TokenRecord {
            access_token: access.into(),
            refresh_token: refresh.map(str::to_string),
            expires_in: 7200,
            token_type: "User Access Token".into(),
        }
    }

    #[test]
    fn auth_code_extracted_and_decoded() {
        let code = extract_auth_code(
            "https://example.com/accept?code=v%5E1.1%23i%5E1%23f%5E0&expires_in=299",
        );
        assert_eq!(code.as_deref(), Some("v^1.1#i^1#f^0"));
    }

    #[test]
    fn redirect_without_code_is_rejected() {
        assert!(extract_auth_code("https://example.com/accept?error=access_denied").is_none());
        assert!(extract_auth_code("not a url").is_none());
    }

    #[test]
    fn omitted_refresh_token_keeps_previous_value() {
        let previous = record("old-access", Some("long-lived-refresh"));
        let merged = carry_refresh(Some(&previous), record("new-access", None));
        assert_eq!(merged.access_token, "new-access");
        assert_eq!(merged.refresh_token.as_deref(), Some("long-lived-refresh"));
    }

    #[test]
    fn rotated_refresh_token_wins() {
        let previous = record("old-access", Some("old-refresh"));
        let merged = carry_refresh(Some(&previous), record("new-access", Some("new-refresh")));
        assert_eq!(merged.refresh_token.as_deref(), Some("new-refresh"));
    }

    #[test]
    fn consent_url_carries_encoded_parameters() {
        let lifecycle = TokenLifecycle::new(
            EbayEnv::Sandbox,
            credentials(),
            TokenStore::with_path("unused.json"),
        );
        let url = lifecycle.consent_url();
        assert!(url.starts_with("https://auth.sandbox.ebay.com/oauth2/authorize?"));
        assert!(url.contains("client_id=app-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope%2Fsell.inventory"));
    }

    #[test]
    fn empty_credentials_cannot_build_basic_header() {
        let lifecycle = TokenLifecycle::new(
            EbayEnv::Sandbox,
            Credentials {
                client_id: String::new(),
                client_secret: String::new(),
                dev_id: String::new(),
                redirect_uri: String::new(),
            },
            TokenStore::with_path("unused.json"),
        );
        assert!(matches!(
            lifecycle.basic_auth_header(),
            Err(EbayAuthError::MissingCredentials)
        ));
    }

    #[test]
    fn token_record_serde_round_trip() {
        let original = record("access", Some("refresh"));
        let json = serde_json::to_string(&original).expect("serialize");
        let back: TokenRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, original);
    }

    #[test]
    fn absent_refresh_token_is_not_serialized_as_null() {
        let json = serde_json::to_string(&record("access", None)).expect("serialize");
        assert!(!json.contains("refresh_token"));
    }
}
