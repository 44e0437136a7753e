//! OAuth2 access token providers for Google APIs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::http::read_error_body;
use crate::metrics::TokenMetrics;

use super::{AuthError, ServiceAccountKey};

/// Tokens are refreshed this long before they actually expire
const EXPIRY_MARGIN_SECS: i64 = 60;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Source of bearer tokens for outbound Google API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Short name used in logs and health output.
    fn kind(&self) -> &'static str;
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Single-flight token cache; concurrent callers wait for one refresh.
#[derive(Default)]
struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<TokenResponse, AuthError>>,
    {
        let mut guard = self.inner.lock().await;
        if let Some(ref token) = *guard {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        match refresh().await {
            Ok(response) => {
                TokenMetrics::record_refresh();
                let token = CachedToken {
                    value: response.access_token,
                    expires_at: Utc::now() + Duration::seconds(response.expires_in),
                };
                tracing::debug!(expires_at = %token.expires_at, "Access token refreshed");
                let value = token.value.clone();
                *guard = Some(token);
                Ok(value)
            }
            Err(e) => {
                TokenMetrics::record_failure();
                Err(e)
            }
        }
    }
}

async fn read_token_response(response: reqwest::Response) -> Result<TokenResponse, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<TokenResponse>().await?);
    }

    let body = read_error_body(response).await;
    let message = match serde_json::from_str::<OAuthErrorResponse>(&body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{}: {}", err.error, description),
            None => err.error,
        },
        Err(_) => body,
    };

    Err(AuthError::TokenEndpoint {
        status: status.as_u16(),
        message,
    })
}

/// Exchanges a signed service account assertion for access tokens.
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    cache: TokenCache,
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey, client: reqwest::Client) -> Result<Self, AuthError> {
        let encoding_key = key.encoding_key()?;
        Ok(Self {
            key,
            encoding_key,
            client,
            cache: TokenCache::default(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    async fn fetch(&self) -> Result<TokenResponse, AuthError> {
        let assertion = self.key.sign_assertion(&self.encoding_key)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        read_token_response(response).await
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.cache.get_or_refresh(|| self.fetch()).await
    }

    fn kind(&self) -> &'static str {
        "service_account"
    }
}

/// Fetches tokens for the attached service account from the metadata server
/// (Cloud Run, Cloud Functions, GCE).
pub struct MetadataTokenProvider {
    url: String,
    client: reqwest::Client,
    cache: TokenCache,
}

impl MetadataTokenProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(METADATA_TOKEN_URL, client)
    }

    pub fn with_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
            cache: TokenCache::default(),
        }
    }

    async fn fetch(&self) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        read_token_response(response).await
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.cache.get_or_refresh(|| self.fetch()).await
    }

    fn kind(&self) -> &'static str {
        "metadata_server"
    }
}

/// Fixed token, used against the Firestore emulator (`owner`) and in tests.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cached_token_freshness_margin() {
        let now = Utc::now();
        let token = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(EXPIRY_MARGIN_SECS + 5),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(10)));
    }

    #[tokio::test]
    async fn test_cache_reuses_fresh_token() {
        let cache = TokenCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let token = cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(TokenResponse {
                        access_token: "ya29.first".to_string(),
                        expires_in: 3599,
                    })
                })
                .await
                .unwrap();
            assert_eq!(token, "ya29.first");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_refreshes_expiring_token() {
        let cache = TokenCache::default();

        let first = cache
            .get_or_refresh(|| async {
                Ok(TokenResponse {
                    access_token: "short-lived".to_string(),
                    expires_in: 30,
                })
            })
            .await
            .unwrap();
        assert_eq!(first, "short-lived");

        let second = cache
            .get_or_refresh(|| async {
                Ok(TokenResponse {
                    access_token: "renewed".to_string(),
                    expires_in: 3600,
                })
            })
            .await
            .unwrap();
        assert_eq!(second, "renewed");
    }

    #[tokio::test]
    async fn test_failed_refresh_is_not_cached() {
        let cache = TokenCache::default();

        let result = cache
            .get_or_refresh(|| async {
                Err(AuthError::TokenEndpoint {
                    status: 400,
                    message: "invalid_grant".to_string(),
                })
            })
            .await;
        assert!(result.is_err());
        assert!(cache.inner.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("owner");
        assert_eq!(provider.access_token().await.unwrap(), "owner");
        assert_eq!(provider.kind(), "static");
    }
}
