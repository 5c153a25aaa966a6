use crate::config::CONFIG;
use crate::error::{FirelinkError, IsRetryable};
use crate::google_auth::credentials::ServiceAccountKey;
use crate::google_auth::endpoints::GoogleAuthEndpoints;
use backon::{ExponentialBuilder, Retryable};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Tokens within this margin of expiry are treated as already expired.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN
    }
}

/// Authenticated Google session for one service account.
///
/// Owns the outbound HTTP client and the cached access token. Built once at
/// startup and shared immutably by all request handlers; building a second
/// instance is permitted and has no process-wide effect.
pub struct GoogleAuthService {
    key: ServiceAccountKey,
    http_client: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl GoogleAuthService {
    pub fn new(key: ServiceAccountKey) -> Self {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("firelink/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15));
        if let Some(proxy_url) = CONFIG.proxy.clone() {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .expect("invalid PROXY url for reqwest client");
            builder = builder.proxy(proxy);
        }
        let http_client = builder
            .build()
            .expect("FATAL: initialize GoogleAuthService HTTP client failed");

        Self {
            key,
            http_client,
            token: RwLock::new(None),
        }
    }

    pub fn http_client(&self) -> reqwest::Client {
        self.http_client.clone()
    }

    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    /// Current access token, refreshed through the token endpoint when the
    /// cached one is within a minute of expiry.
    pub async fn access_token(&self) -> Result<String, FirelinkError> {
        if let Some(token) = self.token.read().await.as_ref()
            && token.is_fresh()
        {
            return Ok(token.access_token.clone());
        }
        self.refresh().await
    }

    /// Run the token exchange and cache the result.
    ///
    /// Transient transport failures are retried under the bounded policy; a
    /// definitive rejection of the grant surfaces immediately.
    pub async fn refresh(&self) -> Result<String, FirelinkError> {
        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = guard.as_ref()
            && token.is_fresh()
        {
            return Ok(token.access_token.clone());
        }

        let response = (|| async {
            GoogleAuthEndpoints::fetch_access_token(&self.key, self.http_client.clone()).await
        })
        .retry(default_retry_policy())
        .when(|e: &FirelinkError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("token exchange retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;

        debug!(expires_in = response.expires_in, "access token cached");
        let access_token = response.access_token.clone();
        *guard = Some(CachedToken {
            access_token: response.access_token,
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        });
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_key() -> ServiceAccountKey {
        serde_json::from_value(serde_json::json!({
            "project_id": "demo-project",
            "private_key": "pem",
            "client_email": "probe@demo-project.iam.gserviceaccount.com"
        }))
        .expect("test key deserializes")
    }

    #[test]
    fn building_the_service_twice_raises_no_error() {
        let first = GoogleAuthService::new(dummy_key());
        let second = GoogleAuthService::new(dummy_key());
        assert_eq!(first.project_id(), second.project_id());
    }

    #[test]
    fn stale_tokens_are_not_fresh() {
        let stale = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!stale.is_fresh());

        let fresh = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_fresh());
    }
}
