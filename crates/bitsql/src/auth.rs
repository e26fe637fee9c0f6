use bitsql_core::remote::TransportError;
use serde::Deserialize;
use std::{
    fmt,
    sync::Mutex,
    time::{Duration, Instant},
};

/// Tenant-token exchange endpoint, relative to the open-API host.
pub const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

// Tokens are refreshed this long before the store expires them.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

///
/// Auth
///

#[derive(Clone, Eq, PartialEq)]
pub enum Auth {
    /// Personal base token, sent as a bearer token as-is.
    PersonalToken(String),

    /// App credentials, exchanged for a tenant access token.
    AppCredentials { app_id: String, app_secret: String },
}

// Secrets stay out of logs and panics.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersonalToken(_) => f.write_str("PersonalToken(..)"),
            Self::AppCredentials { app_id, .. } => f
                .debug_struct("AppCredentials")
                .field("app_id", app_id)
                .finish_non_exhaustive(),
        }
    }
}

///
/// TenantTokenResponse
///

#[derive(Debug, Deserialize)]
pub(crate) struct TenantTokenResponse {
    #[serde(default)]
    code: i64,

    #[serde(default)]
    msg: String,

    #[serde(default)]
    tenant_access_token: Option<String>,

    /// Lifetime in seconds.
    #[serde(default)]
    expire: u64,
}

impl TenantTokenResponse {
    pub(crate) fn into_token(self, now: Instant) -> Result<CachedToken, TransportError> {
        if self.code != 0 {
            return Err(TransportError::Auth(format!("{} (code {})", self.msg, self.code)));
        }

        let token = self
            .tenant_access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| TransportError::Auth("response carried no tenant_access_token".to_string()))?;

        // An expiry past the clock's range never needs a refresh.
        let lifetime = Duration::from_secs(self.expire).saturating_sub(REFRESH_MARGIN);

        Ok(CachedToken {
            token,
            refresh_at: now.checked_add(lifetime),
        })
    }
}

///
/// CachedToken
///

#[derive(Clone, Debug)]
pub(crate) struct CachedToken {
    token: String,
    refresh_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.refresh_at.is_none_or(|refresh_at| now < refresh_at)
    }
}

///
/// TokenCache
///
/// Holds the current tenant token; shared by every request of a connection.
///

#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    current: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Cached token, or a fresh one from `exchange`.
    ///
    /// The lock is held across the exchange so concurrent callers wait for
    /// one refresh instead of each starting their own.
    pub(crate) fn get_or_refresh<F>(&self, exchange: F) -> Result<String, TransportError>
    where
        F: FnOnce() -> Result<CachedToken, TransportError>,
    {
        let mut current = self
            .current
            .lock()
            .map_err(|_| TransportError::Auth("token cache lock poisoned".to_string()))?;

        if let Some(cached) = current.as_ref()
            && cached.is_fresh(Instant::now())
        {
            return Ok(cached.token.clone());
        }

        tracing::debug!("refreshing tenant access token");
        let fresh = exchange()?;
        let token = fresh.token.clone();
        *current = Some(fresh);

        Ok(token)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: serde_json::Value) -> TenantTokenResponse {
        serde_json::from_value(body).expect("token response should decode")
    }

    #[test]
    fn token_response_refreshes_a_minute_early() {
        let now = Instant::now();
        let cached = response(json!({"code": 0, "msg": "ok", "tenant_access_token": "t-1", "expire": 7200}))
            .into_token(now)
            .expect("token should be issued");

        assert!(cached.is_fresh(now + Duration::from_secs(7000)));
        assert!(!cached.is_fresh(now + Duration::from_secs(7141)));
    }

    #[test]
    fn huge_expiry_does_not_overflow_the_clock() {
        let now = Instant::now();
        let cached = response(json!({"tenant_access_token": "t-1", "expire": u64::MAX}))
            .into_token(now)
            .expect("token should be issued");

        assert!(cached.is_fresh(now + Duration::from_secs(86_400)));
    }

    #[test]
    fn token_errors_are_auth_failures() {
        let err = response(json!({"code": 10014, "msg": "app secret invalid"}))
            .into_token(Instant::now())
            .expect_err("error response must fail");

        assert!(matches!(err, TransportError::Auth(ref message) if message.contains("app secret invalid")));
    }

    #[test]
    fn cache_reuses_fresh_tokens() {
        let cache = TokenCache::default();
        let mut exchanges = 0;

        for _ in 0..3 {
            let token = cache
                .get_or_refresh(|| {
                    exchanges += 1;
                    response(json!({"tenant_access_token": "t-1", "expire": 7200}))
                        .into_token(Instant::now())
                })
                .expect("token should be available");
            assert_eq!(token, "t-1");
        }

        assert_eq!(exchanges, 1);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let auth = Auth::AppCredentials {
            app_id: "cli_a".to_string(),
            app_secret: "s3cret".to_string(),
        };

        let shown = format!("{auth:?} {:?}", Auth::PersonalToken("pt-xyz".to_string()));
        assert!(shown.contains("cli_a"));
        assert!(!shown.contains("s3cret"));
        assert!(!shown.contains("pt-xyz"));
    }
}
