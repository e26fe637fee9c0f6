//! Module: transport
//! Responsibility: blocking HTTP for `BaseClient`, with authentication.
//! Does not own: response envelopes (decoded by the engine's client).
//! Boundary: statuses are not errors here when the body is JSON; the
//! envelope inside carries the store's own message.

use crate::{
    auth::{Auth, TENANT_TOKEN_PATH, TenantTokenResponse, TokenCache},
    config::ConnectionConfig,
};
use bitsql_core::remote::{Transport, TransportError};
use serde_json::{Value as JsonValue, json};
use std::time::Instant;

///
/// HttpTransport
///

#[derive(Debug)]
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    auth: Auth,
    tokens: TokenCache,
}

impl HttpTransport {
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            agent: builder.build(),
            base_url: config.base_url(),
            auth: config.auth.clone(),
            tokens: TokenCache::default(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorization(&self) -> Result<String, TransportError> {
        let token = match &self.auth {
            Auth::PersonalToken(token) => token.clone(),
            Auth::AppCredentials { app_id, app_secret } => self
                .tokens
                .get_or_refresh(|| self.exchange_credentials(app_id, app_secret))?,
        };

        Ok(format!("Bearer {token}"))
    }

    fn exchange_credentials(
        &self,
        app_id: &str,
        app_secret: &str,
    ) -> Result<crate::auth::CachedToken, TransportError> {
        let requested_at = Instant::now();
        let result = self
            .agent
            .post(&self.url(TENANT_TOKEN_PATH))
            .send_json(json!({ "app_id": app_id, "app_secret": app_secret }));
        let body = read_response(result)?;

        let response: TenantTokenResponse = serde_json::from_value(body)
            .map_err(|err| TransportError::Decode(err.to_string()))?;

        response.into_token(requested_at)
    }

    fn request(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ureq::Request, TransportError> {
        let mut request = self
            .agent
            .request(method, &self.url(path))
            .set("Authorization", &self.authorization()?);
        for (key, value) in query {
            request = request.query(key, value);
        }

        Ok(request)
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<JsonValue, TransportError> {
        let request = self.request("GET", path, query)?;
        tracing::trace!(url = %request.url(), "GET");

        read_response(request.call())
    }

    fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &JsonValue,
    ) -> Result<JsonValue, TransportError> {
        let request = self.request("POST", path, query)?;
        tracing::trace!(url = %request.url(), "POST");

        read_response(request.send_json(body))
    }
}

fn read_response(result: Result<ureq::Response, ureq::Error>) -> Result<JsonValue, TransportError> {
    match result {
        Ok(response) => response
            .into_json::<JsonValue>()
            .map_err(|err| TransportError::Decode(err.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            match serde_json::from_str::<JsonValue>(&body) {
                Ok(json) if json.is_object() => {
                    tracing::debug!(status, "error status with JSON body");
                    Ok(json)
                }
                _ => Err(TransportError::Status { status, body }),
            }
        }
        Err(ureq::Error::Transport(err)) => Err(TransportError::Io(err.to_string())),
    }
}
