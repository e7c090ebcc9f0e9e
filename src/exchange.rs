//! Refresh token exchange against the provider token endpoint
use crate::error::{AuthError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default bound on a single refresh exchange
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider token-endpoint configuration
#[derive(Debug, Clone)]
pub struct TokenEndpointConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_endpoint: String,
}

/// Token endpoint reply to a `grant_type=refresh_token` exchange
///
/// Providers may omit `refresh_token` when they do not rotate it.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    /// Lifetime of the new access token in seconds
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Exchange seam between the lifecycle manager and the token endpoint
///
/// Implemented over HTTP by [`HttpExchanger`]; tests substitute their own
/// implementation to observe and control exchanges.
pub trait TokenExchange: Send + Sync {
    /// Spend a refresh token for a new access token
    fn exchange(&self, refresh_token: &str) -> Result<RefreshResponse>;
}

/// HTTP implementation of the refresh exchange
pub struct HttpExchanger {
    config: TokenEndpointConfig,
    http: reqwest::blocking::Client,
}

impl HttpExchanger {
    /// Create an exchanger with the default exchange timeout
    pub fn new(config: TokenEndpointConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_REFRESH_TIMEOUT)
    }

    /// Create an exchanger with a caller-supplied exchange timeout
    pub fn with_timeout(config: TokenEndpointConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { config, http })
    }
}

/// Keep transport timeouts distinguishable from other transport failures
fn classify(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::HttpError(err)
    }
}

impl TokenExchange for HttpExchanger {
    fn exchange(&self, refresh_token: &str) -> Result<RefreshResponse> {
        debug!(endpoint = %self.config.token_endpoint, "requesting new access token");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AuthError::RefreshFailed(format!(
                "token endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        let reply: RefreshResponse = response.json().map_err(classify)?;
        if reply.access_token.is_empty() {
            return Err(AuthError::MissingField("access_token".to_string()));
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_response_with_rotation() {
        let reply: RefreshResponse = serde_json::from_str(
            r#"{"access_token":"a2","expires_in":3600,"refresh_token":"r2"}"#,
        )
        .unwrap();

        assert_eq!(reply.access_token, "a2");
        assert_eq!(reply.expires_in, 3600);
        assert_eq!(reply.refresh_token.as_deref(), Some("r2"));
    }

    #[test]
    fn test_refresh_response_without_rotation() {
        let reply: RefreshResponse =
            serde_json::from_str(r#"{"access_token":"a2","expires_in":3600}"#).unwrap();

        assert_eq!(reply.access_token, "a2");
        assert!(reply.refresh_token.is_none());
    }

    #[test]
    fn test_refresh_response_requires_access_token() {
        let parsed = serde_json::from_str::<RefreshResponse>(r#"{"expires_in":3600}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_exchanger_construction() {
        let config = TokenEndpointConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            token_endpoint: "https://auth.example.com/token".to_string(),
        };

        assert!(HttpExchanger::new(config.clone()).is_ok());
        assert!(HttpExchanger::with_timeout(config, Duration::from_secs(5)).is_ok());
    }
}
