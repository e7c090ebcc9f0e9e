//! Credential snapshots and the initial sign-in grant
use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in whole seconds
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Initial grant issued by the provider after the authorization-code exchange
///
/// The exchange itself happens before this crate is involved; the grant is
/// the handoff from session establishment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub access_token: String,
    /// Declared access-token lifetime in seconds, must be positive
    pub expires_in: u64,
    pub refresh_token: String,
}

/// Marker recorded in a snapshot when the most recent refresh exchange failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshFailure {
    /// The token endpoint rejected the exchange, was unreachable, or
    /// returned a malformed response
    Rejected(String),
    /// The exchange exceeded its time bound
    TimedOut,
}

impl RefreshFailure {
    /// Classify an exchange error for storage in the snapshot
    pub fn from_error(err: &AuthError) -> Self {
        match err {
            AuthError::Timeout => RefreshFailure::TimedOut,
            other => RefreshFailure::Rejected(other.to_string()),
        }
    }

    /// The error reported to callers while this marker is set
    pub fn to_error(&self) -> AuthError {
        match self {
            RefreshFailure::Rejected(reason) => AuthError::RefreshFailed(reason.clone()),
            RefreshFailure::TimedOut => AuthError::Timeout,
        }
    }
}

/// Usability of a snapshot at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expired,
    Failed,
}

/// Immutable snapshot of the held credential
///
/// Exactly one snapshot is current per session at any instant; updates
/// replace the whole value. After a failed refresh the stale access token
/// stays in the snapshot for diagnostics, but a set `failure` always wins
/// over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: String,
    /// Unix seconds after which `access_token` must not be used
    pub expires_at: u64,
    /// Spent only at the token endpoint, never sent to the backend API
    pub refresh_token: String,
    #[serde(default)]
    pub failure: Option<RefreshFailure>,
}

impl TokenState {
    /// Build the initial snapshot from a sign-in grant
    pub fn from_grant(grant: &Grant) -> Result<Self> {
        if grant.access_token.is_empty() {
            return Err(AuthError::ConfigurationError(
                "grant has no access token".to_string(),
            ));
        }
        if grant.refresh_token.is_empty() {
            return Err(AuthError::ConfigurationError(
                "grant has no refresh token".to_string(),
            ));
        }
        if grant.expires_in == 0 {
            return Err(AuthError::ConfigurationError(
                "grant lifetime must be positive".to_string(),
            ));
        }

        Ok(Self {
            access_token: grant.access_token.clone(),
            expires_at: unix_now() + grant.expires_in,
            refresh_token: grant.refresh_token.clone(),
            failure: None,
        })
    }

    /// Check if the access token is past its expiry
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.expires_at
    }

    pub fn status(&self) -> TokenStatus {
        if self.failure.is_some() {
            TokenStatus::Failed
        } else if self.is_expired() {
            TokenStatus::Expired
        } else {
            TokenStatus::Valid
        }
    }
}
