//! Bearer-credential lifecycle management with single-flight refresh
use crate::error::Result;
use crate::exchange::TokenExchange;
use crate::token::{unix_now, Grant, RefreshFailure, TokenState, TokenStatus};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the current [`TokenState`] for one signed-in session and hands out
/// a valid access token to every caller that asks.
///
/// Callers get one of three things from [`get_valid_token`]: the held
/// access token while it is still inside its lifetime, the outcome of a
/// refresh exchange once it is not, or the recorded failure after a refresh
/// has gone wrong. However many callers ask concurrently against an
/// expired token, exactly one exchange reaches the token endpoint.
///
/// One manager per session: constructed at sign-in, dropped at sign-out.
///
/// [`get_valid_token`]: TokenLifecycleManager::get_valid_token
pub struct TokenLifecycleManager<E: TokenExchange> {
    exchanger: Arc<E>,
    state: RwLock<TokenState>,
    /// Single-flight gate: held for the full duration of a refresh
    /// exchange, never touched on the fast path
    refresh_gate: Mutex<()>,
}

impl<E: TokenExchange> std::fmt::Debug for TokenLifecycleManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLifecycleManager")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<E: TokenExchange> TokenLifecycleManager<E> {
    /// Establish the credential from a completed sign-in grant
    ///
    /// Fails with `ConfigurationError` if the grant is malformed; there is
    /// no other failure mode.
    pub fn new(grant: Grant, exchanger: Arc<E>) -> Result<Self> {
        let state = TokenState::from_grant(&grant)?;
        Ok(Self {
            exchanger,
            state: RwLock::new(state),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Restore a manager from a snapshot held by an external session store
    pub fn resume(state: TokenState, exchanger: Arc<E>) -> Self {
        Self {
            exchanger,
            state: RwLock::new(state),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current snapshot, for diagnostics or session-store persistence
    pub fn snapshot(&self) -> TokenState {
        self.state.read().clone()
    }

    /// Usability of the currently held credential
    pub fn status(&self) -> TokenStatus {
        self.state.read().status()
    }

    /// Replace the held credential after an explicit re-authentication
    ///
    /// Clears a recorded refresh failure. Waits for an in-flight exchange
    /// to settle first so its result cannot overwrite the fresh grant.
    pub fn reinitialize(&self, grant: Grant) -> Result<()> {
        let state = TokenState::from_grant(&grant)?;
        let _gate = self.refresh_gate.lock();
        *self.state.write() = state;
        info!("credential replaced by re-authentication");
        Ok(())
    }

    /// Return a currently valid access token, refreshing it first if needed
    ///
    /// While the held token is inside its lifetime this is a read-lock
    /// lookup with no network I/O. Past expiry, the first caller performs
    /// the refresh exchange and every concurrent caller blocks on the gate
    /// and receives that exchange's outcome. Once a refresh has failed, the
    /// recorded error is returned without further network I/O until
    /// [`reinitialize`] installs a new grant.
    ///
    /// [`reinitialize`]: TokenLifecycleManager::reinitialize
    pub fn get_valid_token(&self) -> Result<String> {
        if let Some(token) = self.check_current()? {
            return Ok(token);
        }

        // Single-flight: the first caller past this point performs the
        // exchange; late arrivals block here, then re-read its outcome.
        let _gate = self.refresh_gate.lock();
        if let Some(token) = self.check_current()? {
            return Ok(token);
        }

        self.refresh_locked()
    }

    /// Fast path: resolve against the current snapshot without refreshing
    ///
    /// `Ok(None)` means the token is expired and a refresh is required.
    fn check_current(&self) -> Result<Option<String>> {
        let state = self.state.read();

        if let Some(failure) = &state.failure {
            return Err(failure.to_error());
        }
        if !state.is_expired() {
            return Ok(Some(state.access_token.clone()));
        }

        Ok(None)
    }

    /// Perform one refresh exchange; caller must hold the refresh gate
    fn refresh_locked(&self) -> Result<String> {
        let refresh_token = self.state.read().refresh_token.clone();
        info!("access token expired, exchanging refresh token");

        match self.exchanger.exchange(&refresh_token) {
            Ok(reply) => {
                let mut state = self.state.write();
                let next = TokenState {
                    access_token: reply.access_token.clone(),
                    expires_at: unix_now() + reply.expires_in,
                    // Providers may omit a rotated refresh token; the last
                    // known good one must survive
                    refresh_token: reply.refresh_token.unwrap_or(refresh_token),
                    failure: None,
                };
                *state = next;
                debug!(expires_in = reply.expires_in, "access token refreshed");
                Ok(reply.access_token)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                let failure = RefreshFailure::from_error(&err);
                let mut state = self.state.write();
                // Stale access token and expiry stay in the snapshot for
                // diagnostics; the failure marker makes them unreturnable
                let next = TokenState {
                    failure: Some(failure.clone()),
                    ..state.clone()
                };
                *state = next;
                Err(failure.to_error())
            }
        }
    }
}
