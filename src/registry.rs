//! Per-session ownership of lifecycle managers
use crate::error::{AuthError, Result};
use crate::exchange::TokenExchange;
use crate::manager::TokenLifecycleManager;
use crate::token::Grant;
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// One lifecycle manager per signed-in session
///
/// A manager is constructed when a session signs in and dropped when it
/// signs out; there is no process-wide credential singleton. The registry
/// shares one exchanger across all sessions.
pub struct SessionRegistry<E: TokenExchange> {
    exchanger: Arc<E>,
    sessions: RwLock<HashMap<String, Arc<TokenLifecycleManager<E>>>>,
}

impl<E: TokenExchange> SessionRegistry<E> {
    /// Create an empty registry backed by the given exchanger
    pub fn new(exchanger: Arc<E>) -> Self {
        Self {
            exchanger,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Establish a session from a completed sign-in grant
    ///
    /// Returns the session identifier under which the credential is held.
    pub fn sign_in(&self, grant: Grant) -> Result<String> {
        let manager = Arc::new(TokenLifecycleManager::new(grant, self.exchanger.clone())?);

        let session_id = Self::generate_session_id();
        self.sessions
            .write()
            .insert(session_id.clone(), manager);

        info!(session = %session_id, "session established");
        Ok(session_id)
    }

    /// Get the lifecycle manager for a session
    pub fn manager(&self, session_id: &str) -> Result<Arc<TokenLifecycleManager<E>>> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AuthError::UnknownSession(session_id.to_string()))
    }

    /// Tear down a session, dropping its credential
    ///
    /// An exchange still in flight for the session is allowed to complete;
    /// its result is discarded along with the manager. Returns whether the
    /// session existed.
    pub fn sign_out(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            info!(session = %session_id, "session torn down");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn generate_session_id() -> String {
        let mut rng = rand::thread_rng();
        let id_bytes: [u8; 16] = rng.gen();
        hex::encode(&id_bytes)
    }
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::RefreshResponse;

    struct NoExchange;

    impl TokenExchange for NoExchange {
        fn exchange(&self, _refresh_token: &str) -> Result<RefreshResponse> {
            Err(AuthError::RefreshFailed("no exchange in this test".to_string()))
        }
    }

    fn grant(access_token: &str) -> Grant {
        Grant {
            access_token: access_token.to_string(),
            expires_in: 3600,
            refresh_token: "r1".to_string(),
        }
    }

    #[test]
    fn test_sign_in_and_token_lookup() {
        let registry = SessionRegistry::new(Arc::new(NoExchange));

        let session_id = registry.sign_in(grant("a1")).unwrap();
        assert_eq!(session_id.len(), 32);
        assert_eq!(registry.session_count(), 1);

        let manager = registry.manager(&session_id).unwrap();
        assert_eq!(manager.get_valid_token().unwrap(), "a1");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new(Arc::new(NoExchange));

        let first = registry.sign_in(grant("a1")).unwrap();
        let second = registry.sign_in(grant("a2")).unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.manager(&first).unwrap().get_valid_token().unwrap(), "a1");
        assert_eq!(registry.manager(&second).unwrap().get_valid_token().unwrap(), "a2");
    }

    #[test]
    fn test_sign_out_drops_session() {
        let registry = SessionRegistry::new(Arc::new(NoExchange));

        let session_id = registry.sign_in(grant("a1")).unwrap();
        assert!(registry.sign_out(&session_id));
        assert_eq!(registry.session_count(), 0);

        let err = registry.manager(&session_id).unwrap_err();
        assert!(matches!(err, AuthError::UnknownSession(_)));

        // Second sign-out is a no-op
        assert!(!registry.sign_out(&session_id));
    }

    #[test]
    fn test_malformed_grant_does_not_create_session() {
        let registry = SessionRegistry::new(Arc::new(NoExchange));

        let mut bad = grant("a1");
        bad.refresh_token.clear();

        assert!(registry.sign_in(bad).is_err());
        assert_eq!(registry.session_count(), 0);
    }
}
