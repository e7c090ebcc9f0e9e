//! Tokenwart - OAuth 2.0 bearer-credential lifecycle management for chat API clients
//!
//! This library keeps one short-lived access token continuously usable per
//! signed-in session: it hands the token out while it is valid, exchanges
//! the session's refresh token for a new one when it has expired, and
//! surfaces a typed error once a refresh has failed.
//!
//! # Features
//!
//! - Fast-path token reads with no locking against refresh machinery
//! - Single-flight refresh: concurrent callers share one exchange
//! - Refresh-token retention when the provider omits a rotated one
//! - Terminal failure state until explicit re-authentication
//! - Per-session manager ownership, no process-wide singleton
//!
//! # Example
//!
//! ```
//! use tokenwart::prelude::*;
//! use std::sync::Arc;
//!
//! let config = TokenEndpointConfig {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string(),
//!     token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
//! };
//!
//! let grant = Grant {
//!     access_token: "provider-issued-access-token".to_string(),
//!     expires_in: 3600,
//!     refresh_token: "provider-issued-refresh-token".to_string(),
//! };
//!
//! let exchanger = Arc::new(HttpExchanger::new(config).unwrap());
//! let manager = TokenLifecycleManager::new(grant, exchanger).unwrap();
//!
//! let token = manager.get_valid_token().unwrap();
//! assert_eq!(token, "provider-issued-access-token");
//! ```

pub mod api;
pub mod error;
pub mod exchange;
pub mod manager;
pub mod registry;
pub mod token;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api::ChatClient;
    pub use crate::error::AuthError;
    pub use crate::exchange::{
        HttpExchanger, RefreshResponse, TokenEndpointConfig, TokenExchange,
    };
    pub use crate::manager::TokenLifecycleManager;
    pub use crate::registry::SessionRegistry;
    pub use crate::token::{Grant, RefreshFailure, TokenState, TokenStatus};
}
