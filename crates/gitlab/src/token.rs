//! Access-token lookup contract.
//!
//! Token storage itself (OAuth exchange, refresh) belongs to the
//! external account layer; the gateway only needs "token for user".

use async_trait::async_trait;
use tagvault_core::types::DbId;

/// Error type for token lookups.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No token is stored for the user.
    #[error("No access token for user {0}")]
    NotFound(DbId),

    /// The backing store failed.
    #[error("Token store error: {0}")]
    Store(String),
}

/// Resolves a user's GitLab access token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn access_token(&self, user_id: DbId) -> Result<String, TokenError>;
}

/// Token store backed by a single service-account token.
///
/// Useful for single-tenant deployments and tests; multi-user
/// deployments plug in their account store instead.
#[derive(Debug, Clone)]
pub struct StaticTokenStore {
    token: String,
}

impl StaticTokenStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenStore for StaticTokenStore {
    async fn access_token(&self, _user_id: DbId) -> Result<String, TokenError> {
        Ok(self.token.clone())
    }
}
