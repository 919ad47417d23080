use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::ContactError;

/// Resolves a bearer token to the user it belongs to
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, bearer: &str) -> Result<Uuid, ContactError>;
}

/// Fixed token table loaded from `[[auth.tokens]]`
pub struct StaticTokenIdentity {
    tokens: HashMap<String, Uuid>,
}

impl StaticTokenIdentity {
    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        let mut tokens = HashMap::with_capacity(config.tokens.len());
        for entry in &config.tokens {
            let user_id = Uuid::parse_str(entry.user_id.trim()).map_err(|e| {
                anyhow::anyhow!("auth token for user '{}' has an invalid user id: {}", entry.user_id, e)
            })?;
            tokens.insert(entry.token.clone(), user_id);
        }

        if tokens.is_empty() {
            tracing::warn!("No auth tokens configured; every contacts request will be rejected");
        }

        Ok(Self { tokens })
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn authenticate(&self, bearer: &str) -> Result<Uuid, ContactError> {
        let token = bearer.trim();
        if token.is_empty() {
            return Err(ContactError::Unauthenticated);
        }

        self.tokens
            .get(token)
            .copied()
            .ok_or(ContactError::Unauthenticated)
    }
}
