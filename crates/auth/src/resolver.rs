//! Identity Resolver: re-derive the caller's authority from live state.

use std::sync::Arc;

use async_trait::async_trait;

use warden_core::UserId;

use crate::{AuthError, Principal, StoreError, TokenClaims, UserRecord, UserStatus};

/// Read port onto the identity store used once per request.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// The record for `id`, only if its status is `active`.
    async fn find_active(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;
}

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Resolve a verified claim into a [`Principal`].
    ///
    /// Role, email and name come from the stored record, not the claim, so a
    /// role change or suspension after issuance applies to the next request.
    /// "Never existed" and "not active" are the same outcome.
    pub async fn resolve(&self, claims: &TokenClaims) -> Result<Principal, AuthError> {
        let record = self
            .store
            .find_active(claims.sub)
            .await?
            .ok_or(AuthError::PrincipalNotEligible)?;

        if record.status != UserStatus::Active {
            tracing::warn!(user_id = %record.id, status = %record.status, "identity store returned an inactive record");
            return Err(AuthError::PrincipalNotEligible);
        }

        let principal = Principal::from_record(&record);
        if principal.role.map(|r| r.as_str()) != Some(claims.role.as_str()) {
            tracing::debug!(
                user_id = %principal.id,
                claimed = %claims.role,
                "token role differs from stored role; using stored role"
            );
        }

        Ok(principal)
    }
}
