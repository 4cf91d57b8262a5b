//! Credential Verifier: bearer extraction, HS256 verification, issuance.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{validate_claims, AuthError, TokenClaims, UserRecord};

/// Lifetime of every issued token. Fixed at issuance, not configurable.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Verifies (and issues) signed bearer tokens against one process-wide secret.
#[derive(Clone)]
pub struct CredentialVerifier {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl CredentialVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(validation),
        }
    }

    /// Verify a raw `Authorization` header value.
    ///
    /// Any failure after the header parsed as `Bearer <token>` collapses to
    /// [`AuthError::InvalidCredential`]; the reason is only logged.
    pub fn verify(&self, header: Option<&str>) -> Result<TokenClaims, AuthError> {
        let token = extract_bearer(header)?;
        self.verify_token(token, Utc::now())
    }

    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            AuthError::InvalidCredential
        })?;

        validate_claims(&data.claims, now).map_err(|e| {
            tracing::debug!(error = %e, sub = %data.claims.sub, "bearer token rejected");
            AuthError::InvalidCredential
        })?;

        Ok(data.claims)
    }

    /// Issue a token for `user`, valid for [`TOKEN_TTL`] from now.
    pub fn issue(&self, user: &UserRecord) -> Result<String, IssueError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &UserRecord, issued_at: DateTime<Utc>) -> Result<String, IssueError> {
        let iat = issued_at.timestamp();
        let claims = TokenClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat,
            exp: iat + TOKEN_TTL.as_secs() as i64,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl_secs", &TOKEN_TTL.as_secs())
            .finish()
    }
}

/// Extract the token from an `Authorization` header value of the form
/// `Bearer <token>`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}
