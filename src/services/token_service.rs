//! Access and refresh token issuance and verification.
//!
//! Both token kinds are HS256 JWTs signed with the same secret and told
//! apart by an embedded type tag, so a refresh token can never pass where
//! an access token is expected.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Type tag carried by access tokens.
pub const TOKEN_TYPE_ACCESS: &str = "access";

/// Type tag carried by refresh tokens.
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Errors specific to token handling. `WrongType` is deliberately distinct
/// from `Invalid`: the token was well-formed and trusted, just presented to
/// the wrong verifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Wrong token type")]
    WrongType,

    #[error("Token signing error: {0}")]
    Signing(String),
}

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the user id the token was issued for.
    pub sub: Uuid,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// [`TOKEN_TYPE_ACCESS`] or [`TOKEN_TYPE_REFRESH`].
    pub token_type: String,
    /// Unique token id; every issued token gets a fresh one, so rotated
    /// refresh tokens are distinguishable even within the same second.
    pub jti: Uuid,
}

/// Domain service trait for token issuance and verification.
pub trait TokenService: Send + Sync {
    /// Issues an access token for `subject`. `ttl` overrides the configured
    /// lifetime when given.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if encoding fails.
    fn create_access_token(&self, subject: Uuid, ttl: Option<Duration>)
    -> Result<String, TokenError>;

    /// Issues a refresh token for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if encoding fails.
    fn create_refresh_token(
        &self,
        subject: Uuid,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError>;

    /// Verifies an access token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] past the expiry, [`TokenError::WrongType`]
    /// for a refresh token, and [`TokenError::Invalid`] for anything else.
    fn decode_access_token(&self, token: &str) -> Result<TokenClaims, TokenError>;

    /// Verifies a refresh token and returns its claims.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TokenService::decode_access_token`], with access
    /// tokens rejected as [`TokenError::WrongType`].
    fn decode_refresh_token(&self, token: &str) -> Result<TokenClaims, TokenError>;

    /// Configured access token lifetime.
    fn access_ttl(&self) -> Duration;

    /// Configured refresh token lifetime.
    fn refresh_ttl(&self) -> Duration;
}
