//! JWT implementation of the `TokenService` trait.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::services::token_service::{
    TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH, TokenClaims, TokenError, TokenService,
};

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenService {
    #[must_use]
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(auth.access_token_ttl_minutes),
            refresh_ttl: Duration::days(auth.refresh_token_ttl_days),
        }
    }

    fn mint(&self, subject: Uuid, token_type: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: token_type.to_string(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    fn decode_typed(&self, token: &str, expected_type: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock leeway; a token is expired the second its exp passes.
        validation.leeway = 0;

        let data =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|err| {
                match err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })?;

        if data.claims.token_type != expected_type {
            return Err(TokenError::WrongType);
        }

        Ok(data.claims)
    }
}

impl TokenService for JwtTokenService {
    fn create_access_token(
        &self,
        subject: Uuid,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.mint(subject, TOKEN_TYPE_ACCESS, ttl.unwrap_or(self.access_ttl))
    }

    fn create_refresh_token(
        &self,
        subject: Uuid,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.mint(subject, TOKEN_TYPE_REFRESH, ttl.unwrap_or(self.refresh_ttl))
    }

    fn decode_access_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_typed(token, TOKEN_TYPE_ACCESS)
    }

    fn decode_refresh_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_typed(token, TOKEN_TYPE_REFRESH)
    }

    fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtTokenService {
        let auth = AuthConfig {
            jwt_secret: "unit-test-secret-0123456789".to_string(),
            ..AuthConfig::default()
        };
        JwtTokenService::new(&auth)
    }

    #[test]
    fn access_token_round_trips() {
        let service = service();
        let subject = Uuid::new_v4();

        let token = service.create_access_token(subject, None).unwrap();
        let claims = service.decode_access_token(&token).unwrap();

        assert_eq!(claims.sub, subject);
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_rejected_by_access_decoder() {
        let service = service();
        let token = service.create_refresh_token(Uuid::new_v4(), None).unwrap();

        let err = service.decode_access_token(&token).unwrap_err();
        assert_eq!(err, TokenError::WrongType);
    }

    #[test]
    fn access_token_rejected_by_refresh_decoder() {
        let service = service();
        let token = service.create_access_token(Uuid::new_v4(), None).unwrap();

        let err = service.decode_refresh_token(&token).unwrap_err();
        assert_eq!(err, TokenError::WrongType);
    }

    #[test]
    fn expired_token_reported_as_expired() {
        let service = service();
        let token = service
            .create_access_token(Uuid::new_v4(), Some(Duration::minutes(-5)))
            .unwrap();

        let err = service.decode_access_token(&token).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn garbage_rejected_as_invalid() {
        let service = service();

        let err = service.decode_access_token("not.a.token").unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn foreign_secret_rejected_as_invalid() {
        let issuer = service();
        let verifier = JwtTokenService::new(&AuthConfig {
            jwt_secret: "a-different-secret-entirely".to_string(),
            ..AuthConfig::default()
        });

        let token = issuer.create_access_token(Uuid::new_v4(), None).unwrap();
        let err = verifier.decode_access_token(&token).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn every_token_gets_a_fresh_jti() {
        let service = service();
        let subject = Uuid::new_v4();

        let first = service.create_refresh_token(subject, None).unwrap();
        let second = service.create_refresh_token(subject, None).unwrap();

        let first_claims = service.decode_refresh_token(&first).unwrap();
        let second_claims = service.decode_refresh_token(&second).unwrap();
        assert_ne!(first_claims.jti, second_claims.jti);
    }
}
