//! JWT token service
//!
//! Validates staff tokens issued by the account service. HS256 with a shared
//! secret; the issuer claim is checked to reject tokens minted elsewhere.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret (should be at least 32 bytes)
    pub secret: String,
    /// Expected token issuer
    pub issuer: String,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development secret");
            "development-secret-must-be-replaced".to_string()
        });
        Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "comanda-accounts".to_string()),
        }
    }
}

/// JWT claims carried by staff tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (staff member ID)
    pub sub: String,
    /// Tenant the staff member belongs to
    pub tenant_id: String,
    /// Display name (snapshot for audit)
    pub name: String,
    /// Role name
    pub role: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued-at timestamp
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Token validation (and, for tooling, issuance) service
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
        }
    }

    /// Validate a token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// Issue a token.
    ///
    /// Production tokens come from the account service; this is used by
    /// local tooling and tests.
    pub fn issue_token(
        &self,
        sub: &str,
        tenant_id: &str,
        name: &str,
        role: &str,
        ttl_minutes: i64,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }

    /// Extract the bearer token from an Authorization header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "test-secret-test-secret-test-secret".to_string(),
            issuer: "comanda-accounts".to_string(),
        })
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let service = test_service();
        let token = service
            .issue_token("user-1", "tenant-a", "Ana", "waiter", 60)
            .unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.tenant_id, "tenant-a");
        assert_eq!(claims.name, "Ana");
        assert_eq!(claims.role, "waiter");
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let token = service
            .issue_token("user-1", "tenant-a", "Ana", "waiter", -5)
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let foreign = JwtService::new(&JwtConfig {
            secret: "test-secret-test-secret-test-secret".to_string(),
            issuer: "someone-else".to_string(),
        });
        let token = foreign
            .issue_token("user-1", "tenant-a", "Ana", "waiter", 60)
            .unwrap();

        let service = test_service();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
