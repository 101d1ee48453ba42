//! Access and refresh tokens.
//!
//! Access tokens are short-lived HS256 JWTs whose claims carry the user's
//! typed [`Role`]; a token naming a role this server does not know fails to
//! decode. Refresh tokens are opaque random strings exchanged through the
//! `refresh_sessions` table, which only keeps their SHA-256 fingerprint.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use streamsource_core::roles::Role;
use streamsource_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::config::env_or;

/// `iss` claim stamped on and required of every access token.
const ISSUER: &str = "streamsource";

/// Clock skew tolerated when checking `exp`.
const LEEWAY_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: DbId,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is invalid: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("could not sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Signing secret and token lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Reads `JWT_SECRET` (required), `JWT_ACCESS_EXPIRY_MINS` (60) and
    /// `JWT_REFRESH_EXPIRY_DAYS` (7).
    ///
    /// # Panics
    ///
    /// Panics when the secret is missing or blank, or a lifetime is not a
    /// positive integer.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.trim().is_empty(), "JWT_SECRET must be set");

        let lifetime = |key: &str, default: &str| -> i64 {
            let value: i64 = env_or(key, default)
                .parse()
                .unwrap_or_else(|_| panic!("{key} must be an integer"));
            assert!(value > 0, "{key} must be positive");
            value
        };

        Self {
            secret,
            access_token_expiry_mins: lifetime("JWT_ACCESS_EXPIRY_MINS", "60"),
            refresh_token_expiry_days: lifetime("JWT_REFRESH_EXPIRY_DAYS", "7"),
        }
    }

    /// Access token lifetime, as reported in `expires_in`.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    pub fn refresh_expires_at(&self, now: Timestamp) -> Timestamp {
        now + Duration::days(self.refresh_token_expiry_days)
    }

    pub fn issue_access_token(&self, user_id: DbId, role: Role) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat,
            exp: iat + self.access_ttl_secs(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(TokenError::Signing)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECS;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e),
        })
    }
}

/// A freshly minted refresh token. `secret` goes to the client once;
/// `fingerprint` is what gets stored.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub secret: String,
    pub fingerprint: String,
}

impl RefreshToken {
    pub fn generate() -> Self {
        let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let fingerprint = Self::fingerprint_of(&secret);
        Self { secret, fingerprint }
    }

    pub fn fingerprint_of(secret: &str) -> String {
        format!("{:x}", Sha256::digest(secret.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "unit-test-signing-secret".to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 7,
        }
    }

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_carries_typed_role() {
        let config = config();
        let token = config.issue_access_token(42, Role::Editor).unwrap();
        let claims = config.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Editor);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn unknown_role_is_rejected_at_decode() {
        let now = Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({ "sub": 1, "role": "moderator", "iss": ISSUER, "iat": now, "exp": now + 60 }),
            &config().secret,
        );
        assert_matches!(config().verify_access_token(&token), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn expired_token_reports_expiry() {
        let now = Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({ "sub": 1, "role": "default", "iss": ISSUER, "iat": now - 600, "exp": now - 300 }),
            &config().secret,
        );
        assert_matches!(config().verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_issuer_and_secret_are_rejected() {
        let now = Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({ "sub": 1, "role": "admin", "iss": "elsewhere", "iat": now, "exp": now + 60 }),
            &config().secret,
        );
        assert_matches!(config().verify_access_token(&token), Err(TokenError::Invalid(_)));

        let other = JwtConfig {
            secret: "another-secret".to_string(),
            ..config()
        };
        let token = other.issue_access_token(1, Role::Admin).unwrap();
        assert!(config().verify_access_token(&token).is_err());
    }

    #[test]
    fn refresh_fingerprint_is_sha256_hex_of_secret() {
        let token = RefreshToken::generate();
        assert_eq!(token.secret.len(), 64);
        assert_eq!(token.fingerprint, RefreshToken::fingerprint_of(&token.secret));
        assert_eq!(token.fingerprint.len(), 64);
        assert_ne!(token.secret, RefreshToken::generate().secret);
    }
}
