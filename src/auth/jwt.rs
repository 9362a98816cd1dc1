//! JWT token generation and validation
//!
//! Stateless HS256 tokens carrying the member ID, identifier, and role.
//! Token invalidation relies on expiry plus the per-member token_version
//! (bumped on force-logout; checked at the DB on sensitive routes).

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::types::WilbeError;

/// Claims carried in a wilbe JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: stable member ID
    pub sub: String,
    /// Member identifier (email)
    pub identifier: String,
    /// Platform role at issue time
    pub role: Role,
    /// Token version at issue time (for force-logout)
    #[serde(default)]
    pub token_version: i32,
    /// Expiry (seconds since epoch)
    pub exp: u64,
    /// Issued-at (seconds since epoch)
    pub iat: u64,
}

/// Result of verifying a token
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

/// Generates and verifies wilbe JWTs
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a validator from a shared secret
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, WilbeError> {
        if secret.is_empty() {
            return Err(WilbeError::Config("JWT secret must not be empty".into()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        })
    }

    /// Generate a token for a member. Returns (token, expires_at).
    pub fn generate_token(
        &self,
        member_id: &str,
        identifier: &str,
        role: Role,
        token_version: i32,
    ) -> Result<(String, u64), WilbeError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let exp = now + self.expiry_seconds;

        let claims = Claims {
            sub: member_id.to_string(),
            identifier: identifier.to_string(),
            role,
            token_version,
            exp,
            iat: now,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| WilbeError::Auth(format!("Failed to sign token: {}", e)))?;

        Ok((token, exp))
    }

    /// Verify a token and extract its claims
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => TokenValidationResult {
                valid: true,
                claims: Some(data.claims),
                error: None,
            },
            Err(e) => TokenValidationResult {
                valid: false,
                claims: None,
                error: Some(format!("Invalid token: {}", e)),
            },
        }
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    let header = header?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> JwtValidator {
        JwtValidator::new("test-secret".into(), 3600).unwrap()
    }

    #[test]
    fn test_generate_and_verify() {
        let jwt = validator();
        let (token, exp) = jwt
            .generate_token("mem-1", "ada@lab.org", Role::Member, 1)
            .unwrap();

        let result = jwt.verify_token(&token);
        assert!(result.valid);

        let claims = result.claims.unwrap();
        assert_eq!(claims.sub, "mem-1");
        assert_eq!(claims.identifier, "ada@lab.org");
        assert_eq!(claims.role, Role::Member);
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let jwt = validator();
        let (token, _) = jwt
            .generate_token("mem-1", "ada@lab.org", Role::Admin, 1)
            .unwrap();

        let other = JwtValidator::new("different-secret".into(), 3600).unwrap();
        let result = other.verify_token(&token);
        assert!(!result.valid);
        assert!(result.claims.is_none());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = validator().verify_token("not.a.token");
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_token_from_header(Some("bearer abc")), Some("abc"));
        assert_eq!(extract_token_from_header(Some("Basic abc")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(None), None);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(JwtValidator::new(String::new(), 3600).is_err());
    }
}
