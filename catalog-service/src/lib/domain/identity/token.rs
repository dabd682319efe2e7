use auth::JwtHandler;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::identity::models::Principal;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::UserId;
use crate::identity::errors::IdentityError;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id, decimal
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    /// A token is expired from the second its `exp` is reached.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Issues and validates signed bearer tokens.
///
/// Validation is a pure function of the token, the signing key and the clock;
/// no store is consulted and nothing is locked.
#[derive(Debug)]
pub struct TokenProvider {
    jwt_handler: JwtHandler,
    ttl: Duration,
}

impl TokenProvider {
    pub fn new(jwt_handler: JwtHandler, ttl: Duration) -> Self {
        Self { jwt_handler, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `principal`, valid for the configured TTL from now.
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, IdentityError> {
        self.issue_at(principal, Utc::now().timestamp())
    }

    /// Sign a token as if the current time were `now`.
    pub fn issue_at(&self, principal: &Principal, now: i64) -> Result<IssuedToken, IdentityError> {
        let claims = AccessClaims {
            sub: principal.id.to_string(),
            username: principal.username.clone(),
            role: principal.role,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };

        let token = self.jwt_handler.encode(&claims)?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Validate `token` against the current time.
    ///
    /// # Errors
    /// * `TokenInvalid` - Bad signature, algorithm, structure or claims
    /// * `TokenExpired` - Signature is good but `exp` has been reached
    pub fn validate(&self, token: &str) -> Result<Principal, IdentityError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate `token` as if the current time were `now`.
    ///
    /// The signature is checked before any claim is trusted, so a forged token
    /// with a past `exp` is reported as invalid, never as expired.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Principal, IdentityError> {
        let claims: AccessClaims = self.jwt_handler.decode(token)?;

        if claims.is_expired(now) {
            return Err(IdentityError::TokenExpired);
        }

        let id = UserId::parse(&claims.sub)
            .ok_or_else(|| IdentityError::TokenInvalid(format!("bad subject: {}", claims.sub)))?;

        Ok(Principal {
            id,
            username: claims.username,
            role: claims.role,
            // Tokens are only ever issued to enabled accounts.
            enabled: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
    const NOW: i64 = 1_700_000_000;

    fn provider() -> TokenProvider {
        TokenProvider::new(JwtHandler::new(SECRET).unwrap(), Duration::hours(24))
    }

    fn alice() -> Principal {
        Principal {
            id: UserId(1),
            username: "alice".to_string(),
            role: Role::User,
            enabled: true,
        }
    }

    /// Flip the lowest bit of the first signature character's 6-bit value.
    fn flip_signature_bit(token: &str) -> String {
        const ALPHABET: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
        let (signed, signature) = token.rsplit_once('.').unwrap();
        let mut sig = signature.as_bytes().to_vec();
        let index = ALPHABET.iter().position(|c| *c == sig[0]).unwrap();
        sig[0] = ALPHABET[index ^ 1];
        format!("{}.{}", signed, String::from_utf8(sig).unwrap())
    }

    #[test]
    fn test_issue_then_validate_round_trip() {
        let provider = provider();
        let principal = alice();

        let issued = provider.issue_at(&principal, NOW).unwrap();
        assert_eq!(issued.expires_at, NOW + 24 * 60 * 60);

        let validated = provider.validate_at(&issued.token, NOW + 60).unwrap();
        assert_eq!(validated, principal);
    }

    #[test]
    fn test_round_trip_keeps_admin_role() {
        let provider = provider();
        let admin = Principal {
            id: UserId(9),
            username: "root".to_string(),
            role: Role::Admin,
            enabled: true,
        };

        let issued = provider.issue(&admin).unwrap();
        assert_eq!(provider.validate(&issued.token).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_expiry_boundary() {
        let provider = provider();
        let issued = provider.issue_at(&alice(), NOW).unwrap();

        assert!(provider.validate_at(&issued.token, issued.expires_at - 1).is_ok());
        assert!(matches!(
            provider.validate_at(&issued.token, issued.expires_at),
            Err(IdentityError::TokenExpired)
        ));
        assert!(matches!(
            provider.validate_at(&issued.token, issued.expires_at + 3600),
            Err(IdentityError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_issued_in_the_past_is_expired_now() {
        let provider = provider();
        let issued = provider
            .issue_at(&alice(), Utc::now().timestamp() - 25 * 60 * 60)
            .unwrap();

        assert!(matches!(
            provider.validate(&issued.token),
            Err(IdentityError::TokenExpired)
        ));
    }

    #[test]
    fn test_flipped_signature_bit_is_invalid() {
        let provider = provider();
        let issued = provider.issue_at(&alice(), NOW).unwrap();

        let tampered = flip_signature_bit(&issued.token);
        assert_ne!(tampered, issued.token);

        assert!(matches!(
            provider.validate_at(&tampered, NOW),
            Err(IdentityError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_tampered_and_expired_reports_invalid() {
        let provider = provider();
        let issued = provider.issue_at(&alice(), NOW).unwrap();
        let tampered = flip_signature_bit(&issued.token);

        assert!(matches!(
            provider.validate_at(&tampered, issued.expires_at + 10),
            Err(IdentityError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_token_from_other_key_is_invalid() {
        let other = TokenProvider::new(
            JwtHandler::new(b"another-secret-key-that-is-long-enough!").unwrap(),
            Duration::hours(24),
        );
        let issued = other.issue_at(&alice(), NOW).unwrap();

        assert!(matches!(
            provider().validate_at(&issued.token, NOW),
            Err(IdentityError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_missing_or_unknown_role_is_invalid() {
        #[derive(Serialize)]
        struct NoRole {
            sub: String,
            username: String,
            iat: i64,
            exp: i64,
        }

        #[derive(Serialize)]
        struct OddRole {
            sub: String,
            username: String,
            role: String,
            iat: i64,
            exp: i64,
        }

        let handler = JwtHandler::new(SECRET).unwrap();
        let provider = provider();

        let no_role = handler
            .encode(&NoRole {
                sub: "1".to_string(),
                username: "alice".to_string(),
                iat: NOW,
                exp: NOW + 60,
            })
            .unwrap();
        assert!(matches!(
            provider.validate_at(&no_role, NOW),
            Err(IdentityError::TokenInvalid(_))
        ));

        let wildcard = handler
            .encode(&OddRole {
                sub: "1".to_string(),
                username: "alice".to_string(),
                role: "*".to_string(),
                iat: NOW,
                exp: NOW + 60,
            })
            .unwrap();
        assert!(matches!(
            provider.validate_at(&wildcard, NOW),
            Err(IdentityError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_non_numeric_subject_is_invalid() {
        let handler = JwtHandler::new(SECRET).unwrap();
        let token = handler
            .encode(&AccessClaims {
                sub: "alice".to_string(),
                username: "alice".to_string(),
                role: Role::Admin,
                iat: NOW,
                exp: NOW + 60,
            })
            .unwrap();

        assert!(matches!(
            provider().validate_at(&token, NOW),
            Err(IdentityError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_wire_format_segments() {
        let issued = provider().issue_at(&alice(), NOW).unwrap();
        let segments: Vec<&str> = issued.token.split('.').collect();

        assert_eq!(segments.len(), 3);
        for segment in segments {
            assert!(!segment.is_empty());
            assert!(segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        }
    }
}
