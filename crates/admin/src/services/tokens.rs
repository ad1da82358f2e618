//! Bearer tokens.
//!
//! Tokens are JWT-compatible compact strings (`header.claims.signature`,
//! base64url without padding) signed with HMAC-SHA256. Two kinds are issued:
//! short-lived access tokens sent on every request, and refresh tokens that
//! can only be exchanged for a new pair.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use storedesk_core::{UserId, UserRole};

use crate::config::TokenConfig;

type HmacSha256 = Hmac<Sha256>;

/// Base64url of `{"alg":"HS256","typ":"JWT"}`.
const HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

/// Errors from issuing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("expected {expected} token")]
    WrongKind { expected: TokenKind },

    #[error("token signing key rejected")]
    Key,

    #[error("token encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Which of the two token kinds a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        })
    }
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: UserRole,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// An access/refresh token pair as returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies tokens with the configured secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl TokenSigner {
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    /// Issue a single token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the HMAC key is rejected.
    pub fn issue(
        &self,
        user: UserId,
        role: UserRole,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let iat = now.timestamp();
        let claims = Claims {
            sub: user,
            role,
            typ: kind,
            iat,
            exp: iat + ttl,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{HEADER}.{payload}");
        let signature = self.sign(&signing_input)?;
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Issue an access and a refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the HMAC key is rejected.
    pub fn issue_pair(
        &self,
        user: UserId,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user, role, TokenKind::Access, now)?,
            refresh_token: self.issue(user, role, TokenKind::Refresh, now)?,
        })
    }

    /// Check a token's signature, expiry and kind and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the matching `TokenError` for malformed, forged, expired or
    /// wrong-kind tokens.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (header, payload) = signing_input
            .split_once('.')
            .ok_or(TokenError::Malformed)?;
        if header != HEADER {
            return Err(TokenError::Malformed);
        }

        let expected_signature = self.sign(signing_input)?;
        if !constant_time_compare(&expected_signature, signature) {
            return Err(TokenError::BadSignature);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        if claims.typ != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(claims)
    }

    fn sign(&self, input: &str) -> Result<String, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)?;
        mac.update(input.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};

    fn signer() -> TokenSigner {
        TokenSigner::new(&TokenConfig {
            secret: SecretString::from("q8Vf!2kLz#7RmW4xN9pT@1cY6bH3jD5s"),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 604_800,
        })
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_header_constant() {
        assert_eq!(
            URL_SAFE_NO_PAD.decode(HEADER).unwrap(),
            br#"{"alg":"HS256","typ":"JWT"}"#
        );
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let token = signer
            .issue(UserId::new(7), UserRole::Admin, TokenKind::Access, now())
            .unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = signer.verify(&token, TokenKind::Access, now()).unwrap();
        assert_eq!(claims.sub, UserId::new(7));
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let signer = signer();
        let token = signer
            .issue(UserId::new(1), UserRole::Customer, TokenKind::Access, now())
            .unwrap();
        let later = now() + Duration::seconds(3600);
        assert!(matches!(
            signer.verify(&token, TokenKind::Access, later),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let signer = signer();
        let pair = signer.issue_pair(UserId::new(1), UserRole::Admin, now()).unwrap();
        assert!(matches!(
            signer.verify(&pair.refresh_token, TokenKind::Access, now()),
            Err(TokenError::WrongKind {
                expected: TokenKind::Access
            })
        ));
        assert!(signer.verify(&pair.refresh_token, TokenKind::Refresh, now()).is_ok());
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let signer = signer();
        let token = signer
            .issue(UserId::new(2), UserRole::Customer, TokenKind::Access, now())
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                sub: UserId::new(2),
                role: UserRole::Admin,
                typ: TokenKind::Access,
                iat: now().timestamp(),
                exp: now().timestamp() + 3600,
            })
            .unwrap(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert!(matches!(
            signer.verify(&forged, TokenKind::Access, now()),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = signer()
            .issue(UserId::new(3), UserRole::Admin, TokenKind::Access, now())
            .unwrap();
        let other = TokenSigner::new(&TokenConfig {
            secret: SecretString::from("Zx9!mQ2#pL7@vB4$nK8&tR1*wE6^yU3%"),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 3600,
        });
        assert!(matches!(
            other.verify(&token, TokenKind::Access, now()),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let signer = signer();
        for token in ["", "abc", "a.b", "a.b.c"] {
            assert!(signer.verify(token, TokenKind::Access, now()).is_err());
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
