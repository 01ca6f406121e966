//! Signed bearer tokens.
//!
//! Format: `base64url(claims_json) "." base64url(hmac_sha256(claims_b64))`,
//! both parts unpadded. Tokens embedded in links are sometimes delivered
//! wrapped in quotes; `verify` strips them.

use crate::error::{Result, RetroError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// General API access.
    Access,
    /// Link to join a team's retro.
    Retro,
    /// Link to answer a team survey.
    Survey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub purpose: TokenPurpose,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
}

impl Claims {
    /// Access tokens are operator tokens; retro and survey links are
    /// member invitations.
    pub fn is_admin(&self) -> bool {
        self.purpose == TokenPurpose::Access
    }

    /// Admins reach every team; members only the team their link names.
    pub fn can_access_team(&self, team_id: &str) -> bool {
        self.is_admin() || self.team_id.as_deref() == Some(team_id)
    }
}

/// Issues and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl_hours: u32) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(RetroError::InvalidInput("token secret must not be empty".into()));
        }
        Ok(Self {
            secret: secret.to_vec(),
            ttl: Duration::hours(i64::from(ttl_hours)),
        })
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length")
    }

    /// Issue a token for `sub` expiring after the configured TTL.
    pub fn issue(&self, sub: &str, team_id: Option<&str>, purpose: TokenPurpose) -> Result<String> {
        let claims = Claims {
            sub: sub.to_string(),
            team_id: team_id.map(str::to_string),
            purpose,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{sig}"))
    }

    /// Check signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token = token.trim().trim_matches('"');
        let (payload, sig) = token
            .split_once('.')
            .ok_or_else(|| RetroError::InvalidToken("malformed token".into()))?;

        let sig = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| RetroError::InvalidToken("malformed signature".into()))?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| RetroError::InvalidToken("bad signature".into()))?;

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| RetroError::InvalidToken("malformed payload".into()))?;
        let claims: Claims = serde_json::from_slice(&raw)
            .map_err(|e| RetroError::InvalidToken(format!("bad claims: {e}")))?;

        if claims.exp < Utc::now().timestamp() {
            return Err(RetroError::TokenExpired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", 24).unwrap()
    }

    #[test]
    fn issue_then_verify() {
        let s = signer();
        let token = s.issue("u1", Some("t1"), TokenPurpose::Survey).unwrap();
        let claims = s.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.team_id.as_deref(), Some("t1"));
        assert_eq!(claims.purpose, TokenPurpose::Survey);
    }

    #[test]
    fn verify_strips_quotes() {
        let s = signer();
        let token = s.issue("u1", None, TokenPurpose::Access).unwrap();
        assert!(s.verify(&format!("\"{token}\"")).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = signer().issue("u1", None, TokenPurpose::Access).unwrap();
        let other = TokenSigner::new("other-secret", 24).unwrap();
        assert!(matches!(
            other.verify(&token),
            Err(RetroError::InvalidToken(_))
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let s = signer();
        let token = s.issue("u1", None, TokenPurpose::Access).unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let forged_claims = Claims {
            sub: "admin".into(),
            team_id: None,
            purpose: TokenPurpose::Access,
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        assert!(s.verify(&format!("{forged_payload}.{sig}")).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let s = signer();
        let claims = Claims {
            sub: "u1".into(),
            team_id: None,
            purpose: TokenPurpose::Access,
            exp: Utc::now().timestamp() - 10,
        };
        let token = s.sign(&claims).unwrap();
        assert!(matches!(s.verify(&token), Err(RetroError::TokenExpired)));
    }

    #[test]
    fn garbage_is_rejected() {
        let s = signer();
        assert!(s.verify("").is_err());
        assert!(s.verify("abc").is_err());
        assert!(s.verify("abc.!!!").is_err());
    }

    #[test]
    fn member_claims_are_scoped_to_their_team() {
        let member = Claims {
            sub: "u1".into(),
            team_id: Some("t1".into()),
            purpose: TokenPurpose::Retro,
            exp: i64::MAX,
        };
        assert!(!member.is_admin());
        assert!(member.can_access_team("t1"));
        assert!(!member.can_access_team("t2"));

        let unscoped = Claims {
            team_id: None,
            ..member.clone()
        };
        assert!(!unscoped.can_access_team("t1"));

        let admin = Claims {
            purpose: TokenPurpose::Access,
            ..unscoped
        };
        assert!(admin.is_admin());
        assert!(admin.can_access_team("t2"));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(TokenSigner::new("", 1).is_err());
    }
}
