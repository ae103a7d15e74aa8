//! Signed bearer-token sessions.
//!
//! The gateway keeps no session table: a session *is* its token. Tokens
//! are `base64url(claims JSON) . hex(HMAC-SHA256(secret, payload))`, so
//! verification needs only the signing key. Any tampering with the claims
//! segment breaks the MAC; expiry is checked after the MAC.
//!
//! Administrative credentials are a single configured pair. `issue` mints
//! a token with a fixed TTL; `verify` re-derives the claims from the token
//! alone; `require_admin` gates every pipeline-mutating endpoint.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use uuid::Uuid;

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds. A token is valid strictly before this instant.
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    InvalidToken,
    Expired,
    Forbidden,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::InvalidToken => write!(f, "invalid token"),
            AuthError::Expired => write!(f, "token expired"),
            AuthError::Forbidden => write!(f, "admin access required"),
        }
    }
}

impl std::error::Error for AuthError {}

pub struct AuthGateway {
    secret: String,
    admin_email: String,
    admin_password: String,
    token_ttl_secs: i64,
}

impl AuthGateway {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            admin_email: config.admin_email.clone(),
            admin_password: config.admin_password.clone(),
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    /// Check the credential pair and mint a signed admin session token.
    pub fn issue(&self, email: &str, password: &str) -> Result<(String, Claims), AuthError> {
        if email != self.admin_email || password != self.admin_password {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: email.to_string(),
            is_admin: true,
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        Ok((self.sign(&claims), claims))
    }

    /// Re-derive the claims from a token. Signature first, then expiry;
    /// callers surface every failure uniformly as 401.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload_b64, sig_hex) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let sig = hex::decode(sig_hex).map_err(|_| AuthError::InvalidToken)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| AuthError::InvalidToken)?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&sig).map_err(|_| AuthError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    pub fn require_admin(claims: &Claims) -> Result<(), AuthError> {
        if claims.is_admin {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    fn sign(&self, claims: &Claims) -> String {
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("serialize claims"));
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("{}.{}", payload, sig)
    }
}
