//! Signed, time-bounded access tokens
//!
//! Tokens are JWT-shaped: `header.claims.signature`, each part base64url
//! without padding. The signature is a BLAKE3 keyed hash over
//! `header.claims`, keyed by a key derived from the configured secret.
//! Tokens are never stored; every use re-verifies signature and expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod error;

pub use error::TokenError;

use crate::model::{Role, User};

/// Algorithm name written into, and required from, every token header
pub const TOKEN_ALGORITHM: &str = "BLAKE3";

const KEY_CONTEXT: &str = "pcbook 2024-01-01 access token signing key";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims embedded in an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Username
    pub sub: String,
    pub role: Role,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

impl UserClaims {
    pub fn username(&self) -> &str {
        &self.sub
    }
}

/// Mints and verifies access tokens
pub struct TokenManager {
    key: [u8; 32],
    token_duration: Duration,
}

impl TokenManager {
    pub fn new(secret_key: &SecretString, token_duration: Duration) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret_key.expose_secret().as_bytes()),
            token_duration,
        }
    }

    pub fn token_duration(&self) -> Duration {
        self.token_duration
    }

    /// Issue a token for `user`, valid for the configured duration.
    pub fn generate(&self, user: &User) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let lifetime = i64::try_from(self.token_duration.as_secs())
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        let claims = UserClaims {
            sub: user.username.clone(),
            role: user.role,
            iat,
            exp: iat.saturating_add(lifetime),
        };
        let header = Header {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let header = serde_json::to_vec(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
        let claims = serde_json::to_vec(&claims).map_err(|e| TokenError::Signing(e.to_string()))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = blake3::keyed_hash(&self.key, signing_input.as_bytes());

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.as_bytes())
        ))
    }

    /// Check signature, algorithm and expiry; return the embedded claims.
    pub fn verify(&self, token: &str) -> Result<UserClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| TokenError::Malformed)?;
        let header: Header = serde_json::from_slice(&header_json).map_err(|_| TokenError::Malformed)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(TokenError::UnexpectedAlgorithm(header.alg));
        }

        let signature: [u8; 32] = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?
            .try_into()
            .map_err(|_| TokenError::InvalidSignature)?;
        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        let expected = blake3::keyed_hash(&self.key, signing_input.as_bytes());
        // blake3::Hash equality is constant-time.
        if expected != blake3::Hash::from(signature) {
            return Err(TokenError::InvalidSignature);
        }

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| TokenError::Malformed)?;
        let claims: UserClaims = serde_json::from_slice(&claims_json)
            .map_err(|e| TokenError::InvalidClaims(e.to_string()))?;

        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
