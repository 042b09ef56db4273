//! Signed identity credentials
//!
//! Credentials are HS256 JWTs in compact form. The payload carries the
//! identity claim together with `iat` and `exp` (unix seconds), so a
//! credential can be verified with nothing but the shared secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifetime of a freshly issued credential
pub const DEFAULT_CREDENTIAL_TTL_DAYS: i64 = 7;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Credential errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Invalid email: {0}")]
    InvalidInput(String),

    #[error("Credential missing")]
    Missing,

    #[error("Invalid or expired credential: {0}")]
    InvalidOrExpired(&'static str),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => CredentialError::InvalidOrExpired("signature mismatch"),
            ErrorKind::InvalidAlgorithm => CredentialError::InvalidOrExpired("unsupported algorithm"),
            ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => {
                CredentialError::InvalidOrExpired("malformed claims")
            }
            _ => CredentialError::InvalidOrExpired("malformed envelope"),
        }
    }
}

/// Identity claim embedded in every credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Opaque random identifier assigned at issuance
    pub id: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    identity: Identity,
    iat: i64,
    exp: i64,
}

/// A credential together with the identity it was minted for
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub identity: Identity,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Process-wide signing secret
#[derive(Clone)]
pub struct SigningKey {
    secret: Arc<[u8]>,
}

impl SigningKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Mints credentials for self-asserted identities.
///
/// There is no password or ownership check on the email: whoever asks for a
/// credential gets one. Production deployments must put a real verification
/// step in front of issuance.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    key: SigningKey,
    ttl: Duration,
}

impl CredentialIssuer {
    pub fn new(key: SigningKey, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    pub fn issue(&self, email_raw: &str) -> Result<IssuedCredential, CredentialError> {
        self.issue_at(email_raw, Utc::now())
    }

    /// Issue a credential as if the current time were `now`.
    ///
    /// The email is stored exactly as given. Blank input and input without
    /// an `@` are rejected.
    pub fn issue_at(
        &self,
        email_raw: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, CredentialError> {
        if email_raw.trim().is_empty() || !email_raw.contains('@') {
            return Err(CredentialError::InvalidInput(email_raw.to_string()));
        }

        let identity = Identity {
            id: Uuid::new_v4().simple().to_string(),
            email: email_raw.to_string(),
        };
        let expires_at = now + self.ttl;
        let claims = Claims {
            identity: identity.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.key.encoding_key())
            .map_err(|e| CredentialError::Signing(e.to_string()))?;

        info!(identity = %identity.id, expires_at = %expires_at.to_rfc3339(), "Credential issued");

        Ok(IssuedCredential {
            identity,
            token,
            expires_at,
        })
    }
}

/// Checks credential signatures and expiry
#[derive(Clone)]
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is compared against the caller's clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: key.decoding_key(),
            validation,
        }
    }

    /// Verify `token` against the time `now`.
    ///
    /// A credential is still valid at exactly its `exp` second and invalid
    /// from the next second on.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, CredentialError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Missing);
        }

        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;
        if now.timestamp() > claims.exp {
            return Err(CredentialError::InvalidOrExpired("expired"));
        }

        Ok(claims.identity)
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}
