//! Access gate
//!
//! Two admission stages in front of every protected operation: credential
//! verification, then the per-identity quota charge. Each stage returns a
//! typed `GateError`; the HTTP mapping lives in `api::error`.

pub mod credential;
pub mod quota;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

pub use credential::{
    CredentialError, CredentialIssuer, CredentialVerifier, Identity, SigningKey,
    DEFAULT_CREDENTIAL_TTL_DAYS,
};
pub use quota::{
    InMemoryUsageStore, QuotaError, QuotaPolicy, QuotaStatus, QuotaTracker, UsageStore,
    MAX_REQUESTS_PER_DAY,
};

/// Failures of the admission pipeline
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing credential")]
    MissingCredential,

    #[error("Invalid or expired credential")]
    InvalidOrExpiredCredential,

    #[error("Quota check attempted without an authenticated identity")]
    UnauthenticatedQuotaCheck,

    #[error("Daily quota of {limit} requests exceeded")]
    QuotaExceeded {
        limit: u32,
        resets_at: DateTime<Utc>,
    },
}

impl From<CredentialError> for GateError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidInput(email) => GateError::InvalidInput(email),
            CredentialError::Missing => GateError::MissingCredential,
            CredentialError::InvalidOrExpired(_) | CredentialError::Signing(_) => {
                GateError::InvalidOrExpiredCredential
            }
        }
    }
}

impl From<QuotaError> for GateError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::Exceeded { limit, resets_at } => GateError::QuotaExceeded { limit, resets_at },
        }
    }
}

/// A request that passed both stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub identity: Identity,
    pub quota: QuotaStatus,
}

/// Verifier and tracker composed into one admission pipeline
#[derive(Debug)]
pub struct AccessGate<S: UsageStore = InMemoryUsageStore> {
    verifier: CredentialVerifier,
    tracker: QuotaTracker<S>,
}

impl<S: UsageStore> AccessGate<S> {
    pub fn new(verifier: CredentialVerifier, tracker: QuotaTracker<S>) -> Self {
        Self { verifier, tracker }
    }

    pub fn tracker(&self) -> &QuotaTracker<S> {
        &self.tracker
    }

    /// Stage one: recover the identity from a bearer credential
    pub fn authenticate(
        &self,
        credential: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Identity, GateError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(GateError::MissingCredential)?;

        // Logged by the HTTP layer when the rejection becomes a response.
        Ok(self.verifier.verify_at(credential, now)?)
    }

    /// Stage two: charge one request to an authenticated identity.
    ///
    /// Fails closed when no identity is supplied.
    pub fn charge(
        &self,
        identity: Option<&Identity>,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, GateError> {
        let identity = identity.ok_or_else(|| {
            warn!("Quota check reached without an authenticated identity");
            GateError::UnauthenticatedQuotaCheck
        })?;

        Ok(self.tracker.admit_at(&identity.id, now)?)
    }

    /// Both stages in order
    pub fn admit(&self, credential: Option<&str>, now: DateTime<Utc>) -> Result<Admission, GateError> {
        let identity = self.authenticate(credential, now)?;
        let quota = self.charge(Some(&identity), now)?;
        Ok(Admission { identity, quota })
    }
}
