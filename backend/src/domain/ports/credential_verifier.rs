//! Driving port for bearer credential introspection.
//!
//! Inbound adapters call this to turn an opaque credential into a verified
//! identity without knowing the backing provider. Every call is a live
//! round-trip: verification results are never cached across requests, so a
//! revoked credential fails on the very next request.

use async_trait::async_trait;

use crate::domain::{BearerToken, Error, Identity};

/// Validates an opaque bearer credential against the identity provider.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Introspect the credential and return the confirmed identity.
    ///
    /// # Errors
    /// `unauthorized` both when the provider rejects the credential and when
    /// the provider call itself fails; adapters log the two causes
    /// distinctly, but callers must not be able to tell them apart.
    async fn verify(&self, token: &BearerToken) -> Result<Identity, Error>;
}
