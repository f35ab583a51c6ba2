//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O. The bundled ports are
//! process-wide, read-only configuration handles constructed once at startup;
//! per-request scoped access is derived from them, never cached on them.

use std::sync::Arc;

use crate::domain::ports::{
    CredentialVerifier, IdentityProvider, ScopedStoreFactory, SchemaMigrator,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Bearer credential introspection.
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Per-request scoped store derivation.
    pub stores: Arc<dyn ScopedStoreFactory>,
    /// Identity provider operations for the auth routes.
    pub identity: Arc<dyn IdentityProvider>,
    /// Idempotent schema bootstrap for the management route.
    pub migrator: Arc<dyn SchemaMigrator>,
}

impl HttpState {
    /// Bundle the port implementations used by the handlers.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        stores: Arc<dyn ScopedStoreFactory>,
        identity: Arc<dyn IdentityProvider>,
        migrator: Arc<dyn SchemaMigrator>,
    ) -> Self {
        Self {
            verifier,
            stores,
            identity,
            migrator,
        }
    }
}
