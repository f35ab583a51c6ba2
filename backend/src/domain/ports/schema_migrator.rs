//! Driven port for idempotent external schema bootstrap.
//!
//! The data store owns its schema; this port only triggers the bootstrap.
//! Repeated calls are no-ops once every table and column is present, so the
//! management endpoint can be retried safely.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Error;

/// Outcome of a schema bootstrap attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SchemaReport {
    /// Tables that were absent before the attempt.
    pub missing_tables: Vec<String>,
    /// Whether migrations were executed during this attempt.
    pub applied: bool,
}

impl SchemaReport {
    /// Report for a store that already had the full schema.
    #[must_use]
    pub const fn up_to_date() -> Self {
        Self {
            missing_tables: Vec::new(),
            applied: false,
        }
    }
}

/// Ensures the external store has the tables and columns this layer expects.
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    /// Probe the store and run migrations when anything is missing.
    ///
    /// # Errors
    /// `unavailable` when the store cannot be probed or migrations cannot be
    /// executed with the configured credentials.
    async fn ensure_schema(&self) -> Result<SchemaReport, Error>;
}

/// No-op migrator for wiring that has no direct database access.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSchemaMigrator;

#[async_trait]
impl SchemaMigrator for FixtureSchemaMigrator {
    async fn ensure_schema(&self) -> Result<SchemaReport, Error> {
        Ok(SchemaReport::up_to_date())
    }
}
