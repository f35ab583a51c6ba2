//! Schema bootstrap against the hosted store.
//!
//! Probes the REST interface for the expected tables and, when any is
//! missing, applies the bundled migration over a direct database connection.
//! The direct connection is optional wiring: without it the migrator still
//! reports what is missing but cannot create anything.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{error, info};

use crate::domain::Error;
use crate::domain::ports::{SchemaMigrator, SchemaReport};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const API_KEY_HEADER: &str = "apikey";
const EXPECTED_TABLES: [&str; 3] = ["users", "games", "rules"];
const MIGRATION_SQL: &str = include_str!("../../../migrations/0001_init.sql");

/// Migrator probing the REST interface and applying the bundled migration.
pub struct SupabaseSchemaMigrator {
    client: Client,
    base: Url,
    anon_key: String,
    database_url: Option<String>,
}

impl SupabaseSchemaMigrator {
    /// Build a migrator; `database_url` enables actually applying migrations.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base: Url,
        anon_key: String,
        database_url: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            anon_key,
            database_url,
        })
    }

    async fn table_missing(&self, table: &str) -> Result<bool, Error> {
        let url = self
            .base
            .join(&format!("rest/v1/{table}"))
            .map_err(|err| Error::internal(format!("invalid probe endpoint {table}: {err}")))?;
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .bearer_auth(self.anon_key.as_str())
            .query(&[("select", "count"), ("limit", "1")])
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, table, "schema probe transport failure");
                Error::unavailable("Data store unavailable")
            })?;
        // The REST layer answers 404 for unknown relations; any other status
        // means the table exists, even when row-level security hides rows.
        Ok(response.status() == StatusCode::NOT_FOUND)
    }

    fn apply_migration(database_url: String) -> Result<(), Error> {
        let mut conn = postgres::Client::connect(&database_url, postgres::NoTls).map_err(|err| {
            error!(error = %err, "database connection for migration failed");
            Error::unavailable("Database unavailable for migration")
        })?;
        conn.batch_execute(MIGRATION_SQL).map_err(|err| {
            error!(error = %err, "migration execution failed");
            Error::internal(format!("migration failed: {err}"))
        })
    }
}

#[async_trait]
impl SchemaMigrator for SupabaseSchemaMigrator {
    async fn ensure_schema(&self) -> Result<SchemaReport, Error> {
        let mut missing_tables = Vec::new();
        for table in EXPECTED_TABLES {
            if self.table_missing(table).await? {
                missing_tables.push(table.to_owned());
            }
        }
        if missing_tables.is_empty() {
            return Ok(SchemaReport::up_to_date());
        }

        let Some(database_url) = self.database_url.clone() else {
            return Err(Error::unavailable(
                "Schema is incomplete and no database credentials are configured",
            ));
        };
        info!(?missing_tables, "applying bundled schema migration");
        // The postgres client is blocking; keep it off the async executor.
        tokio::task::spawn_blocking(move || Self::apply_migration(database_url))
            .await
            .map_err(|err| Error::internal(format!("migration task failed: {err}")))??;
        Ok(SchemaReport {
            missing_tables,
            applied: true,
        })
    }
}
