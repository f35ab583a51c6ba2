//! Domain ports: the seams between the core and its adapters.
//!
//! Driving ports are called by inbound adapters; driven ports are implemented
//! by outbound adapters. Fixture implementations live beside their traits so
//! handler tests stay deterministic without wiring real infrastructure.

mod credential_verifier;
mod identity_provider;
mod row_store;
mod schema_migrator;

pub use credential_verifier::CredentialVerifier;
pub use identity_provider::{FixtureIdentityHub, IdentityProvider};
pub use row_store::{InMemoryRows, OwnedRowStore, Row, ScopedStoreFactory};
pub use schema_migrator::{FixtureSchemaMigrator, SchemaMigrator, SchemaReport};
