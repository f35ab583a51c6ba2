//! Adapters for the hosted identity and data platform.
//!
//! Three adapters cover the platform's surfaces: [`SupabaseAuthClient`] for
//! the identity API, [`SupabaseRestStore`] for row access under row-level
//! security, and [`SupabaseSchemaMigrator`] for schema bootstrap.

mod auth_client;
mod dto;
mod rest_store;
mod schema;

pub use auth_client::SupabaseAuthClient;
pub use rest_store::SupabaseRestStore;
pub use schema::SupabaseSchemaMigrator;
