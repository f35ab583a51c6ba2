//! Scorecard API backend.
//!
//! Multiplayer score-tracking service: users authenticate against an external
//! identity provider, then create games and saved rule presets isolated to
//! their own identity by the data store's row-level security.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Trace middleware re-export used by server wiring and tests.
pub use middleware::Trace;
/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
