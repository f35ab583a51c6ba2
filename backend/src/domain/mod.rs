//! Domain primitives, aggregates, and ports.
//!
//! Everything here is transport agnostic: inbound adapters map these types to
//! HTTP, outbound adapters resolve upstream wire formats into them. Types are
//! immutable where practical and document their invariants and serde
//! contracts in each type's Rustdoc.

pub mod auth;
pub mod error;
pub mod game;
pub mod patch;
pub mod ports;
pub mod resources;
pub mod rule;
pub mod user;

pub use self::auth::{
    BearerToken, CredentialValidationError, Identity, IssuedSession, LoginCredentials, NewAccount,
};
pub use self::error::{Error, ErrorCode};
pub use self::game::{Game, GameConfig, GameMode, Player, Round, WinCondition, WinMetric};
pub use self::rule::SavedRule;
pub use self::user::{UserId, UserIdError, UserProfile};
