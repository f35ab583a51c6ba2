//! Inbound HTTP adapter: handlers, extractors, and error mapping.

pub mod admin;
pub mod auth;
pub mod auth_context;
pub mod error;
pub mod games;
pub mod health;
pub mod rules;
pub mod state;

pub use auth_context::{AuthContext, MaybeAuthContext};
pub use error::ApiResult;
pub use state::HttpState;
