//! User identity and profile projection types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors raised when constructing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    /// The value was not a valid UUID.
    InvalidUuid(String),
}

impl std::fmt::Display for UserIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUuid(raw) => write!(f, "user id must be a UUID, got {raw:?}"),
        }
    }
}

impl std::error::Error for UserIdError {}

/// Opaque user identifier issued by the identity provider.
///
/// ## Invariants
/// - Always a canonical UUID string; the provider issues UUIDs and the store's
///   row-level security compares against them textually.
///
/// # Examples
/// ```
/// use backend::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
/// assert_eq!(id.as_str(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse and canonicalise a raw identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserIdError> {
        let raw = raw.as_ref();
        Uuid::parse_str(raw)
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| UserIdError::InvalidUuid(raw.to_owned()))
    }

    /// Borrow the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Profile row maintained by the external store for each identity.
///
/// This layer reads and patches the row but does not own its lifecycle: the
/// store creates it via a trigger when the identity provider registers a
/// user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Identity id; equals the owning user's id.
    pub id: UserId,
    /// Email of record at the identity provider.
    pub email: String,
    /// Display name chosen at signup, editable afterwards.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Optional avatar accent colour.
    #[serde(default)]
    pub avatar_color: Option<String>,
    /// Row creation timestamp, set by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp, set by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    #[case("3fa85f64-5717-4562-b3fc")]
    fn rejects_non_uuid_ids(#[case] raw: &str) {
        assert!(UserId::new(raw).is_err());
    }

    #[rstest]
    fn canonicalises_uppercase_uuids() {
        let id = UserId::new("3FA85F64-5717-4562-B3FC-2C963F66AFA6").expect("valid uuid");
        assert_eq!(id.as_str(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    fn profile_tolerates_missing_optional_columns() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "email": "ada@example.com"
        }))
        .expect("decode profile");
        assert_eq!(profile.username, None);
        assert_eq!(profile.created_at, None);
    }
}
