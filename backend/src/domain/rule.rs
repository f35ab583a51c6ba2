//! Saved rule presets: reusable game configurations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::UserId;
use crate::domain::patch::PatchField;
use crate::domain::resources::OwnedResource;

/// A stored rule preset owned by exactly one user.
///
/// The config is validated as a [`crate::domain::GameConfig`] at the API
/// boundary and persisted as jsonb; it stays a raw [`Value`] here so rows
/// written before the schema settled still decode.
///
/// ## Invariants
/// - `user_id` is stamped server-side at creation and never changes. API
///   responses omit it (clients only see `id`, `name`, `config`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRule {
    /// Store-assigned row id.
    pub id: String,
    /// Owning identity; immutable after creation.
    pub user_id: UserId,
    /// Display name for the preset.
    pub name: String,
    /// Stored configuration the preset applies.
    pub config: Value,
}

impl OwnedResource for SavedRule {
    const TABLE: &'static str = "rules";
    const KIND: &'static str = "Rule";
    const PATCH_FIELDS: &'static [PatchField] =
        &[PatchField::plain("name"), PatchField::plain("config")];
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn decodes_a_store_row() {
        let row = json!({
            "id": "a52cf53d-6a3f-4f66-8d4e-55f1a6d2a001",
            "user_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "name": "Whist to 121",
            "config": {
                "winMetric": "points",
                "targetRounds": 10,
                "targetPoints": 121,
                "winCondition": "highest",
                "gameMode": "sudden-death"
            },
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-01T12:00:00Z"
        });
        let rule: SavedRule = serde_json::from_value(row).expect("decode rule row");
        assert_eq!(rule.name, "Whist to 121");
        assert_eq!(rule.config.get("targetPoints"), Some(&json!(121)));
    }

    #[rstest]
    fn patch_whitelist_covers_name_and_config_only() {
        let names: Vec<&str> = SavedRule::PATCH_FIELDS.iter().map(|f| f.request).collect();
        assert_eq!(names, vec!["name", "config"]);
    }
}
