//! Game aggregate: configuration, players, and round-by-round scores.
//!
//! Serde contracts follow the store row shape: nested value objects use
//! camelCase keys and are persisted verbatim in jsonb columns, while the
//! top-level round pointer lives in the snake_case `current_round` column.
//! The API spelling (`currentRound`) is handled by the inbound DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserId;
use crate::domain::patch::PatchField;
use crate::domain::resources::{OwnedResource, RowOrder};

/// Which metric ends the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WinMetric {
    /// The game ends after a fixed number of rounds.
    Rounds,
    /// The game ends once a player reaches a points target.
    Points,
    /// Whichever of rounds or points is reached first ends the game.
    Both,
}

/// Whether the highest or lowest score wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WinCondition {
    /// Highest total wins.
    Highest,
    /// Lowest total wins.
    Lowest,
}

/// End-of-game behaviour once the win metric is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// First player past the target ends the game immediately.
    SuddenDeath,
    /// Players past the target drop out; the game continues.
    Elimination,
}

/// Reusable win-condition configuration for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Metric that ends the game.
    pub win_metric: WinMetric,
    /// Round count target when `win_metric` involves rounds.
    pub target_rounds: i64,
    /// Points target when `win_metric` involves points.
    pub target_points: i64,
    /// Whether the highest or lowest total wins.
    pub win_condition: WinCondition,
    /// End-of-game behaviour.
    pub game_mode: GameMode,
}

/// One participant and their accumulated scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Client-assigned player id, unique within the game.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Per-round scores in round order.
    pub scores: Vec<i64>,
    /// Running total of `scores`.
    pub total_score: i64,
}

/// Scores entered for one round, keyed by player id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// 1-based round number.
    pub round_number: i64,
    /// Player id to score for that round.
    pub scores: BTreeMap<String, i64>,
}

/// A stored game owned by exactly one user.
///
/// ## Invariants
/// - `user_id` is stamped server-side at creation and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Store-assigned row id.
    pub id: String,
    /// Owning identity; immutable after creation.
    pub user_id: UserId,
    /// Display name for the game.
    pub name: String,
    /// Win-condition configuration.
    pub config: GameConfig,
    /// Participants in seating order.
    pub players: Vec<Player>,
    /// Completed rounds in order.
    pub rounds: Vec<Round>,
    /// 1-based pointer to the round in progress.
    pub current_round: i64,
    /// Winning player's id once the game is decided.
    #[serde(default)]
    pub winner: Option<String>,
    /// Row creation timestamp, set by the store.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, set by the store.
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for Game {
    const TABLE: &'static str = "games";
    const KIND: &'static str = "Game";
    // `config` is deliberately absent: the original contract only lets
    // updates touch progress fields, never the win conditions.
    const PATCH_FIELDS: &'static [PatchField] = &[
        PatchField::plain("name"),
        PatchField::plain("players"),
        PatchField::plain("rounds"),
        PatchField::aliased("currentRound", "current_round", "current_round"),
        PatchField::plain("winner"),
    ];

    fn list_order() -> Option<RowOrder> {
        Some(RowOrder::descending("created_at"))
    }
}
