//! Game HTTP handlers: ownership-scoped CRUD over the games table.
//!
//! ```text
//! POST   /api/v1/games
//! GET    /api/v1/games
//! GET    /api/v1/games/{game_id}
//! PUT    /api/v1/games/{game_id}
//! DELETE /api/v1/games/{game_id}
//! ```
//!
//! The wire contract carries `currentRound` in camelCase while accepting the
//! snake_case spelling on input; everything else keeps the store's column
//! names, matching the clients this API predates.

use actix_web::{delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::patch::SparsePatch;
use crate::domain::ports::Row;
use crate::domain::resources::OwnedResource;
use crate::domain::{Error, Game, GameConfig, Player, Round, UserId, resources};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::MessageResponse;
use crate::inbound::http::auth_context::AuthContext;

/// Game creation body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameCreateRequest {
    /// Display name for the game.
    pub name: String,
    /// Win-condition configuration.
    pub config: GameConfig,
    /// Participants in seating order.
    pub players: Vec<Player>,
    /// Rounds completed so far, usually empty at creation.
    pub rounds: Vec<Round>,
    /// 1-based pointer to the round in progress; both spellings accepted.
    #[serde(alias = "current_round")]
    pub current_round: i64,
    /// Winning player's id, when the game arrives already decided.
    #[serde(default)]
    pub winner: Option<String>,
}

impl GameCreateRequest {
    fn into_row(self) -> ApiResult<Row> {
        let mut row = Row::new();
        row.insert("name".to_owned(), Value::String(self.name));
        row.insert("config".to_owned(), to_column(&self.config)?);
        row.insert("players".to_owned(), to_column(&self.players)?);
        row.insert("rounds".to_owned(), to_column(&self.rounds)?);
        row.insert("current_round".to_owned(), Value::from(self.current_round));
        row.insert(
            "winner".to_owned(),
            self.winner.map_or(Value::Null, Value::String),
        );
        Ok(row)
    }
}

fn to_column<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|error| Error::internal(format!("unencodable column value: {error}")))
}

/// Typed view of an update body used for validation only; the sparse patch is
/// computed from the raw body so absent fields stay untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(dead_code, reason = "decoded for validation; the fields are never read")]
struct GameUpdateRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    players: Option<Vec<Player>>,
    #[serde(default)]
    rounds: Option<Vec<Round>>,
    #[serde(default, alias = "current_round")]
    current_round: Option<i64>,
    #[serde(default)]
    winner: Option<String>,
}

/// Game payload returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResponse {
    /// Store-assigned row id.
    pub id: String,
    /// Owning identity.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Win-condition configuration.
    pub config: GameConfig,
    /// Participants.
    pub players: Vec<Player>,
    /// Completed rounds.
    pub rounds: Vec<Round>,
    /// 1-based round pointer, always in the camelCase spelling.
    #[serde(rename = "currentRound")]
    pub current_round: i64,
    /// Winning player's id once decided.
    pub winner: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        Self {
            id: game.id,
            user_id: game.user_id,
            name: game.name,
            config: game.config,
            players: game.players,
            rounds: game.rounds,
            current_round: game.current_round,
            winner: game.winner,
            created_at: game.created_at,
            updated_at: game.updated_at,
        }
    }
}

/// Create a new game for the authenticated user.
#[utoipa::path(
    post,
    path = "/api/v1/games",
    request_body = GameCreateRequest,
    responses(
        (status = 201, description = "Created game", body = GameResponse),
        (status = 400, description = "Invalid payload or store rejection", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["games"],
    operation_id = "createGame"
)]
#[post("/games")]
pub async fn create_game(
    ctx: AuthContext,
    payload: web::Json<GameCreateRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    let row = payload.into_inner().into_row()?;
    let game: Game = resources::create(ctx.store(), ctx.user_id(), row).await?;
    Ok(actix_web::HttpResponse::Created().json(GameResponse::from(game)))
}

/// List the authenticated user's games, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/games",
    responses(
        (status = 200, description = "Games ordered by creation time descending", body = [GameResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["games"],
    operation_id = "listGames"
)]
#[get("/games")]
pub async fn list_games(ctx: AuthContext) -> ApiResult<web::Json<Vec<GameResponse>>> {
    let games: Vec<Game> = resources::list(ctx.store(), ctx.user_id()).await?;
    Ok(web::Json(games.into_iter().map(GameResponse::from).collect()))
}

/// Fetch one game owned by the authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/games/{game_id}",
    params(("game_id" = String, Path, description = "Game row id")),
    responses(
        (status = 200, description = "Game", body = GameResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Absent or owned by another user", body = Error)
    ),
    tags = ["games"],
    operation_id = "getGame"
)]
#[get("/games/{game_id}")]
pub async fn get_game(
    ctx: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<GameResponse>> {
    let game: Game = resources::fetch(ctx.store(), ctx.user_id(), &path.into_inner()).await?;
    Ok(web::Json(GameResponse::from(game)))
}

/// Apply a sparse update to one game owned by the authenticated user.
#[utoipa::path(
    put,
    path = "/api/v1/games/{game_id}",
    params(("game_id" = String, Path, description = "Game row id")),
    responses(
        (status = 200, description = "Updated game", body = GameResponse),
        (status = 400, description = "Empty or malformed patch", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Absent or owned by another user", body = Error)
    ),
    tags = ["games"],
    operation_id = "updateGame"
)]
#[put("/games/{game_id}")]
pub async fn update_game(
    ctx: AuthContext,
    path: web::Path<String>,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<GameResponse>> {
    let body = payload.into_inner();
    validate_update_shape(&body)?;
    let patch = SparsePatch::from_body(&body, Game::PATCH_FIELDS)?;
    let game: Game =
        resources::update(ctx.store(), ctx.user_id(), &path.into_inner(), patch).await?;
    Ok(web::Json(GameResponse::from(game)))
}

fn validate_update_shape(body: &Value) -> ApiResult<()> {
    serde_json::from_value::<GameUpdateRequest>(body.clone())
        .map(|_| ())
        .map_err(|error| Error::invalid_request(format!("invalid game update: {error}")))
}

/// Delete one game owned by the authenticated user.
#[utoipa::path(
    delete,
    path = "/api/v1/games/{game_id}",
    params(("game_id" = String, Path, description = "Game row id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Absent or owned by another user", body = Error)
    ),
    tags = ["games"],
    operation_id = "deleteGame"
)]
#[delete("/games/{game_id}")]
pub async fn delete_game(
    ctx: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    resources::delete::<Game>(ctx.store(), ctx.user_id(), &path.into_inner()).await?;
    Ok(web::Json(MessageResponse {
        message: "Game deleted successfully".to_owned(),
    }))
}
