//! Saved-rule HTTP handlers: ownership-scoped CRUD over the rules table.
//!
//! Rule responses are deliberately slim: clients only ever need the id, the
//! name, and the config, so ownership and timestamp columns stay behind the
//! API boundary. Configs are validated as [`GameConfig`] on the way in and
//! persisted as jsonb.

use actix_web::{delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::patch::SparsePatch;
use crate::domain::ports::Row;
use crate::domain::resources::OwnedResource;
use crate::domain::{Error, GameConfig, SavedRule, resources};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::MessageResponse;
use crate::inbound::http::auth_context::AuthContext;

/// Rule creation body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RuleCreateRequest {
    /// Display name for the preset.
    pub name: String,
    /// Win-condition configuration the client replays into new games.
    pub config: GameConfig,
}

impl RuleCreateRequest {
    fn into_row(self) -> ApiResult<Row> {
        let mut row = Row::new();
        row.insert("name".to_owned(), Value::String(self.name));
        row.insert("config".to_owned(), to_column(&self.config)?);
        Ok(row)
    }
}

fn to_column<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|error| Error::internal(format!("unencodable column value: {error}")))
}

/// Typed view of a rule update body used for validation only; the sparse
/// patch is computed from the raw body so absent fields stay untouched.
#[derive(Debug, Deserialize)]
#[expect(dead_code, reason = "decoded for validation; the fields are never read")]
struct RuleUpdateRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    config: Option<GameConfig>,
}

/// Rule payload returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct RuleResponse {
    /// Store-assigned row id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Stored win-condition configuration.
    pub config: Value,
}

impl From<SavedRule> for RuleResponse {
    fn from(rule: SavedRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            config: rule.config,
        }
    }
}

/// Save a rule preset for the authenticated user.
#[utoipa::path(
    post,
    path = "/api/v1/rules",
    request_body = RuleCreateRequest,
    responses(
        (status = 201, description = "Created rule", body = RuleResponse),
        (status = 400, description = "Invalid payload or store rejection", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["rules"],
    operation_id = "createRule"
)]
#[post("/rules")]
pub async fn create_rule(
    ctx: AuthContext,
    payload: web::Json<RuleCreateRequest>,
) -> ApiResult<actix_web::HttpResponse> {
    let row = payload.into_inner().into_row()?;
    let rule: SavedRule = resources::create(ctx.store(), ctx.user_id(), row).await?;
    Ok(actix_web::HttpResponse::Created().json(RuleResponse::from(rule)))
}

/// List the authenticated user's rule presets.
#[utoipa::path(
    get,
    path = "/api/v1/rules",
    responses(
        (status = 200, description = "Saved rules", body = [RuleResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["rules"],
    operation_id = "listRules"
)]
#[get("/rules")]
pub async fn list_rules(ctx: AuthContext) -> ApiResult<web::Json<Vec<RuleResponse>>> {
    let rules: Vec<SavedRule> = resources::list(ctx.store(), ctx.user_id()).await?;
    Ok(web::Json(rules.into_iter().map(RuleResponse::from).collect()))
}

/// Fetch one rule preset owned by the authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/rules/{rule_id}",
    params(("rule_id" = String, Path, description = "Rule row id")),
    responses(
        (status = 200, description = "Rule", body = RuleResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Absent or owned by another user", body = Error)
    ),
    tags = ["rules"],
    operation_id = "getRule"
)]
#[get("/rules/{rule_id}")]
pub async fn get_rule(
    ctx: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RuleResponse>> {
    let rule: SavedRule = resources::fetch(ctx.store(), ctx.user_id(), &path.into_inner()).await?;
    Ok(web::Json(RuleResponse::from(rule)))
}

/// Apply a sparse update to one rule preset.
#[utoipa::path(
    put,
    path = "/api/v1/rules/{rule_id}",
    params(("rule_id" = String, Path, description = "Rule row id")),
    responses(
        (status = 200, description = "Updated rule", body = RuleResponse),
        (status = 400, description = "Empty or malformed patch", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Absent or owned by another user", body = Error)
    ),
    tags = ["rules"],
    operation_id = "updateRule"
)]
#[put("/rules/{rule_id}")]
pub async fn update_rule(
    ctx: AuthContext,
    path: web::Path<String>,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<RuleResponse>> {
    let body = payload.into_inner();
    validate_update_shape(&body)?;
    let patch = SparsePatch::from_body(&body, SavedRule::PATCH_FIELDS)?;
    let rule: SavedRule =
        resources::update(ctx.store(), ctx.user_id(), &path.into_inner(), patch).await?;
    Ok(web::Json(RuleResponse::from(rule)))
}

fn validate_update_shape(body: &Value) -> ApiResult<()> {
    serde_json::from_value::<RuleUpdateRequest>(body.clone())
        .map(|_| ())
        .map_err(|error| Error::invalid_request(format!("invalid rule update: {error}")))
}

/// Delete one rule preset owned by the authenticated user.
#[utoipa::path(
    delete,
    path = "/api/v1/rules/{rule_id}",
    params(("rule_id" = String, Path, description = "Rule row id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Absent or owned by another user", body = Error)
    ),
    tags = ["rules"],
    operation_id = "deleteRule"
)]
#[delete("/rules/{rule_id}")]
pub async fn delete_rule(
    ctx: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    resources::delete::<SavedRule>(ctx.store(), ctx.user_id(), &path.into_inner()).await?;
    Ok(web::Json(MessageResponse {
        message: "Rule deleted successfully".to_owned(),
    }))
}
