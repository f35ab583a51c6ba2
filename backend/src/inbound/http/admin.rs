//! Management routes.

use actix_web::{post, web};

use crate::domain::ports::SchemaReport;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Ensure the backing schema exists, applying the bundled migration when any
/// expected table is missing. Safe to call repeatedly.
#[utoipa::path(
    post,
    path = "/api/v1/init-db",
    responses(
        (status = 200, description = "Schema report", body = SchemaReport),
        (status = 503, description = "Store unreachable", body = crate::domain::Error)
    ),
    tags = ["admin"],
    operation_id = "initDb",
    security([])
)]
#[post("/init-db")]
pub async fn init_db(state: web::Data<HttpState>) -> ApiResult<web::Json<SchemaReport>> {
    let report = state.migrator.ensure_schema().await?;
    Ok(web::Json(report))
}
