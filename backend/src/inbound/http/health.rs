//! Liveness and welcome routes.

use actix_web::{get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::inbound::http::auth::MessageResponse;

/// Startup-time summary of which backing services are wired in, registered as
/// app data by the server builder.
#[derive(Clone, Copy, Debug)]
pub struct BackendStatus {
    /// Whether a real row store is configured, as opposed to the in-process
    /// fixture used for local development.
    pub store_configured: bool,
}

/// Health probe payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` when the process can answer at all.
    pub status: String,
    /// `configured` or `missing`, reflecting the row store wiring.
    pub store: String,
}

/// Welcome banner for the API root.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome banner", body = MessageResponse)),
    tags = ["meta"],
    operation_id = "root",
    security([])
)]
#[get("/")]
pub async fn root() -> web::Json<MessageResponse> {
    web::Json(MessageResponse {
        message: "Welcome to the Scorecard API".to_owned(),
    })
}

/// Liveness probe; reports whether the row store is wired in.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Liveness report", body = HealthResponse)),
    tags = ["meta"],
    operation_id = "health",
    security([])
)]
#[get("/health")]
pub async fn health(status: web::Data<BackendStatus>) -> web::Json<HealthResponse> {
    let store = if status.store_configured {
        "configured"
    } else {
        "missing"
    };
    web::Json(HealthResponse {
        status: "ok".to_owned(),
        store: store.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::{App, test};
    use rstest::rstest;

    #[rstest]
    #[case(true, "configured")]
    #[case(false, "missing")]
    #[actix_web::test]
    async fn health_reports_store_wiring(#[case] configured: bool, #[case] expected: &str) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(BackendStatus {
                    store_configured: configured,
                }))
                .service(health),
        )
        .await;
        let payload: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
                .await;
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["store"], expected);
    }
}
