//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers every HTTP endpoint from the
//! inbound layer together with the request and response schemas, and declares
//! the bearer token security scheme issued by the auth routes. The generated
//! specification backs Swagger UI in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::SchemaReport;
use crate::domain::{Error, ErrorCode, GameConfig, Player, Round, UserId};
use crate::inbound::http::auth::{
    LoginRequest, MessageResponse, ProfileUpdateRequest, SignupRequest, TokenResponse,
    UserResponse,
};
use crate::inbound::http::games::{GameCreateRequest, GameResponse};
use crate::inbound::http::health::HealthResponse;
use crate::inbound::http::rules::{RuleCreateRequest, RuleResponse};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some(
                        "Access token issued by POST /api/v1/auth/signup or /api/v1/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Scorecard backend API",
        description = "HTTP interface for account management and per-user game and rule storage."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::auth::signup,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_user,
        crate::inbound::http::auth::update_current_user,
        crate::inbound::http::games::create_game,
        crate::inbound::http::games::list_games,
        crate::inbound::http::games::get_game,
        crate::inbound::http::games::update_game,
        crate::inbound::http::games::delete_game,
        crate::inbound::http::rules::create_rule,
        crate::inbound::http::rules::list_rules,
        crate::inbound::http::rules::get_rule,
        crate::inbound::http::rules::update_rule,
        crate::inbound::http::rules::delete_rule,
        crate::inbound::http::admin::init_db,
        crate::inbound::http::health::root,
        crate::inbound::http::health::health,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserId,
        GameConfig,
        Player,
        Round,
        SchemaReport,
        SignupRequest,
        LoginRequest,
        ProfileUpdateRequest,
        TokenResponse,
        UserResponse,
        MessageResponse,
        GameCreateRequest,
        GameResponse,
        RuleCreateRequest,
        RuleResponse,
        HealthResponse,
    )),
    tags(
        (name = "auth", description = "Account lifecycle and profile management"),
        (name = "games", description = "Per-user game storage"),
        (name = "rules", description = "Per-user rule presets"),
        (name = "admin", description = "Schema management"),
        (name = "meta", description = "Liveness and discovery")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI document structure.

    use super::*;

    #[test]
    fn openapi_registers_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/signup",
            "/api/v1/auth/login",
            "/api/v1/auth/logout",
            "/api/v1/auth/me",
            "/api/v1/games",
            "/api/v1/games/{game_id}",
            "/api/v1/rules",
            "/api/v1/rules/{rule_id}",
            "/api/v1/init-db",
            "/health",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "OpenAPI document should describe {path}"
            );
        }
    }

    #[test]
    fn openapi_declares_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
