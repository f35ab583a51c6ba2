//! Server construction and middleware wiring.

mod config;

pub use config::{AppSettings, PlatformEndpoints};

use actix_cors::Cors;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use std::net::SocketAddr;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::admin::init_db;
use crate::inbound::http::auth::{current_user, login, logout, signup, update_current_user};
use crate::inbound::http::games::{create_game, delete_game, get_game, list_games, update_game};
use crate::inbound::http::health::{BackendStatus, health, root};
use crate::inbound::http::rules::{create_rule, delete_rule, get_rule, list_rules, update_rule};
use crate::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: HttpState,
    pub(crate) backend_status: BackendStatus,
    pub(crate) cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Construct a server configuration from pre-built state.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, http_state: HttpState, backend_status: BackendStatus) -> Self {
        Self {
            bind_addr,
            http_state,
            backend_status,
            cors_origins: Vec::new(),
        }
    }

    /// Restrict CORS to the given origins; credentials are only allowed with
    /// an explicit allow-list.
    #[must_use]
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[derive(Clone)]
struct AppDependencies {
    http_state: web::Data<HttpState>,
    backend_status: web::Data<BackendStatus>,
    cors_origins: Vec<String>,
}

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        // Wide open but credential-free; browsers refuse the combination of
        // any-origin and credentials, so the permissive mode stays safe.
        Cors::permissive()
    } else {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors
    }
}

// The CORS layer wraps every body in `EitherBody`, which shows up in the
// service's response type.
fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        backend_status,
        cors_origins,
    } = deps;

    let api = web::scope("/api/v1")
        .service(signup)
        .service(login)
        .service(logout)
        .service(current_user)
        .service(update_current_user)
        .service(create_game)
        .service(list_games)
        .service(get_game)
        .service(update_game)
        .service(delete_game)
        .service(create_rule)
        .service(list_rules)
        .service(get_rule)
        .service(update_rule)
        .service(delete_rule)
        .service(init_db);

    let app = App::new()
        .app_data(http_state)
        .app_data(backend_status)
        .wrap(build_cors(&cors_origins))
        .wrap(Trace)
        .service(api)
        .service(root)
        .service(health);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server from the provided configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        http_state,
        backend_status,
        cors_origins,
    } = config;
    let http_state = web::Data::new(http_state);
    let backend_status = web::Data::new(backend_status);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            http_state: http_state.clone(),
            backend_status: backend_status.clone(),
            cors_origins: cors_origins.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
