//! Server harness and shared world for HTTP behaviour tests.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. The `WorldFixture` ensures the server
//! is stopped even if a test panics. All platform ports are the in-memory
//! fixtures, so every scenario runs hermetically.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use awc::Client;
use rstest::fixture;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

use backend::Trace;
use backend::domain::ports::{FixtureIdentityHub, FixtureSchemaMigrator, InMemoryRows};
use backend::inbound::http::admin::init_db;
use backend::inbound::http::auth::{current_user, login, logout, signup, update_current_user};
use backend::inbound::http::games::{create_game, delete_game, get_game, list_games, update_game};
use backend::inbound::http::health::{BackendStatus, health, root};
use backend::inbound::http::rules::{create_rule, delete_rule, get_rule, list_rules, update_rule};
use backend::inbound::http::state::HttpState;

pub(crate) struct ApiWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) rows: InMemoryRows,
    pub(crate) hub: FixtureIdentityHub,
    /// Access tokens keyed by the persona name used in scenario text.
    pub(crate) tokens: BTreeMap<String, String>,
    /// Resource ids keyed by persona name, for targeted follow-up requests.
    pub(crate) resource_ids: BTreeMap<String, String>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_trace_id: Option<String>,
    pub(crate) last_www_authenticate: Option<String>,
}

pub(crate) type SharedWorld = Rc<RefCell<ApiWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        shutdown(&self.world.clone());
    }
}

pub(crate) fn shutdown(world: &SharedWorld) {
    // `LocalSet` must be driven on the thread that owns it, so we lock the
    // world while calling `block_on`. The future must not lock the world.
    let ctx = world.borrow();
    let server = ctx.server.clone();
    ctx.local.block_on(&ctx.runtime, async move {
        server.stop(true).await;
    });
}

pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

async fn spawn_api_server(http_state: HttpState) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;

    let http_data = web::Data::new(http_state);
    let status_data = web::Data::new(BackendStatus {
        store_configured: false,
    });

    let server = HttpServer::new(move || {
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

        App::new()
            .app_data(http_data.clone())
            .app_data(status_data.clone())
            .wrap(Trace)
            .service(api)
            .service(root)
            .service(health)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}"), handle))
}

fn create_runtime_and_local() -> (Runtime, LocalSet) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();

    (runtime, local)
}

#[fixture]
pub(crate) fn world() -> WorldFixture {
    let (runtime, local) = create_runtime_and_local();
    let rows = InMemoryRows::default();
    let hub = FixtureIdentityHub::new(rows.clone());
    let http_state = HttpState::new(
        Arc::new(hub.clone()),
        Arc::new(rows.clone()),
        Arc::new(hub.clone()),
        Arc::new(FixtureSchemaMigrator),
    );

    let (base_url, server) = local
        .block_on(&runtime, async { spawn_api_server(http_state).await })
        .expect("server should start");

    let world = Rc::new(RefCell::new(ApiWorld {
        runtime,
        local,
        base_url,
        server,
        rows,
        hub,
        tokens: BTreeMap::new(),
        resource_ids: BTreeMap::new(),
        last_status: None,
        last_body: None,
        last_trace_id: None,
        last_www_authenticate: None,
    }));

    WorldFixture { world }
}

/// Sign up a persona through the HTTP surface and remember their token.
pub(crate) fn signup_persona(world: &SharedWorld, name: &str) {
    let email = format!("{}@example.com", name.to_lowercase());
    let username = name.to_owned();
    let body = with_world_async(world, |base_url| async move {
        let mut response = Client::default()
            .post(format!("{base_url}/api/v1/auth/signup"))
            .send_json(&serde_json::json!({
                "email": email,
                "password": "correct horse",
                "username": username
            }))
            .await
            .expect("signup request");
        assert_eq!(response.status().as_u16(), 201, "signup should succeed");
        let bytes = response.body().await.expect("signup body");
        serde_json::from_slice::<Value>(&bytes).expect("signup json")
    });
    let token = body
        .get("access_token")
        .and_then(Value::as_str)
        .expect("access token")
        .to_owned();
    world.borrow_mut().tokens.insert(name.to_owned(), token);
}

pub(crate) fn token_for(world: &SharedWorld, name: &str) -> String {
    world
        .borrow()
        .tokens
        .get(name)
        .unwrap_or_else(|| panic!("no token recorded for {name}"))
        .clone()
}

/// Issue a JSON request as a persona (or anonymously) and record the outcome.
pub(crate) struct RequestSpec<'a> {
    pub(crate) method: awc::http::Method,
    pub(crate) path: String,
    pub(crate) persona: Option<&'a str>,
    pub(crate) payload: Option<Value>,
    pub(crate) label: &'a str,
}

pub(crate) fn perform_json_request(world: &SharedWorld, spec: RequestSpec<'_>) {
    let RequestSpec {
        method,
        path,
        persona,
        payload,
        label,
    } = spec;
    let token = persona.map(|name| token_for(world, name));
    let (status, trace_id, www_authenticate, body) =
        with_world_async(world, |base_url| async move {
            let mut request = Client::default().request(method, format!("{base_url}{path}"));
            if let Some(token) = token {
                request = request.insert_header(("Authorization", format!("Bearer {token}")));
            }
            let mut response = match payload {
                Some(payload) => request.send_json(&payload).await.expect(label),
                None => request.send().await.expect(label),
            };
            let status = response.status().as_u16();
            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
            };
            let trace_id = header("trace-id");
            let www_authenticate = header("www-authenticate");
            let bytes = response.body().await.expect(label);
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).expect(label)
            };
            (status, trace_id, www_authenticate, json)
        });

    let mut ctx = world.borrow_mut();
    ctx.last_status = Some(status);
    ctx.last_trace_id = trace_id;
    ctx.last_www_authenticate = www_authenticate;
    ctx.last_body = Some(body);
}
