//! Backend entry-point: wires platform adapters and REST endpoints.

use std::sync::Arc;

use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::domain::ports::{FixtureIdentityHub, FixtureSchemaMigrator, InMemoryRows};
use backend::inbound::http::health::BackendStatus;
use backend::inbound::http::state::HttpState;
use backend::outbound::supabase::{SupabaseAuthClient, SupabaseRestStore, SupabaseSchemaMigrator};
use backend::server::{AppSettings, ServerConfig, create_server};

fn platform_state(settings: &AppSettings) -> std::io::Result<Option<HttpState>> {
    let endpoints = settings
        .platform()
        .map_err(std::io::Error::other)?;
    let Some(endpoints) = endpoints else {
        return Ok(None);
    };
    let auth = Arc::new(
        SupabaseAuthClient::new(endpoints.base.clone(), endpoints.anon_key.clone())
            .map_err(std::io::Error::other)?,
    );
    let stores = Arc::new(
        SupabaseRestStore::new(endpoints.base.clone(), endpoints.anon_key.clone())
            .map_err(std::io::Error::other)?,
    );
    let migrator = Arc::new(
        SupabaseSchemaMigrator::new(
            endpoints.base,
            endpoints.anon_key,
            settings.database_url(),
        )
        .map_err(std::io::Error::other)?,
    );
    Ok(Some(HttpState::new(auth.clone(), stores, auth, migrator)))
}

fn fixture_state() -> HttpState {
    let rows = InMemoryRows::default();
    let hub = FixtureIdentityHub::new(rows.clone());
    HttpState::new(
        Arc::new(hub.clone()),
        Arc::new(rows),
        Arc::new(hub),
        Arc::new(FixtureSchemaMigrator),
    )
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(std::io::Error::other)?;

    let (http_state, store_configured) = match platform_state(&settings)? {
        Some(state) => (state, true),
        None => {
            warn!("platform credentials not configured; using in-memory fixtures");
            (fixture_state(), false)
        }
    };
    let backend_status = BackendStatus { store_configured };

    let bind_addr = settings.bind_addr();
    info!(%bind_addr, store_configured, "starting server");
    let config = ServerConfig::new(bind_addr, http_state, backend_status)
        .with_cors_origins(settings.cors_origins());
    create_server(config)?.await
}
