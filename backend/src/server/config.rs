//! Application settings loaded via OrthoConfig.
//!
//! Values come from `SCORECARD_`-prefixed environment variables, CLI flags,
//! or a configuration file, in OrthoConfig's usual precedence order.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DATABASE_PORT: u16 = 5432;

/// Settings controlling platform wiring and the HTTP listener.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCORECARD")]
pub struct AppSettings {
    /// Base URL of the hosted platform, e.g. `https://PROJECT.supabase.co`.
    pub supabase_url: Option<String>,
    /// Public (anon) API key for the platform.
    pub supabase_anon_key: Option<String>,
    /// Database password enabling direct-connection schema migrations.
    pub supabase_db_password: Option<String>,
    /// Listener address override.
    pub bind_addr: Option<String>,
    /// Comma-separated list of allowed CORS origins; unset means permissive.
    pub cors_origins: Option<String>,
}

/// Validated platform endpoints derived from the settings.
#[derive(Debug, Clone)]
pub struct PlatformEndpoints {
    /// Base URL all platform requests are joined against.
    pub base: Url,
    /// Public API key sent with every platform request.
    pub anon_key: String,
}

impl AppSettings {
    /// Platform endpoints, when both the URL and key are configured.
    ///
    /// # Errors
    /// Returns the malformed URL text when `supabase_url` does not parse.
    pub fn platform(&self) -> Result<Option<PlatformEndpoints>, String> {
        let (Some(raw), Some(anon_key)) = (&self.supabase_url, &self.supabase_anon_key) else {
            return Ok(None);
        };
        // A trailing slash matters to Url::join; normalise it here once.
        let normalised = format!("{}/", raw.trim_end_matches('/'));
        let base = Url::parse(&normalised).map_err(|err| format!("invalid supabase_url {raw:?}: {err}"))?;
        Ok(Some(PlatformEndpoints {
            base,
            anon_key: anon_key.clone(),
        }))
    }

    /// Direct database connection string for migrations, when the platform
    /// URL and database password are both configured.
    ///
    /// The platform exposes the database on `db.<project host>`; the password
    /// is applied through the URL type so special characters are escaped.
    #[must_use]
    pub fn database_url(&self) -> Option<String> {
        let base = self.supabase_url.as_deref()?;
        let password = self.supabase_db_password.as_deref()?;
        let host = Url::parse(base).ok()?.host_str()?.to_owned();
        let mut url =
            Url::parse(&format!("postgresql://postgres@db.{host}:{DATABASE_PORT}/postgres"))
                .ok()?;
        url.set_password(Some(password)).ok()?;
        Some(url.to_string())
    }

    /// Listener address, falling back to the default when unset or invalid.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| {
                DEFAULT_BIND_ADDR
                    .parse()
                    .unwrap_or_else(|_| unreachable!("default bind address is well-formed"))
            })
    }

    /// Allowed CORS origins; empty means serve any origin without credentials.
    #[must_use]
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}
