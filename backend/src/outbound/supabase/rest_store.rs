//! Reqwest-backed adapter for the hosted store's REST interface.
//!
//! The store enforces row-level security: every query here carries the
//! request's bearer credential, and the store evaluates the policy under that
//! identity. The adapter still sends the compound (id, owner) predicate on
//! targeted operations so isolation does not rest on the policy alone.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use tracing::error;

use crate::domain::ports::{OwnedRowStore, Row, ScopedStoreFactory};
use crate::domain::resources::{OWNER_COLUMN, RowOrder};
use crate::domain::{BearerToken, Error, UserId};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const API_KEY_HEADER: &str = "apikey";
const PROFILE_TABLE: &str = "users";
/// Ask the REST interface to return affected rows for writes.
const PREFER_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// Factory deriving per-request scoped stores over the REST interface.
pub struct SupabaseRestStore {
    client: Client,
    base: Url,
    anon_key: String,
}

impl SupabaseRestStore {
    /// Build a factory using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, anon_key: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            anon_key,
        })
    }
}

impl ScopedStoreFactory for SupabaseRestStore {
    fn scope(&self, token: &BearerToken) -> Arc<dyn OwnedRowStore> {
        Arc::new(ScopedRestStore {
            client: self.client.clone(),
            base: self.base.clone(),
            anon_key: self.anon_key.clone(),
            token: token.clone(),
        })
    }
}

/// One-request store handle carrying the caller's credential.
struct ScopedRestStore {
    client: Client,
    base: Url,
    anon_key: String,
    token: BearerToken,
}

fn eq_filter(value: &str) -> String {
    format!("eq.{value}")
}

fn order_directive(order: RowOrder) -> String {
    let direction = if order.descending { "desc" } else { "asc" };
    format!("{}.{direction}", order.column)
}

fn map_transport_error(error: &reqwest::Error) -> Error {
    error!(error = %error, "row store unreachable");
    Error::unavailable("Data store unavailable")
}

fn map_status_error(status: StatusCode, body: &str) -> Error {
    let preview = body_preview(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::unauthorized("Could not validate credentials")
        }
        _ if status.is_client_error() => {
            let message = if preview.is_empty() {
                format!("Store rejected the request (status {})", status.as_u16())
            } else {
                preview
            };
            Error::invalid_request(message)
        }
        _ => Error::internal(format!("store error status {}: {preview}", status.as_u16())),
    }
}

fn body_preview(body: &str) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

fn decode_rows(body: &str) -> Result<Vec<Value>, Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(single @ Value::Object(_)) => Ok(vec![single]),
        Ok(other) => Err(Error::internal(format!(
            "unexpected store payload shape: {other}"
        ))),
        Err(err) => Err(Error::internal(format!("undecodable store payload: {err}"))),
    }
}

impl ScopedRestStore {
    fn table_url(&self, table: &str) -> Result<Url, Error> {
        self.base
            .join(&format!("rest/v1/{table}"))
            .map_err(|err| Error::internal(format!("invalid store endpoint {table}: {err}")))
    }

    async fn execute(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: Option<Row>,
    ) -> Result<Vec<Value>, Error> {
        let mut request = self
            .client
            .request(method, self.table_url(table)?)
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .bearer_auth(self.token.reveal())
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .query(query);
        if let Some(body) = body {
            request = request.json(&Value::Object(body));
        }
        let response = request
            .send()
            .await
            .map_err(|err| map_transport_error(&err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| map_transport_error(&err))?;
        if !status.is_success() {
            return Err(map_status_error(status, &text));
        }
        decode_rows(&text)
    }
}

#[async_trait]
impl OwnedRowStore for ScopedRestStore {
    async fn insert(&self, table: &str, row: Row) -> Result<Vec<Value>, Error> {
        self.execute(Method::POST, table, &[], Some(row)).await
    }

    async fn select_owned(
        &self,
        table: &str,
        owner: &UserId,
        order: Option<RowOrder>,
    ) -> Result<Vec<Value>, Error> {
        let mut query = vec![
            ("select", "*".to_owned()),
            (OWNER_COLUMN, eq_filter(owner.as_str())),
        ];
        if let Some(order) = order {
            query.push(("order", order_directive(order)));
        }
        self.execute(Method::GET, table, &query, None).await
    }

    async fn select_one(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
    ) -> Result<Option<Value>, Error> {
        let query = [
            ("select", "*".to_owned()),
            ("id", eq_filter(id)),
            (OWNER_COLUMN, eq_filter(owner.as_str())),
        ];
        let rows = self.execute(Method::GET, table, &query, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_owned(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
        patch: Row,
    ) -> Result<Vec<Value>, Error> {
        let query = [
            ("id", eq_filter(id)),
            (OWNER_COLUMN, eq_filter(owner.as_str())),
        ];
        self.execute(Method::PATCH, table, &query, Some(patch)).await
    }

    async fn delete_owned(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
    ) -> Result<Vec<Value>, Error> {
        let query = [
            ("id", eq_filter(id)),
            (OWNER_COLUMN, eq_filter(owner.as_str())),
        ];
        self.execute(Method::DELETE, table, &query, None).await
    }

    async fn fetch_profile(&self, owner: &UserId) -> Result<Option<Value>, Error> {
        // The profile table is keyed by the identity id, not an owner column.
        let query = [
            ("select", "*".to_owned()),
            ("id", eq_filter(owner.as_str())),
        ];
        let rows = self.execute(Method::GET, PROFILE_TABLE, &query, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile(&self, owner: &UserId, patch: Row) -> Result<Vec<Value>, Error> {
        let query = [("id", eq_filter(owner.as_str()))];
        self.execute(Method::PATCH, PROFILE_TABLE, &query, Some(patch))
            .await
    }
}
