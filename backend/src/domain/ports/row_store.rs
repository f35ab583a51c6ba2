//! Driven ports for scoped row access.
//!
//! [`OwnedRowStore`] is the scoped data-access capability: a handle bound to
//! one request's credential, whose every query the backing store evaluates
//! under that identity's row-level security. [`ScopedStoreFactory`] derives a
//! fresh handle from a raw credential; handles are never pooled or reused
//! across requests, because a stale handle bound to a prior credential would
//! leak access across identities.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::resources::{OWNER_COLUMN, RowOrder};
use crate::domain::{BearerToken, Error, UserId};

/// Row map alias used across the store ports.
pub type Row = Map<String, Value>;

/// Data-access handle bound to one identity's credential.
///
/// Every targeted operation carries the owner id so the compound
/// (id, owner) predicate is applied in the store call itself, not as a
/// post-hoc check on fetched data.
#[async_trait]
pub trait OwnedRowStore: Send + Sync {
    /// Insert one row, returning the stored representation(s).
    async fn insert(&self, table: &str, row: Row) -> Result<Vec<Value>, Error>;

    /// Read all rows owned by `owner`, optionally ordered.
    async fn select_owned(
        &self,
        table: &str,
        owner: &UserId,
        order: Option<RowOrder>,
    ) -> Result<Vec<Value>, Error>;

    /// Read the row matching id AND owner, if any.
    async fn select_one(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
    ) -> Result<Option<Value>, Error>;

    /// Patch the row matching id AND owner, returning affected rows.
    async fn update_owned(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
        patch: Row,
    ) -> Result<Vec<Value>, Error>;

    /// Delete the row matching id AND owner, returning the removed rows.
    async fn delete_owned(&self, table: &str, id: &str, owner: &UserId)
    -> Result<Vec<Value>, Error>;

    /// Read the caller's profile row (the `users` projection keyed by the
    /// identity id).
    async fn fetch_profile(&self, owner: &UserId) -> Result<Option<Value>, Error>;

    /// Patch the caller's profile row, returning affected rows.
    async fn update_profile(&self, owner: &UserId, patch: Row) -> Result<Vec<Value>, Error>;
}

/// Derives a scoped [`OwnedRowStore`] from a raw credential.
///
/// Deterministic and side-effect-free: the factory only captures the
/// credential so the downstream store attributes each query to that identity.
pub trait ScopedStoreFactory: Send + Sync {
    /// Build a handle bound to the given credential.
    fn scope(&self, token: &BearerToken) -> Arc<dyn OwnedRowStore>;
}

const PROFILE_TABLE: &str = "users";

#[derive(Default)]
struct RowsInner {
    tables: BTreeMap<String, Vec<Row>>,
    tokens: BTreeMap<String, UserId>,
    clock: i64,
}

impl RowsInner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(self.clock)
    }
}

/// In-memory row store emulating the external store's row-level security.
///
/// Used by unit and behaviour tests (and local development wiring) in place
/// of the real REST adapter. Tokens minted via [`InMemoryRows::issue_token`]
/// scope a handle to one identity; all other tokens scope to an anonymous
/// handle whose queries fail with `unauthorized`, mirroring a store that
/// rejects unattributed row access.
#[derive(Default, Clone)]
pub struct InMemoryRows {
    inner: Arc<Mutex<RowsInner>>,
}

impl InMemoryRows {
    /// Mint a credential the emulated store will attribute to `owner`.
    #[must_use]
    pub fn issue_token(&self, owner: &UserId) -> BearerToken {
        let raw = format!("fixture-{}", Uuid::new_v4());
        let mut inner = self.lock();
        inner.tokens.insert(raw.clone(), owner.clone());
        BearerToken::new(raw).unwrap_or_else(|_| unreachable!("minted token is non-empty"))
    }

    /// Seed a profile row, emulating the store trigger that projects each new
    /// identity into the `users` table.
    pub fn seed_profile(&self, owner: &UserId, email: &str, username: Option<&str>) {
        let mut inner = self.lock();
        let now = inner.next_timestamp();
        let mut row = Row::new();
        row.insert("id".to_owned(), Value::String(owner.as_str().to_owned()));
        row.insert("email".to_owned(), Value::String(email.to_owned()));
        row.insert(
            "username".to_owned(),
            username.map_or(Value::Null, |name| Value::String(name.to_owned())),
        );
        row.insert("avatar_url".to_owned(), Value::Null);
        row.insert("avatar_color".to_owned(), Value::Null);
        row.insert("created_at".to_owned(), Value::String(now.to_rfc3339()));
        row.insert("updated_at".to_owned(), Value::String(now.to_rfc3339()));
        inner
            .tables
            .entry(PROFILE_TABLE.to_owned())
            .or_default()
            .push(row);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RowsInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ScopedStoreFactory for InMemoryRows {
    fn scope(&self, token: &BearerToken) -> Arc<dyn OwnedRowStore> {
        let identity = self.lock().tokens.get(token.reveal()).cloned();
        Arc::new(InMemoryScopedStore {
            inner: self.inner.clone(),
            identity,
        })
    }
}

struct InMemoryScopedStore {
    inner: Arc<Mutex<RowsInner>>,
    identity: Option<UserId>,
}

fn row_owner(row: &Row) -> Option<&str> {
    row.get(OWNER_COLUMN).and_then(Value::as_str)
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

impl InMemoryScopedStore {
    fn require_identity(&self) -> Result<&UserId, Error> {
        self.identity
            .as_ref()
            .ok_or_else(|| Error::unauthorized("row access requires an attributed credential"))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RowsInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn visible(&self, identity: &UserId, table: &str, row: &Row) -> bool {
        if table == PROFILE_TABLE {
            row_id(row) == Some(identity.as_str())
        } else {
            row_owner(row) == Some(identity.as_str())
        }
    }
}

#[async_trait]
impl OwnedRowStore for InMemoryScopedStore {
    async fn insert(&self, table: &str, mut row: Row) -> Result<Vec<Value>, Error> {
        let identity = self.require_identity()?.clone();
        // Row-level security's WITH CHECK: inserts may only attribute rows to
        // the scoped identity.
        if row_owner(&row) != Some(identity.as_str()) {
            return Err(Error::unauthorized(
                "row owner does not match the scoped identity",
            ));
        }
        let mut inner = self.lock();
        let now = inner.next_timestamp();
        row.insert(
            "id".to_owned(),
            Value::String(Uuid::new_v4().to_string()),
        );
        row.entry("created_at".to_owned())
            .or_insert_with(|| Value::String(now.to_rfc3339()));
        row.entry("updated_at".to_owned())
            .or_insert_with(|| Value::String(now.to_rfc3339()));
        inner
            .tables
            .entry(table.to_owned())
            .or_default()
            .push(row.clone());
        Ok(vec![Value::Object(row)])
    }

    async fn select_owned(
        &self,
        table: &str,
        owner: &UserId,
        order: Option<RowOrder>,
    ) -> Result<Vec<Value>, Error> {
        let identity = self.require_identity()?.clone();
        let inner = self.lock();
        let mut rows: Vec<Row> = inner
            .tables
            .get(table)
            .into_iter()
            .flatten()
            .filter(|row| self.visible(&identity, table, row))
            .filter(|row| row_owner(row) == Some(owner.as_str()))
            .cloned()
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let left = a.get(order.column).and_then(Value::as_str).unwrap_or("");
                let right = b.get(order.column).and_then(Value::as_str).unwrap_or("");
                if order.descending {
                    right.cmp(left)
                } else {
                    left.cmp(right)
                }
            });
        }
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn select_one(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
    ) -> Result<Option<Value>, Error> {
        let identity = self.require_identity()?.clone();
        let inner = self.lock();
        Ok(inner
            .tables
            .get(table)
            .into_iter()
            .flatten()
            .filter(|row| self.visible(&identity, table, row))
            .find(|row| row_id(row) == Some(id) && row_owner(row) == Some(owner.as_str()))
            .cloned()
            .map(Value::Object))
    }

    async fn update_owned(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
        patch: Row,
    ) -> Result<Vec<Value>, Error> {
        let identity = self.require_identity()?.clone();
        let mut inner = self.lock();
        let now = inner.next_timestamp();
        let mut affected = Vec::new();
        if let Some(rows) = inner.tables.get_mut(table) {
            for row in rows.iter_mut() {
                let matches = if table == PROFILE_TABLE {
                    row_id(row) == Some(identity.as_str()) && row_id(row) == Some(id)
                } else {
                    row_owner(row) == Some(identity.as_str())
                        && row_id(row) == Some(id)
                        && row_owner(row) == Some(owner.as_str())
                };
                if matches {
                    for (column, value) in &patch {
                        row.insert(column.clone(), value.clone());
                    }
                    row.insert("updated_at".to_owned(), Value::String(now.to_rfc3339()));
                    affected.push(Value::Object(row.clone()));
                }
            }
        }
        Ok(affected)
    }

    async fn delete_owned(
        &self,
        table: &str,
        id: &str,
        owner: &UserId,
    ) -> Result<Vec<Value>, Error> {
        let identity = self.require_identity()?.clone();
        let mut inner = self.lock();
        let Some(rows) = inner.tables.get_mut(table) else {
            return Ok(Vec::new());
        };
        let mut removed = Vec::new();
        rows.retain(|row| {
            let matches = row_owner(row) == Some(identity.as_str())
                && row_id(row) == Some(id)
                && row_owner(row) == Some(owner.as_str());
            if matches {
                removed.push(Value::Object(row.clone()));
            }
            !matches
        });
        Ok(removed)
    }

    async fn fetch_profile(&self, owner: &UserId) -> Result<Option<Value>, Error> {
        let identity = self.require_identity()?.clone();
        let inner = self.lock();
        Ok(inner
            .tables
            .get(PROFILE_TABLE)
            .into_iter()
            .flatten()
            .find(|row| {
                row_id(row) == Some(identity.as_str()) && row_id(row) == Some(owner.as_str())
            })
            .cloned()
            .map(Value::Object))
    }

    async fn update_profile(&self, owner: &UserId, patch: Row) -> Result<Vec<Value>, Error> {
        self.update_owned(PROFILE_TABLE, owner.as_str(), owner, patch)
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn owner() -> UserId {
        UserId::new("11111111-1111-1111-1111-111111111111").expect("fixture id")
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_tokens_scope_to_an_anonymous_handle() {
        let rows = InMemoryRows::default();
        let token = BearerToken::new("not-issued").expect("token shape");
        let store = rows.scope(&token);
        let err = store
            .select_owned("games", &owner(), None)
            .await
            .expect_err("anonymous handle");
        assert_eq!(err.code(), crate::domain::ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn profile_rows_are_keyed_by_identity() {
        let rows = InMemoryRows::default();
        rows.seed_profile(&owner(), "ada@example.com", Some("ada"));
        let token = rows.issue_token(&owner());
        let store = rows.scope(&token);

        let profile = store
            .fetch_profile(&owner())
            .await
            .expect("fetch")
            .expect("profile present");
        assert_eq!(
            profile.get("email").and_then(Value::as_str),
            Some("ada@example.com")
        );

        let updated = store
            .update_profile(&owner(), json!({ "username": "countess" })
                .as_object()
                .expect("object literal")
                .clone())
            .await
            .expect("update");
        assert_eq!(updated.len(), 1);
    }
}
