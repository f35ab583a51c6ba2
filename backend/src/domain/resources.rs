//! Ownership-scoped resource operations shared by the resource controllers.
//!
//! Every targeted operation filters by id AND owner inside the store call
//! itself, so a single compound predicate is the sole source of truth for
//! tenant isolation. Zero affected rows is reported as `not_found` without
//! distinguishing "absent" from "owned by someone else": revealing the
//! difference would leak the existence of other users' resources.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::patch::{PatchField, SparsePatch};
use crate::domain::ports::OwnedRowStore;
use crate::domain::{Error, UserId};

/// Store column recording the owning identity on every resource row.
pub const OWNER_COLUMN: &str = "user_id";

/// Ordering applied to a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOrder {
    /// Column to order by.
    pub column: &'static str,
    /// Order direction; `true` for descending.
    pub descending: bool,
}

impl RowOrder {
    /// Descending order on the given column.
    #[must_use]
    pub const fn descending(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// A resource type owned by exactly one user and stored as one row.
pub trait OwnedResource: Sized + Send + DeserializeOwned {
    /// Store table holding rows of this resource.
    const TABLE: &'static str;
    /// Capitalised noun used in client-facing messages.
    const KIND: &'static str;
    /// Whitelist of patchable fields for sparse updates.
    const PATCH_FIELDS: &'static [PatchField];

    /// Ordering for list queries; `None` leaves the store's default order.
    #[must_use]
    fn list_order() -> Option<RowOrder> {
        None
    }

    /// Decode a store row into the resource.
    ///
    /// # Errors
    /// `internal_error` when the store returns a row this layer cannot
    /// decode; the row shape is part of the store contract.
    fn from_row(row: Value) -> Result<Self, Error> {
        serde_json::from_value(row).map_err(|error| {
            Error::internal(format!(
                "undecodable {} row returned by the store: {error}",
                Self::TABLE
            ))
        })
    }
}

/// Validate a raw path id for a targeted operation.
///
/// Ids that cannot be UUIDs cannot match any row, so they map to the same
/// `not_found` a missing or foreign-owned row produces.
///
/// # Errors
/// `not_found` for malformed ids.
pub fn parse_resource_id<R: OwnedResource>(raw: &str) -> Result<String, Error> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| not_found::<R>())
}

fn not_found<R: OwnedResource>() -> Error {
    Error::not_found(format!("{} not found", R::KIND))
}

/// Insert a new resource row, stamping the owner server-side.
///
/// Any client-supplied owner value is overwritten with the authenticated
/// identity before the row reaches the store.
///
/// # Errors
/// - `invalid_request` when the store accepts the call but returns no row.
/// - Store failures are propagated unchanged.
pub async fn create<R: OwnedResource>(
    store: &dyn OwnedRowStore,
    owner: &UserId,
    mut row: Map<String, Value>,
) -> Result<R, Error> {
    row.insert(
        OWNER_COLUMN.to_owned(),
        Value::String(owner.as_str().to_owned()),
    );
    let rows = store.insert(R::TABLE, row).await?;
    let Some(first) = rows.into_iter().next() else {
        return Err(Error::invalid_request(format!(
            "Failed to create {}",
            R::KIND.to_lowercase()
        )));
    };
    R::from_row(first)
}

/// List all rows owned by the caller, in the resource's list order.
///
/// # Errors
/// Store failures and undecodable rows are propagated.
pub async fn list<R: OwnedResource>(
    store: &dyn OwnedRowStore,
    owner: &UserId,
) -> Result<Vec<R>, Error> {
    let rows = store.select_owned(R::TABLE, owner, R::list_order()).await?;
    rows.into_iter().map(R::from_row).collect()
}

/// Fetch exactly the row matching id AND owner.
///
/// # Errors
/// `not_found` when no row matches the compound predicate.
pub async fn fetch<R: OwnedResource>(
    store: &dyn OwnedRowStore,
    owner: &UserId,
    id: &str,
) -> Result<R, Error> {
    let id = parse_resource_id::<R>(id)?;
    let row = store.select_one(R::TABLE, &id, owner).await?;
    row.map_or_else(|| Err(not_found::<R>()), R::from_row)
}

/// Apply a sparse patch to the row matching id AND owner.
///
/// # Errors
/// `not_found` when the filtered update affects zero rows.
pub async fn update<R: OwnedResource>(
    store: &dyn OwnedRowStore,
    owner: &UserId,
    id: &str,
    patch: SparsePatch,
) -> Result<R, Error> {
    let id = parse_resource_id::<R>(id)?;
    let rows = store
        .update_owned(R::TABLE, &id, owner, patch.into_columns())
        .await?;
    let Some(first) = rows.into_iter().next() else {
        return Err(not_found::<R>());
    };
    R::from_row(first)
}

/// Delete the row matching id AND owner.
///
/// # Errors
/// `not_found` when the filtered delete affects zero rows, including repeat
/// deletes of an already-removed id.
pub async fn delete<R: OwnedResource>(
    store: &dyn OwnedRowStore,
    owner: &UserId,
    id: &str,
) -> Result<(), Error> {
    let id = parse_resource_id::<R>(id)?;
    let rows = store.delete_owned(R::TABLE, &id, owner).await?;
    if rows.is_empty() {
        return Err(not_found::<R>());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::game::Game;
    use crate::domain::ports::{InMemoryRows, ScopedStoreFactory};
    use crate::domain::rule::SavedRule;
    use rstest::rstest;
    use serde_json::json;

    fn owner_a() -> UserId {
        UserId::new("11111111-1111-1111-1111-111111111111").expect("fixture id")
    }

    fn owner_b() -> UserId {
        UserId::new("22222222-2222-2222-2222-222222222222").expect("fixture id")
    }

    fn rule_row(name: &str) -> Map<String, Value> {
        json!({
            "name": name,
            "config": {
                "winMetric": "rounds",
                "targetRounds": 5,
                "targetPoints": 0,
                "winCondition": "lowest",
                "gameMode": "elimination"
            }
        })
        .as_object()
        .expect("object literal")
        .clone()
    }

    fn scoped(rows: &InMemoryRows, owner: &UserId) -> std::sync::Arc<dyn OwnedRowStore> {
        let token = rows.issue_token(owner);
        rows.scope(&token)
    }

    #[rstest]
    #[tokio::test]
    async fn create_stamps_the_authenticated_owner() {
        let rows = InMemoryRows::default();
        let store = scoped(&rows, &owner_a());
        let mut row = rule_row("preset");
        // A spoofed owner must be overwritten, never trusted.
        row.insert(OWNER_COLUMN.to_owned(), json!(owner_b().as_str()));

        let rule: SavedRule = create(store.as_ref(), &owner_a(), row).await.expect("create");
        assert_eq!(rule.user_id, owner_a());
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_rows_are_indistinguishable_from_missing_rows() {
        let rows = InMemoryRows::default();
        let store_a = scoped(&rows, &owner_a());
        let store_b = scoped(&rows, &owner_b());
        let rule: SavedRule = create(store_a.as_ref(), &owner_a(), rule_row("preset"))
            .await
            .expect("create");

        let err = fetch::<SavedRule>(store_b.as_ref(), &owner_b(), &rule.id)
            .await
            .expect_err("foreign fetch");
        assert_eq!(err.code(), ErrorCode::NotFound);

        let listed: Vec<SavedRule> = list(store_b.as_ref(), &owner_b()).await.expect("list");
        assert!(listed.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn delete_is_not_found_the_second_time() {
        let rows = InMemoryRows::default();
        let store = scoped(&rows, &owner_a());
        let rule: SavedRule = create(store.as_ref(), &owner_a(), rule_row("preset"))
            .await
            .expect("create");

        delete::<SavedRule>(store.as_ref(), &owner_a(), &rule.id)
            .await
            .expect("first delete succeeds");
        let err = delete::<SavedRule>(store.as_ref(), &owner_a(), &rule.id)
            .await
            .expect_err("second delete");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    #[tokio::test]
    async fn malformed_ids_map_to_not_found(#[case] raw: &str) {
        let rows = InMemoryRows::default();
        let store = scoped(&rows, &owner_a());
        let err = fetch::<Game>(store.as_ref(), &owner_a(), raw)
            .await
            .expect_err("malformed id");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
