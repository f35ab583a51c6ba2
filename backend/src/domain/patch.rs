//! Sparse update patches computed from raw request bodies.
//!
//! Only fields explicitly present in the body contribute to the patch, so
//! unspecified columns stay untouched in storage. Explicit JSON `null` is
//! written through (it clears the column). One logical field may be accepted
//! under two spellings; the patch normalises it to the store column name.

use serde_json::{Map, Value};

use crate::domain::Error;

/// Declares one patchable field: the request spelling, an optional alternate
/// spelling, and the store column the value is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchField {
    /// Canonical request spelling. Wins when both spellings are present.
    pub request: &'static str,
    /// Alternate accepted spelling, if any.
    pub alias: Option<&'static str>,
    /// Store column receiving the value.
    pub column: &'static str,
}

impl PatchField {
    /// Field whose request spelling equals its column name.
    #[must_use]
    pub const fn plain(name: &'static str) -> Self {
        Self {
            request: name,
            alias: None,
            column: name,
        }
    }

    /// Field accepted under two spellings and normalised to `column`.
    #[must_use]
    pub const fn aliased(
        request: &'static str,
        alias: &'static str,
        column: &'static str,
    ) -> Self {
        Self {
            request,
            alias: Some(alias),
            column,
        }
    }

    fn pick<'a>(&self, body: &'a Map<String, Value>) -> Option<&'a Value> {
        body.get(self.request)
            .or_else(|| self.alias.and_then(|alias| body.get(alias)))
    }
}

/// Sparse column map ready for a filtered store update.
///
/// ## Invariants
/// - Never empty: construction fails with `invalid_request` before any store
///   call when no whitelisted field is present in the body.
#[derive(Debug, Clone, PartialEq)]
pub struct SparsePatch(Map<String, Value>);

impl SparsePatch {
    /// Compute the patch from a raw update body against a field whitelist.
    ///
    /// Unknown keys are ignored. Fields absent from the body are omitted from
    /// the patch entirely, as opposed to explicit `null`, which is included.
    ///
    /// # Errors
    /// - `invalid_request` when the body is not a JSON object or when no
    ///   whitelisted field is present.
    pub fn from_body(body: &Value, fields: &[PatchField]) -> Result<Self, Error> {
        let map = body
            .as_object()
            .ok_or_else(|| Error::invalid_request("update body must be a JSON object"))?;
        let patch: Map<String, Value> = fields
            .iter()
            .filter_map(|field| {
                field
                    .pick(map)
                    .map(|value| (field.column.to_owned(), value.clone()))
            })
            .collect();
        if patch.is_empty() {
            return Err(Error::invalid_request("No fields to update"));
        }
        Ok(Self(patch))
    }

    /// Consume the patch, yielding the column map for the store call.
    #[must_use]
    pub fn into_columns(self) -> Map<String, Value> {
        self.0
    }

    /// Borrow the column map.
    #[must_use]
    pub const fn columns(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;
    use serde_json::json;

    const FIELDS: &[PatchField] = &[
        PatchField::plain("name"),
        PatchField::plain("winner"),
        PatchField::aliased("currentRound", "current_round", "current_round"),
    ];

    #[rstest]
    #[case(json!({ "currentRound": 3 }))]
    #[case(json!({ "current_round": 3 }))]
    fn either_spelling_normalises_to_the_column(#[case] body: Value) {
        let patch = SparsePatch::from_body(&body, FIELDS).expect("patch");
        assert_eq!(patch.columns().get("current_round"), Some(&json!(3)));
        assert_eq!(patch.columns().len(), 1);
    }

    #[rstest]
    fn canonical_spelling_wins_when_both_present() {
        let body = json!({ "currentRound": 5, "current_round": 9 });
        let patch = SparsePatch::from_body(&body, FIELDS).expect("patch");
        assert_eq!(patch.columns().get("current_round"), Some(&json!(5)));
    }

    #[rstest]
    fn absent_fields_are_omitted_but_null_is_written_through() {
        let body = json!({ "winner": null });
        let patch = SparsePatch::from_body(&body, FIELDS).expect("patch");
        assert_eq!(patch.columns().get("winner"), Some(&Value::Null));
        assert!(!patch.columns().contains_key("name"));
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({ "unknown": 1 }))]
    fn empty_or_unrecognised_body_is_rejected(#[case] body: Value) {
        let err = SparsePatch::from_body(&body, FIELDS).expect_err("empty patch");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn non_object_body_is_rejected() {
        let err = SparsePatch::from_body(&json!([1, 2]), FIELDS).expect_err("not an object");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
