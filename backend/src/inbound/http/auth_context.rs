//! Request-scoped identity resolution.
//!
//! [`AuthContext`] is the per-request capability handlers operate through:
//! the verified identity plus a data-access handle scoped to the request's
//! credential. It is constructed once per request by the extractor and
//! dropped at request end; it must never be cached or reused across
//! requests, because the scoped handle is bound to one credential's
//! lifetime.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::ports::OwnedRowStore;
use crate::domain::{BearerToken, Error, Identity, UserId};
use crate::inbound::http::state::HttpState;

/// Verified identity plus scoped data access for one request.
pub struct AuthContext {
    identity: Identity,
    token: BearerToken,
    store: Arc<dyn OwnedRowStore>,
}

impl AuthContext {
    /// The verified identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Owner id shorthand for store predicates.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.identity.user_id
    }

    /// Data-access handle attributed to this request's credential.
    #[must_use]
    pub fn store(&self) -> &dyn OwnedRowStore {
        self.store.as_ref()
    }

    /// The raw credential, needed only to revoke it at logout.
    #[must_use]
    pub const fn token(&self) -> &BearerToken {
        &self.token
    }
}

/// Optional variant: anonymous requests proceed with `None` instead of 401.
///
/// A present-but-invalid credential still fails: tolerating anonymous callers
/// must not silently degrade callers who believe they are authenticated.
pub struct MaybeAuthContext(pub Option<AuthContext>);

/// Extract the bearer credential from the `Authorization` header.
///
/// # Errors
/// `unauthorized` when the header is present but is not a Bearer credential
/// or carries a blank token.
fn bearer_token(req: &HttpRequest) -> Result<Option<BearerToken>, Error> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| Error::unauthorized("Authorization header is not valid text"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("Authorization header must use the Bearer scheme"))?;
    BearerToken::new(token)
        .map(Some)
        .map_err(|_| Error::unauthorized("Bearer token must not be empty"))
}

fn http_state(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))
}

async fn resolve(state: &HttpState, token: BearerToken) -> Result<AuthContext, Error> {
    // Verify first, then derive the scoped handle from the same credential.
    // Both steps are per-request; nothing here is reused across requests.
    let identity = state.verifier.verify(&token).await?;
    let store = state.stores.scope(&token);
    Ok(AuthContext {
        identity,
        token,
        store,
    })
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = http_state(&req)?;
            let token = bearer_token(&req)?
                .ok_or_else(|| Error::unauthorized("Not authenticated"))?;
            resolve(&state, token).await
        })
    }
}

impl FromRequest for MaybeAuthContext {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let Some(token) = bearer_token(&req)? else {
                return Ok(Self(None));
            };
            let state = http_state(&req)?;
            resolve(&state, token).await.map(|ctx| Self(Some(ctx)))
        })
    }
}
