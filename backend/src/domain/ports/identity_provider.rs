//! Driven port for the external identity provider.
//!
//! Covers the provider operations this layer consumes: account creation,
//! password login, and credential revocation. Credential introspection lives
//! on [`crate::domain::ports::CredentialVerifier`] because inbound adapters
//! depend on it for every authenticated request, not just the auth routes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{CredentialVerifier, InMemoryRows};
use crate::domain::{BearerToken, Error, Identity, IssuedSession, LoginCredentials, NewAccount, UserId};

/// Identity provider operations used by the auth routes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account and issue a session for it.
    ///
    /// # Errors
    /// `invalid_request` for duplicate emails or provider-side validation
    /// failures; `unavailable` when the provider cannot be reached.
    async fn sign_up(&self, account: &NewAccount) -> Result<IssuedSession, Error>;

    /// Authenticate an email/password pair and issue a session.
    ///
    /// # Errors
    /// `unauthorized` for bad credentials; `unavailable` when the provider
    /// cannot be reached.
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<IssuedSession, Error>;

    /// Revoke the given credential.
    ///
    /// # Errors
    /// `internal_error` when the provider rejects the revocation.
    async fn sign_out(&self, token: &BearerToken) -> Result<(), Error>;
}

#[derive(Default)]
struct HubInner {
    // email -> (password, identity)
    accounts: BTreeMap<String, (String, Identity)>,
    // raw token -> identity
    sessions: BTreeMap<String, Identity>,
}

/// In-memory identity provider used by tests and local development wiring.
///
/// Emulates the external platform end to end: signup registers an account,
/// projects a profile row into the shared [`InMemoryRows`] store (the way the
/// real store's trigger does on identity creation), and issues a credential
/// the paired verifier and store both recognise.
#[derive(Clone)]
pub struct FixtureIdentityHub {
    inner: Arc<Mutex<HubInner>>,
    rows: InMemoryRows,
}

impl FixtureIdentityHub {
    /// Build a hub projecting profiles into the given row store.
    #[must_use]
    pub fn new(rows: InMemoryRows) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner::default())),
            rows,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn issue_session(&self, identity: &Identity) -> Result<IssuedSession, Error> {
        let token = self.rows.issue_token(&identity.user_id);
        self.lock()
            .sessions
            .insert(token.reveal().to_owned(), identity.clone());
        Ok(IssuedSession {
            access_token: token,
            identity: identity.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityHub {
    async fn sign_up(&self, account: &NewAccount) -> Result<IssuedSession, Error> {
        let email = account.credentials().email().to_owned();
        let identity = {
            let mut inner = self.lock();
            if inner.accounts.contains_key(&email) {
                return Err(Error::invalid_request("Email already registered"));
            }
            let identity = Identity {
                user_id: UserId::new(Uuid::new_v4().to_string())
                    .map_err(|err| Error::internal(format!("minted invalid user id: {err}")))?,
                email: email.clone(),
            };
            inner.accounts.insert(
                email.clone(),
                (account.credentials().password().to_owned(), identity.clone()),
            );
            identity
        };
        self.rows
            .seed_profile(&identity.user_id, &email, account.username());
        self.issue_session(&identity)
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<IssuedSession, Error> {
        let identity = {
            let inner = self.lock();
            match inner.accounts.get(credentials.email()) {
                Some((password, identity)) if password == credentials.password() => {
                    identity.clone()
                }
                _ => return Err(Error::unauthorized("Invalid credentials")),
            }
        };
        self.issue_session(&identity)
    }

    async fn sign_out(&self, token: &BearerToken) -> Result<(), Error> {
        self.lock().sessions.remove(token.reveal());
        Ok(())
    }
}

#[async_trait]
impl CredentialVerifier for FixtureIdentityHub {
    async fn verify(&self, token: &BearerToken) -> Result<Identity, Error> {
        self.lock()
            .sessions
            .get(token.reveal())
            .cloned()
            .ok_or_else(|| Error::unauthorized("Could not validate credentials"))
    }
}
