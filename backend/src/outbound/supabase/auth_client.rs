//! Reqwest-backed adapter for the hosted identity service.
//!
//! This adapter owns transport details only: request shaping, status and
//! error-body mapping, and JSON decoding into domain sessions. Credential
//! verification failures and provider outages both surface as `unauthorized`
//! to callers of [`CredentialVerifier::verify`]; the log line distinguishes
//! them so an outage is diagnosable without weakening the auth boundary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use tracing::{error, warn};

use super::dto::{AuthErrorDto, AuthUserDto, SessionDto, SignupResponseDto};
use crate::domain::ports::{CredentialVerifier, IdentityProvider};
use crate::domain::{BearerToken, Error, Identity, IssuedSession, LoginCredentials, NewAccount};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const API_KEY_HEADER: &str = "apikey";

/// Identity-service adapter speaking the provider's `/auth/v1` API.
pub struct SupabaseAuthClient {
    client: Client,
    base: Url,
    anon_key: String,
}

impl SupabaseAuthClient {
    /// Build an adapter using a reqwest client with an explicit request timeout.
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

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base
            .join(path)
            .map_err(|err| Error::internal(format!("invalid auth endpoint {path}: {err}")))
    }

    async fn error_message(response: reqwest::Response) -> Option<String> {
        response
            .json::<AuthErrorDto>()
            .await
            .ok()
            .and_then(AuthErrorDto::into_message)
    }
}

fn map_transport_error(error: &reqwest::Error) -> Error {
    error!(error = %error, "identity provider unreachable");
    Error::unavailable("Authentication service unavailable")
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn sign_up(&self, account: &NewAccount) -> Result<IssuedSession, Error> {
        let mut body = json!({
            "email": account.credentials().email(),
            "password": account.credentials().password(),
        });
        if let Some(username) = account.username() {
            body["data"] = json!({ "username": username });
        }
        let response = self
            .client
            .post(self.endpoint("auth/v1/signup")?)
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|err| map_transport_error(&err))?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| "Signup failed".to_owned());
            warn!(status = status.as_u16(), "signup rejected by provider");
            return Err(Error::invalid_request(message));
        }
        // A success body without a session means the provider is holding the
        // token back until the email address is verified.
        let signup: SignupResponseDto = response
            .json()
            .await
            .map_err(|err| Error::internal(format!("undecodable signup response: {err}")))?;
        signup.into_session()
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<IssuedSession, Error> {
        let response = self
            .client
            .post(self.endpoint("auth/v1/token?grant_type=password")?)
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .json(&json!({
                "email": credentials.email(),
                "password": credentials.password(),
            }))
            .send()
            .await
            .map_err(|err| map_transport_error(&err))?;

        let status = response.status();
        if !status.is_success() {
            // The provider answers 400 for bad password grants; anything it
            // rejects is an authentication failure from the caller's view.
            warn!(status = status.as_u16(), "login rejected by provider");
            return Err(Error::unauthorized("Invalid credentials"));
        }
        let session: SessionDto = response
            .json()
            .await
            .map_err(|err| Error::internal(format!("undecodable login response: {err}")))?;
        session.into_session()
    }

    async fn sign_out(&self, token: &BearerToken) -> Result<(), Error> {
        let response = self
            .client
            .post(self.endpoint("auth/v1/logout")?)
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .bearer_auth(token.reveal())
            .send()
            .await
            .map_err(|err| map_transport_error(&err))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            error!(status = status.as_u16(), "logout rejected by provider");
            Err(Error::internal("Logout failed"))
        }
    }
}

#[async_trait]
impl CredentialVerifier for SupabaseAuthClient {
    async fn verify(&self, token: &BearerToken) -> Result<Identity, Error> {
        let response = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .bearer_auth(token.reveal())
            .send()
            .await
            .map_err(|err| {
                // An unreachable verifier must fail closed; log the outage so
                // it is distinguishable from a genuinely bad credential.
                error!(error = %err, "credential verification transport failure");
                Error::unauthorized("Could not validate credentials")
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "credential rejected by provider");
            return Err(Error::unauthorized("Could not validate credentials"));
        }
        let user: AuthUserDto = response
            .json()
            .await
            .map_err(|err| Error::internal(format!("undecodable user response: {err}")))?;
        user.into_identity()
    }
}
