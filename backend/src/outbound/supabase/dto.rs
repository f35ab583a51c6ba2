//! Wire DTOs for the hosted identity and data services.
//!
//! These types mirror the provider's JSON exactly and are converted into
//! domain types at the adapter boundary; nothing above the adapter sees them.

use serde::Deserialize;

use crate::domain::{BearerToken, Error, Identity, IssuedSession, UserId};

/// Identity record returned by the auth service.
#[derive(Debug, Deserialize)]
pub struct AuthUserDto {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUserDto {
    /// Convert into a domain identity, validating the id shape.
    ///
    /// # Errors
    /// `internal` when the provider returns an id that is not a UUID; that is
    /// a contract violation, not a caller mistake.
    pub fn into_identity(self) -> Result<Identity, Error> {
        let user_id = UserId::new(&self.id)
            .map_err(|_| Error::internal(format!("auth service returned non-uuid id {}", self.id)))?;
        Ok(Identity {
            user_id,
            email: self.email.unwrap_or_default(),
        })
    }
}

/// Session envelope returned by signup and password-grant token requests.
#[derive(Debug, Deserialize)]
pub struct SessionDto {
    pub access_token: String,
    pub user: AuthUserDto,
}

impl SessionDto {
    /// Convert into a domain session.
    ///
    /// # Errors
    /// `internal` when the token is blank or the embedded user is malformed.
    pub fn into_session(self) -> Result<IssuedSession, Error> {
        let access_token = BearerToken::new(&self.access_token)
            .map_err(|_| Error::internal("auth service returned a blank access token"))?;
        Ok(IssuedSession {
            access_token,
            identity: self.user.into_identity()?,
        })
    }
}

/// Signup answer: a full session, or just the user when the provider has
/// email verification switched on and withholds the session until the address
/// is confirmed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignupResponseDto {
    Session(SessionDto),
    PendingVerification(AuthUserDto),
}

impl SignupResponseDto {
    /// Convert into a domain session.
    ///
    /// # Errors
    /// `invalid_request` when no session was issued: the account exists but
    /// the caller must verify their email before logging in. `internal` when
    /// the session envelope is malformed.
    pub fn into_session(self) -> Result<IssuedSession, Error> {
        match self {
            Self::Session(session) => session.into_session(),
            Self::PendingVerification(_) => Err(Error::invalid_request(
                "Account created successfully! Please verify your email to log in.",
            )),
        }
    }
}

/// Error envelope the auth service uses, with several historical spellings.
#[derive(Debug, Default, Deserialize)]
pub struct AuthErrorDto {
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthErrorDto {
    /// Best-effort human-readable message from whichever field is populated.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}
