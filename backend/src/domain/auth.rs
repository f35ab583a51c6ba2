//! Authentication primitives: bearer credentials and resolved identities.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::UserId;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email lacked the minimal `local@domain` shape.
    MalformedEmail,
    /// Password was blank.
    EmptyPassword,
    /// Bearer token was blank.
    EmptyToken,
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::MalformedEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::EmptyToken => write!(f, "bearer token must not be empty"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Opaque bearer credential proving an identity, issued at login or signup.
///
/// ## Invariants
/// - Non-empty once trimmed; no other structure is assumed. The token is
///   introspected by the identity provider, never decoded locally.
///
/// The inner string is zeroed on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Validate and wrap a raw credential string.
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CredentialValidationError::EmptyToken);
        }
        Ok(Self(Zeroizing::new(raw)))
    }

    /// Borrow the raw credential for outbound `Authorization` headers.
    #[must_use]
    pub fn reveal(&self) -> &str {
        self.0.as_str()
    }
}

/// Verified identity returned by credential introspection.
///
/// Immutable once resolved for a request and never persisted by this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Subject id confirmed by the identity provider.
    pub user_id: UserId,
    /// Email of record for the subject.
    pub email: String,
}

/// Validated email/password pair used for password login.
///
/// ## Invariants
/// - `email` is trimmed and minimally shaped (`local@domain`).
/// - `password` is non-empty but retains caller-provided whitespace to avoid
///   surprising credential comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

fn validate_email(email: &str) -> Result<String, CredentialValidationError> {
    let normalized = email.trim();
    if normalized.is_empty() {
        return Err(CredentialValidationError::EmptyEmail);
    }
    let mut parts = normalized.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(CredentialValidationError::MalformedEmail);
    }
    Ok(normalized.to_owned())
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email string suitable for the identity provider.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated signup payload: credentials plus the initial display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    credentials: LoginCredentials,
    username: Option<String>,
}

impl NewAccount {
    /// Construct a signup payload from raw inputs.
    ///
    /// A blank username is treated as absent; the profile trigger will leave
    /// the column null.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<Self, CredentialValidationError> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        let username = username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        Ok(Self {
            credentials,
            username,
        })
    }

    /// Email/password pair for the provider call.
    #[must_use]
    pub const fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Initial display name, when supplied.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// Token-bearing session issued by the identity provider at signup or login.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Bearer credential for subsequent requests.
    pub access_token: BearerToken,
    /// Identity the credential was issued to.
    pub identity: Identity,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialValidationError::EmptyEmail)]
    #[case("   ", "pw", CredentialValidationError::EmptyEmail)]
    #[case("ada", "pw", CredentialValidationError::MalformedEmail)]
    #[case("ada@", "pw", CredentialValidationError::MalformedEmail)]
    #[case("@example.com", "pw", CredentialValidationError::MalformedEmail)]
    #[case("ada@localhost", "pw", CredentialValidationError::MalformedEmail)]
    #[case("ada@example.com", "", CredentialValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  ada@example.com  ", "secret")]
    #[case("grace@science.example.org", "correct horse battery staple")]
    fn valid_credentials_trim_email(#[case] email: &str, #[case] password: &str) {
        let creds =
            LoginCredentials::try_from_parts(email, password).expect("valid inputs succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    #[case("", CredentialValidationError::EmptyToken)]
    #[case("   ", CredentialValidationError::EmptyToken)]
    fn blank_tokens_rejected(#[case] raw: &str, #[case] expected: CredentialValidationError) {
        assert_eq!(BearerToken::new(raw).expect_err("blank token"), expected);
    }

    #[rstest]
    fn blank_username_treated_as_absent() {
        let account = NewAccount::try_from_parts("ada@example.com", "pw", Some("   "))
            .expect("valid account");
        assert_eq!(account.username(), None);
    }
}
