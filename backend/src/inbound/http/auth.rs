//! Authentication and profile HTTP handlers.
//!
//! ```text
//! POST /api/v1/auth/signup
//! POST /api/v1/auth/login
//! POST /api/v1/auth/logout
//! GET  /api/v1/auth/me
//! PUT  /api/v1/auth/me
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::domain::ports::Row;
use crate::domain::{
    CredentialValidationError, Error, IssuedSession, LoginCredentials, NewAccount, UserId,
    UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth_context::AuthContext;
use crate::inbound::http::state::HttpState;

/// Signup request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignupRequest {
    /// Email of record for the new account.
    pub email: String,
    /// Password for the new account.
    pub password: String,
    /// Initial display name; blank values are treated as absent.
    #[serde(default)]
    pub username: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    /// Email of record.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Profile patch body; only supplied fields are written.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProfileUpdateRequest {
    /// New display name.
    #[serde(default)]
    pub username: Option<String>,
    /// New avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// New avatar accent colour.
    #[serde(default)]
    pub avatar_color: Option<String>,
}

/// User payload embedded in auth responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// Identity id.
    pub id: UserId,
    /// Email of record.
    pub email: String,
    /// Display name.
    pub username: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Avatar accent colour.
    pub avatar_color: Option<String>,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            username: profile.username,
            avatar_url: profile.avatar_url,
            avatar_color: profile.avatar_color,
        }
    }
}

/// Token envelope returned by signup and login.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Bearer credential for subsequent requests.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
    /// The authenticated user.
    pub user: UserResponse,
}

impl TokenResponse {
    fn new(session: &IssuedSession, user: UserResponse) -> Self {
        Self {
            access_token: session.access_token.reveal().to_owned(),
            token_type: "bearer".to_owned(),
            user,
        }
    }
}

/// Simple message envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

fn map_credential_validation_error(err: CredentialValidationError) -> Error {
    let (field, code) = match err {
        CredentialValidationError::EmptyEmail => ("email", "empty_email"),
        CredentialValidationError::MalformedEmail => ("email", "malformed_email"),
        CredentialValidationError::EmptyPassword => ("password", "empty_password"),
        CredentialValidationError::EmptyToken => ("token", "empty_token"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

fn decode_profile(row: Value) -> ApiResult<UserProfile> {
    serde_json::from_value(row)
        .map_err(|error| Error::internal(format!("undecodable users row: {error}")))
}

/// Create a new user account.
///
/// The user profile row is created by the store's trigger on identity
/// creation, so the response echoes the submitted username rather than
/// re-reading the projection.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Duplicate email or validation failure", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/auth/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let account = NewAccount::try_from_parts(&body.email, &body.password, body.username.as_deref())
        .map_err(map_credential_validation_error)?;
    let session = state.identity.sign_up(&account).await?;
    let user = UserResponse {
        id: session.identity.user_id.clone(),
        email: session.identity.email.clone(),
        username: account.username().map(str::to_owned),
        avatar_url: None,
        avatar_color: None,
    };
    Ok(HttpResponse::Created().json(TokenResponse::new(&session, user)))
}

/// Login with email and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&body.email, &body.password)
        .map_err(map_credential_validation_error)?;
    let session = state.identity.sign_in(&credentials).await?;

    // Read the profile projection through a handle scoped to the fresh
    // credential so row-level security attributes the read correctly.
    let store = state.stores.scope(&session.access_token);
    let user = match store.fetch_profile(&session.identity.user_id).await? {
        Some(row) => UserResponse::from(decode_profile(row)?),
        None => UserResponse {
            id: session.identity.user_id.clone(),
            email: session.identity.email.clone(),
            username: None,
            avatar_url: None,
            avatar_color: None,
        },
    };
    Ok(HttpResponse::Ok().json(TokenResponse::new(&session, user)))
}

/// Logout the current user, revoking the presented credential.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Logout failed", body = Error)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(state: web::Data<HttpState>, ctx: AuthContext) -> ApiResult<HttpResponse> {
    state.identity.sign_out(ctx.token()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Successfully logged out".to_owned(),
    }))
}

/// Get the current user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Profile row missing", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn current_user(ctx: AuthContext) -> ApiResult<web::Json<UserResponse>> {
    let row = ctx
        .store()
        .fetch_profile(ctx.user_id())
        .await?
        .ok_or_else(|| Error::not_found("User profile not found"))?;
    Ok(web::Json(UserResponse::from(decode_profile(row)?)))
}

fn profile_patch(body: &ProfileUpdateRequest) -> ApiResult<Row> {
    // Unlike resource patches, explicit nulls are ignored here: the profile
    // columns are only ever set, never cleared, through this route.
    let mut patch = Row::new();
    if let Some(username) = &body.username {
        patch.insert("username".to_owned(), json!(username));
    }
    if let Some(avatar_url) = &body.avatar_url {
        patch.insert("avatar_url".to_owned(), json!(avatar_url));
    }
    if let Some(avatar_color) = &body.avatar_color {
        patch.insert("avatar_color".to_owned(), json!(avatar_color));
    }
    if patch.is_empty() {
        return Err(Error::invalid_request("No fields to update"));
    }
    Ok(patch)
}

/// Update the current user's profile.
#[utoipa::path(
    put,
    path = "/api/v1/auth/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Empty patch", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Profile row missing", body = Error)
    ),
    tags = ["auth"],
    operation_id = "updateCurrentUser"
)]
#[put("/auth/me")]
pub async fn update_current_user(
    ctx: AuthContext,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let patch = profile_patch(&payload.into_inner())?;
    let rows = ctx.store().update_profile(ctx.user_id(), patch).await?;
    let Some(first) = rows.into_iter().next() else {
        return Err(Error::not_found("User profile not found"));
    };
    Ok(web::Json(UserResponse::from(decode_profile(first)?)))
}
