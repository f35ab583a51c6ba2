//! Behaviour tests for the account lifecycle endpoints.
//!
//! These scenarios exercise signup, login, profile reads and patches, and
//! logout end to end over HTTP, confirming error bodies carry trace ids and
//! unauthorised responses challenge with the Bearer scheme.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

// Shared harness has extra helpers used by other integration suites.
#[allow(dead_code)]
#[path = "support/harness.rs"]
mod harness;

use awc::http::Method;
use harness::{
    RequestSpec, SharedWorld, WorldFixture, perform_json_request, signup_persona, with_world_async,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

#[fixture]
fn world() -> WorldFixture {
    harness::world()
}

fn signup_raw(world: &SharedWorld) {
    // Raw request rather than the helper: these scenarios also need to see
    // the failure responses the helper would panic on.
    perform_json_request(
        world,
        RequestSpec {
            method: Method::POST,
            path: "/api/v1/auth/signup".to_owned(),
            persona: None,
            payload: Some(json!({
                "email": "ada@example.com",
                "password": "correct horse",
                "username": "Ada"
            })),
            label: "signup request",
        },
    );
}

fn login(world: &SharedWorld, password: &str) {
    perform_json_request(
        world,
        RequestSpec {
            method: Method::POST,
            path: "/api/v1/auth/login".to_owned(),
            persona: None,
            payload: Some(json!({ "email": "ada@example.com", "password": password })),
            label: "login request",
        },
    );
}

fn body(world: &SharedWorld) -> Value {
    world.borrow().last_body.clone().expect("response body")
}

#[given("a running server")]
fn a_running_server(world: &WorldFixture) {
    let _ = world;
}

#[given("Ada has an account")]
fn ada_has_an_account(world: &WorldFixture) {
    signup_persona(&world.world(), "Ada");
}

#[when("a visitor signs up as Ada")]
fn a_visitor_signs_up_as_ada(world: &WorldFixture) {
    signup_raw(&world.world());
}

#[when("Ada logs in with the correct password")]
fn ada_logs_in_with_the_correct_password(world: &WorldFixture) {
    login(&world.world(), "correct horse");
}

#[when("Ada logs in with a wrong password")]
fn ada_logs_in_with_a_wrong_password(world: &WorldFixture) {
    login(&world.world(), "battery staple");
}

#[when("Ada requests their profile")]
fn ada_requests_their_profile(world: &WorldFixture) {
    perform_json_request(
        &world.world(),
        RequestSpec {
            method: Method::GET,
            path: "/api/v1/auth/me".to_owned(),
            persona: Some("Ada"),
            payload: None,
            label: "profile request",
        },
    );
}

#[when("Ada updates their avatar colour")]
fn ada_updates_their_avatar_colour(world: &WorldFixture) {
    perform_json_request(
        &world.world(),
        RequestSpec {
            method: Method::PUT,
            path: "/api/v1/auth/me".to_owned(),
            persona: Some("Ada"),
            payload: Some(json!({ "avatar_color": "#224466" })),
            label: "profile update request",
        },
    );
}

#[when("Ada submits an empty profile update")]
fn ada_submits_an_empty_profile_update(world: &WorldFixture) {
    perform_json_request(
        &world.world(),
        RequestSpec {
            method: Method::PUT,
            path: "/api/v1/auth/me".to_owned(),
            persona: Some("Ada"),
            payload: Some(json!({})),
            label: "empty profile update request",
        },
    );
}

#[when("Ada logs out")]
fn ada_logs_out(world: &WorldFixture) {
    perform_json_request(
        &world.world(),
        RequestSpec {
            method: Method::POST,
            path: "/api/v1/auth/logout".to_owned(),
            persona: Some("Ada"),
            payload: None,
            label: "logout request",
        },
    );
}

#[then("the response is created with a bearer token for Ada")]
fn the_response_is_created_with_a_bearer_token_for_ada(world: &WorldFixture) {
    let world = world.world();
    assert_eq!(world.borrow().last_status, Some(201));
    let body = body(&world);
    assert_eq!(
        body.get("token_type").and_then(Value::as_str),
        Some("bearer")
    );
    assert!(
        body.get("access_token")
            .and_then(Value::as_str)
            .is_some_and(|token| !token.is_empty()),
        "token must be present"
    );
    assert_eq!(
        body.pointer("/user/email").and_then(Value::as_str),
        Some("ada@example.com")
    );
}

#[then("the response is a bad request about a duplicate email")]
fn the_response_is_a_bad_request_about_a_duplicate_email(world: &WorldFixture) {
    let world = world.world();
    assert_eq!(world.borrow().last_status, Some(400));
    let body = body(&world);
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("invalid_request")
    );
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("Email already registered")
    );
}

#[then("the login response includes Ada's profile")]
fn the_login_response_includes_adas_profile(world: &WorldFixture) {
    let world = world.world();
    assert_eq!(world.borrow().last_status, Some(200));
    let body = body(&world);
    assert_eq!(
        body.pointer("/user/username").and_then(Value::as_str),
        Some("Ada")
    );
    assert_eq!(
        body.pointer("/user/email").and_then(Value::as_str),
        Some("ada@example.com")
    );
}

#[then("the response is unauthorised with a bearer challenge and a trace id")]
fn the_response_is_unauthorised_with_a_bearer_challenge_and_a_trace_id(world: &WorldFixture) {
    let world = world.world();
    let ctx = world.borrow();
    assert_eq!(ctx.last_status, Some(401));
    assert_eq!(ctx.last_www_authenticate.as_deref(), Some("Bearer"));

    let trace_id = ctx.last_trace_id.as_deref().expect("trace id header");
    let body = ctx.last_body.as_ref().expect("error body");
    assert_eq!(body.get("traceId").and_then(Value::as_str), Some(trace_id));
}

#[then("the profile response shows Ada's username")]
fn the_profile_response_shows_adas_username(world: &WorldFixture) {
    let world = world.world();
    assert_eq!(world.borrow().last_status, Some(200));
    let body = body(&world);
    assert_eq!(body.get("username").and_then(Value::as_str), Some("Ada"));
}

#[then("the profile response keeps the username and shows the new colour")]
fn the_profile_response_keeps_the_username_and_shows_the_new_colour(world: &WorldFixture) {
    let world = world.world();
    assert_eq!(world.borrow().last_status, Some(200));
    let body = body(&world);
    assert_eq!(body.get("username").and_then(Value::as_str), Some("Ada"));
    assert_eq!(
        body.get("avatar_color").and_then(Value::as_str),
        Some("#224466")
    );
}

#[then("the response is a bad request about an empty update")]
fn the_response_is_a_bad_request_about_an_empty_update(world: &WorldFixture) {
    let world = world.world();
    assert_eq!(world.borrow().last_status, Some(400));
    let body = body(&world);
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("No fields to update")
    );
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "Signing up issues a bearer token"
)]
fn signing_up_issues_a_bearer_token(world: WorldFixture) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "Signing up twice with the same email is rejected"
)]
fn signing_up_twice_with_the_same_email_is_rejected(world: WorldFixture) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "Logging in returns the stored profile"
)]
fn logging_in_returns_the_stored_profile(world: WorldFixture) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "A wrong password is rejected"
)]
fn a_wrong_password_is_rejected(world: WorldFixture) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "The profile can be read back"
)]
fn the_profile_can_be_read_back(world: WorldFixture) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "A profile patch only touches supplied fields"
)]
fn a_profile_patch_only_touches_supplied_fields(world: WorldFixture) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "An empty profile patch is rejected"
)]
fn an_empty_profile_patch_is_rejected(world: WorldFixture) {
    drop(world);
}

#[scenario(
    path = "tests/features/auth_endpoints.feature",
    name = "Logout revokes the credential"
)]
fn logout_revokes_the_credential(world: WorldFixture) {
    drop(world);
}

/// The welcome and health routes answer without credentials.
#[rstest::rstest]
fn liveness_routes_answer_anonymously(world: WorldFixture) {
    let world = world.world();
    let (root_body, health_body) = with_world_async(&world, |base_url| async move {
        let client = awc::Client::default();
        let mut root = client
            .get(format!("{base_url}/"))
            .send()
            .await
            .expect("root request");
        let root_bytes = root.body().await.expect("root body");
        let mut health = client
            .get(format!("{base_url}/health"))
            .send()
            .await
            .expect("health request");
        let health_bytes = health.body().await.expect("health body");
        (
            serde_json::from_slice::<Value>(&root_bytes).expect("root json"),
            serde_json::from_slice::<Value>(&health_bytes).expect("health json"),
        )
    });
    assert!(
        root_body
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|message| message.contains("Scorecard")),
    );
    assert_eq!(health_body.get("status"), Some(&json!("ok")));
    assert_eq!(health_body.get("store"), Some(&json!("missing")));
}
