//! Integration tests for the session lifecycle
//!
//! Exercises the full stack against a mock backend: credential sign-in,
//! persisted hydration at boot, periodic re-validation, and forced logout
//! when the backend revokes the session.

use std::sync::Arc;
use std::time::Duration;

use opencircle_core::{
    AuthStore, FailurePolicy, LoginFlow, NoopRequestCache, RouteDecision, RouteGuard,
    SessionStorage, SessionValidator,
};
use opencircle_domain::constants::MEMBER_PROFILE_ROUTE;
use opencircle_domain::{AccountType, Credentials, LoginStep, Role};
use opencircle_infra::scheduling::{SessionScheduler, SessionSchedulerConfig};
use opencircle_infra::{ApiClient, ApiClientConfig, FileSessionStorage, HttpAccountGateway};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn member_body(two_factor_enabled: u8, bypass_two_factor: u8) -> serde_json::Value {
    serde_json::json!({
        "id": 7,
        "account_id": 70,
        "first_name": "Ada",
        "last_name": "Osei",
        "email": "ada@example.com",
        "username": "ada",
        "bio": null,
        "profile_pic": null,
        "uuid": "7f3f4a1e-3f1c-4f4e-9d8a-1e2b3c4d5e6f",
        "role": "member",
        "two_factor_enabled": two_factor_enabled,
        "bypass_two_factor": bypass_two_factor,
        "membership_status": "active",
        "account_status": "verified",
        "avatar_url": null
    })
}

struct Harness {
    store: Arc<AuthStore>,
    gateway: Arc<HttpAccountGateway>,
    validator: Arc<SessionValidator>,
    storage: Arc<FileSessionStorage>,
}

fn build_harness(server: &MockServer, dir: &tempfile::TempDir) -> Harness {
    let config = ApiClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        max_attempts: 1,
    };
    let client = Arc::new(ApiClient::new(config).expect("api client"));
    let gateway = Arc::new(HttpAccountGateway::new(client));
    let storage = Arc::new(FileSessionStorage::new(dir.path().join("session.json")));
    let store = Arc::new(AuthStore::new(storage.clone(), Arc::new(NoopRequestCache)));
    let validator = Arc::new(SessionValidator::new(store.clone(), gateway.clone()));
    Harness { store, gateway, validator, storage }
}

fn credentials() -> Credentials {
    Credentials { email: "ada@example.com".into(), password: "hunter2".into() }
}

/// Validates the full sign-in path for a member whose policy skips OTP.
///
/// # Test Steps
/// 1. Mock the member sign-in endpoint with a session envelope
/// 2. Run the login flow with form credentials
/// 3. Verify the step enters the app at the member profile home
/// 4. Verify the store holds the session and the snapshot hit disk
/// 5. Verify the route guard now renders member-only routes
#[tokio::test(flavor = "multi_thread")]
async fn test_sign_in_to_authenticated_session() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/account/user_signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": member_body(0, 1),
            "expires_at": "2030-01-01T00:00:00Z",
        })))
        .mount(&mock_server)
        .await;

    let harness = build_harness(&mock_server, &dir);
    let flow = LoginFlow::new(harness.store.clone(), harness.gateway.clone())
        .settle_delay(Duration::from_millis(0));

    let step = flow.sign_in(AccountType::User, credentials()).await.expect("sign-in");

    assert!(matches!(step, LoginStep::EnterApp { home: MEMBER_PROFILE_ROUTE, .. }));
    assert!(harness.store.is_authenticated());
    assert!(harness.storage.load().await.unwrap().is_some(), "snapshot persisted");

    let guard = RouteGuard::new().with_roles([Role::Member]);
    assert_eq!(
        guard.evaluate(&harness.store.session(), "/member-profile"),
        RouteDecision::Render
    );
}

/// Validates boot hydration from a persisted snapshot.
///
/// # Test Steps
/// 1. Sign in and persist a snapshot with one harness
/// 2. Build a second harness over the same storage (a fresh process)
/// 3. Mock the who-am-I endpoint with a raw identity record
/// 4. Bootstrap and verify the session is confirmed and refreshed
#[tokio::test(flavor = "multi_thread")]
async fn test_bootstrap_rehydrates_persisted_session() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/account/user_signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": member_body(0, 1),
            "expires_at": "2030-01-01T00:00:00Z",
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/auth_user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(member_body(0, 1)))
        .mount(&mock_server)
        .await;

    let first = build_harness(&mock_server, &dir);
    let flow = LoginFlow::new(first.store.clone(), first.gateway.clone())
        .settle_delay(Duration::from_millis(0));
    flow.sign_in(AccountType::User, credentials()).await.expect("sign-in");

    // Fresh process: same storage file, empty in-memory state
    let second = build_harness(&mock_server, &dir);
    assert!(!second.store.is_authenticated());

    let outcome = second.validator.bootstrap().await;

    assert!(outcome.is_valid());
    assert!(second.store.is_authenticated());
}

/// Validates that the periodic check force-logs-out a revoked session.
///
/// # Test Steps
/// 1. Establish a session, with the who-am-I endpoint answering empty
/// 2. Run the scheduler with a short interval
/// 3. Verify the store clears and the persisted snapshot is gone
#[tokio::test(flavor = "multi_thread")]
async fn test_periodic_check_logs_out_revoked_session() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/account/user_signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": member_body(0, 1),
            "expires_at": "2030-01-01T00:00:00Z",
        })))
        .mount(&mock_server)
        .await;
    // Server-side revocation: who-am-I comes back empty
    Mock::given(method("GET"))
        .and(path("/account/auth_user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&mock_server)
        .await;

    let harness = build_harness(&mock_server, &dir);
    let flow = LoginFlow::new(harness.store.clone(), harness.gateway.clone())
        .settle_delay(Duration::from_millis(0));
    flow.sign_in(AccountType::User, credentials()).await.expect("sign-in");
    assert!(harness.store.is_authenticated());

    let mut scheduler = SessionScheduler::new(
        harness.validator.clone(),
        SessionSchedulerConfig { interval: Duration::from_millis(20), enabled: true },
    );
    scheduler.start().await.unwrap();

    // Give the scheduler a few ticks to notice
    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.stop().await.unwrap();

    assert!(!harness.store.is_authenticated());
    assert!(harness.storage.load().await.unwrap().is_none(), "snapshot cleared");
}

/// Validates the transient-failure policy end to end.
///
/// # Test Steps
/// 1. Establish a session, with the who-am-I endpoint answering 503
/// 2. Run one periodic-style validation
/// 3. Verify the session survives a transient backend failure
/// 4. Switch the endpoint to 401 and verify the session clears
#[tokio::test(flavor = "multi_thread")]
async fn test_transient_failure_keeps_session_definitive_clears_it() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/account/user_signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": member_body(0, 1),
            "expires_at": "2030-01-01T00:00:00Z",
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/auth_user"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/auth_user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let harness = build_harness(&mock_server, &dir);
    let flow = LoginFlow::new(harness.store.clone(), harness.gateway.clone())
        .settle_delay(Duration::from_millis(0));
    flow.sign_in(AccountType::User, credentials()).await.expect("sign-in");

    // 503: transient, session survives
    let outcome = harness
        .validator
        .validate_session_with_policy(FailurePolicy::KeepOnTransient)
        .await;
    assert!(!outcome.is_valid());
    assert!(harness.store.is_authenticated());

    // 401: definitive, session clears
    let outcome = harness
        .validator
        .validate_session_with_policy(FailurePolicy::KeepOnTransient)
        .await;
    assert!(!outcome.is_valid());
    assert!(!harness.store.is_authenticated());
}

/// Validates the member OTP journey: challenge, verify, session commit.
///
/// # Test Steps
/// 1. Mock sign-in to answer with a two-factor challenge
/// 2. Verify the flow routes to OTP entry without touching the store
/// 3. Mock the verify endpoint with a session envelope
/// 4. Verify the code commits the session
#[tokio::test(flavor = "multi_thread")]
async fn test_two_factor_challenge_then_verify() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/account/user_signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requires_2fa": true,
            "message": "OTP required",
            "account_type": "user",
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account/verify_2fa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": member_body(1, 1),
            "expires_at": "2030-01-01T00:00:00Z",
        })))
        .mount(&mock_server)
        .await;

    let harness = build_harness(&mock_server, &dir);
    let flow = LoginFlow::new(harness.store.clone(), harness.gateway.clone())
        .settle_delay(Duration::from_millis(0));

    let step = flow.sign_in(AccountType::User, credentials()).await.expect("sign-in");
    assert!(matches!(step, LoginStep::PromptOtp { .. }));
    assert!(!harness.store.is_authenticated());

    let step = flow
        .verify_otp(AccountType::User, "ada@example.com", "123456")
        .await
        .expect("verify");
    assert!(matches!(step, LoginStep::EnterApp { .. }));
    assert!(harness.store.is_authenticated());
}

/// Validates explicit sign-out with a failing backend logout endpoint.
///
/// # Test Steps
/// 1. Establish a session
/// 2. Mock the logout endpoint to fail with 500
/// 3. Sign out and verify the local session and snapshot still clear
#[tokio::test(flavor = "multi_thread")]
async fn test_sign_out_is_best_effort() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/account/user_signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": member_body(0, 1),
            "expires_at": "2030-01-01T00:00:00Z",
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let harness = build_harness(&mock_server, &dir);
    let flow = LoginFlow::new(harness.store.clone(), harness.gateway.clone())
        .settle_delay(Duration::from_millis(0));
    flow.sign_in(AccountType::User, credentials()).await.expect("sign-in");

    harness.validator.sign_out().await;

    assert!(!harness.store.is_authenticated());
    assert!(harness.storage.load().await.unwrap().is_none());
}
