use doctorbot::{
    error::CoreError,
    models::ResetStatus,
    repositories::SqliteAccountRepository,
    services::{
        credential_service::CredentialService,
        notification_service::HttpNotificationService,
        reset_service::ResetService,
        token_service::TokenService,
    },
    test_utils::test_helpers,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn build_reset_stack(
    pool: SqlitePool,
    base_url: &str,
) -> (Arc<ResetService>, Arc<CredentialService>) {
    let accounts = Arc::new(SqliteAccountRepository::new(pool));
    let credentials = Arc::new(CredentialService::new(accounts.clone()));
    let tokens = Arc::new(TokenService::new(accounts.clone()));
    let notifier = Arc::new(HttpNotificationService::new(base_url));
    let reset = Arc::new(ResetService::new(
        accounts,
        tokens,
        credentials.clone(),
        notifier,
    ));
    (reset, credentials)
}

#[tokio::test]
async fn full_reset_flow_approve_and_finalize() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-reset-password"))
        .and(query_param("email", "alice@example.com"))
        .and(query_param("name", "Test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", true)
        .await
        .unwrap();

    let (reset, credentials) = build_reset_stack(pool, &mock_server.uri());

    let token = reset.request_reset("alice@example.com").await.unwrap();
    assert!(!token.is_empty());
    assert_eq!(
        reset.check_status("alice@example.com").await.unwrap(),
        ResetStatus::Pending
    );

    // A second request while one is pending is refused.
    let second = reset.request_reset("alice@example.com").await;
    assert!(matches!(second, Err(CoreError::AlreadyPending)));

    // The approver acts while the requester is polling.
    let approver = reset.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        approver.approve("alice@example.com").await.unwrap();
    });

    let status = reset
        .poll_until_resolved(
            "alice@example.com",
            Duration::from_millis(10),
            Duration::from_secs(2),
        )
        .await
        .unwrap();
    assert_eq!(status, ResetStatus::Approved);

    reset
        .finalize_reset("alice@example.com", "newsecret")
        .await
        .unwrap();
    assert_eq!(
        reset.check_status("alice@example.com").await.unwrap(),
        ResetStatus::None
    );

    // New password works, the old one is dead.
    assert!(credentials
        .authenticate("alice@example.com", "newsecret")
        .await
        .is_ok());
    assert!(matches!(
        credentials.authenticate("alice@example.com", "secret1").await,
        Err(CoreError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn rejected_reset_allows_a_new_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-reset-password"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", true)
        .await
        .unwrap();

    let (reset, _) = build_reset_stack(pool, &mock_server.uri());

    reset.request_reset("alice@example.com").await.unwrap();
    reset.reject("alice@example.com").await.unwrap();
    assert_eq!(
        reset.check_status("alice@example.com").await.unwrap(),
        ResetStatus::Rejected
    );

    // REJECTED is terminal but not blocking.
    assert!(reset.request_reset("alice@example.com").await.is_ok());
    assert_eq!(
        reset.check_status("alice@example.com").await.unwrap(),
        ResetStatus::Pending
    );
}

#[tokio::test]
async fn finalize_without_approval_leaves_state_untouched() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-reset-password"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", true)
        .await
        .unwrap();

    let (reset, credentials) = build_reset_stack(pool, &mock_server.uri());

    reset.request_reset("alice@example.com").await.unwrap();

    let result = reset.finalize_reset("alice@example.com", "newsecret").await;
    assert!(matches!(result, Err(CoreError::NotFound)));
    assert_eq!(
        reset.check_status("alice@example.com").await.unwrap(),
        ResetStatus::Pending
    );
    assert!(credentials
        .authenticate("alice@example.com", "secret1")
        .await
        .is_ok());
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-reset-password"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", true)
        .await
        .unwrap();

    let (reset, _) = build_reset_stack(pool, &mock_server.uri());

    assert!(reset.request_reset("alice@example.com").await.is_ok());
    assert_eq!(
        reset.check_status("alice@example.com").await.unwrap(),
        ResetStatus::Pending
    );
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (reset, _) = build_reset_stack(pool, "http://127.0.0.1:1");

    let result = reset.request_reset("nobody@example.com").await;
    assert!(matches!(result, Err(CoreError::NotFound)));

    let status = reset.check_status("nobody@example.com").await;
    assert!(matches!(status, Err(CoreError::NotFound)));
}

#[tokio::test]
async fn unverified_account_cannot_request_reset() {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", false)
        .await
        .unwrap();

    let (reset, _) = build_reset_stack(pool, "http://127.0.0.1:1");

    let result = reset.request_reset("alice@example.com").await;
    assert!(matches!(result, Err(CoreError::NotVerified)));
}

#[tokio::test]
async fn poll_times_out_with_last_observed_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-reset-password"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", true)
        .await
        .unwrap();

    let (reset, _) = build_reset_stack(pool, &mock_server.uri());
    reset.request_reset("alice@example.com").await.unwrap();

    // Nobody resolves it; the poll gives up and reports what it saw.
    let status = reset
        .poll_until_resolved(
            "alice@example.com",
            Duration::from_millis(10),
            Duration::from_millis(50),
        )
        .await
        .unwrap();
    assert_eq!(status, ResetStatus::Pending);
}
