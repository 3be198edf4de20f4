use chrono::{Duration, Utc};
use doctorbot::{
    error::CoreError,
    models::ResetStatus,
    repositories::{AccountRepository, SqliteAccountRepository},
    services::token_service::TokenService,
    test_utils::test_helpers,
};
use std::sync::Arc;

#[tokio::test]
async fn verification_token_cannot_be_replayed() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let uuid = test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", false)
        .await
        .unwrap();

    let service = TokenService::new(Arc::new(SqliteAccountRepository::new(pool)));

    let token = service.issue_verification_token(&uuid).await.unwrap();
    assert_eq!(service.consume_verification_token(&token).await.unwrap(), uuid);

    // The token was cleared on consumption; a replay finds nothing.
    let replay = service.consume_verification_token(&token).await;
    assert!(matches!(replay, Err(CoreError::NotFound)));
}

#[tokio::test]
async fn expired_verification_token_is_rejected() {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", false)
        .await
        .unwrap();

    let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
    test_helpers::set_verification_state(&pool, "alice@example.com", Some("stale-token"), Some(&past))
        .await
        .unwrap();

    let service = TokenService::new(Arc::new(SqliteAccountRepository::new(pool)));
    let result = service.consume_verification_token("stale-token").await;
    assert!(matches!(result, Err(CoreError::Expired)));
}

#[tokio::test]
async fn reissuing_verification_token_overwrites_previous() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let uuid = test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", false)
        .await
        .unwrap();

    let service = TokenService::new(Arc::new(SqliteAccountRepository::new(pool)));

    let first = service.issue_verification_token(&uuid).await.unwrap();
    let second = service.issue_verification_token(&uuid).await.unwrap();
    assert_ne!(first, second);

    // Only the most recent token is live.
    assert!(matches!(
        service.consume_verification_token(&first).await,
        Err(CoreError::NotFound)
    ));
    assert_eq!(service.consume_verification_token(&second).await.unwrap(), uuid);
}

#[tokio::test]
async fn second_reset_request_is_already_pending() {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", true)
        .await
        .unwrap();

    let service = TokenService::new(Arc::new(SqliteAccountRepository::new(pool)));

    service.issue_reset_token("alice@example.com").await.unwrap();
    let second = service.issue_reset_token("alice@example.com").await;
    assert!(matches!(second, Err(CoreError::AlreadyPending)));
}

#[tokio::test]
async fn reset_token_for_unknown_email_is_not_found() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let service = TokenService::new(Arc::new(SqliteAccountRepository::new(pool)));

    let result = service.issue_reset_token("nobody@example.com").await;
    assert!(matches!(result, Err(CoreError::NotFound)));
}

#[tokio::test]
async fn stale_pending_reset_does_not_block_reissue() {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_account(&pool, "alice@example.com", "secret1", true)
        .await
        .unwrap();

    let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
    test_helpers::set_reset_state(
        &pool,
        "alice@example.com",
        "PENDING",
        Some("stale-token"),
        Some(&past),
    )
    .await
    .unwrap();

    let service = TokenService::new(Arc::new(SqliteAccountRepository::new(pool)));
    let result = service.issue_reset_token("alice@example.com").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn maintenance_sweep_cleans_up_stale_state() {
    let pool = test_helpers::create_test_db().await.unwrap();

    // Unverified account whose verification window lapsed over 7 days ago.
    test_helpers::insert_test_account(&pool, "ghost@example.com", "secret1", false)
        .await
        .unwrap();
    let long_past = (Utc::now() - Duration::days(8)).to_rfc3339();
    test_helpers::set_verification_state(&pool, "ghost@example.com", Some("t1"), Some(&long_past))
        .await
        .unwrap();

    // Pending reset that expired more than a day ago.
    test_helpers::insert_test_account(&pool, "stale@example.com", "secret1", true)
        .await
        .unwrap();
    let two_days_ago = (Utc::now() - Duration::days(2)).to_rfc3339();
    test_helpers::set_reset_state(
        &pool,
        "stale@example.com",
        "PENDING",
        Some("t2"),
        Some(&two_days_ago),
    )
    .await
    .unwrap();

    let accounts = Arc::new(SqliteAccountRepository::new(pool));
    let service = TokenService::new(accounts.clone());
    service.run_maintenance().await.unwrap();

    assert!(accounts
        .find_by_email("ghost@example.com")
        .await
        .unwrap()
        .is_none());

    let stale = accounts
        .find_by_email("stale@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stale.reset_status, ResetStatus::Expired);
    assert!(stale.reset_token.is_none());
    assert!(stale.reset_expiration.is_none());
}
