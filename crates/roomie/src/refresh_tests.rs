// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::session::{Session, UserType};
use crate::test_support::MockServer;

const REFRESH: &str = "POST /auth/refresh";

async fn setup() -> anyhow::Result<(MockServer, Arc<SessionStore>, TokenRefresher)> {
    let server = MockServer::start().await?;
    let store = SessionStore::in_memory();
    store
        .save_session(
            "A1".to_owned(),
            "R1".to_owned(),
            Some("seeker-7".to_owned()),
            Some(UserType::PropertyOwner),
        )
        .await?;
    let http = crate::http_client(Duration::from_secs(5))?;
    let refresher = TokenRefresher::new(http, &server.base_url, Arc::clone(&store));
    Ok((server, store, refresher))
}

fn original() -> Session {
    Session {
        access_token: Some("A1".to_owned()),
        refresh_token: Some("R1".to_owned()),
        user_id: Some("seeker-7".to_owned()),
        user_type: Some(UserType::PropertyOwner),
    }
}

#[yare::parameterized(
    both_absent = { None, None },
    access_absent = { None, Some("R1") },
    refresh_absent = { Some("A1"), None },
    access_blank = { Some("  "), Some("R1") },
    refresh_blank = { Some("A1"), Some("") },
)]
#[test_macro(tokio::test)]
async fn blank_input_fails_without_network(access: Option<&str>, refresh: Option<&str>) {
    let (server, store, refresher) = setup().await.expect("setup");
    let result = refresher.refresh(access, refresh).await;
    assert_eq!(result, Err(AuthError::MissingCredentials));
    assert_eq!(server.calls(REFRESH), 0);
    assert_eq!(store.snapshot(), original());
}

#[tokio::test]
async fn success_persists_new_pair_and_keeps_identity() -> anyhow::Result<()> {
    let (server, store, refresher) = setup().await?;
    server.respond(REFRESH, 200, r#"{"accessToken":"A2","refreshToken":"R2"}"#);

    let token = refresher.refresh(Some("A1"), Some("R1")).await;
    assert_eq!(token, Ok("A2".to_owned()));
    assert_eq!(
        store.snapshot(),
        Session {
            access_token: Some("A2".to_owned()),
            refresh_token: Some("R2".to_owned()),
            user_id: Some("seeker-7".to_owned()),
            user_type: Some(UserType::PropertyOwner),
        }
    );

    let sent = server.requests(REFRESH);
    assert_eq!(sent.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&sent[0].body)?;
    assert_eq!(body, serde_json::json!({ "accessToken": "A1", "refreshToken": "R1" }));
    Ok(())
}

#[yare::parameterized(
    server_error = { 500 },
    unauthorized = { 401 },
    forbidden = { 403 },
    no_content = { 204 },
)]
#[test_macro(tokio::test)]
async fn non_200_is_rejected_and_store_unchanged(status: u16) {
    let (server, store, refresher) = setup().await.expect("setup");
    server.respond(REFRESH, status, r#"{"accessToken":"A2","refreshToken":"R2"}"#);

    let result = refresher.refresh(Some("A1"), Some("R1")).await;
    assert_eq!(result, Err(AuthError::Rejected));
    assert_eq!(store.snapshot(), original());
}

#[yare::parameterized(
    missing_refresh = { r#"{"accessToken":"A2"}"# },
    missing_access = { r#"{"refreshToken":"R2"}"# },
    blank_access = { r#"{"accessToken":" ","refreshToken":"R2"}"# },
    null_refresh = { r#"{"accessToken":"A2","refreshToken":null}"# },
    not_json = { "<html>ok</html>" },
    empty = { "" },
)]
#[test_macro(tokio::test)]
async fn unusable_200_body_is_malformed(body: &str) {
    let (server, store, refresher) = setup().await.expect("setup");
    server.respond(REFRESH, 200, body);

    let result = refresher.refresh(Some("A1"), Some("R1")).await;
    assert_eq!(result, Err(AuthError::MalformedResponse));
    assert_eq!(store.snapshot(), original());
}

#[tokio::test]
async fn unreachable_backend_is_network_failure() -> anyhow::Result<()> {
    let store = SessionStore::in_memory();
    store.save_session("A1".to_owned(), "R1".to_owned(), None, None).await?;
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;
    let http = crate::http_client(Duration::from_secs(2))?;
    let refresher = TokenRefresher::new(http, &format!("http://{addr}"), Arc::clone(&store));

    let result = refresher.refresh(Some("A1"), Some("R1")).await;
    assert_eq!(result, Err(AuthError::NetworkFailure));
    assert_eq!(store.access_token().as_deref(), Some("A1"));
    Ok(())
}

#[tokio::test]
async fn timeout_is_network_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await?;
    server
        .respond(REFRESH, 200, r#"{"accessToken":"A2","refreshToken":"R2"}"#)
        .delay(REFRESH, Duration::from_secs(2));
    let store = SessionStore::in_memory();
    store.save_session("A1".to_owned(), "R1".to_owned(), None, None).await?;
    let http = crate::http_client(Duration::from_millis(200))?;
    let refresher = TokenRefresher::new(http, &server.base_url, Arc::clone(&store));

    let result = refresher.refresh(Some("A1"), Some("R1")).await;
    assert_eq!(result, Err(AuthError::NetworkFailure));
    assert_eq!(store.access_token().as_deref(), Some("A1"));
    Ok(())
}

#[tokio::test]
async fn dropped_refresh_leaves_store_untouched() -> anyhow::Result<()> {
    let (server, store, refresher) = setup().await?;
    server
        .respond(REFRESH, 200, r#"{"accessToken":"A2","refreshToken":"R2"}"#)
        .delay(REFRESH, Duration::from_millis(500));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        refresher.refresh(Some("A1"), Some("R1")),
    )
    .await;
    assert!(cancelled.is_err());

    // Give the server time to finish its delayed reply.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(store.snapshot(), original());
    Ok(())
}

#[tokio::test]
async fn logout_during_refresh_discards_tokens() -> anyhow::Result<()> {
    let (server, store, refresher) = setup().await?;
    server
        .respond(REFRESH, 200, r#"{"accessToken":"A2","refreshToken":"R2"}"#)
        .delay(REFRESH, Duration::from_millis(200));

    let logout = {
        let store = Arc::clone(&store);
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            store.clear().await
        }
    };
    let (result, cleared) = tokio::join!(refresher.refresh(Some("A1"), Some("R1")), logout);
    cleared?;
    assert_eq!(result, Err(AuthError::MissingCredentials));
    assert_eq!(store.snapshot(), Session::default());
    Ok(())
}

#[tokio::test]
async fn superseded_refresh_returns_stored_token() -> anyhow::Result<()> {
    let (server, store, refresher) = setup().await?;
    server.respond(REFRESH, 200, r#"{"accessToken":"A3","refreshToken":"R3"}"#);
    // Another refresh already rotated R1 -> R2.
    store.rotate_tokens("R1", "A2".to_owned(), "R2".to_owned()).await?;

    let result = refresher.refresh(Some("A1"), Some("R1")).await;
    assert_eq!(result, Ok("A2".to_owned()));
    assert_eq!(store.refresh_token().as_deref(), Some("R2"));
    Ok(())
}

#[test]
fn refresh_url_trims_trailing_slash() -> anyhow::Result<()> {
    let http = crate::http_client(Duration::from_secs(1))?;
    let refresher = TokenRefresher::new(http, "http://api.test/v1/", SessionStore::in_memory());
    assert_eq!(refresher.refresh_url, "http://api.test/v1/auth/refresh");
    Ok(())
}

#[tokio::test]
async fn rejected_body_is_not_logged() -> anyhow::Result<()> {
    let (server, _store, refresher) = setup().await?;
    server.respond(REFRESH, 401, r#"{"error":"revoked","refreshToken":"R1-secret"}"#);
    let (_guard, logs) = crate::test_support::capture_logs();

    let result = refresher.refresh(Some("A1"), Some("R1")).await;
    assert_eq!(result, Err(AuthError::Rejected));

    let logs = logs.contents();
    assert!(logs.contains("refresh rejected"), "{logs}");
    assert!(logs.contains("401"), "{logs}");
    assert!(!logs.contains("R1-secret"), "{logs}");
    Ok(())
}
