mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use storefront_client::auth::{FileStorage, Role, Session, SessionStorage, SESSION_KEY};
use storefront_client::config::StorefrontConfig;
use storefront_client::error::Error;
use storefront_client::Storefront;
use tempfile::tempdir;
use wiremock::matchers::{any, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{storefront, user};

fn auth_body(role: &str) -> serde_json::Value {
    json!({
        "user": { "_id": "u1", "name": "Ada", "email": "ada@example.com", "role": role },
        "token": "server-token"
    })
}

#[tokio::test]
async fn test_login_persists_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("admin")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (shop, storage) = storefront(&mock_server);
    let session = shop.auth().login(" ada@example.com ", "secret").await.unwrap();

    assert_eq!(session.user.id, "u1");
    assert_eq!(session.token, "server-token");
    assert!(session.expires_at.is_some());
    assert!(shop.auth().is_authenticated());
    assert!(shop.auth().is_admin());

    let stored = storage.get_item(SESSION_KEY).await.unwrap().unwrap();
    let stored: Session = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored.user.email, "ada@example.com");
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })))
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let err = shop.auth().login("ada@example.com", "wrong").await.unwrap_err();

    match err {
        Error::InvalidCredentials(msg) => assert_eq!(msg, "Invalid email or password"),
        other => panic!("expected invalid credentials, got {:?}", other),
    }
    assert!(!shop.auth().is_authenticated());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "message": "User already exists" })))
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let err = shop
        .auth()
        .register("Ada", "ada@example.com", "secret")
        .await
        .unwrap_err();

    match err {
        Error::Conflict(msg) => assert_eq!(msg, "User already exists"),
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_signs_in() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({ "name": "Ada", "email": "ada@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(auth_body("user")))
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    shop.auth().register("Ada", "ada@example.com", "secret").await.unwrap();

    assert!(shop.auth().is_authenticated());
    assert!(!shop.auth().is_admin());
}

#[tokio::test]
async fn test_register_requires_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let err = shop.auth().register("  ", "ada@example.com", "secret").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_password_flows() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/forgot-password"))
        .and(body_json(json!({ "email": "nobody@example.com" })))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "User not found" })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .and(body_json(json!({ "email": "ada@example.com", "newPassword": "fresh" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Password updated" })))
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);

    let err = shop.auth().forgot_password("nobody@example.com").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(msg) if msg == "User not found"));

    let message = shop.auth().reset_password("ada@example.com", "fresh").await.unwrap();
    assert_eq!(message, "Password updated");
}

#[tokio::test]
async fn test_logout_is_local() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (shop, storage) = storefront(&mock_server);
    shop.session()
        .set(Session::new(user("u1", Role::User), "t".to_string(), Duration::from_secs(60)))
        .await
        .unwrap();
    assert!(storage.get_item(SESSION_KEY).await.unwrap().is_some());

    shop.sign_out().await.unwrap();

    assert!(!shop.auth().is_authenticated());
    assert!(storage.get_item(SESSION_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_from_session_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("session.json");

    let first = Storefront::from_config(
        StorefrontConfig::new("http://localhost:5000")
            .unwrap()
            .with_session_file(&file),
    )
    .unwrap();
    first
        .session()
        .set(Session::new(user("u7", Role::Admin), "t".to_string(), Duration::from_secs(60)))
        .await
        .unwrap();

    let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::new(&file));
    let second = Storefront::with_storage(StorefrontConfig::new("http://localhost:5000").unwrap(), storage).unwrap();
    assert!(!second.auth().is_authenticated());

    let restored = second.auth().restore().await.unwrap().unwrap();
    assert_eq!(restored.user.id, "u7");
    assert!(second.auth().is_admin());
}

#[tokio::test]
async fn test_restore_discards_expired_session() {
    let mock_server = MockServer::start().await;
    let (shop, storage) = storefront(&mock_server);

    let mut session = Session::new(user("u1", Role::User), "t".to_string(), Duration::from_secs(60));
    session.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(5));
    storage
        .set_item(SESSION_KEY, &serde_json::to_string(&session).unwrap())
        .await
        .unwrap();

    assert!(shop.auth().restore().await.unwrap().is_none());
    assert!(storage.get_item(SESSION_KEY).await.unwrap().is_none());
}
