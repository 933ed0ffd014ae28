#![allow(clippy::unwrap_used)]
// Integration tests for accounts, entities and setup against a wiremock
// backend.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ufanet_core::setup::{self, SetupError};
use ufanet_core::{
    Account, AccountConfig, AccountEntry, AccountRegistry, CredentialStore, Entity, EntityKind,
    IntercomEntry, MemoryStore, StoredCredentials,
};

const CONTRACT: &str = "100200300";

// ── Helpers ─────────────────────────────────────────────────────────

fn jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string());
    format!("{header}.{payload}.sig")
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

fn fresh_jwt() -> String {
    jwt(Utc::now().timestamp() + 3600)
}

fn expired_jwt() -> String {
    jwt(Utc::now().timestamp() - 10)
}

fn config(server: &MockServer) -> AccountConfig {
    AccountConfig::new(CONTRACT).with_base_url(server.uri())
}

fn store_with_password() -> Arc<dyn CredentialStore> {
    let store = MemoryStore::new();
    store
        .save(
            CONTRACT,
            &StoredCredentials {
                password: Some("hunter2".into()),
                ..StoredCredentials::default()
            },
        )
        .unwrap();
    Arc::new(store)
}

fn entry() -> AccountEntry {
    AccountEntry {
        contract: CONTRACT.into(),
        intercoms: vec![
            IntercomEntry {
                id: 7,
                name: "Подъезд 1".into(),
            },
            IntercomEntry {
                id: 8,
                name: "Калитка".into(),
            },
        ],
    }
}

async fn mount_login(server: &MockServer, password: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/auth_by_contract/"))
        .and(body_json(json!({ "contract": CONTRACT, "password": password })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": {
                "access": fresh_jwt(),
                "refresh": "refresh-1",
                "exp": 1_900_000_000
            }
        })))
        .mount(server)
        .await;
}

fn camera_json(number: &str, token: &str, domain: &str) -> serde_json::Value {
    json!({
        "number": number,
        "title": format!("Camera {number}"),
        "token_l": token,
        "servers": { "domain": domain }
    })
}

async fn open_account(server: &MockServer, store: Arc<dyn CredentialStore>) -> Account {
    Account::open(&config(server), entry(), store).unwrap()
}

// ── Setup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validate_credentials_records_account() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "role": { "name": "Подъезд 1" } },
            { "id": 8, "string_view": "Калитка" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    let entry = setup::validate_credentials(&config(&server), &secret("hunter2"), &store)
        .await
        .unwrap();

    assert_eq!(entry, self::entry());

    let record = store.load(CONTRACT).unwrap().unwrap();
    assert_eq!(record.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(record.refresh_exp, Some(1_900_000_000));
    assert_eq!(record.password.as_deref(), Some("hunter2"));
}

#[tokio::test]
async fn test_validate_credentials_bad_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/auth_by_contract/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Неверный пароль" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    let result =
        setup::validate_credentials(&config(&server), &secret("wrong"), &store).await;

    assert!(matches!(result, Err(SetupError::Auth)));
    assert_eq!(store.load(CONTRACT).unwrap(), None);
}

#[tokio::test]
async fn test_validate_credentials_without_intercoms() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    let result =
        setup::validate_credentials(&config(&server), &secret("hunter2"), &store).await;

    assert!(matches!(result, Err(SetupError::NoIntercoms)));
}

#[tokio::test]
async fn test_validate_credentials_server_error_is_unknown() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    let result =
        setup::validate_credentials(&config(&server), &secret("hunter2"), &store).await;

    match result {
        Err(SetupError::Unknown(message)) => assert!(message.contains("500"), "{message}"),
        other => panic!("expected Unknown, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reauthenticate_replaces_stored_credentials() {
    let server = MockServer::start().await;
    mount_login(&server, "new-password").await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 7 }])))
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    store
        .save(
            CONTRACT,
            &StoredCredentials {
                refresh_token: Some("stale".into()),
                refresh_exp: Some(1),
                password: Some("old-password".into()),
            },
        )
        .unwrap();

    setup::reauthenticate(&config(&server), &secret("new-password"), &store)
        .await
        .unwrap();

    let record = store.load(CONTRACT).unwrap().unwrap();
    assert_eq!(record.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(record.password.as_deref(), Some("new-password"));
}

// ── Buttons ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_buttons_follow_entry() {
    let server = MockServer::start().await;
    let account = open_account(&server, store_with_password()).await;

    let buttons = account.buttons();
    assert_eq!(buttons.len(), 2);
    assert_eq!(buttons[0].unique_id(), "100200300_7_open");
    assert_eq!(buttons[0].name(), "Подъезд 1");
    assert_eq!(buttons[1].unique_id(), "100200300_8_open");
    assert_eq!(buttons[0].kind(), EntityKind::Button);
    assert_eq!(buttons[0].icon(), Some("mdi:door"));
    assert_eq!(buttons[0].device_info().identifier.1, CONTRACT);
    assert_eq!(buttons[0].device_info().name, CONTRACT);
}

#[tokio::test]
async fn test_button_press_opens_door() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/7/open/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/8/open/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": false })))
        .expect(1)
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    let buttons = account.buttons();

    assert!(buttons[0].press().await.unwrap());
    assert!(!buttons[1].press().await.unwrap());
}

#[tokio::test]
async fn test_token_rotation_is_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh/"))
        .and(body_json(json!({ "token": "stored" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": fresh_jwt(),
            "refresh": "refresh-2",
            "exp": 1_950_000_000
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/7/open/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
        .mount(&server)
        .await;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    store
        .save(
            CONTRACT,
            &StoredCredentials {
                refresh_token: Some("stored".into()),
                refresh_exp: None,
                password: Some("hunter2".into()),
            },
        )
        .unwrap();

    let account = open_account(&server, Arc::clone(&store)).await;
    assert!(account.buttons()[0].press().await.unwrap());

    let record = store.load(CONTRACT).unwrap().unwrap();
    assert_eq!(record.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(record.refresh_exp, Some(1_950_000_000));
    assert_eq!(record.password.as_deref(), Some("hunter2"));
}

#[tokio::test]
async fn test_press_without_credentials_is_auth_error() {
    let server = MockServer::start().await;
    let account = open_account(&server, Arc::new(MemoryStore::new())).await;

    let err = account.buttons()[0].press().await.unwrap_err();
    assert!(err.is_auth());
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Cameras ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cameras_load_failure_is_empty() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    assert!(account.cameras().await.is_empty());
}

#[tokio::test]
async fn test_cameras_without_credentials_are_empty() {
    let server = MockServer::start().await;
    let account = open_account(&server, Arc::new(MemoryStore::new())).await;

    assert!(account.cameras().await.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fresh_stream_token_is_not_refreshed() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    let token = fresh_jwt();
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([camera_json("1001", &token, "s1.example")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    let mut cameras = account.cameras().await;
    assert_eq!(cameras.len(), 1);

    let camera = &mut cameras[0];
    assert_eq!(camera.unique_id(), "100200300_1001");
    assert_eq!(camera.name(), "Camera 1001");
    assert_eq!(camera.kind(), EntityKind::Camera);
    assert_eq!(
        camera.stream_source().await,
        format!("rtsp://s1.example/1001?token={token}")
    );
}

#[tokio::test]
async fn test_expiring_stream_token_is_refreshed() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    let fresh = fresh_jwt();
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([camera_json("1001", &expired_jwt(), "old.example")])),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            camera_json("1002", &fresh, "other.example"),
            camera_json("1001", &fresh, "new.example")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    let mut cameras = account.cameras().await;
    let camera = &mut cameras[0];

    let expected = format!("rtsp://new.example/1001?token={fresh}");
    assert_eq!(camera.stream_source().await, expected);
    // Now fresh: no further listing.
    assert_eq!(camera.stream_source().await, expected);
    assert_eq!(camera.camera().domain, "new.example");
}

#[tokio::test]
async fn test_failed_refresh_keeps_stale_url() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    let stale = expired_jwt();
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([camera_json("1001", &stale, "old.example")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    let mut cameras = account.cameras().await;

    assert_eq!(
        cameras[0].stream_source().await,
        format!("rtsp://old.example/1001?token={stale}")
    );
}

#[tokio::test]
async fn test_camera_missing_after_refresh_keeps_stale_url() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    let stale = expired_jwt();
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([camera_json("1001", &stale, "old.example")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([camera_json("2002", &fresh_jwt(), "new.example")])),
        )
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    let mut cameras = account.cameras().await;

    assert_eq!(
        cameras[0].stream_source().await,
        format!("rtsp://old.example/1001?token={stale}")
    );
}

#[tokio::test]
async fn test_camera_image_without_screenshot_server() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([camera_json("1001", &expired_jwt(), "old.example")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    let mut cameras = account.cameras().await;

    assert_eq!(cameras[0].camera_image().await, None);
}

#[tokio::test]
async fn test_camera_image_fetch_failure_is_none() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    // Snapshot URLs are always https; pointing one at the plain-http mock
    // makes the fetch fail.
    let screenshot_host = server.address().to_string();
    Mock::given(method("GET"))
        .and(path("/api/v1/cctv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "number": "1001",
            "token_l": fresh_jwt(),
            "servers": { "domain": "s1.example", "screenshot_domain": screenshot_host }
        }])))
        .mount(&server)
        .await;

    let account = open_account(&server, store_with_password()).await;
    let mut cameras = account.cameras().await;

    assert!(cameras[0].camera().snapshot_url().is_some());
    assert_eq!(cameras[0].camera_image().await, None);
}

// ── Registry ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_registry_lifecycle() {
    let server = MockServer::start().await;
    let store = store_with_password();
    let mut registry = AccountRegistry::new(Arc::clone(&store));

    let account = registry.setup(&config(&server), entry()).unwrap();
    assert_eq!(account.contract(), CONTRACT);
    assert!(registry.get(CONTRACT).is_some());
    assert_eq!(registry.contracts().collect::<Vec<_>>(), vec![CONTRACT]);

    assert!(registry.unload(CONTRACT).is_some());
    assert!(registry.get(CONTRACT).is_none());
    assert!(store.load(CONTRACT).unwrap().is_some());

    registry.setup(&config(&server), entry()).unwrap();
    registry.remove(CONTRACT).unwrap();
    assert!(registry.get(CONTRACT).is_none());
    assert_eq!(store.load(CONTRACT).unwrap(), None);
}

#[tokio::test]
async fn test_discover_builds_entry_from_listing() {
    let server = MockServer::start().await;
    mount_login(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "role": { "name": "Подъезд 1" } }
        ])))
        .mount(&server)
        .await;

    let account = Account::discover(&config(&server), store_with_password())
        .await
        .unwrap();

    assert_eq!(account.entry().intercoms.len(), 1);
    assert_eq!(account.buttons()[0].unique_id(), "100200300_7_open");
}
