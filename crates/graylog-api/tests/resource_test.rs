#![allow(clippy::unwrap_used)]
// Integration tests for the generic resource lifecycle, users and
// dashboards, using wiremock.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use graylog_api::{Dashboard, Error, ResourceState, Session, User};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<Session>) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let session = Session::with_client(reqwest::Client::new(), base_url);
    (server, Arc::new(session))
}

fn john() -> Value {
    json!({
        "username": "john",
        "full_name": "john doe",
        "email": "john@doe.org",
        "password": "secret",
        "permissions": []
    })
}

fn loaded_john(session: &Arc<Session>) -> User {
    let mut user = User::new(Arc::clone(session));
    user.load_from_json(json!({
        "id": "5a1b",
        "username": "john",
        "full_name": "john doe",
        "email": "john@doe.org",
        "permissions": ["streams:read"]
    }))
    .unwrap();
    user
}

/// Fails the test on drop if any request reaches the server.
async fn forbid_requests(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

// ── Create / delete ─────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_delete_user() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(john()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut user = User::new(Arc::clone(&session));
    assert!(user.create(john()).await.unwrap());
    assert_eq!(user.data().cloned().map(Value::Object), Some(john()));
    assert_eq!(user.id(), Some("john"));

    assert!(user.delete().await.unwrap());
    assert_eq!(user.state(), &ResourceState::Deleted);
    assert!(user.data().is_none());
}

#[tokio::test]
async fn test_create_missing_fields_sends_nothing() {
    let (server, session) = setup().await;
    forbid_requests(&server).await;

    let mut user = User::new(session);
    let result = user
        .create(json!({ "username": "john", "full_name": "john doe" }))
        .await;

    match result {
        Err(Error::MissingField { resource, fields }) => {
            assert_eq!(resource, "user");
            assert_eq!(fields, vec!["email", "password", "permissions"]);
        }
        other => panic!("expected MissingField, got: {other:?}"),
    }
    assert!(user.error_message().contains("email"));
    assert!(!user.is_loaded());
}

#[tokio::test]
async fn test_create_rejects_non_mapping() {
    let (server, session) = setup().await;
    forbid_requests(&server).await;

    let mut user = User::new(session);
    let err = user.create(json!(["john"])).await.unwrap_err();
    assert!(err.is_validation(), "got: {err:?}");
}

#[tokio::test]
async fn test_create_bad_request_is_validation_error() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "invalid email" })),
        )
        .mount(&server)
        .await;

    let mut user = User::new(session);
    let err = user.create(john()).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }), "got: {err:?}");
    assert!(err.to_string().contains("invalid email"));
    assert_eq!(
        user.last_response(),
        Some(&json!({ "message": "invalid email" }))
    );
    assert!(!user.is_loaded());
}

#[tokio::test]
async fn test_create_conflict_returns_false_with_response() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "user exists" })),
        )
        .mount(&server)
        .await;

    let mut user = User::new(session);
    assert!(!user.create(john()).await.unwrap());
    assert_eq!(user.last_response(), Some(&json!({ "message": "user exists" })));
    assert!(!user.is_loaded());
}

#[tokio::test]
async fn test_create_server_error_is_fatal() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut user = User::new(session);
    let err = user.create(john()).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.status(), Some(500));
    assert!(!user.is_loaded());
}

#[tokio::test]
async fn test_delete_without_identity_sends_nothing() {
    let (server, session) = setup().await;
    forbid_requests(&server).await;

    let mut user = User::new(session);
    let err = user.delete().await.unwrap_err();
    assert!(err.is_validation());
    assert!(user.error_message().contains("username"));
}

#[tokio::test]
async fn test_delete_refused_keeps_data() {
    let (server, session) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "nope" })))
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    assert!(!user.delete().await.unwrap());
    assert!(user.is_loaded());
    assert_eq!(user.last_response(), Some(&json!({ "message": "nope" })));
}

// ── Find / load ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_find_by_id_not_found_is_false() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut user = User::new(session);
    assert!(!user.find_by_id("ghost").await.unwrap());
    assert!(!user.is_loaded());
}

#[tokio::test]
async fn test_find_by_id_existing_does_not_load() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(200).set_body_json(john()))
        .mount(&server)
        .await;

    let mut user = User::new(session);
    assert!(user.find_by_id("john").await.unwrap());
    assert!(!user.is_loaded());
}

#[tokio::test]
async fn test_find_and_load_server_errors_are_fatal() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let mut user = User::new(session);
    assert!(user.find_by_id("john").await.unwrap_err().is_fatal());
    assert!(user.load_from_server("john").await.unwrap_err().is_fatal());
}

#[tokio::test]
async fn test_find_by_id_empty_id_sends_nothing() {
    let (server, session) = setup().await;
    forbid_requests(&server).await;

    let mut user = User::new(session);
    assert!(user.find_by_id("").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_create_then_load_round_trip() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "5a1b",
            "username": "john",
            "full_name": "john doe",
            "email": "john@doe.org",
            "password": "secret",
            "permissions": [],
            "read_only": false
        })))
        .mount(&server)
        .await;

    let mut created = User::new(Arc::clone(&session));
    assert!(created.create(john()).await.unwrap());

    let mut loaded = User::new(session);
    assert!(loaded.load_from_server("john").await.unwrap());
    for (field, value) in john().as_object().unwrap() {
        assert_eq!(loaded.get(field), Some(value), "field {field}");
    }
}

#[test]
fn test_load_from_json_rejects_empty() {
    let session = Arc::new(Session::connect("localhost", 12900, false, false).unwrap());
    let mut user = User::new(session);
    assert!(user.load_from_json(json!({})).unwrap_err().is_validation());
    assert!(user.load_from_json(json!("john")).unwrap_err().is_validation());
    assert!(!user.is_loaded());
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_without_change_is_noop() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/users/john"))
        .and(body_json(json!({ "full_name": "john doe" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(200).set_body_json(john()))
        .expect(0)
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    let changed = user
        .update(json!({ "username": "john", "full_name": "john doe" }))
        .await
        .unwrap();
    assert!(!changed);
}

#[tokio::test]
async fn test_update_with_change_refetches_once() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "john",
            "full_name": "John Doe",
            "email": "john@doe.org",
            "permissions": ["streams:read"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    assert!(user.update(json!({ "full_name": "John Doe" })).await.unwrap());
    assert_eq!(user.get("full_name"), Some(&json!("John Doe")));
}

#[tokio::test]
async fn test_update_routes_password_out_of_band() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/users/john/password"))
        .and(body_json(json!({ "password": "n3w" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    // The password never counts as a cached-field change.
    assert!(!user.update(json!({ "password": "n3w" })).await.unwrap());
}

#[tokio::test]
async fn test_update_password_and_field() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/users/john/password"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/john"))
        .and(body_json(json!({ "email": "jd@doe.org" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "john",
            "email": "jd@doe.org"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    let changed = user
        .update(json!({ "password": "n3w", "email": "jd@doe.org" }))
        .await
        .unwrap();
    assert!(changed);
    assert_eq!(user.get("email"), Some(&json!("jd@doe.org")));
}

#[tokio::test]
async fn test_update_requires_loaded_object() {
    let (server, session) = setup().await;
    forbid_requests(&server).await;

    let mut user = User::new(session);
    let err = user.update(json!({ "email": "x@y.z" })).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_update_failure_keeps_cached_data() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/users/john"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    let err = user.update(json!({ "email": "x@y.z" })).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(user.get("email"), Some(&json!("john@doe.org")));
}

// ── User endpoints ──────────────────────────────────────────────────

#[tokio::test]
async fn test_update_password_with_old_password() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/users/john/password"))
        .and(body_json(json!({ "password": "n3w", "old_password": "secret" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    let new = SecretString::from("n3w");
    let old = SecretString::from("secret");
    assert!(user.update_password(&new, Some(&old)).await.unwrap());
}

#[tokio::test]
async fn test_set_and_revoke_permissions() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/users/john/permissions"))
        .and(body_json(json!({ "permissions": ["dashboards:read"] })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/users/john/permissions"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut user = loaded_john(&session);
    assert_eq!(user.permissions().unwrap(), vec!["streams:read"]);

    assert!(
        user.set_permissions(&["dashboards:read".to_owned()])
            .await
            .unwrap()
    );
    assert_eq!(user.permissions().unwrap(), vec!["dashboards:read"]);

    assert!(user.revoke_permissions().await.unwrap());
    assert!(user.permissions().unwrap().is_empty());
}

#[tokio::test]
async fn test_permissions_require_loaded_user() {
    let (_server, session) = setup().await;
    let mut user = User::new(session);
    assert!(user.permissions().unwrap_err().is_validation());
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_users() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                { "username": "admin", "full_name": "Administrator" },
                { "username": "john", "full_name": "john doe" }
            ]
        })))
        .mount(&server)
        .await;

    let users = session.list_users().await.unwrap();
    let names: Vec<_> = users.iter().filter_map(User::id).collect();
    assert_eq!(names, vec!["admin", "john"]);
}

#[tokio::test]
async fn test_list_users_fails_atomically() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "username": "admin" }, "garbage"]
        })))
        .mount(&server)
        .await;

    let err = session.list_users().await.unwrap_err();
    assert!(err.is_validation(), "got: {err:?}");
}

#[tokio::test]
async fn test_basic_auth_is_sent() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users/john"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(john()))
        .expect(1)
        .mount(&server)
        .await;

    session
        .authenticate("admin", SecretString::from("secret"))
        .unwrap();
    let mut user = User::new(session);
    assert!(user.load_from_server("john").await.unwrap());
}

// ── Dashboards & schema validation ──────────────────────────────────

fn dashboard_docs() -> Value {
    json!({
        "apiVersion": "1.1.2",
        "resourcePath": "/dashboards",
        "models": {
            "CreateDashboardRequest": {
                "id": "CreateDashboardRequest",
                "required": ["title", "description"],
                "properties": {
                    "title": { "type": "string" },
                    "description": { "type": "string" }
                }
            }
        }
    })
}

#[tokio::test]
async fn test_dashboard_create_merges_created_id() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dashboards"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "dashboard_id": "d-42" })),
        )
        .mount(&server)
        .await;

    let mut dashboard = Dashboard::new(session);
    let created = dashboard
        .create(json!({ "title": "Ops", "description": "On-call overview" }))
        .await
        .unwrap();
    assert!(created);
    assert_eq!(dashboard.id(), Some("d-42"));
    assert_eq!(dashboard.get("title"), Some(&json!("Ops")));
}

#[tokio::test]
async fn test_dashboard_schema_is_fetched_once() {
    let server = MockServer::start().await;
    let session = Arc::new(
        Session::with_client(reqwest::Client::new(), Url::parse(&server.uri()).unwrap())
            .with_schema_validation(true),
    );

    Mock::given(method("GET"))
        .and(path("/api-docs/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_docs()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dashboards"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "dashboard_id": "d1" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut bad = Dashboard::new(Arc::clone(&session));
    let err = bad
        .create(json!({ "title": 7, "description": "numbers" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Schema { .. }), "got: {err:?}");

    let mut good = Dashboard::new(session);
    assert!(
        good.create(json!({ "title": "Ops", "description": "overview" }))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_dashboard_find_by_title() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "dashboards": [
                { "id": "d1", "title": "Ops", "description": "" },
                { "id": "d2", "title": "Security", "description": "" }
            ]
        })))
        .mount(&server)
        .await;

    let mut dashboard = Dashboard::new(session);
    assert_eq!(
        dashboard.find_by_title("Security").await.unwrap().as_deref(),
        Some("d2")
    );
}

// ── Backup ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_backup_one_and_all() {
    let (server, session) = setup().await;

    let listing = json!({ "dashboards": [{ "id": "d1", "title": "Ops" }], "total": 1 });
    Mock::given(method("GET"))
        .and(path("/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&listing))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboards/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboards/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut dashboard = Dashboard::new(session);
    assert_eq!(dashboard.backup_all().await.unwrap(), listing);
    assert_eq!(
        dashboard.backup("d1").await.unwrap(),
        Some(json!({ "id": "d1" }))
    );
    assert_eq!(dashboard.backup("gone").await.unwrap(), None);
    assert!(!dashboard.is_loaded());
}
