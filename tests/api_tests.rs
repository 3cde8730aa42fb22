//! Integration tests for the HTTP API.
//!
//! Every test boots the full router over a throwaway database, so the seed
//! migration provides the bootstrap admin account, the baseline roles and
//! the baseline permissions.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use portcullis::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
const TEST_PASSWORD: &str = "sup3rsecret";

async fn spawn_app() -> Router {
    let db_path =
        std::env::temp_dir().join(format!("portcullis-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.auth.jwt_secret = TEST_SECRET.to_string();

    let state = portcullis::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    portcullis::api::router(state).await
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", mime::APPLICATION_JSON.as_ref())
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send_raw(app, method, uri, bearer, body).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Log in and return the access token plus the raw `set-cookie` header.
async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let response = send_raw(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login must set the refresh cookie")
        .to_str()
        .unwrap()
        .to_string();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let access = body["data"]["access_token"].as_str().unwrap().to_string();

    (access, set_cookie)
}

async fn admin_token(app: &Router) -> String {
    login(app, "admin", "changeme").await.0
}

/// Register an account through the public endpoint and return its DTO.
async fn register(app: &Router, username: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

/// First `name=value` pair of a `set-cookie` header.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let response = send_raw(&app, "GET", "/api/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["success"].as_bool().unwrap_or(false));
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["data"]["version"].is_string());
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let app = spawn_app().await;

    let alice = register(&app, "alice", "alice@example.com").await;
    assert_eq!(alice["username"], "alice");
    assert_eq!(alice["email"], "alice@example.com");
    assert_eq!(alice["active"], true);
    assert!(alice.get("password_hash").is_none());

    // Username and email are each reserved, soft-deleted holders included.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "alice", "email": "other@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already registered");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "alice2", "email": "alice@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    let (access, set_cookie) = login(&app, "alice", TEST_PASSWORD).await;
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/api/auth"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "bob", "email": "bob@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "bob", "email": "not-an-email", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "x", "email": "bob@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_assigns_default_role() {
    let app = spawn_app().await;

    let alice = register(&app, "alice", "alice@example.com").await;
    let alice_id = alice["id"].as_str().unwrap().to_string();

    let (access, _) = login(&app, "alice", TEST_PASSWORD).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/users/{alice_id}/roles"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|role| role["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["user"]);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = spawn_app().await;

    register(&app, "alice", "alice@example.com").await;

    let (status, wrong_password) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "not-the-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "not-the-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same message for both, so responses do not leak which usernames exist.
    assert_eq!(wrong_password["error"], unknown_user["error"]);

    // A correct password against a deactivated account is a 403, not a 401.
    let admin = admin_token(&app).await;
    let carol = register(&app, "carol", "carol@example.com").await;
    let id = carol["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(&admin),
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "carol", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "User is inactive");
}

#[tokio::test]
async fn test_token_type_and_expiry_errors() {
    let app = spawn_app().await;

    let (status, _) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    // A refresh token presented as a bearer token is well-formed and
    // correctly signed, and still rejected.
    register(&app, "alice", "alice@example.com").await;
    let (_, set_cookie) = login(&app, "alice", TEST_PASSWORD).await;
    let refresh_token = cookie_pair(&set_cookie)
        .split_once('=')
        .map(|(_, value)| value.to_string())
        .unwrap();

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&refresh_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Wrong token type");

    // Mint an already-expired access token with the same secret.
    let bob = register(&app, "bob", "bob@example.com").await;
    let user_id = uuid::Uuid::parse_str(bob["id"].as_str().unwrap()).unwrap();

    use portcullis::services::{JwtTokenService, TokenService};
    let mut config = Config::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    let tokens = JwtTokenService::new(&config.auth);
    let expired = tokens
        .create_access_token(user_id, Some(chrono::Duration::minutes(-5)))
        .unwrap();

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has expired");
}

#[tokio::test]
async fn test_refresh_rotation_and_logout() {
    let app = spawn_app().await;

    register(&app, "alice", "alice@example.com").await;
    let (_, set_cookie) = login(&app, "alice", TEST_PASSWORD).await;
    let old_pair = cookie_pair(&set_cookie);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/refresh")
                .header("Cookie", old_pair.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rotated = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("refresh must rotate the cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert_ne!(cookie_pair(&rotated), old_pair);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    // No cookie, no refresh.
    let (status, _) = send(&app, "POST", "/api/auth/refresh", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = send_raw(&app, "POST", "/api/auth/logout", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("logout must clear the cookie")
        .to_str()
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_user_crud_and_soft_delete() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({ "username": "bob", "email": "bob@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let bob_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{bob_id}"),
        Some(&admin),
        Some(json!({ "full_name": "Bob Builder" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["full_name"], "Bob Builder");

    // Updating into another account's email is a conflict.
    register(&app, "alice", "alice@example.com").await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{bob_id}"),
        Some(&admin),
        Some(json!({ "email": "alice@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{bob_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Direct fetch still resolves the row; listings hide it.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/users/{bob_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["deleted_at"].is_string());

    let (status, body) = send(&app, "GET", "/api/users?size=50", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let usernames: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["username"].as_str().unwrap())
        .collect();
    assert!(!usernames.contains(&"bob"));

    // The second delete finds nothing left to mark.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{bob_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The username stays reserved by the soft-deleted row.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "bob", "email": "bob2@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Credentials of a soft-deleted account no longer authenticate.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "bob", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_pagination_search_and_order() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    for (name, email) in [
        ("carol", "carol@example.com"),
        ("dave", "dave@example.com"),
        ("erin", "erin@example.com"),
    ] {
        register(&app, name, email).await;
    }

    // Four users total: the seeded admin plus the three above.
    let (status, body) = send(&app, "GET", "/api/users?page=1&size=2", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["pages"], 2);
    assert_eq!(body["data"]["items"][0]["username"], "admin");

    let (status, body) = send(&app, "GET", "/api/users?page=2&size=2", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["username"], "dave");

    let (status, body) = send(&app, "GET", "/api/users?search=carol", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["username"], "carol");

    let (status, body) = send(
        &app,
        "GET",
        "/api/users?order_by=username&order=desc",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["username"], "erin");

    let (status, body) = send(
        &app,
        "GET",
        "/api/users?order_by=password_hash",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Cannot order by unknown field")
    );

    let (status, _) = send(&app, "GET", "/api/users?order=sideways", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/users?size=0", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/users?size=101", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_role_crud_and_grant_sync() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&admin),
        Some(json!({ "name": "auditor", "description": "Read-only reviewer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&admin),
        Some(json!({ "name": "auditor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Seeded permissions: users:read, users:write, roles:read, roles:write.
    let (status, body) = send(&app, "GET", "/api/permissions?size=50", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap().clone();
    assert!(items.len() >= 4);

    let id_of = |resource: &str, action: &str| {
        items
            .iter()
            .find(|p| p["resource"] == resource && p["action"] == action)
            .and_then(|p| p["id"].as_str())
            .unwrap()
            .to_string()
    };
    let users_read = id_of("users", "read");
    let roles_read = id_of("roles", "read");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/roles/{role_id}/permissions"),
        Some(&admin),
        Some(json!({ "permission_ids": [users_read, roles_read] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let granted: Vec<(String, String)> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            (
                p["resource"].as_str().unwrap().to_string(),
                p["action"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        granted,
        vec![
            ("roles".to_string(), "read".to_string()),
            ("users".to_string(), "read".to_string()),
        ]
    );

    // Syncing to the same set changes nothing and reports the same set.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/roles/{role_id}/permissions"),
        Some(&admin),
        Some(json!({ "permission_ids": [users_read, roles_read] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Shrinking the desired set removes only the difference.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/roles/{role_id}/permissions"),
        Some(&admin),
        Some(json!({ "permission_ids": [users_read] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["resource"], "users");

    // An unknown id fails the whole call before anything is written.
    let bogus = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/roles/{role_id}/permissions"),
        Some(&admin),
        Some(json!({ "permission_ids": [roles_read, bogus] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&bogus.to_string()));

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/roles/{role_id}/permissions"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["resource"], "users");

    // A missing role 404s for both sync and read.
    let missing_role = uuid::Uuid::new_v4();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/roles/{missing_role}/permissions"),
        Some(&admin),
        Some(json!({ "permission_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/roles/{missing_role}/permissions"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_role_sync() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&admin),
        Some(json!({ "name": "staff" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let staff_id = body["data"]["id"].as_str().unwrap().to_string();

    let frank = register(&app, "frank", "frank@example.com").await;
    let frank_id = frank["id"].as_str().unwrap().to_string();

    // Registration granted the default role; replace it entirely.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{frank_id}/roles"),
        Some(&admin),
        Some(json!({ "role_ids": [staff_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|role| role["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["staff"]);

    // Unknown role id: nothing changes, the id is named in the error.
    let bogus = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{frank_id}/roles"),
        Some(&admin),
        Some(json!({ "role_ids": [staff_id, bogus] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&bogus.to_string()));

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/users/{frank_id}/roles"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // An empty desired set clears the membership.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{frank_id}/roles"),
        Some(&admin),
        Some(json!({ "role_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let missing_user = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{missing_user}/roles"),
        Some(&admin),
        Some(json!({ "role_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_role_hard_delete_cascades() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&admin),
        Some(json!({ "name": "temp" })),
    )
    .await;
    let role_id = body["data"]["id"].as_str().unwrap().to_string();

    let frank = register(&app, "frank", "frank@example.com").await;
    let frank_id = frank["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{frank_id}/roles"),
        Some(&admin),
        Some(json!({ "role_ids": [role_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/roles/{role_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/roles/{role_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The membership rows went with the role.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/users/{frank_id}/roles"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_permission_crud() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/permissions",
        Some(&admin),
        Some(json!({ "resource": "reports", "action": "read" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/permissions",
        Some(&admin),
        Some(json!({ "resource": "reports", "action": "read" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/permissions/{id}"),
        Some(&admin),
        Some(json!({ "description": "Read the reporting dashboards" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Read the reporting dashboards");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/permissions/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/permissions/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_requires_auth() {
    let app = spawn_app().await;

    let (status, _) = send(&app, "GET", "/api/metrics", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = admin_token(&app).await;
    let response = send_raw(&app, "GET", "/api/metrics", Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
