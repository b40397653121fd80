//! Integration tests for the backend client against an in-process mock server

#![cfg(feature = "client")]

use axum::extract::{Form, Multipart, Path, RawQuery};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use fmeca_review::analysis::{analyze, AdminStats};
use fmeca_review::api::{
    ApiClient, ApiConfig, ApiError, BlockingApiClient, NewUser, PasswordChange, ProfileUpdate,
    RegisterRequest, UploadKind, UserQuery, UserUpdate,
};
use fmeca_review::risk::{BandFilter, RiskBand};
use fmeca_review::session::{MemorySessionStore, SessionManager, SessionPolicy};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "tok-alice";

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some("Bearer tok-alice")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
        .into_response()
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    let user = form.get("username").map(String::as_str);
    let pass = form.get("password").map(String::as_str);
    if user == Some("alice") && pass == Some("secret") {
        Json(json!({ "access_token": TOKEN, "token_type": "bearer" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect username or password" })),
        )
            .into_response()
    }
}

async fn verify_token(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": "65a1",
        "username": "alice",
        "email": "alice@example.com",
        "full_name": "Alice",
        "disabled": false,
        "role": "admin",
        "created_at": "2024-01-22T10:00:00",
        "updated_at": "2024-01-22T10:00:00",
        "last_login": "2024-03-01T08:30:00.5"
    }))
    .into_response()
}

async fn boards(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        { "id": 1, "name": "Power Board", "has_fmeca": true, "has_coverage": true,
          "has_image": false, "has_fmeca_db": true, "has_coverage_db": true },
        { "id": 2, "name": "IO Board", "has_fmeca": true, "has_coverage": false,
          "has_image": false, "has_fmeca_db": false, "has_coverage_db": false }
    ]))
    .into_response()
}

async fn fmeca_data(Path(id): Path<u32>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match id {
        1 => Json(json!({
            "data": [
                { "ID": 1, "Component": "Capacitor", "Reference_Designator": "C1",
                  "RPN": 42, "ATM_Coverage": "Tested" },
                { "ID": 2, "Component": "Regulator", "Reference_Designator": "U3",
                  "RPN": 81.5, "ATM_Coverage": "Partially Tested" },
                { "ID": 3, "Component": "Fuse", "Reference_Designator": "F1",
                  "RPN": "n/a" }
            ],
            "count": 3,
            "message": format!("filter={}", body["filter_type"].as_str().unwrap_or("?")),
        }))
        .into_response(),
        2 => Json(json!({ "data": [], "error": "Failed to read FMECA sheet" })).into_response(),
        3 => Json(json!({ "data": "not a list" })).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Board not found" }))).into_response(),
    }
}

async fn atm_check(Path(_id): Path<u32>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "missing_components": [
            { "component": "U7", "atm_coverage": "Untested" },
            { "component": "Q2", "atm_coverage": null }
        ],
        "message": "Found 2 components in coverage report missing from FMECA"
    }))
    .into_response()
}

async fn upload(Path(id): Path<u32>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut file_type = None;
    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file_type") => file_type = field.text().await.ok(),
            Some("file") => {
                let name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                file = Some((name, bytes));
            }
            _ => {}
        }
    }

    match (file_type, file) {
        (Some(kind), Some((name, len))) => Json(json!({
            "message": format!("{kind} file {} uploaded", name.unwrap_or_default()),
            "record_count": len,
            "version": 2,
            "board_id": id,
            "board_name": "Power Board"
        }))
        .into_response(),
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "msg": "field required" }] })),
        )
            .into_response(),
    }
}

async fn roles(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "roles": ["admin", "user"] })).into_response()
}

fn user_json(username: &str, role: &str, disabled: bool, email: Option<&str>, full_name: Option<&str>) -> Value {
    json!({
        "id": format!("id-{username}"),
        "username": username,
        "email": email,
        "full_name": full_name,
        "disabled": disabled,
        "role": role,
        "created_at": "2024-01-22T10:00:00",
        "updated_at": "2024-01-22T10:00:00",
        "last_login": null
    })
}

fn message(text: String) -> Response {
    Json(json!({ "message": text })).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    if username == "alice" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Username already registered" })),
        )
            .into_response();
    }
    Json(user_json(
        username,
        "user",
        false,
        body["email"].as_str(),
        body["full_name"].as_str(),
    ))
    .into_response()
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["current_password"] != "secret" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Incorrect current password" })),
        )
            .into_response();
    }
    message("Password changed successfully".to_string())
}

async fn update_profile(
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(user_json(
        &username,
        "user",
        false,
        body["email"].as_str(),
        body["full_name"].as_str(),
    ))
    .into_response()
}

async fn board_files(Path(id): Path<u32>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "board_id": id,
        "board_name": "Power Board",
        "fmeca_exists": true,
        "coverage_exists": false,
        "image_exists": true,
        "fmeca_db_exists": true,
        "coverage_db_exists": false
    }))
    .into_response()
}

async fn db_status(Path(id): Path<u32>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "board_id": id,
        "board_name": "Power Board",
        "fmeca_in_db": true,
        "coverage_in_db": false,
        "fmeca_info": {
            "upload_date": "2024-03-01T08:30:00",
            "uploaded_by": "alice",
            "version": 4,
            "record_count": 120
        },
        "coverage_info": null
    }))
    .into_response()
}

/// Echoes the raw query string back in the second user's full name.
async fn list_users(headers: HeaderMap, RawQuery(query): RawQuery) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        user_json("alice", "admin", false, Some("alice@example.com"), None),
        user_json("bob", "user", false, None, query.as_deref()),
    ]))
    .into_response()
}

async fn get_user(Path(username): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if username == "ghost" {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "User not found" }))).into_response();
    }
    Json(user_json(&username, "user", false, None, None)).into_response()
}

async fn create_user(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::CREATED,
        Json(user_json(
            body["username"].as_str().unwrap_or_default(),
            body["role"].as_str().unwrap_or("user"),
            body["disabled"].as_bool().unwrap_or(false),
            body["email"].as_str(),
            body["full_name"].as_str(),
        )),
    )
        .into_response()
}

/// Reports the keys it received in the full name.
async fn update_user(
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let keys: Vec<&str> = body
        .as_object()
        .map(|o| o.keys().map(String::as_str).collect())
        .unwrap_or_default();
    Json(user_json(
        &username,
        body["role"].as_str().unwrap_or("user"),
        body["disabled"].as_bool().unwrap_or(false),
        body["email"].as_str(),
        Some(keys.join(",").as_str()),
    ))
    .into_response()
}

async fn delete_user(Path(username): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    message(format!("User {username} deleted"))
}

async fn enable_user(Path(username): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    message(format!("User {username} enabled"))
}

async fn disable_user(Path(username): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    message(format!("User {username} disabled"))
}

/// Start the mock backend on a random port and return its base URL.
async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/", get(|| async { Json(json!({ "message": "FMECA-HWATM API" })) }))
        .route("/token", post(token))
        .route("/verify-token", get(verify_token))
        .route("/boards", get(boards))
        .route("/fmeca-data/:id", post(fmeca_data))
        .route("/atm-check/:id", get(atm_check))
        .route("/upload/board/:id/excel-to-db", post(upload))
        .route("/register", post(register))
        .route("/change-password", post(change_password))
        .route("/users/:username", put(update_profile))
        .route("/board/:id/files", get(board_files))
        .route("/board/:id/db-status", get(db_status))
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:username",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/admin/users/:username/enable", put(enable_user))
        .route("/admin/users/:username/disable", put(disable_user))
        .route("/admin/roles", get(roles));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock backend failed");
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(ApiConfig::new(base_url, Duration::from_secs(5))).expect("Failed to build client")
}

#[tokio::test]
async fn test_login_and_verify() {
    let base = spawn_backend().await;
    let anon = client(&base);

    assert!(anon.test_connection().await.unwrap());

    let token = anon.login("alice", "secret").await.expect("login failed");
    assert_eq!(token.access_token, TOKEN);
    assert_eq!(token.token_type, "bearer");

    let user = client(&base).with_token(token.access_token).verify_token().await.unwrap();
    assert_eq!(user.username, "alice");
    assert!(user.is_admin());
    assert!(user.last_login.is_some());
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let base = spawn_backend().await;

    let err = client(&base).login("alice", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Not authorized: Incorrect username or password");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let base = spawn_backend().await;

    let err = client(&base).boards().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[tokio::test]
async fn test_boards() {
    let base = spawn_backend().await;
    let boards = client(&base).with_token(TOKEN).boards().await.unwrap();

    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0].name, "Power Board");
    assert!(boards[1].has_fmeca && !boards[1].has_coverage);
}

#[tokio::test]
async fn test_fmeca_data_sends_filter_and_classifies() {
    let base = spawn_backend().await;
    let api = client(&base).with_token(TOKEN);

    let response = api.fmeca_data(1, BandFilter::Orange).await.unwrap();
    assert_eq!(response.message.as_deref(), Some("filter=orange"));
    assert_eq!(response.count, 3);

    let rows = analyze(response.data);
    assert_eq!(rows[0].row.reference_designator, "U3");
    assert_eq!(rows[0].band, RiskBand::Red);
    assert_eq!(rows[1].band, RiskBand::Green);
    assert_eq!(rows[2].rpn_value, None);
    assert_eq!(rows[2].coverage_display, "✗ Not Found");
}

#[tokio::test]
async fn test_fmeca_error_field_is_backend_error() {
    let base = spawn_backend().await;
    let err = client(&base)
        .with_token(TOKEN)
        .fmeca_data(2, BandFilter::All)
        .await
        .unwrap_err();

    match err {
        ApiError::Backend(msg) => assert_eq!(msg, "Failed to read FMECA sheet"),
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_shape_is_serialization_error() {
    let base = spawn_backend().await;
    let err = client(&base)
        .with_token(TOKEN)
        .fmeca_data(3, BandFilter::All)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Serialization(_)));
}

#[tokio::test]
async fn test_not_found_carries_detail() {
    let base = spawn_backend().await;
    let err = client(&base)
        .with_token(TOKEN)
        .fmeca_data(99, BandFilter::All)
        .await
        .unwrap_err();

    match err {
        ApiError::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Board not found");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_atm_check() {
    let base = spawn_backend().await;
    let report = client(&base).with_token(TOKEN).atm_check(1).await.unwrap();

    assert_eq!(report.missing_components.len(), 2);
    assert_eq!(report.missing_components[1].atm_coverage, None);
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension_before_sending() {
    // Nothing listens here; the request must never be made.
    let api = client("http://127.0.0.1:9").with_token(TOKEN);
    let err = api
        .upload(1, UploadKind::Fmeca, std::path::Path::new("board.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidUpload(_)));
}

#[tokio::test]
async fn test_upload_sends_multipart() {
    let base = spawn_backend().await;

    let mut file = tempfile::Builder::new()
        .suffix(".xlsx")
        .tempfile()
        .unwrap();
    file.write_all(b"PK\x03\x04 fake workbook").unwrap();

    let receipt = client(&base)
        .with_token(TOKEN)
        .upload(1, UploadKind::Coverage, file.path())
        .await
        .unwrap();

    assert!(receipt.message.starts_with("coverage file "));
    assert!(receipt.message.ends_with(".xlsx uploaded"));
    assert_eq!(receipt.record_count, Some(18));
    assert_eq!(receipt.version, Some(2));
}

#[tokio::test]
async fn test_unauthorized_ends_session() {
    let base = spawn_backend().await;
    let manager = SessionManager::new(Arc::new(MemorySessionStore::new()), SessionPolicy::default());
    manager.login("stale-token", "alice").unwrap();

    let api = client(&base).with_token(manager.token().unwrap());
    let err = manager.guard(api.roles().await).unwrap_err();

    assert!(err.is_unauthorized());
    assert!(manager.current().is_none());
    assert!(manager.token().is_none());
}

#[tokio::test]
async fn test_other_errors_keep_session() {
    let base = spawn_backend().await;
    let manager = SessionManager::new(Arc::new(MemorySessionStore::new()), SessionPolicy::default());
    manager.login(TOKEN, "alice").unwrap();

    let api = client(&base).with_token(manager.token().unwrap());
    let result = manager.guard(api.fmeca_data(99, BandFilter::All).await);

    assert!(matches!(result, Err(ApiError::Server { status: 404, .. })));
    assert_eq!(manager.token().as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn test_register() {
    let base = spawn_backend().await;
    let anon = client(&base);

    let user = anon
        .register(&RegisterRequest {
            username: "dave".to_string(),
            password: "pw".to_string(),
            email: Some("dave@example.com".to_string()),
            full_name: None,
        })
        .await
        .unwrap();
    assert_eq!(user.username, "dave");
    assert_eq!(user.email.as_deref(), Some("dave@example.com"));
    assert_eq!(user.role, "user");

    let err = anon
        .register(&RegisterRequest {
            username: "alice".to_string(),
            password: "pw".to_string(),
            email: None,
            full_name: None,
        })
        .await
        .unwrap_err();
    match err {
        ApiError::Server { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Username already registered");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_change_password() {
    let base = spawn_backend().await;
    let api = client(&base).with_token(TOKEN);

    let response = api
        .change_password(&PasswordChange {
            current_password: "secret".to_string(),
            new_password: "better".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.message, "Password changed successfully");

    let err = api
        .change_password(&PasswordChange {
            current_password: "guess".to_string(),
            new_password: "better".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 400, .. }));
}

#[tokio::test]
async fn test_update_profile_encodes_username() {
    let base = spawn_backend().await;
    let user = client(&base)
        .with_token(TOKEN)
        .update_profile(
            "j doe/x",
            &ProfileUpdate {
                email: Some("jd@example.com".to_string()),
                full_name: Some("J Doe".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(user.username, "j doe/x");
    assert_eq!(user.email.as_deref(), Some("jd@example.com"));
    assert_eq!(user.full_name.as_deref(), Some("J Doe"));
}

#[tokio::test]
async fn test_board_files_and_db_status() {
    let base = spawn_backend().await;
    let api = client(&base).with_token(TOKEN);

    let files = api.board_files(5).await.unwrap();
    assert_eq!(files.board_id, 5);
    assert!(files.fmeca_exists && !files.coverage_exists && files.image_exists);

    let status = api.db_status(5).await.unwrap();
    assert!(status.fmeca_in_db && !status.coverage_in_db);
    let info = status.fmeca_info.unwrap();
    assert_eq!(info.version, Some(4));
    assert_eq!(info.record_count, Some(120));
    assert_eq!(info.uploaded_by.as_deref(), Some("alice"));
    assert!(status.coverage_info.is_none());
}

#[tokio::test]
async fn test_list_users_query_encoding() {
    let base = spawn_backend().await;
    let api = client(&base).with_token(TOKEN);

    let users = api
        .list_users(&UserQuery {
            skip: 5,
            limit: 20,
            search: Some("al ice".to_string()),
            role: Some("admin".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(
        users[1].full_name.as_deref(),
        Some("skip=5&limit=20&search=al+ice&role=admin")
    );

    let users = api.list_users(&UserQuery::default()).await.unwrap();
    assert_eq!(users[1].full_name.as_deref(), Some("skip=0&limit=100"));
}

#[tokio::test]
async fn test_admin_user_lifecycle() {
    let base = spawn_backend().await;
    let api = client(&base).with_token(TOKEN);

    let created = api
        .create_user(&NewUser {
            username: "erin".to_string(),
            password: "pw".to_string(),
            email: None,
            full_name: Some("Erin".to_string()),
            role: "admin".to_string(),
            disabled: true,
        })
        .await
        .unwrap();
    assert_eq!(created.username, "erin");
    assert!(created.is_admin());
    assert!(created.disabled);

    assert_eq!(api.get_user("erin").await.unwrap().username, "erin");

    let updated = api
        .update_user(
            "erin",
            &UserUpdate {
                role: Some("user".to_string()),
                disabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("disabled,role"));
    assert!(!updated.is_admin());

    assert_eq!(api.enable_user("erin").await.unwrap().message, "User erin enabled");
    assert_eq!(api.disable_user("erin").await.unwrap().message, "User erin disabled");
    assert_eq!(api.delete_user("erin").await.unwrap().message, "User erin deleted");

    let err = api.get_user("ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 404, .. }));
}

#[tokio::test]
async fn test_admin_stats_from_backend() {
    let base = spawn_backend().await;
    let api = client(&base).with_token(TOKEN);

    let users = api.list_users(&UserQuery::default()).await.unwrap();
    let boards = api.boards().await.unwrap();
    let stats = AdminStats::from_catalog(&users, &boards);

    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.admin_users, 1);
    assert_eq!(stats.regular_users, 1);
    assert_eq!(stats.total_boards, 2);
    assert_eq!(stats.boards_with_db_data, 1);
    assert_eq!(stats.fmeca_in_db, 1);
    assert_eq!(stats.coverage_in_db, 1);
}

#[test]
fn test_blocking_client() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let base = runtime.block_on(spawn_backend());

    let anon = BlockingApiClient::new(ApiConfig::new(base.as_str(), Duration::from_secs(5))).unwrap();
    let token = anon.login("alice", "secret").unwrap();

    let api = BlockingApiClient::new(ApiConfig::new(base.as_str(), Duration::from_secs(5)))
        .unwrap()
        .with_token(token.access_token);
    assert_eq!(api.roles().unwrap(), vec!["admin", "user"]);
}
