use axum::{
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mock_server::{app, ADMIN_PASSWORD, ADMIN_USERNAME, DATA_SOURCE};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

/// Log in as the admin on `app` and return the issued token.
async fn login(app: &Router) -> String {
    let body = format!("username={ADMIN_USERNAME}&password={ADMIN_PASSWORD}");
    let resp = app
        .clone()
        .oneshot(form_request("/api/tokens", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["authToken"].as_str().unwrap().to_string()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(get_request(uri)).await.unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

// --- tokens ---

#[tokio::test]
async fn token_issued_for_valid_credentials() {
    let app = app();
    let body = format!("username={ADMIN_USERNAME}&password={ADMIN_PASSWORD}");
    let resp = app.oneshot(form_request("/api/tokens", &body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["dataSource"], DATA_SOURCE);
    assert_eq!(json["username"], ADMIN_USERNAME);
    assert_eq!(json["authToken"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn token_rejected_for_bad_password() {
    let app = app();
    let resp = app
        .oneshot(form_request("/api/tokens", "username=guacadmin&password=wrong"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let json = body_json(resp).await;
    assert_eq!(json["type"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn token_request_without_form_fields_is_rejected() {
    let app = app();
    let resp = app
        .oneshot(form_request("/api/tokens", "username=guacadmin"))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
    assert!(!body_bytes(resp).await.is_empty());
}

// --- session guard ---

#[tokio::test]
async fn data_endpoints_require_a_known_token() {
    let app = app();
    let (status, json) = get_json(&app, "/api/session/data/postgresql/users?token=BOGUS").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["type"], "PERMISSION_DENIED");

    let (status, _) = get_json(&app, "/api/session/data/postgresql/users").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_data_source_is_not_found() {
    let app = app();
    let token = login(&app).await;
    let (status, _) = get_json(&app, &format!("/api/session/data/mysql/users?token={token}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- connection groups ---

#[tokio::test]
async fn root_tree_has_connections_and_groups() {
    let app = app();
    let token = login(&app).await;
    let (status, tree) = get_json(
        &app,
        &format!("/api/session/data/postgresql/connectionGroups/ROOT/tree?token={token}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree["childConnections"].as_array().unwrap().len(), 2);
    assert_eq!(tree["childConnectionGroups"][0]["name"], "Lab");
}

#[tokio::test]
async fn subgroup_tree_by_identifier() {
    let app = app();
    let token = login(&app).await;
    let (status, tree) = get_json(
        &app,
        &format!("/api/session/data/postgresql/connectionGroups/42/tree?token={token}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree["name"], "Lab");
    assert_eq!(tree["childConnections"][0]["name"], "lab-vnc");
}

#[tokio::test]
async fn unknown_group_tree_is_not_found() {
    let app = app();
    let token = login(&app).await;
    let (status, _) = get_json(
        &app,
        &format!("/api/session/data/postgresql/connectionGroups/999/tree?token={token}"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_listing_is_keyed_by_identifier() {
    let app = app();
    let token = login(&app).await;
    let (status, groups) = get_json(
        &app,
        &format!("/api/session/data/postgresql/connectionGroups/?token={token}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let groups = groups.as_object().unwrap();
    assert_eq!(groups["42"]["name"], "Lab");
    assert!(groups["ROOT"].get("childConnections").is_none());
}

// --- users ---

#[tokio::test]
async fn users_keyed_by_username() {
    let app = app();
    let token = login(&app).await;
    let (status, users) =
        get_json(&app, &format!("/api/session/data/postgresql/users?token={token}")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = users.as_object().unwrap().keys().cloned().collect();
    assert_eq!(names, ["guacadmin", "alice", "bob"]);
}

// --- connection parameters ---

#[tokio::test]
async fn connection_parameters_found() {
    let app = app();
    let token = login(&app).await;
    let (status, params) = get_json(
        &app,
        &format!("/api/session/data/postgresql/connections/2/parameters?token={token}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(params["port"], "3389");
}

#[tokio::test]
async fn connection_parameters_not_found() {
    let app = app();
    let token = login(&app).await;
    let (status, json) = get_json(
        &app,
        &format!("/api/session/data/postgresql/connections/77/parameters?token={token}"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["type"], "NOT_FOUND");
}
