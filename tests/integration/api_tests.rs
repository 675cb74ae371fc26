//! API integration tests
//!
//! These run against a live server with a superadmin account, e.g. the
//! bootstrap account from config/default.toml. Credentials come from
//! SIYANMAT_TEST_LOGIN / SIYANMAT_TEST_PASSWORD.

use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const UPLOADS_URL: &str = "http://localhost:8080/uploads";

// Smallest valid PNG: one transparent pixel
const PIXEL_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

fn credentials() -> (String, String) {
    (
        std::env::var("SIYANMAT_TEST_LOGIN").unwrap_or_else(|_| "superadmin".to_string()),
        std::env::var("SIYANMAT_TEST_PASSWORD").unwrap_or_else(|_| "change-me-now".to_string()),
    )
}

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let (login, password) = credentials();
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn login(client: &Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Create an account with the given role; returns its id and a token for it
async fn create_user_with_role(client: &Client, token: &str, role: &str) -> (i64, String) {
    let username = unique(role);
    let password = "member-pass-1";
    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "name": "Member",
            "password": password,
            "confirmPassword": password,
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(user["role"], role);
    let id = user["id"].as_i64().expect("user id");
    (id, login(client, &username, password).await)
}

async fn set_role(client: &Client, token: &str, id: i64, role: &str) -> StatusCode {
    client
        .put(format!("{}/users/{}/role", BASE_URL, id))
        .bearer_auth(token)
        .json(&json!({ "role": role }))
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

async fn create_tool_as(client: &Client, token: &str, code: &str) -> StatusCode {
    let form = multipart::Form::new()
        .text("toolCode", code.to_string())
        .text("name", "Genset")
        .text("brand", "Yamaha")
        .text("maxHourUsage", "100")
        .text("condition", "B");
    client
        .post(format!("{}/tools", BASE_URL))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

/// Codes unique per run so tests can be repeated against the same database
fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

async fn create_tool(client: &Client, token: &str, code: &str, max_hours: i32) -> Value {
    let form = multipart::Form::new()
        .text("toolCode", code.to_string())
        .text("name", format!("Tool {}", code))
        .text("brand", "Komatsu")
        .text("maxHourUsage", max_hours.to_string())
        .text("condition", "B");

    let response = client
        .post(format!("{}/tools", BASE_URL))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn get_tool(client: &Client, token: &str, code: &str) -> Value {
    client
        .get(format!("{}/tools/{}", BASE_URL, code))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

async fn delete(client: &Client, token: &str, path: &str) -> StatusCode {
    client
        .delete(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();
    let (login, password) = credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": login, "password": password }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["role"], "superadmin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (login, _) = credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": login, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_tools_require_authentication() {
    let client = Client::new();

    let response = client
        .get(format!("{}/tools", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
#[ignore]
async fn test_tool_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = unique("EXC");

    let created = create_tool(&client, &token, &code, 2000).await;
    assert_eq!(created["toolCode"], code.as_str());
    assert_eq!(created["remainingHours"], 2000);
    assert_eq!(created["overAllocated"], false);

    // Duplicate code
    let form = multipart::Form::new()
        .text("toolCode", code.clone())
        .text("name", "Other")
        .text("brand", "Other")
        .text("maxHourUsage", "10")
        .text("condition", "RR");
    let response = client
        .post(format!("{}/tools", BASE_URL))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .put(format!("{}/tools/{}", BASE_URL, code))
        .bearer_auth(&token)
        .json(&json!({ "condition": "RB", "maxHourUsage": 1500 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["condition"], "RB");
    assert_eq!(updated["remainingHours"], 1500);

    let response = client
        .get(format!("{}/tools?search={}", BASE_URL, code.to_lowercase()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let page: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["toolCode"], code.as_str());

    assert_eq!(delete(&client, &token, &format!("/tools/{}", code)).await, StatusCode::NO_CONTENT);
    assert_eq!(delete(&client, &token, &format!("/tools/{}", code)).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_create_tool_missing_code() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let form = multipart::Form::new()
        .text("name", "Nameless")
        .text("brand", "Nobody")
        .text("maxHourUsage", "100")
        .text("condition", "B");
    let response = client
        .post(format!("{}/tools", BASE_URL))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Missing fields: toolCode");
}

#[tokio::test]
#[ignore]
async fn test_activity_charges_every_linked_tool() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (a, b, c) = (unique("A"), unique("B"), unique("C"));
    for code in [&a, &b, &c] {
        create_tool(&client, &token, code, 2000).await;
    }
    let activity = unique("KEG");

    let response = client
        .post(format!("{}/activities", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "activityCode": activity,
            "name": "Pemadatan jalan",
            "description": "Ruas utara",
            "date": "2024-03-15",
            "operatorName": "Budi",
            "toolCode": format!("{},{}", a, b),
            "toolUsage": 25
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(created["tools"].as_array().map(Vec::len), Some(2));

    assert_eq!(get_tool(&client, &token, &a).await["remainingHours"], 1975);
    assert_eq!(get_tool(&client, &token, &b).await["remainingHours"], 1975);
    assert_eq!(get_tool(&client, &token, &c).await["remainingHours"], 2000);

    // Relink {A, B} -> {B, C}
    let response = client
        .put(format!("{}/activities/{}", BASE_URL, activity))
        .bearer_auth(&token)
        .json(&json!({ "toolCode": format!("{},{}", b, c) }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    assert_eq!(get_tool(&client, &token, &a).await["remainingHours"], 2000);
    assert_eq!(get_tool(&client, &token, &b).await["remainingHours"], 1975);
    let detail = get_tool(&client, &token, &c).await;
    assert_eq!(detail["remainingHours"], 1975);
    assert_eq!(detail["activities"][0]["activityCode"], activity.as_str());

    let response = client
        .get(format!("{}/activities?toolCode={}", BASE_URL, c))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let page: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(page["total"], 1);

    assert_eq!(
        delete(&client, &token, &format!("/activities/{}", activity)).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(get_tool(&client, &token, &b).await["remainingHours"], 2000);

    for code in [&a, &b, &c] {
        delete(&client, &token, &format!("/tools/{}", code)).await;
    }
}

#[tokio::test]
#[ignore]
async fn test_activity_with_unknown_tool() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let missing = unique("NOPE");

    let response = client
        .post(format!("{}/activities", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "activityCode": unique("KEG"),
            "name": "Ghost work",
            "date": "2024-03-15",
            "operatorName": "Budi",
            "toolCode": missing,
            "toolUsage": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], format!("Tool(s) not found: {}", missing));
}

#[tokio::test]
#[ignore]
async fn test_exports() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/exports/activities/html", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "startDate": "2024-01-01",
            "endDate": "2024-12-31",
            "signerName": "Sutrisno",
            "signerId": "19700101"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let html = response.text().await.expect("Failed to read body");
    assert!(html.contains("Sutrisno"));

    let response = client
        .post(format!("{}/exports/xlsx", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "kind": "tools" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("data-peralatan.xlsx"));
    let bytes = response.bytes().await.expect("Failed to read body");
    // XLSX is a zip archive
    assert_eq!(&bytes[..2], b"PK");

    let response = client
        .post(format!("{}/exports/xlsx", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "kind": "activities" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_user_roles() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let username = unique("viewer");

    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "name": "Viewer",
            "password": "viewer-pass-1",
            "confirmPassword": "viewer-pass-1"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(user["role"], "viewer");
    let id = user["id"].as_i64().expect("user id");

    let response = client
        .put(format!("{}/users/{}/role", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .expect("Failed to send request");
    let promoted: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(promoted["role"], "admin");

    assert_eq!(delete(&client, &token, &format!("/users/{}", id)).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_tool_image_is_served_until_tool_is_deleted() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = unique("IMG");

    let image = multipart::Part::bytes(PIXEL_PNG.to_vec())
        .file_name("tool.png")
        .mime_str("image/png")
        .expect("valid mime");
    let form = multipart::Form::new()
        .text("toolCode", code.clone())
        .text("name", "Excavator")
        .text("brand", "Komatsu")
        .text("maxHourUsage", "2000")
        .text("condition", "B")
        .part("image", image);
    let response = client
        .post(format!("{}/tools", BASE_URL))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.expect("Failed to parse response");
    let path = created["image"].as_str().expect("stored image path").to_string();
    assert!(path.starts_with("tools/"));
    assert!(path.ends_with(".png"));

    let response = client
        .get(format!("{}/{}", UPLOADS_URL, path))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(response.bytes().await.expect("Failed to read body").as_ref(), &PIXEL_PNG[..]);

    assert_eq!(delete(&client, &token, &format!("/tools/{}", code)).await, StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/{}", UPLOADS_URL, path))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_role_changes_apply_to_issued_tokens() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (id, member_token) = create_user_with_role(&client, &token, "admin").await;

    let code = unique("ROLE");
    assert_eq!(create_tool_as(&client, &member_token, &code).await, StatusCode::CREATED);

    // Same token, account demoted afterwards
    assert_eq!(set_role(&client, &token, id, "viewer").await, StatusCode::OK);
    assert_eq!(create_tool_as(&client, &member_token, &unique("ROLE")).await, StatusCode::FORBIDDEN);
    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&member_token)
        .send()
        .await
        .expect("Failed to send request");
    let me: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(me["role"], "viewer");

    // Same token, account deleted afterwards
    assert_eq!(delete(&client, &token, &format!("/users/{}", id)).await, StatusCode::NO_CONTENT);
    let response = client
        .get(format!("{}/tools", BASE_URL))
        .bearer_auth(&member_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    delete(&client, &token, &format!("/tools/{}", code)).await;
}

#[tokio::test]
#[ignore]
async fn test_viewer_and_admin_limits() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = unique("LIM");
    create_tool(&client, &token, &code, 100).await;

    let (viewer_id, viewer_token) = create_user_with_role(&client, &token, "viewer").await;
    assert_eq!(
        delete(&client, &viewer_token, &format!("/tools/{}", code)).await,
        StatusCode::FORBIDDEN
    );

    let (admin_id, admin_token) = create_user_with_role(&client, &token, "admin").await;
    assert_eq!(set_role(&client, &admin_token, viewer_id, "admin").await, StatusCode::FORBIDDEN);

    for id in [viewer_id, admin_id] {
        delete(&client, &token, &format!("/users/{}", id)).await;
    }
    delete(&client, &token, &format!("/tools/{}", code)).await;
}

#[tokio::test]
#[ignore]
async fn test_activity_with_blank_tool_list() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/activities", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "activityCode": unique("KEG"),
            "name": "Latihan",
            "date": "2024-03-15",
            "operatorName": "Budi",
            "toolCode": " , ",
            "toolUsage": 2
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Missing fields: toolCode");
}

#[tokio::test]
#[ignore]
async fn test_activity_export_without_signer() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/exports/activities/html", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "startDate": "2024-01-01", "endDate": "2024-12-31" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_activity_date_before_1900_is_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/activities", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "activityCode": unique("KEG"),
            "name": "Latihan",
            "date": "0024-03-02",
            "operatorName": "Budi",
            "toolCode": unique("ANY"),
            "toolUsage": 2
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
