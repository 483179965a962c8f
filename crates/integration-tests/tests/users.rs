//! User management and profile access against `PostgreSQL`.
//!
//! Run with: `cargo test -p storerate-integration-tests -- --ignored`

use axum::http::StatusCode;
use serde_json::json;

use storerate_integration_tests::{PASSWORD, TestContext, unique_email};

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_user_cannot_read_other_profiles() {
    let ctx = TestContext::new().await;
    let (alice, alice_token) = ctx.register("Alice Profile Reader Test").await;
    let (bob, _) = ctx.register("Bob Profile Owner Testing").await;

    let (status, body) = ctx
        .send("GET", &format!("/api/users/{bob}"), Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Access forbidden" }));

    // Even a missing id is forbidden for a plain user
    let (status, _) = ctx
        .send("GET", "/api/users/2147483647", Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send("GET", &format!("/api/users/{alice}"), Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], alice);
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_only_admins_change_roles() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin().await;
    let (id, token) = ctx.register("Would Be Administrator User").await;

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/users/{id}"),
            Some(&token),
            Some(json!({ "role": "ADMIN" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Cannot change role" }));

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/users/{id}"),
            Some(&token),
            Some(json!({ "address": "1 New Street, Moved City" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "1 New Street, Moved City");
    assert_eq!(body["role"], "USER");

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/users/{id}"),
            Some(&admin),
            Some(json!({ "role": "ADMIN" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_admin_creates_and_filters_users() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin().await;
    let email = unique_email("filtered");

    let (status, body) = ctx
        .send(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({
                "name": "Filterable Store Owner Account",
                "email": email,
                "password": PASSWORD,
                "role": "STORE_OWNER",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["role"], "STORE_OWNER");

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/api/users?email={email}&role=STORE_OWNER"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], email.as_str());

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/api/users?email={email}&role=USER"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
