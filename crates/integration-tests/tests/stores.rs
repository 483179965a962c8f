//! Store ownership and dashboards against `PostgreSQL`.
//!
//! Run with: `cargo test -p storerate-integration-tests -- --ignored`

use axum::http::StatusCode;
use serde_json::json;

use storerate_integration_tests::{TestContext, unique_email};

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_owner_binding_and_dashboard() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin().await;
    let (owner, owner_token) = ctx.register("Dashboard Store Owner Acct").await;
    let (rater, rater_token) = ctx.register("Dashboard Store Rater Acct").await;

    // Not bound yet, so still a plain user
    let (status, _) = ctx
        .send("GET", "/api/dashboard/store-owner", Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let store = ctx
        .create_store(&admin, "Owner Dashboard Test Store", Some(owner))
        .await;

    let (status, body) = ctx
        .send("GET", &format!("/api/users/{owner}"), Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "STORE_OWNER");
    assert_eq!(body["store"]["id"], store);

    let (status, _) = ctx
        .send(
            "POST",
            "/api/ratings",
            Some(&rater_token),
            Some(json!({ "storeId": store, "rating": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Store owners cannot rate
    let (status, _) = ctx
        .send(
            "POST",
            "/api/ratings",
            Some(&owner_token),
            Some(json!({ "storeId": store, "rating": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send("GET", "/api/dashboard/store-owner", Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["store"]["id"], store);
    assert_eq!(body["averageRating"], 4.0);
    assert_eq!(body["totalRatings"], 1);
    assert_eq!(body["ratingUsers"][0]["id"], rater);
    assert_eq!(body["ratingUsers"][0]["rating"], 4);

    let (status, body) = ctx
        .send("GET", &format!("/api/stores/{store}"), Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ratings"][0]["id"], rater);
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_store_owner_rules() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin().await;
    let (owner, _) = ctx.register("Single Store Owner Account").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/stores",
            Some(&admin),
            Some(json!({
                "name": "Store With Missing Owner",
                "email": unique_email("orphan"),
                "ownerId": 2_147_483_647,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Owner user not found" }));

    let store = ctx
        .create_store(&admin, "First Store For This Owner", Some(owner))
        .await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/stores",
            Some(&admin),
            Some(json!({
                "name": "Second Store For This Owner",
                "email": unique_email("second"),
                "ownerId": owner,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "message": "Owner already has a store" }));

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/stores/{store}"),
            Some(&admin),
            Some(json!({ "ownerId": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ownerId"], serde_json::Value::Null);
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_role_edits_respect_store_binding() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin().await;
    let (owner, owner_token) = ctx.register("Bound Owner Role Edit Acct").await;
    let (rater, rater_token) = ctx.register("Storeless Owner Role Acct").await;

    let store = ctx
        .create_store(&admin, "Store Kept By Its Owner", Some(owner))
        .await;

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/users/{owner}"),
            Some(&admin),
            Some(json!({ "role": "USER" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "message": "User still owns a store; unassign the store before changing the role" })
    );

    let (status, body) = ctx
        .send("GET", &format!("/api/stores/{store}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ownerId"], owner);

    // The refused demotion must not open rating to the owner
    let (status, _) = ctx
        .send(
            "POST",
            "/api/ratings",
            Some(&owner_token),
            Some(json!({ "storeId": store, "rating": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A storeless user may be promoted ahead of a binding
    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/users/{rater}"),
            Some(&admin),
            Some(json!({ "role": "STORE_OWNER" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "STORE_OWNER");

    let (status, body) = ctx
        .send("GET", "/api/dashboard/store-owner", Some(&rater_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Store not found for this owner" }));

    // Once unbound the former owner can be demoted freely
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/stores/{store}"),
            Some(&admin),
            Some(json!({ "ownerId": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/users/{owner}"),
            Some(&admin),
            Some(json!({ "role": "USER" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "USER");
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_store_list_filters_and_admin_totals() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin().await;
    let marker = uuid::Uuid::new_v4().simple().to_string();
    let name = format!("Filter {}", &marker[..20]);
    let store = ctx.create_store(&admin, &name, None).await;

    let (status, body) = ctx
        .send("GET", &format!("/api/stores?name={}", &marker[..20]), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], store);
    assert_eq!(rows[0]["averageRating"], 0.0);

    let (status, body) = ctx
        .send("GET", "/api/dashboard/admin", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["totalUsers"].as_i64().unwrap_or_default() >= 1);
    assert!(body["totalStores"].as_i64().unwrap_or_default() >= 1);
}
