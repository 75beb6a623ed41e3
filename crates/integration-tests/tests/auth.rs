//! Sign-up, sign-in and role checks over HTTP.

use refill_integration_tests::{PASSWORD, TestApp};
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let live = app.get("/health", None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, json!("ok"));

    let ready = app.get("/health/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

// ============================================================================
// Registration & Sessions
// ============================================================================

#[tokio::test]
async fn test_register_login_and_session() {
    let app = TestApp::spawn().await;
    let token = app.sign_up("Ana@Refill.ph", "Ana Cruz", "Pugaro").await;

    let session = app.get("/auth/session", Some(&token)).await;
    assert_eq!(session.status, StatusCode::OK);
    assert_eq!(session.body["email"], "ana@refill.ph");
    assert_eq!(session.body["role"], "customer");

    let profile = app.get("/profile", Some(&token)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["subscription_status"], "inactive");
    assert_eq!(
        profile.body["personal_details"]["address"],
        "12, Pugaro, Balungao, Pangasinan"
    );
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::spawn().await;
    app.sign_up("ana@refill.ph", "Ana Cruz", "Pugaro").await;

    let duplicate = app
        .post(
            "/auth/register",
            None,
            &json!({
                "email": "ANA@refill.ph",
                "password": PASSWORD,
                "name": "Another Ana",
                "phone_number": "0917",
                "house_number": "3",
                "barangay": "Mauban",
            }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let unknown_barangay = app
        .post(
            "/auth/register",
            None,
            &json!({
                "email": "ben@refill.ph",
                "password": PASSWORD,
                "name": "Ben",
                "phone_number": "0917",
                "house_number": "3",
                "barangay": "Atlantis",
            }),
        )
        .await;
    assert_eq!(unknown_barangay.status, StatusCode::BAD_REQUEST);

    let short_password = app
        .post(
            "/auth/register",
            None,
            &json!({
                "email": "cy@refill.ph",
                "password": "short",
                "name": "Cy",
                "phone_number": "0917",
                "house_number": "3",
                "barangay": "Mauban",
            }),
        )
        .await;
    assert_eq!(short_password.status, StatusCode::BAD_REQUEST);
    assert!(short_password.body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_wrong_password_and_logout() {
    let app = TestApp::spawn().await;
    let token = app.sign_up("ana@refill.ph", "Ana Cruz", "Pugaro").await;

    let wrong = app
        .post(
            "/auth/login",
            None,
            &json!({ "email": "ana@refill.ph", "password": "not the password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let logout = app.post("/auth/logout", Some(&token), &json!({})).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let after = app.get("/profile", Some(&token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = TestApp::spawn().await;
    let customer = app.sign_up("ana@refill.ph", "Ana Cruz", "Pugaro").await;

    assert_eq!(
        app.get("/admin/sales", None).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/admin/sales", Some(&customer)).await.status,
        StatusCode::FORBIDDEN
    );

    let admin = app.sign_up_admin("owner@refill.ph").await;
    let sales = app.get("/admin/sales", Some(&admin)).await;
    assert_eq!(sales.status, StatusCode::OK);
    assert_eq!(sales.body, json!([]));
}
