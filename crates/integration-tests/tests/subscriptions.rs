//! Subscription checkout and the referral points ledger.

use refill_integration_tests::{TestApp, id_of};
use reqwest::StatusCode;
use serde_json::json;

/// Returns (admin token, plan id, referrer token, referrer code, buyer token).
async fn referral_setup(app: &TestApp) -> (String, String, String, String, String) {
    let admin = app.sign_up_admin("owner@refill.ph").await;
    // 5 gallons a week for 2 months at 25 pesos: 40 gallons, 1000 pesos.
    let plan = app.create_plan(&admin, 5, 2).await;

    let referrer = app.sign_up("ana@refill.ph", "Ana Cruz", "Pugaro").await;
    let code = app.post("/referrals/code", Some(&referrer), &json!({})).await;
    assert_eq!(code.status, StatusCode::OK);
    let code = code.body["referral_code"]
        .as_str()
        .expect("referral code issued")
        .to_owned();

    let buyer = app.sign_up("ben@refill.ph", "Ben Santos", "Mauban").await;
    (admin, plan, referrer, code, buyer)
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_subscribe_generates_schedule() {
    let app = TestApp::spawn().await;
    let admin = app.sign_up_admin("owner@refill.ph").await;
    let plan = app.create_plan(&admin, 5, 1).await;
    let buyer = app.sign_up("ben@refill.ph", "Ben Santos", "Mauban").await;

    let subscribed = app
        .post(
            "/subscriptions",
            Some(&buyer),
            &json!({
                "plan_id": plan,
                "payment_method": "credit_card",
                "start_date": "2024-03-04",
            }),
        )
        .await;
    assert_eq!(subscribed.status, StatusCode::CREATED, "{}", subscribed.body);
    assert_eq!(subscribed.body["total_gallons"], 20);
    assert_eq!(
        subscribed.body["delivery_schedule"],
        json!(["2024-03-04", "2024-03-11", "2024-03-18", "2024-03-25"])
    );
    assert!(subscribed.body["referral"].is_null());

    let profile = app.get("/profile", Some(&buyer)).await;
    assert_eq!(profile.body["subscription_status"], "active");
    assert_eq!(profile.body["remaining_gallons"], 20);
    assert_eq!(profile.body["pending_count"], 4);
    assert_eq!(profile.body["next_delivery"], "2024-03-04");
    assert_eq!(profile.body["payment_details"]["payment_status"], "paid");

    let sales = app.get("/admin/sales?type=subscription", Some(&admin)).await;
    let sales = sales.body.as_array().expect("sales list");
    assert_eq!(sales.len(), 1);
    assert_eq!(sales.first().map(|s| &s["type"]), Some(&json!("subscription")));
}

#[tokio::test]
async fn test_custom_plan_is_private() {
    let app = TestApp::spawn().await;
    let ana = app.sign_up("ana@refill.ph", "Ana Cruz", "Pugaro").await;
    let ben = app.sign_up("ben@refill.ph", "Ben Santos", "Mauban").await;

    let custom = app
        .post(
            "/plans/custom",
            Some(&ana),
            &json!({ "gallons_per_week": 3, "subscription_duration": 1 }),
        )
        .await;
    assert_eq!(custom.status, StatusCode::CREATED, "{}", custom.body);
    let plan = id_of(&custom.body);

    let again = app
        .post(
            "/plans/custom",
            Some(&ana),
            &json!({ "gallons_per_week": 4, "subscription_duration": 1 }),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let visible_to_ben = app.get("/plans", Some(&ben)).await;
    assert_eq!(visible_to_ben.body, json!([]));

    let stolen = app
        .post(
            "/subscriptions",
            Some(&ben),
            &json!({ "plan_id": plan, "payment_method": "credit_card" }),
        )
        .await;
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);

    let own = app
        .post(
            "/subscriptions",
            Some(&ana),
            &json!({ "plan_id": plan, "payment_method": "bank_transfer" }),
        )
        .await;
    assert_eq!(own.status, StatusCode::CREATED, "{}", own.body);
    assert_eq!(own.body["total_gallons"], 12);
}

// ============================================================================
// Referral Ledger
// ============================================================================

#[tokio::test]
async fn test_cash_on_delivery_referral_settles_on_payment() {
    let app = TestApp::spawn().await;
    let (admin, plan, referrer, code, buyer) = referral_setup(&app).await;

    let subscribed = app
        .post(
            "/subscriptions",
            Some(&buyer),
            &json!({
                "plan_id": plan,
                "payment_method": "cash_on_delivery",
                "referral_code": code.to_lowercase(),
            }),
        )
        .await;
    assert_eq!(subscribed.status, StatusCode::CREATED, "{}", subscribed.body);
    assert_eq!(subscribed.body["referral"]["points"], 100);
    assert_eq!(subscribed.body["referral"]["kind"], "pending");
    let sale_id = subscribed.body["sale_id"]
        .as_str()
        .expect("sale id")
        .to_owned();

    let before = app.get("/profile", Some(&referrer)).await;
    let ledger = &before.body["referral_details"];
    assert_eq!(ledger["referral_points"], 0);
    assert_eq!(ledger["referral_points_pending"], 100);
    assert_eq!(ledger["referrals_count"], 0);

    let unpaid = app.get("/profile", Some(&buyer)).await;
    assert_eq!(unpaid.body["payment_details"]["payment_status"], "pending");
    assert_eq!(unpaid.body["payment_details"]["amount_paid"], "0");

    let paid = app
        .post(
            &format!("/admin/sales/{sale_id}/mark-paid"),
            Some(&admin),
            &json!({}),
        )
        .await;
    assert_eq!(paid.status, StatusCode::NO_CONTENT, "{}", paid.body);

    let after = app.get("/profile", Some(&referrer)).await;
    let ledger = &after.body["referral_details"];
    assert_eq!(ledger["referral_points"], 100);
    assert_eq!(ledger["referral_points_pending"], 0);
    assert_eq!(ledger["referrals_count"], 1);

    let buyer_profile = app.get("/profile", Some(&buyer)).await;
    assert_eq!(buyer_profile.body["payment_details"]["payment_status"], "paid");
    assert_eq!(
        buyer_profile.body["payment_details"]["amount_paid"],
        buyer_profile.body["subscription_details"]["total_price"]
    );

    let twice = app
        .post(
            &format!("/admin/sales/{sale_id}/mark-paid"),
            Some(&admin),
            &json!({}),
        )
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_immediate_payment_confirms_referral() {
    let app = TestApp::spawn().await;
    let (_admin, plan, referrer, code, buyer) = referral_setup(&app).await;

    let subscribed = app
        .post(
            "/subscriptions",
            Some(&buyer),
            &json!({
                "plan_id": plan,
                "payment_method": "credit_card",
                "referral_code": code,
            }),
        )
        .await;
    assert_eq!(subscribed.status, StatusCode::CREATED, "{}", subscribed.body);
    assert_eq!(subscribed.body["referral"]["kind"], "confirmed");

    let ledger = app.get("/profile", Some(&referrer)).await.body["referral_details"].clone();
    assert_eq!(ledger["referral_points"], 100);
    assert_eq!(ledger["referral_points_pending"], 0);
    assert_eq!(ledger["referrals_count"], 1);
}

#[tokio::test]
async fn test_bad_referral_codes_write_nothing() {
    let app = TestApp::spawn().await;
    let (admin, plan, referrer, code, buyer) = referral_setup(&app).await;

    let unknown = app
        .post(
            "/subscriptions",
            Some(&buyer),
            &json!({
                "plan_id": plan,
                "payment_method": "cash_on_delivery",
                "referral_code": "REF-ZZZZZZZZ",
            }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let own_code = app
        .post(
            "/subscriptions",
            Some(&referrer),
            &json!({
                "plan_id": plan,
                "payment_method": "cash_on_delivery",
                "referral_code": code,
            }),
        )
        .await;
    assert_eq!(own_code.status, StatusCode::BAD_REQUEST);

    let sales = app.get("/admin/sales", Some(&admin)).await;
    assert_eq!(sales.body, json!([]));

    let profile = app.get("/profile", Some(&buyer)).await;
    assert_eq!(profile.body["subscription_status"], "inactive");
}

#[tokio::test]
async fn test_referral_code_is_stable() {
    let app = TestApp::spawn().await;
    let ana = app.sign_up("ana@refill.ph", "Ana Cruz", "Pugaro").await;

    let first = app.post("/referrals/code", Some(&ana), &json!({})).await;
    let second = app.post("/referrals/code", Some(&ana), &json!({})).await;
    assert_eq!(first.body, second.body);

    let code = first.body["referral_code"].as_str().expect("code");
    assert!(code.starts_with("REF-"));
    assert_eq!(code.len(), 12);
}
