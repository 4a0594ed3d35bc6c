use axum::http::StatusCode;
use chrono::{Duration, Utc};
use reqwest::Client;
use salesdesk_server::{server, storage};
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;

const LOGIN_PATH: &str = "/api/v1/auth/login";
const WEBHOOK_SECRET: &str = "whsec-test";

struct TestServer {
    base: String,
    client: Client,
    handle: tokio::task::JoinHandle<()>,
    _tempdir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Option<Self> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let (addr, handle) = match start_server(&db_path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                eprintln!("Skipping test due to sandbox restrictions: {e}");
                return None;
            }
            Err(e) => panic!("failed to start server: {e}"),
        };
        Some(Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            handle,
            _tempdir: dir,
        })
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let body = self
            .request_expect(
                "POST",
                LOGIN_PATH,
                None,
                Some(json!({"username": username, "password": password})),
                StatusCode::OK,
            )
            .await;
        body.get("token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .expect("token missing from auth response")
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let url = format!("{}{}", self.base, path);
        let mut req = match method {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url),
            "PUT" => self.client.put(&url),
            "DELETE" => self.client.delete(&url),
            other => panic!("unsupported method {other}"),
        };
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let text = resp.text().await.unwrap();
        let val = if text.is_empty() {
            json!(null)
        } else {
            serde_json::from_str(&text).unwrap_or(json!({"raw": text}))
        };
        (status, val)
    }

    async fn request_expect(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let (status, value) = self.request(method, path, token, body).await;
        assert_eq!(
            status, expected,
            "{method} {path} returned {status:?} with body {value:?}",
        );
        value
    }

    /// POST to a webhook endpoint with the signature header.
    async fn webhook(&self, path: &str, signature: Option<&str>, body: Value) -> (StatusCode, Value) {
        let url = format!("{}{}", self.base, path);
        let mut req = self.client.post(&url).json(&body);
        if let Some(sig) = signature {
            req = req.header("x-webhook-signature", sig);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let val: Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
        (status, val)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(
    tmp_db: &Path,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), std::io::Error> {
    let admin_pwd = "adminpass";
    let staff_pwd = "staffpass";
    let admin_hash = bcrypt::hash(admin_pwd, bcrypt::DEFAULT_COST).unwrap();
    let staff_hash = bcrypt::hash(staff_pwd, bcrypt::DEFAULT_COST).unwrap();
    let config = server::AppConfig {
        jwt_secret: "testsecret".into(),
        webhook_secret: Some(WEBHOOK_SECRET.into()),
        users: vec![
            server::UserConfig {
                username: "anna".into(),
                password_hash: admin_hash,
                role: server::Role::Admin,
                display_name: "Anna Andersson".into(),
                commission_rate_percent: None,
            },
            server::UserConfig {
                username: "maja".into(),
                password_hash: staff_hash,
                role: server::Role::Staff,
                display_name: "Maja Lindqvist".into(),
                commission_rate_percent: Some(10.0),
            },
        ],
        timezone: Some("Europe/Stockholm".into()),
        dev_cors_origin: None,
        listen_port: None,
    };

    let store = storage::Store::connect_sqlite(tmp_db.to_str().unwrap())
        .await
        .expect("db");

    let state = server::AppState::new(config, store);
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok((addr, handle))
}

fn rfc3339_days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339()
}

fn purchase_event(uuid: &str, seller: &str, amount: Value, days_ago: i64) -> Value {
    json!({
        "purchase_uuid": uuid,
        "timestamp": rfc3339_days_ago(days_ago),
        "amount": amount,
        "user_display_name": seller,
        "payment_type": "card",
        "products": null,
        "product_name": null,
        "quantity": null,
        "refund_uuid": null,
    })
}

#[tokio::test]
async fn public_endpoints_work() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    server
        .request_expect("GET", "/healthz", None, None, StatusCode::OK)
        .await;
    let token = server.login("anna", "adminpass").await;
    assert!(!token.is_empty());
    server
        .request_expect(
            "POST",
            LOGIN_PATH,
            None,
            Some(json!({"username": "anna", "password": "wrong"})),
            StatusCode::UNAUTHORIZED,
        )
        .await;
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let cases: Vec<(&str, &str, Option<Value>)> = vec![
        ("GET", "/api/v1/purchases", None),
        ("POST", "/api/v1/purchases/verify", Some(json!({"purchase_ids": ["x"]}))),
        ("GET", "/api/v1/stats/leaderboard", None),
        ("GET", "/api/v1/stats/points", None),
        ("GET", "/api/v1/stats/salary?from=2026-01-01&to=2026-01-31", None),
        ("GET", "/api/v1/shifts", None),
        ("POST", "/api/v1/shifts", Some(json!({"date": "2026-08-10", "start_time": "09:00", "end_time": "17:00", "available_slots": 2}))),
        ("DELETE", "/api/v1/shifts/1", None),
        ("POST", "/api/v1/shifts/1/bookings", None),
        ("POST", "/api/v1/bookings/1/cancel", None),
        ("GET", "/api/v1/bookings/weekly-status", None),
        ("GET", "/api/v1/invitations", None),
        ("POST", "/api/v1/invitations", Some(json!({}))),
        ("GET", "/api/v1/challenges/active?kind=weekly", None),
        ("GET", "/api/v1/settings/booking_enabled", None),
    ];

    for (method, path, body) in cases.iter() {
        server
            .request_expect(method, path, None, body.clone(), StatusCode::UNAUTHORIZED)
            .await;
    }
}

#[tokio::test]
async fn webhook_ingestion_points_and_leaderboard() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let staff_token = server.login("maja", "staffpass").await;

    // Signature is mandatory and must match the configured secret.
    let (status, body) = server
        .webhook(
            "/api/v1/webhooks/purchases",
            None,
            purchase_event("p-0", "Maja Lindqvist", json!("10"), 1),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.get("success").unwrap(), false);
    let (status, _) = server
        .webhook(
            "/api/v1/webhooks/purchases",
            Some("wrong"),
            purchase_event("p-0", "Maja Lindqvist", json!("10"), 1),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Purchase with line items: Utforska earns the elevated rate.
    let mut with_products = purchase_event("p-1", "Maja Lindqvist", json!("123,45"), 3);
    with_products["products"] = json!([
        {"name": "Utforska", "quantity": 3.0},
    ]);
    let (status, body) = server
        .webhook(
            "/api/v1/webhooks/purchases",
            Some(WEBHOOK_SECRET),
            with_products.clone(),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body:?}");
    assert_eq!(body.get("success").unwrap(), true);

    // Redelivery of the same event is acknowledged without duplication.
    let (status, body) = server
        .webhook(
            "/api/v1/webhooks/purchases",
            Some(WEBHOOK_SECRET),
            with_products,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.get("message").and_then(|v| v.as_str()).unwrap(),
        "duplicate purchase ignored"
    );

    // A legacy-shape purchase (no line items) and one for another seller.
    let mut legacy = purchase_event("p-2", "Maja Lindqvist", json!("200"), 1);
    legacy["product_name"] = json!("Kaffe");
    legacy["quantity"] = json!(2.0);
    server
        .webhook("/api/v1/webhooks/purchases", Some(WEBHOOK_SECRET), legacy)
        .await;
    server
        .webhook(
            "/api/v1/webhooks/purchases",
            Some(WEBHOOK_SECRET),
            purchase_event("p-3", "Erik Berg", json!(500.0), 2),
        )
        .await;

    // The purchase listing carries the normalized legacy shape.
    let purchases = server
        .request_expect(
            "GET",
            "/api/v1/purchases",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    let arr = purchases.as_array().unwrap();
    assert_eq!(arr.len(), 3);
    let p1 = arr.iter().find(|p| p.get("id").unwrap() == "p-1").unwrap();
    assert_eq!(p1.get("amount").unwrap().as_f64().unwrap(), 123.45);
    assert_eq!(p1.get("refunded").unwrap(), false);

    // Points: 3 x Utforska (120) + legacy 2 x standard (30).
    let points = server
        .request_expect(
            "GET",
            "/api/v1/stats/points",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(points.get("total_points").unwrap().as_f64().unwrap(), 150.0);

    // Leaderboard: Erik's single 500 sale tops the totals; Maja was
    // active on more distinct days.
    let board = server
        .request_expect(
            "GET",
            "/api/v1/stats/leaderboard",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    let top_seller = board.get("top_seller").unwrap();
    assert_eq!(top_seller.get("user_display_name").unwrap(), "Erik Berg");
    assert_eq!(top_seller.get("value").unwrap().as_f64().unwrap(), 500.0);
    let presence = board.get("top_presence").unwrap();
    assert_eq!(presence.get("user_display_name").unwrap(), "Maja Lindqvist");
    assert_eq!(presence.get("value").unwrap().as_f64().unwrap(), 2.0);

    // Refund the legacy purchase; its points and sales stop counting.
    let refund = json!({
        "purchase_uuid": "r-1",
        "timestamp": rfc3339_days_ago(0),
        "amount": json!("200"),
        "user_display_name": "Maja Lindqvist",
        "refund_uuid": "p-2",
    });
    let (status, body) = server
        .webhook("/api/v1/webhooks/purchases", Some(WEBHOOK_SECRET), refund)
        .await;
    assert_eq!(status, StatusCode::OK, "{body:?}");

    let points = server
        .request_expect(
            "GET",
            "/api/v1/stats/points",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(points.get("total_points").unwrap().as_f64().unwrap(), 120.0);

    // Refunds referencing unknown purchases are rejected.
    let bogus = json!({
        "purchase_uuid": "r-2",
        "timestamp": rfc3339_days_ago(0),
        "amount": json!("1"),
        "refund_uuid": "missing",
    });
    let (status, body) = server
        .webhook("/api/v1/webhooks/purchases", Some(WEBHOOK_SECRET), bogus)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.get("success").unwrap(), false);

    // Payment verification is admin-only and marks rows verified.
    let admin_token = server.login("anna", "adminpass").await;
    let verified = server
        .request_expect(
            "POST",
            "/api/v1/purchases/verify",
            Some(&admin_token),
            Some(json!({"purchase_ids": ["p-1", "p-3"]})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(verified.get("updated").unwrap().as_u64().unwrap(), 2);
    let purchases = server
        .request_expect(
            "GET",
            "/api/v1/purchases",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    let p1 = purchases
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p.get("id").unwrap() == "p-1")
        .unwrap();
    assert_eq!(p1.get("verified").unwrap(), true);
}

#[tokio::test]
async fn salary_commission_below_threshold() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    server
        .webhook(
            "/api/v1/webhooks/purchases",
            Some(WEBHOOK_SECRET),
            purchase_event("s-1", "Maja Lindqvist", json!("10000"), 2),
        )
        .await;

    let staff_token = server.login("maja", "staffpass").await;
    let salary = server
        .request_expect(
            "GET",
            "/api/v1/stats/salary?from=2000-01-01&to=2100-01-01",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(salary.get("period_total").unwrap().as_f64().unwrap(), 10000.0);
    assert_eq!(
        salary.get("accumulated_sales").unwrap().as_f64().unwrap(),
        10000.0
    );
    assert_eq!(salary.get("base_rate_percent").unwrap().as_f64().unwrap(), 10.0);
    assert_eq!(salary.get("commission").unwrap().as_f64().unwrap(), 1000.0);

    server
        .request_expect(
            "GET",
            "/api/v1/stats/salary?from=2100-01-01&to=2000-01-01",
            Some(&staff_token),
            None,
            StatusCode::BAD_REQUEST,
        )
        .await;
}

#[tokio::test]
async fn booking_and_shift_lifecycle() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let admin_token = server.login("anna", "adminpass").await;
    let staff_token = server.login("maja", "staffpass").await;

    // A week with no shifts short-circuits to zero without error.
    let status = server
        .request_expect(
            "GET",
            "/api/v1/bookings/weekly-status?week_start=2026-08-10",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(status.get("week_start").unwrap(), "2026-08-10");
    assert_eq!(status.get("week_end").unwrap(), "2026-08-16");
    assert_eq!(status.get("total_bookings").unwrap().as_i64().unwrap(), 0);
    assert_eq!(status.get("meets_minimum_requirement").unwrap(), false);

    // Staff cannot create shifts.
    let new_shift = json!({
        "date": "2026-08-10",
        "start_time": "09:00",
        "end_time": "17:00",
        "available_slots": 2
    });
    server
        .request_expect(
            "POST",
            "/api/v1/shifts",
            Some(&staff_token),
            Some(new_shift.clone()),
            StatusCode::FORBIDDEN,
        )
        .await;

    let shift1 = server
        .request_expect(
            "POST",
            "/api/v1/shifts",
            Some(&admin_token),
            Some(new_shift),
            StatusCode::OK,
        )
        .await;
    let shift1_id = shift1.get("id").unwrap().as_i64().unwrap();
    let shift2 = server
        .request_expect(
            "POST",
            "/api/v1/shifts",
            Some(&admin_token),
            Some(json!({
                "date": "2026-08-12",
                "start_time": "09:00",
                "end_time": "17:00",
                "available_slots": 1
            })),
            StatusCode::OK,
        )
        .await;
    let shift2_id = shift2.get("id").unwrap().as_i64().unwrap();

    let shifts = server
        .request_expect(
            "GET",
            "/api/v1/shifts?from=2026-08-10&to=2026-08-16",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(shifts.as_array().unwrap().len(), 2);

    // One booking is below the weekly minimum of two.
    let booking1 = server
        .request_expect(
            "POST",
            &format!("/api/v1/shifts/{shift1_id}/bookings"),
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(booking1.get("status").unwrap(), "confirmed");
    assert_eq!(
        booking1.get("user_display_name").unwrap(),
        "Maja Lindqvist"
    );
    let status = server
        .request_expect(
            "GET",
            "/api/v1/bookings/weekly-status?week_start=2026-08-10",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(status.get("total_bookings").unwrap().as_i64().unwrap(), 1);
    assert_eq!(status.get("meets_minimum_requirement").unwrap(), false);

    // Booking the same shift twice is a conflict.
    server
        .request_expect(
            "POST",
            &format!("/api/v1/shifts/{shift1_id}/bookings"),
            Some(&staff_token),
            None,
            StatusCode::CONFLICT,
        )
        .await;

    let booking2 = server
        .request_expect(
            "POST",
            &format!("/api/v1/shifts/{shift2_id}/bookings"),
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    let status = server
        .request_expect(
            "GET",
            "/api/v1/bookings/weekly-status?week_start=2026-08-10",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(status.get("total_bookings").unwrap().as_i64().unwrap(), 2);
    assert_eq!(status.get("meets_minimum_requirement").unwrap(), true);

    // Shift 2 had a single slot, so the admin cannot book it anymore.
    server
        .request_expect(
            "POST",
            &format!("/api/v1/shifts/{shift2_id}/bookings"),
            Some(&admin_token),
            None,
            StatusCode::CONFLICT,
        )
        .await;

    // Cancelling drops the booking from the weekly tally.
    let booking2_id = booking2.get("id").unwrap().as_i64().unwrap();
    let cancelled = server
        .request_expect(
            "POST",
            &format!("/api/v1/bookings/{booking2_id}/cancel"),
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(cancelled.get("status").unwrap(), "cancelled");
    let status = server
        .request_expect(
            "GET",
            "/api/v1/bookings/weekly-status?week_start=2026-08-10",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(status.get("total_bookings").unwrap().as_i64().unwrap(), 1);

    // Deleting a shift removes its bookings with it.
    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/shifts/{shift1_id}"),
            Some(&admin_token),
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    server
        .request_expect(
            "GET",
            &format!("/api/v1/shifts/{shift1_id}/bookings"),
            Some(&admin_token),
            None,
            StatusCode::NOT_FOUND,
        )
        .await;
    let status = server
        .request_expect(
            "GET",
            "/api/v1/bookings/weekly-status?week_start=2026-08-10",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(status.get("total_bookings").unwrap().as_i64().unwrap(), 0);

    // Disabling the booking system blocks new bookings.
    server
        .request_expect(
            "PUT",
            "/api/v1/settings/booking_enabled",
            Some(&admin_token),
            Some(json!({"value": "false"})),
            StatusCode::OK,
        )
        .await;
    server
        .request_expect(
            "POST",
            &format!("/api/v1/shifts/{shift2_id}/bookings"),
            Some(&admin_token),
            None,
            StatusCode::CONFLICT,
        )
        .await;
    let setting = server
        .request_expect(
            "GET",
            "/api/v1/settings/booking_enabled",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(setting.get("value").unwrap(), "false");
}

#[tokio::test]
async fn invitation_lifecycle() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let admin_token = server.login("anna", "adminpass").await;
    let staff_token = server.login("maja", "staffpass").await;

    // Invitations are admin-only.
    server
        .request_expect(
            "GET",
            "/api/v1/invitations",
            Some(&staff_token),
            None,
            StatusCode::FORBIDDEN,
        )
        .await;

    let invitation = server
        .request_expect(
            "POST",
            "/api/v1/invitations",
            Some(&admin_token),
            Some(json!({"display_name": "Nils Holm", "expires_in_hours": 24})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(invitation.get("status").unwrap(), "pending");
    let code = invitation
        .get("code")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();

    let listing = server
        .request_expect(
            "GET",
            "/api/v1/invitations",
            Some(&admin_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    // The status-mutation webhook flips pending to used, exactly once.
    let (status, body) = server
        .webhook(
            "/api/v1/webhooks/invitations",
            Some(WEBHOOK_SECRET),
            json!({"code": code, "status": "used"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body:?}");
    assert_eq!(body.get("success").unwrap(), true);

    let (status, body) = server
        .webhook(
            "/api/v1/webhooks/invitations",
            Some(WEBHOOK_SECRET),
            json!({"code": code, "status": "used"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.get("success").unwrap(), false);

    let (status, _) = server
        .webhook(
            "/api/v1/webhooks/invitations",
            Some(WEBHOOK_SECRET),
            json!({"code": "nope", "status": "used"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .webhook(
            "/api/v1/webhooks/invitations",
            Some(WEBHOOK_SECRET),
            json!({"code": code, "status": "pending"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn challenges_and_acl() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let admin_token = server.login("anna", "adminpass").await;
    let staff_token = server.login("maja", "staffpass").await;

    server
        .request_expect(
            "POST",
            "/api/v1/challenges",
            Some(&admin_token),
            Some(json!({
                "name": "Spring sprint",
                "kind": "weekly",
                "starts_on": "2026-08-10",
                "ends_on": "2026-08-16",
                "reward_amount": 500.0
            })),
            StatusCode::OK,
        )
        .await;
    // Overlapping challenge of the same kind: the first one wins.
    server
        .request_expect(
            "POST",
            "/api/v1/challenges",
            Some(&admin_token),
            Some(json!({
                "name": "Late duplicate",
                "kind": "weekly",
                "starts_on": "2026-08-12",
                "ends_on": "2026-08-18",
                "reward_amount": 100.0
            })),
            StatusCode::OK,
        )
        .await;

    let active = server
        .request_expect(
            "GET",
            "/api/v1/challenges/active?kind=weekly&on=2026-08-13",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(active.get("name").unwrap(), "Spring sprint");

    let none = server
        .request_expect(
            "GET",
            "/api/v1/challenges/active?kind=daily&on=2026-08-13",
            Some(&staff_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert!(none.is_null());

    server
        .request_expect(
            "GET",
            "/api/v1/challenges/active?kind=hourly&on=2026-08-13",
            Some(&staff_token),
            None,
            StatusCode::BAD_REQUEST,
        )
        .await;

    // Staff cannot reach management endpoints.
    let negative_cases: Vec<(&str, &str, Option<Value>)> = vec![
        (
            "POST",
            "/api/v1/purchases/verify",
            Some(json!({"purchase_ids": ["p-1"]})),
        ),
        (
            "POST",
            "/api/v1/challenges",
            Some(json!({
                "name": "x", "kind": "daily",
                "starts_on": "2026-08-10", "ends_on": "2026-08-10",
                "reward_amount": 1.0
            })),
        ),
        ("GET", "/api/v1/challenges", None),
        ("DELETE", "/api/v1/shifts/1", None),
        (
            "PUT",
            "/api/v1/settings/booking_enabled",
            Some(json!({"value": "true"})),
        ),
        ("POST", "/api/v1/invitations", Some(json!({}))),
    ];
    for (method, path, body) in negative_cases.iter() {
        server
            .request_expect(
                method,
                path,
                Some(&staff_token),
                body.clone(),
                StatusCode::FORBIDDEN,
            )
            .await;
    }
}

#[tokio::test]
async fn logout_invalidates_session() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.login("maja", "staffpass").await;
    server
        .request_expect(
            "GET",
            "/api/v1/stats/points",
            Some(&token),
            None,
            StatusCode::OK,
        )
        .await;
    server
        .request_expect(
            "POST",
            "/api/v1/auth/logout",
            Some(&token),
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    server
        .request_expect(
            "GET",
            "/api/v1/stats/points",
            Some(&token),
            None,
            StatusCode::UNAUTHORIZED,
        )
        .await;
}
