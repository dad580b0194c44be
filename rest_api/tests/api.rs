// rest_api/tests/api.rs
// Drives the router in-process through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use simrs_core::config::{SchedulingConfig, StorageConfig};
use simrs_core::{AppConfig, HospitalEngine, InMemoryStorage};
use simrs_models::{NewUser, Role};
use simrs_rest_api::{build_app, AppState};
use simrs_security::{Actor, RolesConfig};

const GATEWAY_KEY: &str = "gw-test-key";

struct TestApp {
    state: AppState,
    root: Actor,
}

impl TestApp {
    async fn new() -> Self {
        let mut config = AppConfig::default();
        config.storage = StorageConfig::in_memory();
        config.security.gateway_key = Some(GATEWAY_KEY.to_string());
        let engine = HospitalEngine::open(
            Arc::new(InMemoryStorage::new()),
            Arc::new(RolesConfig::builtin()),
            SchedulingConfig::default(),
        )
        .await
        .unwrap();
        let root = engine.create_superuser("root", "root@rs.test", "rahasia123").await.unwrap();
        let root = engine.resolve_actor(root.id).await.unwrap();
        TestApp { state: AppState::new(Arc::new(engine), config), root }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.send_with(method, uri, token, &[], body).await
    }

    async fn send_with(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = build_app(self.state.clone()).oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    /// Creates a staff account directly on the engine and logs it in over HTTP.
    async fn staff_token(&self, username: &str, role: Role) -> (String, String) {
        let created = self.state.engine.create_user(&self.root, account(username, role)).await.unwrap();
        (created.profile.id.to_string(), self.access_token(username).await)
    }

    async fn login(&self, username: &str) -> (StatusCode, Value) {
        self.send(Method::POST, "/api/auth/login", None, Some(json!({"username": username, "password": "rahasia123"})))
            .await
    }

    async fn access_token(&self, username: &str) -> String {
        let (status, body) = self.login(username).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["access"].as_str().unwrap().to_string()
    }

    async fn register_patient(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::to_value(account(username, Role::Patient)).unwrap()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        self.access_token(username).await
    }
}

fn account(username: &str, role: Role) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@rs.test", username),
        password: Some("rahasia123".to_string()),
        first_name: username.to_string(),
        last_name: String::new(),
        role,
        phone_number: String::new(),
        national_id: String::new(),
        date_of_birth: None,
        gender: String::new(),
        requires_support_activation: false,
    }
}

#[tokio::test]
async fn should_report_health_without_credentials() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn should_authenticate_with_bearer_token() {
    let app = TestApp::new().await;
    let token = app.register_patient("siti").await;

    let (status, body) = app.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "siti");
    assert_eq!(body["role"], "PATIENT");

    let (status, body) = app.send(Method::GET, "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send(Method::GET, "/api/users/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_reject_wrong_password_and_refresh_as_access() {
    let app = TestApp::new().await;
    app.register_patient("budi").await;

    let (status, body) = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({"username": "budi", "password": "salah-sekali"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (_, pair) = app.login("budi").await;
    let refresh = pair["refresh"].as_str().unwrap();
    let (status, _) = app.send(Method::GET, "/api/users/me", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, renewed) = app.send(Method::POST, "/api/auth/refresh", None, Some(json!({"refresh": refresh}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renewed["role"], "PATIENT");
    let (status, _) = app.send(Method::GET, "/api/users/me", renewed["access"].as_str(), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn should_accept_trailing_slash() {
    let app = TestApp::new().await;
    let token = app.register_patient("ani").await;
    let (status, body) = app.send(Method::GET, "/api/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ani");
}

#[tokio::test]
async fn should_render_malformed_body_as_invalid_data() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({"username": "nobody"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_DATA");
}

#[tokio::test]
async fn should_switch_to_paginated_envelope_when_page_given() {
    let app = TestApp::new().await;
    let (_, admin) = app.staff_token("admin", Role::HospitalAdmin).await;
    for (code, floor) in [("MW", 2), ("ML", 3), ("AN", 4)] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/wards",
                Some(&admin),
                Some(json!({"name": format!("Ward {}", code), "code": code, "floor": floor})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = app.send(Method::GET, "/api/wards", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));

    let (status, body) = app.send(Method::GET, "/api/wards?page=1&page_size=2", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["next"], "/api/wards?page=2&page_size=2");
    assert!(body["previous"].is_null());

    let (status, body) = app
        .send(Method::POST, "/api/wards", Some(&admin), Some(json!({"name": "Dup", "code": "mw", "floor": 1})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn should_gate_doctor_assignment_on_settled_fee() {
    let app = TestApp::new().await;
    let (doctor_id, _) = app.staff_token("dr-andi", Role::Doctor).await;
    let (_, director) = app.staff_token("direktur", Role::MedicalDirector).await;
    let patient = app.register_patient("pasien").await;

    let (status, appointment) = app
        .send(
            Method::POST,
            "/api/appointments/request_appointment",
            Some(&patient),
            Some(json!({
                "appointment_type": "POLYCLINIC",
                "scheduled_start": "2030-03-04T09:00:00Z",
                "scheduled_end": "2030-03-04T09:30:00Z",
                "administration_fee": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", appointment);
    assert_eq!(appointment["status"], "PENDING");
    let id = appointment["id"].as_str().unwrap().to_string();
    let assign_uri = format!("/api/appointments/{}/assign_doctor", id);
    let assignment = json!({"doctor": doctor_id, "location": "Poli Dalam 2"});

    let (status, body) = app.send(Method::POST, &assign_uri, Some(&director), Some(assignment.clone())).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "PAYMENT_REQUIRED");

    let (status, payments) = app.send(Method::GET, "/api/payments/midtrans", Some(&patient), None).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = payments[0]["order_id"].as_str().unwrap().to_string();
    assert_eq!(payments[0]["status"], "WAITING");
    let notification = json!({"order_id": order_id, "transaction_status": "settlement"});

    let notify_uri = "/api/payments/midtrans/notification";
    let (status, _) = app.send(Method::POST, notify_uri, None, Some(notification.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .send_with(Method::POST, notify_uri, None, &[("X-Gateway-Key", "wrong")], Some(notification.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, paid) = app
        .send_with(Method::POST, notify_uri, None, &[("X-Gateway-Key", GATEWAY_KEY)], Some(notification))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "PAID");

    let (status, confirmed) = app.send(Method::POST, &assign_uri, Some(&director), Some(assignment)).await;
    assert_eq!(status, StatusCode::OK, "{}", confirmed);
    assert_eq!(confirmed["status"], "CONFIRMED");
    assert_eq!(confirmed["doctor"], doctor_id);
    assert_eq!(confirmed["location"], "Poli Dalam 2");
}

#[tokio::test]
async fn should_serve_role_dashboards() {
    let app = TestApp::new().await;
    let patient = app.register_patient("dewi").await;

    let (status, _) = app.send(Method::GET, "/api/dashboard/patient", Some(&patient), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(Method::GET, "/api/dashboard/nurse", Some(&patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app.send(Method::GET, "/api/dashboard/janitor", Some(&patient), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
