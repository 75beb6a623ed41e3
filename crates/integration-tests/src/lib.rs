//! Integration tests for Refill.
//!
//! Each test spawns the full router on an ephemeral port, backed by a fresh
//! in-memory document store, and talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p refill-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};

use refill_server::config::RefillConfig;
use refill_server::services::AuthService;
use refill_server::state::AppState;
use refill_server::store::{DocumentStore, MemoryStore};

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse battery";

/// A running server plus an HTTP client pointed at it.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    store: Arc<dyn DocumentStore>,
    config: RefillConfig,
}

/// A response status with its parsed JSON body (`Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    /// Start a server on `127.0.0.1:0` over an empty store.
    pub async fn spawn() -> Self {
        let config = RefillConfig::default();
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let app = refill_server::app(AppState::new(config.clone(), Arc::clone(&store)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            addr,
            client: Client::new(),
            store,
            config,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        into_test_response(request.send().await.expect("GET failed")).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &impl Serialize) -> TestResponse {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        into_test_response(request.send().await.expect("POST failed")).await
    }

    /// Register a customer in `barangay` and return their bearer token.
    pub async fn sign_up(&self, email: &str, name: &str, barangay: &str) -> String {
        let registered = self
            .post(
                "/auth/register",
                None,
                &json!({
                    "email": email,
                    "password": PASSWORD,
                    "name": name,
                    "phone_number": "09171234567",
                    "house_number": "12",
                    "barangay": barangay,
                }),
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        self.login(email).await
    }

    pub async fn login(&self, email: &str) -> String {
        let response = self
            .post(
                "/auth/login",
                None,
                &json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"]
            .as_str()
            .expect("login response has a token")
            .to_owned()
    }

    /// Register an account and grant it the admin role.
    pub async fn sign_up_admin(&self, email: &str) -> String {
        let token = self.sign_up(email, "Store Owner", "Poblacion").await;
        AuthService::new(self.store.as_ref(), self.config.session_ttl())
            .promote(email)
            .await
            .expect("Failed to promote admin");
        token
    }

    /// Create a catalogue plan priced at 25 pesos per gallon.
    pub async fn create_plan(&self, admin: &str, gallons_per_week: u32, months: u32) -> String {
        let response = self
            .post(
                "/admin/plans",
                Some(admin),
                &json!({
                    "subscription_name": "Family",
                    "gallons_per_week": gallons_per_week,
                    "price_per_gallon": "25",
                    "subscription_duration": months,
                    "bonus_points": 10,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        id_of(&response.body)
    }
}

/// The `id` field of a created record.
pub fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("record has an id").to_owned()
}

async fn into_test_response(response: reqwest::Response) -> TestResponse {
    let status = response.status();
    let text = response.text().await.expect("Failed to read response body");
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    TestResponse { status, body }
}
