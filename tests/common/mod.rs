#![allow(dead_code)]

use std::collections::HashMap;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tower::ServiceExt;

use clinic_api_rust::config::AppConfig;
use clinic_api_rust::crypto::PayloadCipher;
use clinic_api_rust::database::models::Appointment;
use clinic_api_rust::services::notify::{Notification, Notifier, NotifyError};
use clinic_api_rust::{app, AppState};

pub const ENCRYPTION_KEY: &str = "0123456789abcdef";
pub const JWT_SECRET: &str = "integration-test-secret";
pub const BASIC_USER: &str = "clinic";
pub const BASIC_PASS: &str = "open-sesame";
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "admin-pass";
pub const ADMIN_TOKEN: &str = "dashboard-token";

fn test_vars(extra: &[(&str, &str)]) -> HashMap<String, String> {
    let mut vars: HashMap<String, String> = [
        ("APP_ENV", "development"),
        ("ENCRYPTION_KEY", ENCRYPTION_KEY),
        ("JWT_SECRET", JWT_SECRET),
        ("BASIC_AUTH_USERNAME", BASIC_USER),
        ("BASIC_AUTH_PASSWORD", BASIC_PASS),
        ("ADMIN_BASIC_AUTH_USERNAME", ADMIN_USER),
        ("ADMIN_BASIC_AUTH_PASSWORD", ADMIN_PASS),
        ("ADMIN_TOKEN", ADMIN_TOKEN),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    vars
}

/// Configuration built without touching the process environment
pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let vars = test_vars(extra);
    AppConfig::from_lookup(|name| vars.get(name).cloned())
}

/// Records notifications instead of logging them
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(Notification, String)>>,
}

impl RecordingNotifier {
    fn record(&self, kind: Notification, appointment: &Appointment) {
        if let Ok(mut events) = self.events.lock() {
            events.push((kind, appointment.id.clone()));
        }
    }

    pub fn events(&self) -> Vec<(Notification, String)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Background sends land on another task; poll briefly
    pub async fn wait_for(&self, kind: Notification, id: &str) -> bool {
        for _ in 0..50 {
            if self.events().iter().any(|(k, i)| *k == kind && i == id) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn appointment_received(&self, appointment: &Appointment) -> Result<(), NotifyError> {
        self.record(Notification::Received, appointment);
        Ok(())
    }

    async fn appointment_confirmed(&self, appointment: &Appointment) -> Result<(), NotifyError> {
        self.record(Notification::Confirmed, appointment);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub cipher: PayloadCipher,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_vars(&[])
    }

    pub fn with_vars(extra: &[(&str, &str)]) -> Result<Self> {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::from_config(&test_config(extra))?.with_notifier(notifier.clone());

        // cheap bcrypt rounds keep registration tests fast
        let mut security = (*state.security).clone();
        security.password_cost = 4;
        let state = state.with_security(security);

        Ok(Self {
            router: app(state.clone()),
            state,
            notifier,
            cipher: PayloadCipher::new(ENCRYPTION_KEY)?,
        })
    }

    pub fn encrypt(&self, payload: &Value) -> Result<String> {
        Ok(self.cipher.encrypt(&payload.to_string())?)
    }

    /// Unwrap a `{"data": ciphertext}` response into the inner envelope
    pub fn decrypt(&self, wrapped: &Value) -> Result<Value> {
        let data = wrapped["data"].as_str().context("response is not encrypted")?;
        Ok(serde_json::from_slice(&self.cipher.decrypt(data)?)?)
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
        };
        Ok(TestResponse { status, headers, body })
    }

    /// GET with the payload encrypted into the `data` query parameter
    pub fn encrypted_get(&self, path: &str, payload: &Value) -> Result<RequestBuilder> {
        let data = self.encrypt(payload)?;
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", &data)
            .finish();
        Ok(RequestBuilder::new(Method::GET, &format!("{}?{}", path, query)))
    }

    /// POST with the payload encrypted into a JSON `{"data": ...}` body
    pub fn encrypted_post(&self, path: &str, payload: &Value) -> Result<RequestBuilder> {
        let data = self.encrypt(payload)?;
        Ok(RequestBuilder::new(Method::POST, path).json(&serde_json::json!({ "data": data })))
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Body,
}

impl RequestBuilder {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            // a fixed client address keeps rate-limit buckets per test predictable
            headers: vec![("x-forwarded-for".into(), "198.51.100.7".into())],
            body: Body::empty(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn basic(self, username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{}:{}", username, password));
        self.header(header::AUTHORIZATION.as_str(), &format!("Basic {}", encoded))
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header(header::AUTHORIZATION.as_str(), &format!("Bearer {}", token))
    }

    pub fn admin_token(self, token: &str) -> Self {
        self.header("x-admin-token", token)
    }

    pub fn json(mut self, value: &Value) -> Self {
        self.body = Body::from(value.to_string());
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    pub fn form(mut self, encoded: String) -> Self {
        self.body = Body::from(encoded);
        self.header(header::CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")
    }

    pub fn build(self) -> Result<Request<Body>> {
        let mut request = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), HeaderValue::from_str(value)?);
        }
        Ok(request.body(self.body)?)
    }
}

// ---------------------------------------------------------------------------
// Spawned binary

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_clinic-api-rust"));
        cmd.envs(test_vars(&[]))
            .env("CLINIC_API_PORT", port.to_string())
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
