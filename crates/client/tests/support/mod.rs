#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};

pub const STUB_USERNAME: &str = "admin";
pub const STUB_PASSWORD: &str = "secret";
pub const STUB_TOKEN: &str = "stub-token";

#[derive(Debug, Clone)]
struct Reply {
    status: StatusCode,
    body: String,
}

impl Reply {
    fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}

#[derive(Debug)]
struct Recorded {
    products: Reply,
    movement: Reply,
    movements: Vec<Value>,
    product_requests: usize,
    authorization: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
struct StubState {
    inner: Arc<Mutex<Recorded>>,
}

impl StubState {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap()
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn list_products(State(state): State<StubState>, headers: HeaderMap) -> Response {
    let mut recorded = state.lock();
    recorded.product_requests += 1;
    recorded.authorization.push(authorization(&headers));
    recorded.products.clone().into_response()
}

async fn record_movement(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut recorded = state.lock();
    recorded.movements.push(body);
    recorded.authorization.push(authorization(&headers));
    recorded.movement.clone().into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == STUB_USERNAME && body["password"] == STUB_PASSWORD {
        Reply::json(StatusCode::OK, json!({ "token": STUB_TOKEN })).into_response()
    } else {
        Reply::json(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Invalid credentials" }),
        )
        .into_response()
    }
}

/// Inventory service stand-in on an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    state: StubState,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let state = StubState {
            inner: Arc::new(Mutex::new(Recorded {
                products: Reply::json(StatusCode::OK, json!([])),
                movement: Reply::json(StatusCode::OK, json!({ "status": "ok" })),
                movements: Vec::new(),
                product_requests: 0,
                authorization: Vec::new(),
            })),
        };

        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/transaction", post(record_movement))
            .route("/api/login", post(login))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    pub fn set_products(&self, products: Value) {
        self.state.lock().products = Reply::json(StatusCode::OK, products);
    }

    pub fn set_products_raw(&self, status: u16, body: &str) {
        self.state.lock().products = Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        };
    }

    pub fn set_movement_reply(&self, status: u16, body: Value) {
        self.state.lock().movement = Reply::json(StatusCode::from_u16(status).unwrap(), body);
    }

    pub fn set_movement_reply_raw(&self, status: u16, body: &str) {
        self.state.lock().movement = Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        };
    }

    pub fn movements(&self) -> Vec<Value> {
        self.state.lock().movements.clone()
    }

    pub fn product_requests(&self) -> usize {
        self.state.lock().product_requests
    }

    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.state.lock().authorization.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
