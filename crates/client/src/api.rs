//! HTTP bindings for the remote inventory service.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stocklog_core::{CatalogEntry, Direction, MovementIntent, Quantity};

use crate::config::ClientConfig;

/// Body of `POST /api/transaction`.
///
/// The service resolves `product_name` to an existing product or creates
/// one; product ids are never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub product_name: String,
    pub quantity: Quantity,
    #[serde(rename = "type")]
    pub direction: Direction,
}

impl From<&MovementIntent> for MovementRequest {
    fn from(intent: &MovementIntent) -> Self {
        Self {
            product_name: intent.product.name().to_string(),
            quantity: intent.quantity,
            direction: intent.direction,
        }
    }
}

/// Body of `POST /api/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Structured error body the service returns with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, IO).
    #[error("network error: {0}")]
    Network(String),
    /// The service declined the request and said why.
    #[error("rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// Non-2xx status without a usable `detail`.
    #[error("unexpected response status {status}")]
    Unexpected { status: u16 },
    /// A 2xx body that could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// True when the message was authored by the service.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}

/// The subset of the inventory service the client depends on.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// `GET /api/products`
    async fn list_products(&self) -> Result<Vec<CatalogEntry>, ApiError>;

    /// `POST /api/transaction`; the response body is ignored.
    async fn record_movement(&self, request: &MovementRequest) -> Result<(), ApiError>;

    /// `POST /api/login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
}

/// `reqwest`-backed service client.
#[derive(Debug)]
pub struct HttpInventoryService {
    client: reqwest::Client,
    api_url: String,
    token: RwLock<Option<String>>,
}

impl HttpInventoryService {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    /// Replace (or drop) the bearer token attached to every request.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        let req = self.client.request(method, url);

        let token = self.token.read().unwrap_or_else(|e| e.into_inner());
        match token.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| ApiError::Network(e.to_string()))?;
        Err(match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(ErrorBody { detail }) => ApiError::Rejected { status, detail },
            Err(_) => ApiError::Unexpected { status },
        })
    }
}

#[async_trait]
impl InventoryService for HttpInventoryService {
    async fn list_products(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        let resp = self
            .send(self.request(reqwest::Method::GET, "/api/products"))
            .await?;

        resp.json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse product list: {}", e)))
    }

    async fn record_movement(&self, request: &MovementRequest) -> Result<(), ApiError> {
        self.send(self.request(reqwest::Method::POST, "/api/transaction").json(request))
            .await?;
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let resp = self
            .send(self.request(reqwest::Method::POST, "/api/login").json(request))
            .await?;

        resp.json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse login response: {}", e)))
    }
}
