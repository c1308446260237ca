use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stocklog_core::CatalogEntry;
use tokio::sync::Notify;

use crate::api::{ApiError, InventoryService, LoginRequest, LoginResponse, MovementRequest};

/// In-memory `InventoryService` that records what it was asked to do.
pub(crate) struct FakeService {
    products: Mutex<Result<Vec<CatalogEntry>, ApiError>>,
    movement_result: Mutex<Result<(), ApiError>>,
    login_result: Mutex<Result<LoginResponse, ApiError>>,
    movements: Mutex<Vec<MovementRequest>>,
    logins: Mutex<Vec<LoginRequest>>,
    product_calls: AtomicUsize,
    /// When set, `record_movement` parks here after recording the request.
    gate: Option<Arc<Notify>>,
    /// When set, `list_products` parks here after counting the call.
    products_gate: Option<Arc<Notify>>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self {
            products: Mutex::new(Ok(Vec::new())),
            movement_result: Mutex::new(Ok(())),
            login_result: Mutex::new(Err(ApiError::Rejected {
                status: 401,
                detail: "Invalid credentials".to_string(),
            })),
            movements: Mutex::new(Vec::new()),
            logins: Mutex::new(Vec::new()),
            product_calls: AtomicUsize::new(0),
            gate: None,
            products_gate: None,
        }
    }

    pub(crate) fn with_products(self, products: Vec<CatalogEntry>) -> Self {
        *self.products.lock().unwrap() = Ok(products);
        self
    }

    pub(crate) fn failing_products(self, err: ApiError) -> Self {
        *self.products.lock().unwrap() = Err(err);
        self
    }

    pub(crate) fn failing_movements(self, err: ApiError) -> Self {
        *self.movement_result.lock().unwrap() = Err(err);
        self
    }

    pub(crate) fn with_login_token(self, token: &str) -> Self {
        *self.login_result.lock().unwrap() = Ok(LoginResponse {
            token: token.to_string(),
        });
        self
    }

    pub(crate) fn failing_login(self, err: ApiError) -> Self {
        *self.login_result.lock().unwrap() = Err(err);
        self
    }

    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn gated_products(mut self, gate: Arc<Notify>) -> Self {
        self.products_gate = Some(gate);
        self
    }

    pub(crate) fn set_movement_result(&self, result: Result<(), ApiError>) {
        *self.movement_result.lock().unwrap() = result;
    }

    pub(crate) fn set_products(&self, products: Result<Vec<CatalogEntry>, ApiError>) {
        *self.products.lock().unwrap() = products;
    }

    pub(crate) fn movements(&self) -> Vec<MovementRequest> {
        self.movements.lock().unwrap().clone()
    }

    pub(crate) fn movement_count(&self) -> usize {
        self.movements.lock().unwrap().len()
    }

    pub(crate) fn logins(&self) -> Vec<LoginRequest> {
        self.logins.lock().unwrap().clone()
    }

    pub(crate) fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn entry(id: u64, name: &str, stock: i64) -> CatalogEntry {
    CatalogEntry {
        id: id.into(),
        name: name.to_string(),
        category: None,
        stock: Some(stock),
    }
}

#[async_trait]
impl InventoryService for FakeService {
    async fn list_products(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.products_gate {
            gate.notified().await;
        }
        self.products.lock().unwrap().clone()
    }

    async fn record_movement(&self, request: &MovementRequest) -> Result<(), ApiError> {
        self.movements.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.movement_result.lock().unwrap().clone()
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.logins.lock().unwrap().push(request.clone());
        self.login_result.lock().unwrap().clone()
    }
}
