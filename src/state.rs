//! Shared application state handed to the router

use crate::auth::{Gate, TokenVerifier};
use crate::config::Config;
use crate::images::ImageStore;
use crate::notify::Outbox;
use crate::services::{OrderService, ProductService, PurchaseService};
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub purchases: Arc<PurchaseService>,
    pub gate: Arc<Gate>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services once per process; used by the binary and by the
    /// integration tests with their respective backends.
    pub fn assemble(
        store: Arc<dyn Store>,
        images: Arc<dyn ImageStore>,
        verifier: Arc<dyn TokenVerifier>,
        outbox: Outbox,
        nats: Option<async_nats::Client>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            products: Arc::new(ProductService::new(store.clone(), images)),
            orders: Arc::new(OrderService::new(store.clone(), outbox, nats, config.admin_email.clone())),
            purchases: Arc::new(PurchaseService::new(store.clone())),
            gate: Arc::new(Gate::new(verifier, store)),
            config,
        }
    }
}
