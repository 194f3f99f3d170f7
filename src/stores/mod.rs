//! Persistence seams for the checkout services.
//!
//! The services only ever talk to these traits; the surrounding system is
//! expected to provide database-backed implementations. The in-memory
//! implementations in [`memory`] back the test suite and local development.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Coupon, GatewayOrder, Offer, Order, PaymentRecord, StockKey, StockLine};

pub mod memory;

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Offer>, ServiceError>;
    async fn insert(&self, offer: Offer) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Coupon>, ServiceError>;
    async fn insert(&self, coupon: Coupon) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait StockStore: Send + Sync {
    async fn get(&self, key: &StockKey) -> Result<Option<StockLine>, ServiceError>;
    async fn put(&self, line: StockLine) -> Result<(), ServiceError>;

    /// Decrements every requested variant as a single unit of work: either
    /// all demands are applied or none are. Demands for the same variant are
    /// combined before checking availability.
    async fn decrement_all(&self, demands: &[(StockKey, i32)]) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Order>, ServiceError>;
    async fn insert(&self, order: Order) -> Result<(), ServiceError>;
    async fn update(&self, order: Order) -> Result<Order, ServiceError>;

    /// Returns one page of orders, newest first, plus the total count.
    /// Pages are 1-based.
    async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<Order>, u64), ServiceError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_gateway_order(&self, gateway_order: GatewayOrder) -> Result<(), ServiceError>;
    async fn get_gateway_order(&self, id: &str) -> Result<Option<GatewayOrder>, ServiceError>;

    async fn insert_payment(&self, payment: PaymentRecord) -> Result<(), ServiceError>;
    async fn get_payment(&self, id: Uuid) -> Result<Option<PaymentRecord>, ServiceError>;
    async fn find_payment_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PaymentRecord>, ServiceError>;
    async fn update_payment(&self, payment: PaymentRecord)
        -> Result<PaymentRecord, ServiceError>;
}

/// The full set of store handles the services are wired with.
#[derive(Clone)]
pub struct AppStores {
    pub offers: Arc<dyn OfferStore>,
    pub coupons: Arc<dyn CouponStore>,
    pub stock: Arc<dyn StockStore>,
    pub orders: Arc<dyn OrderStore>,
    pub payments: Arc<dyn PaymentStore>,
}

impl AppStores {
    /// Fresh in-memory stores, used by tests and local development.
    pub fn in_memory() -> Self {
        Self {
            offers: Arc::new(memory::InMemoryOfferStore::default()),
            coupons: Arc::new(memory::InMemoryCouponStore::default()),
            stock: Arc::new(memory::InMemoryStockStore::default()),
            orders: Arc::new(memory::InMemoryOrderStore::default()),
            payments: Arc::new(memory::InMemoryPaymentStore::default()),
        }
    }
}
