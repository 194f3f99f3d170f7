//! Checkout Core
//!
//! Order pricing, discount application, and payment reconciliation for
//! e-commerce storefronts. The crate computes chargeable order totals from
//! line items, per-product offers, and order-level coupons; verifies
//! payment-gateway signatures; and reconciles stock once a payment is
//! captured. HTTP routing, persistence, and authentication are left to the
//! surrounding system, which plugs in through the store traits.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod stores;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{orders::OrderService, payments::PaymentService, pricing::PricingService};
use crate::stores::AppStores;

/// Wires the configuration, stores, event channel, and services together.
#[derive(Clone)]
pub struct CheckoutApp {
    pub config: AppConfig,
    pub stores: AppStores,
    pub pricing: Arc<PricingService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
}

impl CheckoutApp {
    pub fn new(
        config: AppConfig,
        stores: AppStores,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        let pricing = Arc::new(PricingService::new(
            stores.offers.clone(),
            stores.coupons.clone(),
            stores.stock.clone(),
            config.pricing.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            stores.orders.clone(),
            stores.payments.clone(),
            pricing.clone(),
            event_sender.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            stores.orders.clone(),
            stores.payments.clone(),
            stores.stock.clone(),
            config.gateway.clone(),
            event_sender,
        ));

        Self {
            config,
            stores,
            pricing,
            orders,
            payments,
        }
    }

    /// An app backed by fresh in-memory stores, for tests and local
    /// development.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, AppStores::in_memory(), None)
    }
}
