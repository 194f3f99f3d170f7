#![allow(dead_code)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

use checkout_core::config::AppConfig;
use checkout_core::models::{Color, Coupon, Offer, Size, StockKey, StockLine};
use checkout_core::services::orders::CreateOrderRequest;
use checkout_core::services::payments::{expected_signature, VerifyPaymentRequest};
use checkout_core::services::pricing::{LineItemInput, QuoteRequest};
use checkout_core::stores::{CouponStore, OfferStore, StockStore};
use checkout_core::CheckoutApp;

pub fn test_app() -> CheckoutApp {
    checkout_core::logging::init("warn", false);
    CheckoutApp::in_memory(AppConfig::development())
}

pub async fn seed_stock(app: &CheckoutApp, product_id: Uuid, available: i32) {
    app.stores
        .stock
        .put(StockLine {
            product_id,
            size: Size::M,
            color: Color::Black,
            available,
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
}

pub async fn available_stock(app: &CheckoutApp, product_id: Uuid) -> Option<i32> {
    app.stores
        .stock
        .get(&StockKey::new(product_id, Size::M, Color::Black))
        .await
        .unwrap()
        .map(|line| line.available)
}

pub async fn seed_offer(app: &CheckoutApp, percent: i64, product_ids: &[Uuid]) -> Uuid {
    let offer = Offer {
        id: Uuid::new_v4(),
        name: "Test offer".to_string(),
        discount_percent: Decimal::from(percent),
        product_ids: product_ids.iter().copied().collect::<HashSet<_>>(),
        expires_at: Utc::now() + Duration::days(7),
        created_at: Utc::now(),
    };
    let id = offer.id;
    app.stores.offers.insert(offer).await.unwrap();
    id
}

pub async fn seed_coupon(app: &CheckoutApp, percent: i64, expired: bool) -> Uuid {
    let expires_at = if expired {
        Utc::now() - Duration::hours(1)
    } else {
        Utc::now() + Duration::days(7)
    };
    let coupon = Coupon {
        id: Uuid::new_v4(),
        code: "TESTCODE".to_string(),
        discount_percent: Decimal::from(percent),
        expires_at,
        created_at: Utc::now(),
    };
    let id = coupon.id;
    app.stores.coupons.insert(coupon).await.unwrap();
    id
}

pub fn line(product_id: Uuid, quantity: i32, unit_price: i64, offer_id: Option<Uuid>) -> LineItemInput {
    LineItemInput {
        product_id,
        size: Size::M,
        color: Color::Black,
        quantity,
        unit_price,
        offer_id,
    }
}

pub fn quote_request(lines: Vec<LineItemInput>, coupon_id: Option<Uuid>) -> QuoteRequest {
    QuoteRequest {
        currency: "USD".to_string(),
        lines,
        coupon_id,
    }
}

pub fn create_request(lines: Vec<LineItemInput>, coupon_id: Option<Uuid>) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: Uuid::new_v4(),
        order_number: format!("ORD-{}", Uuid::new_v4().simple()),
        currency: "USD".to_string(),
        lines,
        coupon_id,
        shipping_address_id: None,
        notes: None,
    }
}

/// A verification request carrying a signature computed with the app's own
/// gateway secret, i.e. what a genuine gateway callback would send.
pub fn signed_verification(app: &CheckoutApp, gateway_order_id: &str) -> VerifyPaymentRequest {
    let gateway_payment_id = format!("pay_{}", Uuid::new_v4().simple());
    let signature = expected_signature(
        &app.config.gateway.key_secret,
        gateway_order_id,
        &gateway_payment_id,
    );
    VerifyPaymentRequest {
        gateway_order_id: gateway_order_id.to_string(),
        gateway_payment_id,
        signature,
    }
}
