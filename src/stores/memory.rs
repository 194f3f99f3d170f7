//! In-memory store implementations backing tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Coupon, GatewayOrder, Offer, Order, PaymentRecord, StockKey, StockLine};
use crate::stores::{CouponStore, OfferStore, OrderStore, PaymentStore, StockStore};

#[derive(Debug, Default)]
pub struct InMemoryOfferStore {
    offers: DashMap<Uuid, Offer>,
}

#[async_trait]
impl OfferStore for InMemoryOfferStore {
    async fn get(&self, id: Uuid) -> Result<Option<Offer>, ServiceError> {
        Ok(self.offers.get(&id).map(|entry| entry.clone()))
    }

    async fn insert(&self, offer: Offer) -> Result<(), ServiceError> {
        self.offers.insert(offer.id, offer);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCouponStore {
    coupons: DashMap<Uuid, Coupon>,
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn get(&self, id: Uuid) -> Result<Option<Coupon>, ServiceError> {
        Ok(self.coupons.get(&id).map(|entry| entry.clone()))
    }

    async fn insert(&self, coupon: Coupon) -> Result<(), ServiceError> {
        self.coupons.insert(coupon.id, coupon);
        Ok(())
    }
}

/// Stock lives behind a single lock rather than a sharded map so that
/// [`StockStore::decrement_all`] can check and apply a multi-variant demand
/// atomically.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    lines: RwLock<HashMap<StockKey, StockLine>>,
}

impl InMemoryStockStore {
    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<StockKey, StockLine>>, ServiceError> {
        self.lines
            .read()
            .map_err(|_| ServiceError::StoreError("stock lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<StockKey, StockLine>>, ServiceError> {
        self.lines
            .write()
            .map_err(|_| ServiceError::StoreError("stock lock poisoned".to_string()))
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn get(&self, key: &StockKey) -> Result<Option<StockLine>, ServiceError> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn put(&self, line: StockLine) -> Result<(), ServiceError> {
        self.write()?.insert(line.key(), line);
        Ok(())
    }

    async fn decrement_all(&self, demands: &[(StockKey, i32)]) -> Result<(), ServiceError> {
        // Combine demands per variant so two lines for the same variant are
        // checked against their summed quantity.
        let mut combined: HashMap<StockKey, i32> = HashMap::new();
        for (key, quantity) in demands {
            *combined.entry(*key).or_insert(0) += quantity;
        }

        let mut lines = self.write()?;

        // Validate everything before mutating anything.
        for (key, quantity) in &combined {
            let line = lines.get(key).ok_or_else(|| {
                ServiceError::InvalidProduct(format!(
                    "no stock record for product {} ({}/{})",
                    key.product_id, key.size, key.color
                ))
            })?;
            if line.available < *quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "product {} ({}/{}): requested {}, available {}",
                    key.product_id, key.size, key.color, quantity, line.available
                )));
            }
        }

        let now = Utc::now();
        for (key, quantity) in &combined {
            if let Some(line) = lines.get_mut(key) {
                line.available -= quantity;
                line.updated_at = now;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<Uuid, Order>,
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, id: Uuid) -> Result<Option<Order>, ServiceError> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }

    async fn insert(&self, order: Order) -> Result<(), ServiceError> {
        self.orders.insert(order.id, order);
        Ok(())
    }

    async fn update(&self, order: Order) -> Result<Order, ServiceError> {
        if !self.orders.contains_key(&order.id) {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                order.id
            )));
        }
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<Order>, u64), ServiceError> {
        if page == 0 || per_page == 0 {
            return Err(ServiceError::ValidationError(
                "page and per_page must be positive".to_string(),
            ));
        }

        let mut all: Vec<Order> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = all.len() as u64;
        let start = ((page - 1) * per_page) as usize;
        let orders = all
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        Ok((orders, total))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    gateway_orders: DashMap<String, GatewayOrder>,
    payments: DashMap<Uuid, PaymentRecord>,
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert_gateway_order(&self, gateway_order: GatewayOrder) -> Result<(), ServiceError> {
        self.gateway_orders
            .insert(gateway_order.id.clone(), gateway_order);
        Ok(())
    }

    async fn get_gateway_order(&self, id: &str) -> Result<Option<GatewayOrder>, ServiceError> {
        Ok(self.gateway_orders.get(id).map(|entry| entry.clone()))
    }

    async fn insert_payment(&self, payment: PaymentRecord) -> Result<(), ServiceError> {
        self.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<PaymentRecord>, ServiceError> {
        Ok(self.payments.get(&id).map(|entry| entry.clone()))
    }

    async fn find_payment_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PaymentRecord>, ServiceError> {
        Ok(self
            .payments
            .iter()
            .find(|entry| entry.value().order_id == order_id)
            .map(|entry| entry.value().clone()))
    }

    async fn update_payment(
        &self,
        payment: PaymentRecord,
    ) -> Result<PaymentRecord, ServiceError> {
        if !self.payments.contains_key(&payment.id) {
            return Err(ServiceError::NotFound(format!(
                "Payment {} not found",
                payment.id
            )));
        }
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, Size};
    use assert_matches::assert_matches;

    fn stock_line(product_id: Uuid, available: i32) -> StockLine {
        StockLine {
            product_id,
            size: Size::M,
            color: Color::Black,
            available,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn decrement_all_applies_every_demand() {
        let store = InMemoryStockStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.put(stock_line(a, 10)).await.unwrap();
        store.put(stock_line(b, 5)).await.unwrap();

        let demands = vec![
            (StockKey::new(a, Size::M, Color::Black), 4),
            (StockKey::new(b, Size::M, Color::Black), 5),
        ];
        store.decrement_all(&demands).await.unwrap();

        let a_line = store
            .get(&StockKey::new(a, Size::M, Color::Black))
            .await
            .unwrap()
            .unwrap();
        let b_line = store
            .get(&StockKey::new(b, Size::M, Color::Black))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a_line.available, 6);
        assert_eq!(b_line.available, 0);
    }

    #[tokio::test]
    async fn decrement_all_is_all_or_nothing() {
        let store = InMemoryStockStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.put(stock_line(a, 10)).await.unwrap();
        store.put(stock_line(b, 1)).await.unwrap();

        let demands = vec![
            (StockKey::new(a, Size::M, Color::Black), 4),
            (StockKey::new(b, Size::M, Color::Black), 2),
        ];
        let result = store.decrement_all(&demands).await;
        assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

        // The first demand must not have been applied.
        let a_line = store
            .get(&StockKey::new(a, Size::M, Color::Black))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a_line.available, 10);
    }

    #[tokio::test]
    async fn decrement_all_combines_demands_for_the_same_variant() {
        let store = InMemoryStockStore::default();
        let a = Uuid::new_v4();
        store.put(stock_line(a, 5)).await.unwrap();

        let key = StockKey::new(a, Size::M, Color::Black);
        let result = store.decrement_all(&[(key, 3), (key, 3)]).await;
        assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

        let line = store.get(&key).await.unwrap().unwrap();
        assert_eq!(line.available, 5);
    }

    #[tokio::test]
    async fn order_list_is_paginated_newest_first() {
        let store = InMemoryOrderStore::default();
        let mut ids = Vec::new();
        for i in 0..5 {
            let order = crate::models::Order {
                id: Uuid::new_v4(),
                order_number: format!("ORD-{:04}", i),
                customer_id: Uuid::new_v4(),
                status: crate::models::OrderStatus::Pending,
                review_status: crate::models::ReviewStatus::Pending,
                currency: "USD".to_string(),
                lines: vec![],
                coupon_id: None,
                subtotal: 100,
                discount: 0,
                total_amount: 100,
                shipping_address_id: None,
                tracking_number: None,
                notes: None,
                created_at: Utc::now() + chrono::Duration::seconds(i),
                updated_at: None,
                version: 1,
            };
            ids.push(order.id);
            store.insert(order).await.unwrap();
        }

        let (first_page, total) = store.list(1, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(first_page.len(), 2);
        // Newest first: the last inserted order leads.
        assert_eq!(first_page[0].id, ids[4]);

        let (last_page, _) = store.list(3, 2).await.unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].id, ids[0]);
    }
}
