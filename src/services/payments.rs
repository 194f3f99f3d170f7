use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::GatewayConfig,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{GatewayOrder, Order, OrderStatus, PaymentRecord, PaymentState, StockKey},
    stores::{OrderStore, PaymentStore, StockStore},
};

type HmacSha256 = Hmac<Sha256>;

/// Inbound payment confirmation from the gateway callback.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "Gateway order id is required"))]
    pub gateway_order_id: String,
    #[validate(length(min = 1, message = "Gateway payment id is required"))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1, message = "Signature is required"))]
    pub signature: String,
}

/// Result of a successful verification: the persisted payment and the order
/// after its transition to `Placed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCaptured {
    pub payment_id: Uuid,
    pub order: Order,
}

/// Verifies gateway payment confirmations and reconciles the order and its
/// stock once a payment is proven genuine.
#[derive(Clone)]
pub struct PaymentService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    stock: Arc<dyn StockStore>,
    gateway: GatewayConfig,
    event_sender: Option<Arc<EventSender>>,
}

impl PaymentService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        stock: Arc<dyn StockStore>,
        gateway: GatewayConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            orders,
            payments,
            stock,
            gateway,
            event_sender,
        }
    }

    /// Registers a charge for the order's total with the gateway and records
    /// it so a later confirmation can be resolved back to the order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn create_gateway_order(&self, order_id: Uuid) -> Result<GatewayOrder, ServiceError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidStateTransition(format!(
                "order {} is '{}', not awaiting payment",
                order.id, order.status
            )));
        }

        let gateway_order = GatewayOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            order_id,
            amount: order.total_amount,
            currency: order.currency.clone(),
            created_at: Utc::now(),
        };
        self.payments
            .insert_gateway_order(gateway_order.clone())
            .await?;

        info!(
            gateway_order_id = %gateway_order.id,
            amount = gateway_order.amount,
            "Gateway order created"
        );
        Ok(gateway_order)
    }

    /// Verifies a payment confirmation.
    ///
    /// A signature mismatch aborts with no state change. On success the
    /// order's full stock demand is consumed as one unit of work, the
    /// payment record is persisted, and the order moves `Pending -> Placed`.
    #[instrument(skip(self, request), fields(gateway_order_id = %request.gateway_order_id))]
    pub async fn verify_payment(
        &self,
        request: VerifyPaymentRequest,
    ) -> Result<PaymentCaptured, ServiceError> {
        request.validate()?;

        let gateway_order = self
            .payments
            .get_gateway_order(&request.gateway_order_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Gateway order {} not found",
                    request.gateway_order_id
                ))
            })?;

        let expected = expected_signature(
            &self.gateway.key_secret,
            &request.gateway_order_id,
            &request.gateway_payment_id,
        );
        if !constant_time_eq(&expected, &request.signature) {
            warn!(order_id = %gateway_order.order_id, "Payment signature verification failed");
            return Err(ServiceError::InvalidPaymentSignature);
        }

        let order = self
            .orders
            .get(gateway_order.order_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", gateway_order.order_id))
            })?;

        // Only a pending order can be captured; a repeat confirmation for an
        // already placed order must not consume stock twice.
        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidStateTransition(format!(
                "order {} is '{}', expected 'pending'",
                order.id, order.status
            )));
        }

        let demands: Vec<(StockKey, i32)> = order
            .lines
            .iter()
            .map(|l| (StockKey::from(l), l.quantity))
            .collect();
        self.stock.decrement_all(&demands).await?;

        let now = Utc::now();
        let payment = PaymentRecord {
            id: Uuid::new_v4(),
            order_id: order.id,
            customer_id: order.customer_id,
            gateway_order_id: request.gateway_order_id.clone(),
            gateway_payment_id: request.gateway_payment_id.clone(),
            signature: request.signature.clone(),
            state: PaymentState::Captured,
            created_at: now,
            updated_at: None,
        };
        self.payments.insert_payment(payment.clone()).await?;

        let old_status = order.status;
        let mut order = order;
        order.status = OrderStatus::Placed;
        order.updated_at = Some(now);
        order.version += 1;
        let order = self.orders.update(order).await?;

        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            line_count = demands.len(),
            "Payment captured, order placed"
        );

        if let Some(sender) = &self.event_sender {
            for event in [
                Event::StockConsumed {
                    order_id: order.id,
                    line_count: demands.len(),
                },
                Event::PaymentCaptured {
                    order_id: order.id,
                    payment_id: payment.id,
                },
                Event::OrderStatusChanged {
                    order_id: order.id,
                    old_status,
                    new_status: order.status,
                },
            ] {
                if let Err(e) = sender.send(event).await {
                    warn!(error = %e, order_id = %order.id, "Failed to send payment event");
                }
            }
        }

        Ok(PaymentCaptured {
            payment_id: payment.id,
            order,
        })
    }
}

/// Expected gateway signature for a confirmation:
/// `hex(HMAC-SHA256(secret, "<gateway_order_id>|<gateway_payment_id>"))`.
pub fn expected_signature(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}|{}", gateway_order_id, gateway_payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
