use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Order, OrderLine, OrderStatus, PaymentState, ReviewStatus},
    services::pricing::{LineItemInput, OrderQuote, PricingService, QuoteRequest},
    stores::{OrderStore, PaymentStore},
};

/// Request/Response types for the order service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    #[validate(length(
        min = 1,
        max = 50,
        message = "Order number must be between 1 and 50 characters"
    ))]
    pub order_number: String,
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub currency: String,
    #[validate]
    pub lines: Vec<LineItemInput>,
    pub coupon_id: Option<Uuid>,
    pub shipping_address_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// The created order plus its pricing breakdown. `pricing.errors` carries
/// the per-line problems found while quoting; the order is persisted even
/// when that list is non-empty, and the caller decides how to present the
/// warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order: Order,
    pub pricing: OrderQuote,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for creating orders and driving them through their lifecycle.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    pricing: Arc<PricingService>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        pricing: Arc<PricingService>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            orders,
            payments,
            pricing,
            event_sender,
        }
    }

    /// Creates a new order priced from its line items, offers, and coupon.
    ///
    /// The order is persisted even when the quote accumulated line errors;
    /// the response carries them so the caller can report warnings.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, order_number = %request.order_number))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResponse, ServiceError> {
        request.validate()?;

        let quote_request = QuoteRequest {
            currency: request.currency.clone(),
            lines: request.lines.clone(),
            coupon_id: request.coupon_id,
        };
        let quote = self.pricing.quote_order(&quote_request, Utc::now()).await?;

        if !quote.errors.is_empty() {
            warn!(
                order_number = %request.order_number,
                error_count = quote.errors.len(),
                "Order priced with line errors, creating anyway"
            );
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            order_number: request.order_number,
            customer_id: request.customer_id,
            status: OrderStatus::Pending,
            review_status: ReviewStatus::Pending,
            currency: request.currency,
            lines: request
                .lines
                .into_iter()
                .map(|l| OrderLine {
                    product_id: l.product_id,
                    size: l.size,
                    color: l.color,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    offer_id: l.offer_id,
                })
                .collect(),
            coupon_id: request.coupon_id,
            subtotal: quote.subtotal,
            discount: quote.coupon.discount(),
            total_amount: quote.total,
            shipping_address_id: request.shipping_address_id,
            tracking_number: None,
            notes: request.notes,
            created_at: now,
            updated_at: Some(now),
            version: 1,
        };
        self.orders.insert(order.clone()).await?;

        info!(order_id = %order.id, total = order.total_amount, "Order created");
        self.emit(Event::OrderCreated(order.id)).await;

        Ok(CreateOrderResponse {
            order,
            pricing: quote,
        })
    }

    /// Retrieves an order by ID
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, ServiceError> {
        self.orders.get(order_id).await
    }

    /// Lists orders with pagination, newest first
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let (orders, total) = self.orders.list(page, per_page).await?;
        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Transitions an order to a new status, enforcing the lifecycle rules.
    ///
    /// A same-status update is a no-op. Moving to `Cancelled` also marks a
    /// captured payment as failed (compensating action, not a refund); stock
    /// already consumed is not restored.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<Order, ServiceError> {
        request.validate()?;

        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status;
        let new_status = request.status;

        if old_status == new_status {
            return Ok(order);
        }
        if !old_status.can_transition_to(new_status) {
            warn!(
                old_status = %old_status,
                "Rejected order status transition"
            );
            return Err(ServiceError::invalid_transition(old_status, new_status));
        }

        let mut order = order;
        order.status = new_status;
        if let Some(tracking_number) = request.tracking_number {
            order.tracking_number = Some(tracking_number);
        }
        if let Some(notes) = request.notes {
            order.notes = Some(notes);
        }
        order.updated_at = Some(Utc::now());
        order.version += 1;
        let order = self.orders.update(order).await?;

        if new_status == OrderStatus::Cancelled {
            self.fail_captured_payment(&order).await?;
        }

        info!(
            old_status = %old_status,
            new_status = %new_status,
            "Order status updated"
        );
        self.emit(Event::OrderStatusChanged {
            order_id: order.id,
            old_status,
            new_status,
        })
        .await;

        Ok(order)
    }

    /// Cancels an order. Allowed only before shipment; a cancelled paid
    /// order keeps its consumed stock and gets its payment marked failed.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<Order, ServiceError> {
        let order = self
            .update_status(
                order_id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Cancelled,
                    tracking_number: None,
                    notes: reason,
                },
            )
            .await?;

        self.emit(Event::OrderCancelled(order_id)).await;
        Ok(order)
    }

    /// Records the admin review decision for an order's contents. The
    /// review track is independent of fulfillment status.
    #[instrument(skip(self), fields(order_id = %order_id, decision = %decision))]
    pub async fn review_order(
        &self,
        order_id: Uuid,
        decision: ReviewStatus,
    ) -> Result<Order, ServiceError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let mut order = order;
        order.review_status = decision;
        order.updated_at = Some(Utc::now());
        order.version += 1;
        let order = self.orders.update(order).await?;

        info!("Order review recorded");
        self.emit(Event::OrderReviewed {
            order_id: order.id,
            decision,
        })
        .await;

        Ok(order)
    }

    /// Marks the order's captured payment as failed, if there is one.
    async fn fail_captured_payment(&self, order: &Order) -> Result<(), ServiceError> {
        let Some(payment) = self.payments.find_payment_by_order(order.id).await? else {
            return Ok(());
        };
        if payment.state != PaymentState::Captured {
            return Ok(());
        }

        let mut payment = payment;
        payment.state = PaymentState::Failed;
        payment.updated_at = Some(Utc::now());
        let payment = self.payments.update_payment(payment).await?;

        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            "Payment marked failed after cancellation"
        );
        self.emit(Event::PaymentFailed {
            order_id: order.id,
            payment_id: payment.id,
        })
        .await;
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send order event");
            }
        }
    }
}
