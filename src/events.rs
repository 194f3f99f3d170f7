use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::order::{OrderStatus, ReviewStatus};

/// Events emitted by the checkout services. Consumers (webhooks, email,
/// analytics) subscribe on the receiving end of the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderCancelled(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderReviewed {
        order_id: Uuid,
        decision: ReviewStatus,
    },

    // Payment events
    PaymentCaptured {
        order_id: Uuid,
        payment_id: Uuid,
    },
    PaymentFailed {
        order_id: Uuid,
        payment_id: Uuid,
    },

    // Inventory events
    StockConsumed {
        order_id: Uuid,
        line_count: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a bounded channel and wraps the sending half.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}
