use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Outcome of a captured payment. `Failed` is also used as the compensating
/// mark when a paid order is cancelled (not a refund).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentState {
    Captured,
    Failed,
}

/// A charge request registered with the payment gateway before the client
/// pays. Verification resolves the gateway order id back to the owning
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Identifier issued to the gateway, e.g. `order_9f2c...`
    pub id: String,
    pub order_id: Uuid,
    /// Amount to charge, in minor currency units
    pub amount: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// A verified payment confirmation tied to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    pub state: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
