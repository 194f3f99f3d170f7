use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::variant::{Color, Size};

/// Fulfillment status of an order.
///
/// The happy path is `Pending -> Placed -> Shipped -> Delivered`; an order
/// may be diverted to `Cancelled` from `Pending` or `Placed` only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OrderStatus {
    Pending,
    Placed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the transition `self -> next` is allowed. A same-status
    /// update is treated as a no-op and allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Placed) | (Pending, Cancelled) => true,
            (Placed, Shipped) | (Placed, Cancelled) => true,
            (Shipped, Delivered) => true,
            _ => self == next,
        }
    }
}

/// Admin review of the order contents, independent of fulfillment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReviewStatus {
    Pending,
    Accepted,
    Rejected,
}

/// One ordered product variant with a quantity and an optional offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub size: Size,
    pub color: Color,
    pub quantity: i32,
    /// Unit price in minor currency units
    pub unit_price: i64,
    pub offer_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub review_status: ReviewStatus,
    pub currency: String,
    pub lines: Vec<OrderLine>,
    pub coupon_id: Option<Uuid>,
    /// Sum of line totals after per-line offers, in minor units
    pub subtotal: i64,
    /// Order-level coupon discount, in minor units
    pub discount: i64,
    /// Final chargeable amount, in minor units
    pub total_amount: i64,
    pub shipping_address_id: Option<Uuid>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}
