use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::OrderLine;
use crate::models::variant::{Color, Size};

/// Identifies the stock record of one product variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: Uuid,
    pub size: Size,
    pub color: Color,
}

impl StockKey {
    pub fn new(product_id: Uuid, size: Size, color: Color) -> Self {
        Self {
            product_id,
            size,
            color,
        }
    }
}

impl From<&OrderLine> for StockKey {
    fn from(line: &OrderLine) -> Self {
        Self::new(line.product_id, line.size, line.color)
    }
}

/// Available quantity of one product variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLine {
    pub product_id: Uuid,
    pub size: Size,
    pub color: Color,
    pub available: i32,
    pub updated_at: DateTime<Utc>,
}

impl StockLine {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.product_id, self.size, self.color)
    }
}
