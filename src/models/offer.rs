use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A percentage discount scoped to a fixed set of products, with an expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub name: String,
    /// Discount percentage in the range 0-100
    pub discount_percent: Decimal,
    /// Products the offer can be applied to
    pub product_ids: HashSet<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// An offer is usable only while `now` is strictly before its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn applies_to(&self, product_id: Uuid) -> bool {
        self.product_ids.contains(&product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn offer(expires_at: DateTime<Utc>, product_ids: &[Uuid]) -> Offer {
        Offer {
            id: Uuid::new_v4(),
            name: "Spring sale".to_string(),
            discount_percent: dec!(20),
            product_ids: product_ids.iter().copied().collect(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn offer_expired_exactly_at_expiry() {
        let now = Utc::now();
        let o = offer(now, &[]);
        assert!(o.is_expired(now));
        assert!(!o.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn offer_applies_only_to_listed_products() {
        let product = Uuid::new_v4();
        let o = offer(Utc::now() + Duration::days(1), &[product]);
        assert!(o.applies_to(product));
        assert!(!o.applies_to(Uuid::new_v4()));
    }
}
