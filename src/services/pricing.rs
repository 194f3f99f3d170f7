use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{ExpiredCouponPolicy, PricingConfig},
    errors::{LineError, LineErrorReason, ServiceError},
    models::{Color, Size, StockKey},
    stores::{CouponStore, OfferStore, StockStore},
};

/// One line of an order to be priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    pub product_id: Uuid,
    pub size: Size,
    pub color: Color,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    /// Unit price in minor currency units
    #[validate(range(min = 0, message = "Unit price must not be negative"))]
    pub unit_price: i64,
    pub offer_id: Option<Uuid>,
}

/// Request to price an order. Inputs are validated before any lookup runs,
/// so the computation never sees malformed quantities or prices.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuoteRequest {
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub currency: String,
    #[validate]
    pub lines: Vec<LineItemInput>,
    pub coupon_id: Option<Uuid>,
}

/// Priced result for a single line. `line_total` uses the effective unit
/// price, which equals `unit_price` whenever no usable offer applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuote {
    pub line_index: usize,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub effective_unit_price: i64,
    pub line_total: i64,
}

/// What happened to the order-level coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponOutcome {
    NotRequested,
    Applied { coupon_id: Uuid, discount: i64 },
    Expired { coupon_id: Uuid },
    NotFound { coupon_id: Uuid },
}

impl CouponOutcome {
    pub fn discount(&self) -> i64 {
        match self {
            CouponOutcome::Applied { discount, .. } => *discount,
            _ => 0,
        }
    }

    /// Whether a coupon was named on the request, regardless of whether it
    /// produced a discount.
    pub fn was_attempted(&self) -> bool {
        !matches!(self, CouponOutcome::NotRequested)
    }
}

/// The priced order: per-line totals, subtotal after offers, coupon outcome,
/// clamped final total, and every non-fatal line problem found on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub currency: String,
    pub lines: Vec<LineQuote>,
    /// Sum of line totals after per-line offers, in minor units
    pub subtotal: i64,
    pub coupon: CouponOutcome,
    /// Final chargeable amount, never below the configured minimum charge
    pub total: i64,
    /// Line problems, sorted by line index
    pub errors: Vec<LineError>,
}

struct PricedLine {
    quote: LineQuote,
    errors: Vec<LineError>,
}

/// Prices orders against reference data (offers, coupons, stock). Owns no
/// state of its own: identical inputs and `now` always produce the same
/// quote.
#[derive(Clone)]
pub struct PricingService {
    offers: Arc<dyn OfferStore>,
    coupons: Arc<dyn CouponStore>,
    stock: Arc<dyn StockStore>,
    config: PricingConfig,
}

impl PricingService {
    pub fn new(
        offers: Arc<dyn OfferStore>,
        coupons: Arc<dyn CouponStore>,
        stock: Arc<dyn StockStore>,
        config: PricingConfig,
    ) -> Self {
        Self {
            offers,
            coupons,
            stock,
            config,
        }
    }

    /// Prices an order.
    ///
    /// Per-line problems (bad offer, missing or short stock) are accumulated
    /// and returned with the quote rather than aborting it; only malformed
    /// input, store failures, and the strict expired-coupon policy produce an
    /// `Err`.
    #[instrument(skip(self, request), fields(line_count = request.lines.len()))]
    pub async fn quote_order(
        &self,
        request: &QuoteRequest,
        now: DateTime<Utc>,
    ) -> Result<OrderQuote, ServiceError> {
        request.validate()?;
        if request.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one line item is required".to_string(),
            ));
        }

        // Offer and stock lookups for different lines run concurrently with
        // no completion-order guarantee; folding the results by line index
        // keeps the output deterministic.
        let priced = join_all(
            request
                .lines
                .iter()
                .enumerate()
                .map(|(index, line)| self.price_line(index, line, now)),
        )
        .await;

        let mut lines = Vec::with_capacity(priced.len());
        let mut errors = Vec::new();
        let mut subtotal: i64 = 0;
        for result in priced {
            let priced_line = result?;
            subtotal += priced_line.quote.line_total;
            errors.extend(priced_line.errors);
            lines.push(priced_line.quote);
        }
        errors.sort_by_key(|e| e.line_index);

        let coupon = self.resolve_coupon(request.coupon_id, subtotal, now).await?;
        if matches!(coupon, CouponOutcome::Expired { .. })
            && self.config.expired_coupon_policy == ExpiredCouponPolicy::Reject
        {
            return Err(ServiceError::ValidationError(
                "Coupon has expired".to_string(),
            ));
        }

        let unclamped = subtotal - coupon.discount();
        let total = if unclamped <= 0 {
            self.config.minimum_charge
        } else {
            unclamped
        };

        Ok(OrderQuote {
            currency: request.currency.clone(),
            lines,
            subtotal,
            coupon,
            total,
            errors,
        })
    }

    async fn price_line(
        &self,
        index: usize,
        line: &LineItemInput,
        now: DateTime<Utc>,
    ) -> Result<PricedLine, ServiceError> {
        let mut errors = Vec::new();
        let mut effective_unit_price = line.unit_price;

        if let Some(offer_id) = line.offer_id {
            match self.offers.get(offer_id).await? {
                None => errors.push(LineError {
                    line_index: index,
                    product_id: line.product_id,
                    reason: LineErrorReason::OfferNotFound,
                }),
                Some(offer) if !offer.applies_to(line.product_id) => errors.push(LineError {
                    line_index: index,
                    product_id: line.product_id,
                    reason: LineErrorReason::OfferNotApplicable,
                }),
                Some(offer) if offer.is_expired(now) => errors.push(LineError {
                    line_index: index,
                    product_id: line.product_id,
                    reason: LineErrorReason::OfferExpired,
                }),
                Some(offer) => {
                    effective_unit_price =
                        line.unit_price - percent_of(line.unit_price, offer.discount_percent);
                }
            }
        }

        let key = StockKey::new(line.product_id, line.size, line.color);
        match self.stock.get(&key).await? {
            None => errors.push(LineError {
                line_index: index,
                product_id: line.product_id,
                reason: LineErrorReason::InvalidProduct,
            }),
            Some(stock) if stock.available < line.quantity => errors.push(LineError {
                line_index: index,
                product_id: line.product_id,
                reason: LineErrorReason::InsufficientStock {
                    requested: line.quantity,
                    available: stock.available,
                },
            }),
            Some(_) => {}
        }

        let line_total = effective_unit_price * i64::from(line.quantity);
        Ok(PricedLine {
            quote: LineQuote {
                line_index: index,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                effective_unit_price,
                line_total,
            },
            errors,
        })
    }

    async fn resolve_coupon(
        &self,
        coupon_id: Option<Uuid>,
        subtotal: i64,
        now: DateTime<Utc>,
    ) -> Result<CouponOutcome, ServiceError> {
        let Some(id) = coupon_id else {
            return Ok(CouponOutcome::NotRequested);
        };

        match self.coupons.get(id).await? {
            None => {
                warn!(coupon_id = %id, "Coupon not found, skipping discount");
                Ok(CouponOutcome::NotFound { coupon_id: id })
            }
            Some(coupon) if coupon.is_expired(now) => {
                warn!(coupon_id = %id, code = %coupon.code, "Coupon expired, skipping discount");
                Ok(CouponOutcome::Expired { coupon_id: id })
            }
            Some(coupon) => Ok(CouponOutcome::Applied {
                coupon_id: id,
                discount: percent_of(subtotal, coupon.discount_percent),
            }),
        }
    }
}

/// Discount amount for `percent` of `amount`, in minor units, rounded to the
/// nearest unit (midpoint away from zero) and clamped to `[0, amount]` so a
/// malformed percentage can never drive a value negative.
pub fn percent_of(amount: i64, percent: Decimal) -> i64 {
    let discount = (Decimal::from(amount) * percent / Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    discount.to_i64().unwrap_or(0).clamp(0, amount)
}
