use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service-level error type shared by every service in the crate.
///
/// Per-line pricing problems are deliberately NOT variants here: they are
/// collected into [`LineError`] lists and returned alongside the computed
/// total, so a single bad line never aborts the whole quote.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid payment signature")]
    InvalidPaymentSignature,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<::config::ConfigError> for ServiceError {
    fn from(err: ::config::ConfigError) -> Self {
        ServiceError::ConfigError(err.to_string())
    }
}

impl ServiceError {
    /// Convenience constructor for transition failures, keeping the message
    /// format uniform across services.
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        ServiceError::InvalidStateTransition(format!(
            "cannot transition from '{}' to '{}'",
            from, to
        ))
    }
}

/// A non-fatal problem with a single order line, reported by index so the
/// caller can point the client at the offending item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineError {
    pub line_index: usize,
    pub product_id: Uuid,
    pub reason: LineErrorReason,
}

/// Why a line failed one of the pricing checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineErrorReason {
    #[error("offer not found")]
    OfferNotFound,

    #[error("offer does not apply to this product")]
    OfferNotApplicable,

    #[error("offer expired")]
    OfferExpired,

    #[error("no stock record for this product variant")]
    InvalidProduct,

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_format() {
        let err = ServiceError::invalid_transition("shipped", "cancelled");
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot transition from 'shipped' to 'cancelled'"
        );
    }

    #[test]
    fn line_error_reason_serializes_with_kind_tag() {
        let reason = LineErrorReason::InsufficientStock {
            requested: 5,
            available: 2,
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "insufficient_stock");
        assert_eq!(json["requested"], 5);
        assert_eq!(json["available"], 2);
    }

    #[test]
    fn line_error_reason_displays_quantities() {
        let reason = LineErrorReason::InsufficientStock {
            requested: 3,
            available: 1,
        };
        assert_eq!(
            reason.to_string(),
            "insufficient stock: requested 3, available 1"
        );
    }
}
