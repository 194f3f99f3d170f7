pub mod coupon;
pub mod offer;
pub mod order;
pub mod payment;
pub mod stock;
pub mod variant;

pub use coupon::Coupon;
pub use offer::Offer;
pub use order::{Order, OrderLine, OrderStatus, ReviewStatus};
pub use payment::{GatewayOrder, PaymentRecord, PaymentState};
pub use stock::{StockKey, StockLine};
pub use variant::{Color, Size};
