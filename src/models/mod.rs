pub mod pricing;
pub mod product_snapshot;
pub mod status;

pub use pricing::{generate_order_id, price_with_discount};
pub use product_snapshot::{MoreDetails, ProductSnapshot};
pub use status::{DeliveryStatus, OrderStatus, PaymentStatus};
