use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Highest list price a product may carry. Keeps line and order totals
/// inside the `numeric(16, 4)` money columns.
pub const MAX_UNIT_PRICE: Decimal = dec!(10_000_000);

/// Decimal places stored for money columns.
pub const MONEY_SCALE: u32 = 4;

/// Unit price after a percentage discount.
///
/// The discount amount is rounded up to the next whole currency unit, so
/// `price_with_discount(101, 3)` is `97`, not `97.97`. Discounts outside
/// `0..=100` are clamped.
pub fn price_with_discount(price: Decimal, discount_pct: Decimal) -> Decimal {
    let pct = discount_pct.clamp(Decimal::ZERO, HUNDRED);
    if pct.is_zero() {
        return price;
    }
    let discount = (price * pct / HUNDRED).ceil();
    (price - discount).max(Decimal::ZERO)
}

/// Amount in minor currency units (paise/cents) as the payment provider expects.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * HUNDRED).round().to_i64()
}

/// Inverse of [`to_minor_units`].
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2).normalize()
}

/// Customer-facing order number: `ORD-` followed by 32 uppercase hex digits.
pub fn generate_order_id() -> String {
    format!(
        "ORD-{}",
        Uuid::new_v4().simple().to_string().to_ascii_uppercase()
    )
}
