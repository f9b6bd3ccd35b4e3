use grocery_api::models::pricing::{from_minor_units, price_with_discount, to_minor_units};
use grocery_api::models::{generate_order_id, DeliveryStatus, OrderStatus};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn amount() -> impl Strategy<Value = Decimal> {
    // Two-decimal prices up to 1,000,000.00
    (0i64..100_000_000).prop_map(|minor| Decimal::new(minor, 2))
}

fn percent() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|basis| Decimal::new(basis, 2))
}

proptest! {
    #[test]
    fn discounted_price_stays_between_zero_and_list(price in amount(), pct in percent()) {
        let discounted = price_with_discount(price, pct);
        prop_assert!(discounted >= Decimal::ZERO);
        prop_assert!(discounted <= price);
    }

    #[test]
    fn discount_is_rounded_up_to_a_whole_unit(price in amount(), pct in percent()) {
        let discounted = price_with_discount(price, pct);
        let taken = price - discounted;
        prop_assume!(discounted > Decimal::ZERO);
        prop_assert_eq!(taken, taken.trunc());
        prop_assert!(taken >= price * pct / dec!(100));
    }

    #[test]
    fn zero_discount_is_identity(price in amount()) {
        prop_assert_eq!(price_with_discount(price, Decimal::ZERO), price);
    }

    #[test]
    fn minor_units_round_trip(price in amount()) {
        let minor = to_minor_units(price).expect("fits in i64");
        prop_assert_eq!(from_minor_units(minor), price);
    }

    #[test]
    fn order_status_never_returns_to_processing(idx in 0usize..7) {
        let all = [
            OrderStatus::ReadyForDispatch,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::FailedDelivery,
            OrderStatus::Returned,
            OrderStatus::Cancelled,
            OrderStatus::Processing,
        ];
        let from = all[idx];
        prop_assert_eq!(from.can_transition_to(OrderStatus::Processing), from == OrderStatus::Processing);
    }

    #[test]
    fn terminal_delivery_states_are_final(idx in 0usize..4, next in 0usize..4) {
        let terminal = [
            DeliveryStatus::Rejected,
            DeliveryStatus::DeliveredSuccessfully,
            DeliveryStatus::FailedDelivery,
            DeliveryStatus::ReturnToSeller,
        ];
        let from = terminal[idx];
        let to = terminal[next];
        prop_assert_eq!(from.can_transition_to(to), from == to);
    }
}

#[test]
fn documented_examples() {
    assert_eq!(price_with_discount(dec!(100), dec!(10)), dec!(90));
    assert_eq!(price_with_discount(dec!(101), dec!(3)), dec!(97));
}

#[test]
fn order_numbers_are_unique_and_well_formed() {
    let a = generate_order_id();
    let b = generate_order_id();
    assert_ne!(a, b);
    assert!(a.starts_with("ORD-"));
    assert_eq!(a.len(), 36);
    assert!(a[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}
