//! Property-based tests for pricing, formatting and row conversion.

use chrono::{TimeZone, Utc};
use meu_bentin::{
    adapters::{PersistenceAdapter, ProductAdapter},
    entities::product,
    format::{format_brl, format_cents},
    models::{compute_margin, PaymentMethod, Sale, SaleItem, SaleStatus},
    validation::MAX_AMOUNT,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn cents_strategy() -> impl Strategy<Value = i64> {
    1i64..10_000_000
}

fn list_column_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![
        ".{0,16}",
        "[A-Z0-9 ]{0,3}(,[A-Z0-9 ]{0,3}){0,3}",
        prop::collection::vec(".{0,4}", 0..4)
            .prop_map(|entries| serde_json::to_string(&entries).unwrap()),
    ])
}

fn product_row_strategy() -> impl Strategy<Value = product::Model> {
    (
        "[A-Za-z ]{1,20}",
        cents_strategy(),
        cents_strategy(),
        0i32..500,
        list_column_strategy(),
        list_column_strategy(),
        any::<bool>(),
        proptest::option::of("[a-z]{3,10}"),
    )
        .prop_map(
            |(name, price, cost, quantity, sizes, colors, active, category)| {
                let price = Decimal::new(price, 2);
                let cost_price = Decimal::new(cost, 2);
                let stamp = Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap();
                product::Model {
                    id: Uuid::new_v4(),
                    name,
                    code: "VES-AB12".to_string(),
                    category,
                    brand: None,
                    description: None,
                    price,
                    cost_price,
                    margin: compute_margin(price, cost_price).ok().flatten(),
                    quantity,
                    min_quantity: 2,
                    sizes,
                    colors,
                    fabric: None,
                    gender: None,
                    image_url: None,
                    active,
                    created_at: stamp,
                    updated_at: stamp,
                }
            },
        )
}

fn digits_value(rendered: &str) -> i64 {
    rendered
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .expect("rendering has digits")
}

// Property: rows survive the trip through the application record
proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn product_rows_round_trip(row in product_row_strategy()) {
        let record = ProductAdapter::to_internal(row.clone());
        prop_assert_eq!(ProductAdapter::to_remote(&record), row);
    }

    #[test]
    fn edited_lists_are_read_back_as_written(
        row in product_row_strategy(),
        sizes in prop::collection::vec(".{0,6}", 0..4),
    ) {
        let mut record = ProductAdapter::to_internal(row);
        record.sizes = sizes.clone();
        let written = ProductAdapter::to_remote(&record);
        prop_assert_eq!(ProductAdapter::to_internal(written).sizes, sizes);
    }
}

// Property: margin is markup over cost
proptest! {
    #[test]
    fn margin_matches_markup_over_cost(price in cents_strategy(), cost in cents_strategy()) {
        let price = Decimal::new(price, 2);
        let cost = Decimal::new(cost, 2);
        let exact = (price - cost) / cost * Decimal::from(100);

        match compute_margin(price, cost) {
            Ok(Some(margin)) => {
                prop_assert!(margin.scale() <= 2);
                prop_assert!((margin - exact).abs() <= dec!(0.005), "{} vs {}", margin, exact);
                if price == cost {
                    prop_assert!(margin.is_zero());
                }
            }
            Ok(None) => prop_assert!(false, "cost is positive"),
            Err(_) => prop_assert!(exact.round_dp(2).abs() >= MAX_AMOUNT, "{} fits", exact),
        }
    }

    #[test]
    fn zero_cost_has_no_margin(price in cents_strategy()) {
        prop_assert_eq!(compute_margin(Decimal::new(price, 2), Decimal::ZERO).unwrap(), None);
    }
}

// Property: currency renderings keep their shape
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn price_mask_truncates_to_ten_centavos(raw in 0i64..1_000_000_000) {
        let rendered = format_cents(raw);
        prop_assert!(rendered.ends_with('0'), "last digit must be zero: {}", rendered);
        let comma = rendered.find(',').expect("decimal comma");
        prop_assert_eq!(rendered.len() - comma, 3);
        prop_assert_eq!(digits_value(&rendered), raw / 10 * 10);
    }

    #[test]
    fn brl_rendering_keeps_every_cent(cents in 0i64..10_000_000_000) {
        let rendered = format_brl(Decimal::new(cents, 2));
        prop_assert!(rendered.starts_with("R$ "), "missing prefix: {}", rendered);
        prop_assert_eq!(digits_value(&rendered), cents);
    }
}

// Property: totals never go negative and follow the items
proptest! {
    #[test]
    fn sale_total_is_subtotal_minus_discount(
        lines in prop::collection::vec((cents_strategy(), 1i32..10), 1..6),
        discount in 0i64..5_000_000,
    ) {
        let items: Vec<SaleItem> = lines
            .iter()
            .map(|(price, quantity)| {
                let unit_price = Decimal::new(*price, 2);
                SaleItem {
                    id: Uuid::new_v4(),
                    product_id: Uuid::new_v4(),
                    product_name: "Body".into(),
                    unit_price,
                    quantity: *quantity,
                    line_total: unit_price * Decimal::from(*quantity),
                }
            })
            .collect();
        let sale = Sale {
            id: Uuid::new_v4(),
            seller_id: None,
            customer_name: None,
            payment_method: PaymentMethod::Cash,
            discount: Decimal::new(discount, 2),
            notes: None,
            status: SaleStatus::Completed,
            sold_at: Utc::now(),
            updated_at: Utc::now(),
            items,
        };

        let expected_subtotal: Decimal = lines
            .iter()
            .map(|(price, quantity)| Decimal::new(*price, 2) * Decimal::from(*quantity))
            .sum();
        prop_assert_eq!(sale.subtotal(), expected_subtotal);
        prop_assert!(sale.total() >= Decimal::ZERO);
        prop_assert_eq!(
            sale.total(),
            (expected_subtotal - Decimal::new(discount, 2)).max(Decimal::ZERO)
        );
        prop_assert_eq!(sale.units(), lines.iter().map(|(_, q)| q).sum::<i32>());
    }
}
