#![cfg(feature = "depreciation")]

use calcdesk_core::depreciation::{compute_depreciation, DepreciationInput, DepreciationMethod};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn expenses(input: &DepreciationInput) -> Vec<Decimal> {
    compute_depreciation(input)
        .unwrap()
        .result
        .schedule
        .iter()
        .map(|e| e.depreciation_expense)
        .collect()
}

#[test]
fn test_straight_line_equal_charges() {
    let input = DepreciationInput {
        cost: dec!(50_000),
        salvage_value: dec!(5_000),
        useful_life_years: 5,
        method: DepreciationMethod::StraightLine,
    };
    let out = compute_depreciation(&input).unwrap();
    let r = &out.result;

    assert_eq!(expenses(&input), vec![dec!(9000); 5]);
    assert_eq!(r.schedule[4].ending_book_value, dec!(5000));
    assert_eq!(r.schedule[4].accumulated_depreciation, dec!(45000));
    assert_eq!(r.total_depreciation, r.depreciable_base);
}

#[test]
fn test_declining_balance_stops_at_salvage() {
    let input = DepreciationInput {
        cost: dec!(10_000),
        salvage_value: dec!(3_000),
        useful_life_years: 5,
        method: DepreciationMethod::DoubleDecliningBalance,
    };
    // Year 3 would take 1440 but only 600 remains above salvage
    assert_eq!(
        expenses(&input),
        vec![dec!(4000), dec!(2400), dec!(600), dec!(0), dec!(0)]
    );
    let out = compute_depreciation(&input).unwrap();
    assert!(out
        .result
        .schedule
        .iter()
        .all(|e| e.ending_book_value >= dec!(3000)));
}

#[test]
fn test_methods_depreciate_same_total() {
    let totals: Vec<Decimal> = [
        DepreciationMethod::StraightLine,
        DepreciationMethod::DoubleDecliningBalance,
        DepreciationMethod::SumOfYearsDigits,
    ]
    .into_iter()
    .map(|method| {
        let input = DepreciationInput {
            cost: dec!(24_000),
            salvage_value: dec!(2_000),
            useful_life_years: 7,
            method,
        };
        compute_depreciation(&input).unwrap().result.total_depreciation
    })
    .collect();

    for total in totals {
        assert!((total - dec!(22_000)).abs() < dec!(0.000001), "total {total}");
    }
}

fn method_strategy() -> impl Strategy<Value = DepreciationMethod> {
    prop_oneof![
        Just(DepreciationMethod::StraightLine),
        Just(DepreciationMethod::DoubleDecliningBalance),
        Just(DepreciationMethod::SumOfYearsDigits),
    ]
}

proptest! {
    #[test]
    fn prop_book_value_lands_on_salvage(
        cost_cents in 100_000i64..100_000_000,
        salvage_share in 0i64..=100,
        life in 1u32..=40,
        method in method_strategy(),
    ) {
        let cost = Decimal::new(cost_cents, 2);
        let salvage = (cost * Decimal::new(salvage_share, 2)).round_dp(2);
        let input = DepreciationInput {
            cost,
            salvage_value: salvage,
            useful_life_years: life,
            method,
        };
        let out = compute_depreciation(&input).unwrap();
        let schedule = &out.result.schedule;

        prop_assert_eq!(schedule.len(), life as usize);
        prop_assert_eq!(schedule.last().unwrap().ending_book_value, salvage);
        prop_assert!(schedule.iter().all(|e| e.ending_book_value >= salvage));
        prop_assert!(schedule.iter().all(|e| e.depreciation_expense >= Decimal::ZERO));
        let accumulated = schedule.last().unwrap().accumulated_depreciation;
        prop_assert!((accumulated - (cost - salvage)).abs() < dec!(0.0001));
    }
}
