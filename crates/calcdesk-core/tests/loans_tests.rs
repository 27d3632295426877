#![cfg(feature = "loans")]

use calcdesk_core::loans::affordability::{self, AffordabilityInput};
use calcdesk_core::loans::amortization::{self, AmortizationInput};
use calcdesk_core::loans::mortgage::{self, LoanProgram, MortgageInput};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Amortization
// ===========================================================================

fn thirty_year_loan() -> AmortizationInput {
    AmortizationInput {
        principal: dec!(200_000),
        annual_rate_pct: dec!(5),
        term_years: 30,
        extra_monthly_payment: None,
        start_date: None,
    }
}

#[test]
fn test_thirty_year_payment_and_interest() {
    let out = amortization::compute_amortization(&thirty_year_loan()).unwrap();
    let r = &out.result;

    assert_eq!(r.monthly_payment.round_dp(2), dec!(1073.64));
    assert_eq!(r.number_of_payments, 360);
    assert!(
        (r.total_interest - dec!(186_511.57)).abs() < dec!(1),
        "total interest {}",
        r.total_interest
    );
    assert_eq!(r.schedule.last().unwrap().ending_balance, Decimal::ZERO);
}

#[test]
fn test_first_period_split() {
    let out = amortization::compute_amortization(&thirty_year_loan()).unwrap();
    let first = &out.result.schedule[0];
    // 200k * 5% / 12
    assert_eq!(first.interest.round_dp(2), dec!(833.33));
    assert_eq!(first.principal.round_dp(2), dec!(240.31));
}

#[test]
fn test_extra_payment_shortens_loan() {
    let mut input = thirty_year_loan();
    input.extra_monthly_payment = Some(dec!(200));
    let out = amortization::compute_amortization(&input).unwrap();
    let r = &out.result;

    assert!(r.number_of_payments < 360);
    assert_eq!(r.months_saved, Some(360 - r.number_of_payments));
    assert!(r.interest_saved.unwrap() > dec!(40_000));
    let principal: Decimal = r.schedule.iter().map(|e| e.principal).sum();
    assert!((principal - dec!(200_000)).abs() < dec!(0.01));
}

#[test]
fn test_payment_dates_follow_start_date() {
    let mut input = thirty_year_loan();
    input.start_date = NaiveDate::from_ymd_opt(2024, 1, 31);
    let out = amortization::compute_amortization(&input).unwrap();
    let r = &out.result;

    // Month-end dates clamp to the shorter month
    assert_eq!(r.schedule[0].payment_date, NaiveDate::from_ymd_opt(2024, 2, 29));
    assert_eq!(r.payoff_date, NaiveDate::from_ymd_opt(2054, 1, 31));
}

#[test]
fn test_zero_principal_rejected() {
    let mut input = thirty_year_loan();
    input.principal = Decimal::ZERO;
    let err = amortization::compute_amortization(&input).unwrap_err();
    assert!(err.is_invalid_input());
}

proptest! {
    #[test]
    fn prop_schedule_retires_principal(
        cents in 100_000i64..100_000_000,
        rate_bp in 0i64..1_500,
        term_years in 1u32..=40,
    ) {
        let principal = Decimal::new(cents, 2);
        let input = AmortizationInput {
            principal,
            annual_rate_pct: Decimal::new(rate_bp, 2),
            term_years,
            extra_monthly_payment: None,
            start_date: None,
        };
        let out = amortization::compute_amortization(&input).unwrap();
        let schedule = &out.result.schedule;

        let paid: Decimal = schedule.iter().map(|e| e.principal).sum();
        prop_assert!((paid - principal).abs() < dec!(0.01), "paid {} of {}", paid, principal);
        prop_assert_eq!(schedule.last().unwrap().ending_balance, Decimal::ZERO);
        prop_assert!(schedule.iter().all(|e| e.ending_balance >= Decimal::ZERO));
    }
}

// ===========================================================================
// Mortgage
// ===========================================================================

fn conventional(down_payment: Decimal) -> MortgageInput {
    MortgageInput {
        home_price: dec!(300_000),
        down_payment,
        annual_rate_pct: dec!(6.5),
        term_years: 30,
        property_tax_rate_pct: dec!(1.2),
        annual_insurance: dec!(1_200),
        monthly_hoa: Decimal::ZERO,
        program: LoanProgram::Conventional,
        pmi_rate_pct: dec!(0.5),
        va_subsequent_use: false,
        va_funding_fee_exempt: false,
    }
}

#[test]
fn test_twenty_percent_down_has_no_pmi() {
    let out = mortgage::compute_mortgage_payment(&conventional(dec!(60_000))).unwrap();
    let r = &out.result;
    assert_eq!(r.monthly_mortgage_insurance, Decimal::ZERO);
    assert_eq!(r.monthly_property_tax, dec!(300));
    assert_eq!(r.monthly_insurance, dec!(100));
    assert_eq!(r.total_monthly_payment, r.principal_and_interest + dec!(400));
}

#[test]
fn test_low_down_payment_adds_pmi() {
    let out = mortgage::compute_mortgage_payment(&conventional(dec!(15_000))).unwrap();
    assert!(out.result.monthly_mortgage_insurance > Decimal::ZERO);
    assert!(out.result.mortgage_insurance_months > 0);
}

// ===========================================================================
// Affordability
// ===========================================================================

fn buyer(annual_income: Decimal) -> AffordabilityInput {
    AffordabilityInput {
        annual_income,
        monthly_debts: dec!(300),
        down_payment: dec!(40_000),
        annual_rate_pct: dec!(6),
        term_years: 30,
        property_tax_rate_pct: dec!(1),
        insurance_rate_pct: dec!(0.3),
        front_end_limit_pct: dec!(28),
        back_end_limit_pct: dec!(36),
    }
}

#[test]
fn test_affordable_piti_meets_budget() {
    let out = affordability::compute_affordability(&buyer(dec!(90_000))).unwrap();
    let r = &out.result;
    assert!(r.monthly_piti <= r.max_monthly_payment);
    assert!(r.max_monthly_payment - r.monthly_piti < dec!(0.05));
    assert!(r.max_home_price > dec!(40_000));
}

#[test]
fn test_price_never_drops_across_dime_raises() {
    let make = |annual_income: Decimal| AffordabilityInput {
        property_tax_rate_pct: dec!(1.1),
        insurance_rate_pct: dec!(0.35),
        ..buyer(annual_income)
    };

    let mut previous: Option<(Decimal, Decimal)> = None;
    for step in 0..1_000i64 {
        let income = dec!(90_000) + Decimal::new(step, 1);
        let r = affordability::compute_affordability(&make(income)).unwrap().result;
        assert!(r.monthly_piti <= r.max_monthly_payment, "PITI over budget at {income}");
        if let Some((prev_income, prev_price)) = previous {
            assert!(
                r.max_home_price >= prev_price,
                "income {income} buys {} but {prev_income} bought {prev_price}",
                r.max_home_price
            );
        }
        previous = Some((income, r.max_home_price));
    }
}

proptest! {
    #[test]
    fn prop_higher_income_never_buys_less(
        income_cents in 3_000_000i64..40_000_000,
        raise_cents in prop_oneof![1i64..10_000, 10_000i64..10_000_000],
        down in 0i64..50_000,
        rate_tenths in 30i64..=90,
        long_term in any::<bool>(),
        debts in 0i64..500,
    ) {
        let make = |annual_income_cents: i64| AffordabilityInput {
            annual_income: Decimal::new(annual_income_cents, 2),
            monthly_debts: Decimal::from(debts),
            down_payment: Decimal::from(down),
            annual_rate_pct: Decimal::new(rate_tenths, 1),
            term_years: if long_term { 30 } else { 15 },
            property_tax_rate_pct: dec!(1.1),
            insurance_rate_pct: dec!(0.35),
            front_end_limit_pct: dec!(28),
            back_end_limit_pct: dec!(36),
        };

        let lower = affordability::compute_affordability(&make(income_cents));
        prop_assume!(lower.is_ok());
        let higher = affordability::compute_affordability(&make(income_cents + raise_cents));
        prop_assert!(higher.is_ok());

        let lower_price = lower.unwrap().result.max_home_price;
        let higher_price = higher.unwrap().result.max_home_price;
        prop_assert!(higher_price >= lower_price, "{} < {}", higher_price, lower_price);
    }
}
