use calcdesk_core::solvers::irr::{compute_irr, IrrInput};
use calcdesk_core::time_value::{
    compute_annuity_value, compute_compound_growth, AnnuityInput, AnnuityKind, AnnuityTiming,
    CompoundGrowthInput,
};
use calcdesk_core::{CalcError, Frequency};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

// ===========================================================================
// Annuities
// ===========================================================================

fn annuity(kind: AnnuityKind, rate_pct: Decimal) -> AnnuityInput {
    AnnuityInput {
        kind,
        payment: dec!(250),
        annual_rate_pct: rate_pct,
        periods: 8,
        frequency: Frequency::Quarterly,
        timing: AnnuityTiming::Ordinary,
    }
}

#[test]
fn test_zero_rate_annuity_is_payment_times_periods() {
    for kind in [AnnuityKind::FutureValue, AnnuityKind::PresentValue] {
        let out = compute_annuity_value(&annuity(kind, Decimal::ZERO)).unwrap();
        assert_eq!(out.result.value, dec!(8000));
        assert_eq!(out.result.total_periods, 32);
        assert_eq!(out.result.interest_component, Decimal::ZERO);
    }
}

#[test]
fn test_future_value_exceeds_present_value() {
    let fv = compute_annuity_value(&annuity(AnnuityKind::FutureValue, dec!(6))).unwrap();
    let pv = compute_annuity_value(&annuity(AnnuityKind::PresentValue, dec!(6))).unwrap();
    assert!(fv.result.value > dec!(8000));
    assert!(pv.result.value < dec!(8000));
    // FV = PV * (1 + i)^N
    let growth = fv.result.value / pv.result.value;
    let expected = (Decimal::ONE + dec!(0.015)).powu(32);
    assert!((growth - expected).abs() < dec!(0.0000001));
}

#[test]
fn test_annuity_outside_decimal_range_is_overflow_error() {
    for (kind, timing) in [
        (AnnuityKind::FutureValue, AnnuityTiming::Ordinary),
        (AnnuityKind::FutureValue, AnnuityTiming::Due),
    ] {
        let input = AnnuityInput {
            payment: Decimal::MAX / dec!(1000),
            annual_rate_pct: dec!(50),
            periods: 100,
            frequency: Frequency::Annually,
            timing,
            ..annuity(kind, dec!(50))
        };
        let err = compute_annuity_value(&input).unwrap_err();
        assert!(matches!(err, CalcError::Overflow { .. }), "{kind:?} {timing:?}: {err}");
    }
}

#[test]
fn test_compound_growth_doubles_at_rule_of_72() {
    let out = compute_compound_growth(&CompoundGrowthInput {
        principal: dec!(1000),
        annual_rate_pct: dec!(7.2),
        years: 10,
        compounding: Frequency::Annually,
    })
    .unwrap();
    let fv = out.result.future_value;
    assert!(fv > dec!(1990) && fv < dec!(2010), "fv {fv}");
    assert_eq!(out.result.schedule.len(), 10);
}

// ===========================================================================
// IRR
// ===========================================================================

#[test]
fn test_irr_single_period() {
    let out = compute_irr(&IrrInput {
        cash_flows: vec![dec!(-1000), dec!(1100)],
    })
    .unwrap();
    assert!((out.result.irr - dec!(0.10)).abs() < dec!(0.0001));
    assert!((out.result.irr_pct - dec!(10)).abs() < dec!(0.01));
}

#[test]
fn test_irr_project_flows() {
    let out = compute_irr(&IrrInput {
        cash_flows: vec![dec!(-10_000), dec!(3_000), dec!(4_200), dec!(6_800)],
    })
    .unwrap();
    // Excel IRR gives 16.34%
    assert!((out.result.irr - dec!(0.1634)).abs() < dec!(0.0005), "irr {}", out.result.irr);
    assert!(out.result.iterations <= 100);
}

#[test]
fn test_irr_rejects_missing_outflow() {
    let err = compute_irr(&IrrInput {
        cash_flows: vec![dec!(100), dec!(200)],
    })
    .unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_irr_above_bracket_is_no_solution() {
    let err = compute_irr(&IrrInput {
        cash_flows: vec![dec!(-100), dec!(500)],
    })
    .unwrap_err();
    assert!(matches!(err, CalcError::NoSolution { .. }));
}
