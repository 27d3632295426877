use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::CalcError;
use crate::solvers::{bisect, BisectionConfig};
use crate::time_value::npv;
use crate::types::{rate_to_pct, with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

/// Lowest periodic rate searched (-99%).
pub const IRR_LOWER_BOUND: Rate = dec!(-0.99);
/// Highest periodic rate searched (100%).
pub const IRR_UPPER_BOUND: Rate = dec!(1.0);
const MAX_IRR_ITERATIONS: u32 = 100;
const IRR_TOLERANCE: Decimal = dec!(0.00001);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    /// Per-period flows; index 0 is the initial investment
    pub cash_flows: Vec<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    /// Periodic IRR as a decimal (0.10 = 10%)
    pub irr: Rate,
    pub irr_pct: Decimal,
    pub npv_at_irr: Money,
    pub iterations: u32,
    pub periods: usize,
}

/// Internal Rate of Return by bisection over [-99%, 100%].
///
/// The first flow must be an outflow and at least one later flow an inflow.
/// A rate outside the search bracket is reported as `NoSolution`.
pub fn compute_irr(input: &IrrInput) -> CalcResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_cash_flows(&input.cash_flows)?;

    let sign_changes = input
        .cash_flows
        .windows(2)
        .filter(|w| !w[0].is_zero() && !w[1].is_zero())
        .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
        .count();
    if sign_changes > 1 {
        warn!(sign_changes, "IRR may not be unique");
        warnings.push(format!(
            "Cash flows change sign {sign_changes} times; multiple IRRs may exist and only one is reported"
        ));
    }

    let config = BisectionConfig {
        lower: IRR_LOWER_BOUND,
        upper: IRR_UPPER_BOUND,
        max_iterations: MAX_IRR_ITERATIONS,
        tolerance: IRR_TOLERANCE,
    };
    let root = bisect("IRR", &config, |rate| {
        npv_preserving_sign(rate, &input.cash_flows)
    })?;

    let output = IrrOutput {
        irr: root.value,
        irr_pct: rate_to_pct(root.value),
        npv_at_irr: root.residual,
        iterations: root.iterations,
        periods: input.cash_flows.len(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "IRR via bisection on NPV over [-0.99, 1.0]",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_cash_flows(flows: &[Money]) -> CalcResult<()> {
    if flows.len() < 2 {
        return Err(CalcError::invalid(
            "cash_flows",
            "IRR requires at least 2 cash flows",
        ));
    }
    if flows[0] >= Decimal::ZERO {
        return Err(CalcError::invalid(
            "cash_flows",
            "First cash flow must be a negative investment",
        ));
    }
    if !flows[1..].iter().any(|cf| *cf > Decimal::ZERO) {
        return Err(CalcError::invalid(
            "cash_flows",
            "At least one later cash flow must be positive",
        ));
    }
    Ok(())
}

/// NPV for the root-finder. At the edges of the bracket the discount factor
/// can leave the Decimal range; the flows compounded forward to the last
/// period have the same sign there, which is all bisection needs.
fn npv_preserving_sign(rate: Rate, flows: &[Money]) -> CalcResult<Decimal> {
    match npv(rate, flows) {
        Ok(value) => Ok(value),
        Err(CalcError::Overflow { .. }) | Err(CalcError::DivisionByZero { .. }) => {
            terminal_value(rate, flows)
        }
        Err(e) => Err(e),
    }
}

/// Σ flow[t] * (1+r)^(T-t), evaluated in Horner form.
fn terminal_value(rate: Rate, flows: &[Money]) -> CalcResult<Decimal> {
    let growth = Decimal::ONE + rate;
    flows.iter().try_fold(Decimal::ZERO, |acc, cf| {
        acc.checked_mul(growth)
            .and_then(|v| v.checked_add(*cf))
            .ok_or_else(|| CalcError::overflow("IRR terminal value"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn irr_of(flows: &[Decimal]) -> CalcResult<ComputationOutput<IrrOutput>> {
        compute_irr(&IrrInput {
            cash_flows: flows.to_vec(),
        })
    }

    #[test]
    fn test_single_period_ten_percent() {
        let out = irr_of(&[dec!(-1000), dec!(1100)]).unwrap();
        assert!((out.result.irr_pct - dec!(10.0)).abs() < dec!(0.01));
        assert!(out.result.npv_at_irr.abs() < IRR_TOLERANCE);
    }

    #[test]
    fn test_level_inflows() {
        let out = irr_of(&[dec!(-1000), dec!(400), dec!(400), dec!(400)]).unwrap();
        // IRR ≈ 9.70%
        assert!((out.result.irr - dec!(0.0970)).abs() < dec!(0.0005));
    }

    #[test]
    fn test_no_negative_initial_flow_rejected() {
        let err = irr_of(&[dec!(1000), dec!(1100)]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_no_positive_later_flow_rejected() {
        let err = irr_of(&[dec!(-1000), dec!(-100), dec!(0)]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_single_flow_rejected() {
        assert!(irr_of(&[dec!(-1000)]).is_err());
    }

    #[test]
    fn test_rate_above_bracket_is_no_solution() {
        // True IRR is 900%
        let err = irr_of(&[dec!(-100), dec!(1000)]).unwrap_err();
        assert!(matches!(err, CalcError::NoSolution { .. }));
    }

    #[test]
    fn test_rate_below_bracket_is_no_solution() {
        // True IRR is -99.9%
        let err = irr_of(&[dec!(-1000), dec!(1)]).unwrap_err();
        assert!(matches!(err, CalcError::NoSolution { .. }));
    }

    #[test]
    fn test_long_series_survives_extreme_bound() {
        // 0.01^t underflows the discount factor at the lower bound for t >= 15
        let mut flows = vec![dec!(-1000)];
        flows.extend(std::iter::repeat(dec!(100)).take(30));
        let out = irr_of(&flows).unwrap();
        // 30-year level annuity of 100 on 1000 ≈ 9.31%
        assert!((out.result.irr - dec!(0.0931)).abs() < dec!(0.001));
    }

    #[test]
    fn test_multiple_sign_changes_warns() {
        let out = irr_of(&[dec!(-100), dec!(200), dec!(-50), dec!(50)]).unwrap();
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_terminal_value_matches_sign_of_npv() {
        let flows = [dec!(-1000), dec!(600), dec!(600)];
        let rate = dec!(0.05);
        let tv = terminal_value(rate, &flows).unwrap();
        let pv = npv(rate, &flows).unwrap();
        assert_eq!(tv.is_sign_negative(), pv.is_sign_negative());
        assert!((tv - pv * dec!(1.1025)).abs() < dec!(0.000001));
    }
}
