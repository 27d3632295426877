pub mod irr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CalcError;
use crate::CalcResult;

/// Search bracket and stopping rules for [`bisect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BisectionConfig {
    pub lower: Decimal,
    pub upper: Decimal,
    pub max_iterations: u32,
    /// Stop once |f(x)| or the half-width of the bracket drops below this.
    /// [`bisect_feasible`] also reports its answer on a grid of this step.
    pub tolerance: Decimal,
}

/// A root located by [`bisect`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub value: Decimal,
    /// f(value); within tolerance of zero unless the bracket collapsed first
    pub residual: Decimal,
    pub iterations: u32,
}

/// Find a zero of `f` on `[lower, upper]` by repeated halving.
///
/// `f` must change sign across the bracket; if it does not, the root is not
/// bracketed and `NoSolution` is returned rather than an edge value. Running
/// out of iterations is a `ConvergenceFailure`.
pub fn bisect<F>(function: &str, config: &BisectionConfig, mut f: F) -> CalcResult<Root>
where
    F: FnMut(Decimal) -> CalcResult<Decimal>,
{
    let mut lo = config.lower;
    let mut hi = config.upper;
    if lo >= hi {
        return Err(CalcError::NoSolution {
            function: function.into(),
            reason: format!("empty search bracket [{lo}, {hi}]"),
        });
    }

    let mut f_lo = f(lo)?;
    if f_lo.abs() < config.tolerance {
        return Ok(Root {
            value: lo,
            residual: f_lo,
            iterations: 0,
        });
    }
    let f_hi = f(hi)?;
    if f_hi.abs() < config.tolerance {
        return Ok(Root {
            value: hi,
            residual: f_hi,
            iterations: 0,
        });
    }
    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        return Err(CalcError::NoSolution {
            function: function.into(),
            reason: format!("no sign change across [{lo}, {hi}]; root is not bracketed"),
        });
    }

    for i in 1..=config.max_iterations {
        let mid = (lo + hi) / dec!(2);
        let f_mid = f(mid)?;

        if f_mid.abs() < config.tolerance || (hi - lo) / dec!(2) < config.tolerance {
            debug!(function, iterations = i, root = %mid, residual = %f_mid, "bisection converged");
            return Ok(Root {
                value: mid,
                residual: f_mid,
                iterations: i,
            });
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(CalcError::ConvergenceFailure {
        function: function.into(),
        iterations: config.max_iterations,
        last_delta: hi - lo,
    })
}

/// Largest point of a `tolerance`-step grid in `[lower, upper]` where a
/// non-decreasing `f` is still `<= 0`.
///
/// Unlike [`bisect`], which may stop on either side of the root, the bracket
/// here always keeps `f(lo) <= 0 < f(hi)` and only stops once it is narrower
/// than one grid step. The answer is then snapped down to the grid and nudged
/// up one step if that point is still feasible, so it does not depend on the
/// path the halving took. `f(lower) > 0` or `f(upper) <= 0` means the boundary
/// is not inside the bracket and is reported as `NoSolution`.
pub fn bisect_feasible<F>(function: &str, config: &BisectionConfig, mut f: F) -> CalcResult<Root>
where
    F: FnMut(Decimal) -> CalcResult<Decimal>,
{
    let step = config.tolerance;
    if step <= Decimal::ZERO {
        return Err(CalcError::invalid("tolerance", "Grid step must be positive"));
    }
    let mut lo = config.lower;
    let mut hi = config.upper;
    if lo >= hi {
        return Err(CalcError::NoSolution {
            function: function.into(),
            reason: format!("empty search bracket [{lo}, {hi}]"),
        });
    }
    if f(lo)? > Decimal::ZERO {
        return Err(CalcError::NoSolution {
            function: function.into(),
            reason: format!("no feasible point: f({lo}) is already above zero"),
        });
    }
    if f(hi)? <= Decimal::ZERO {
        return Err(CalcError::NoSolution {
            function: function.into(),
            reason: format!("boundary lies beyond the search bracket: f({hi}) is not above zero"),
        });
    }

    let width = |lo: Decimal, hi: Decimal| {
        hi.checked_sub(lo)
            .ok_or_else(|| CalcError::overflow(format!("{function} bracket width")))
    };
    let mut iterations = 0;
    while width(lo, hi)? >= step {
        if iterations == config.max_iterations {
            return Err(CalcError::ConvergenceFailure {
                function: function.into(),
                iterations,
                last_delta: width(lo, hi)?,
            });
        }
        iterations += 1;
        let mid = lo / dec!(2) + hi / dec!(2);
        if f(mid)? <= Decimal::ZERO {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    // The boundary sits in [lo, hi), so at most one grid step separates the
    // floor of lo from the answer.
    let mut value = lo
        .checked_div(step)
        .and_then(|steps| steps.floor().checked_mul(step))
        .ok_or_else(|| CalcError::overflow(format!("{function} grid snap")))?
        .max(config.lower);
    let mut residual = f(value)?;
    let next = value
        .checked_add(step)
        .ok_or_else(|| CalcError::overflow(format!("{function} grid snap")))?;
    if next < hi {
        let f_next = f(next)?;
        if f_next <= Decimal::ZERO {
            value = next;
            residual = f_next;
        }
    }

    debug!(function, iterations, boundary = %value, residual = %residual, "feasible bisection converged");
    Ok(Root {
        value,
        residual,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lower: Decimal, upper: Decimal) -> BisectionConfig {
        BisectionConfig {
            lower,
            upper,
            max_iterations: 100,
            tolerance: dec!(0.000001),
        }
    }

    #[test]
    fn test_bisect_square_root_of_two() {
        let root = bisect("sqrt2", &config(dec!(0), dec!(2)), |x| Ok(x * x - dec!(2))).unwrap();
        assert!((root.value - dec!(1.414213)).abs() < dec!(0.00001));
        assert!(root.iterations > 0);
    }

    #[test]
    fn test_bisect_decreasing_function() {
        let root = bisect("linear", &config(dec!(0), dec!(10)), |x| Ok(dec!(4) - x)).unwrap();
        assert!((root.value - dec!(4)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_bisect_root_at_bound() {
        let root = bisect("edge", &config(dec!(3), dec!(5)), |x| Ok(x - dec!(3))).unwrap();
        assert_eq!(root.value, dec!(3));
        assert_eq!(root.iterations, 0);
    }

    #[test]
    fn test_bisect_unbracketed_is_no_solution() {
        let err = bisect("sq", &config(dec!(-1), dec!(1)), |x| Ok(x * x + dec!(1))).unwrap_err();
        assert!(matches!(err, CalcError::NoSolution { .. }));
    }

    #[test]
    fn test_bisect_iteration_cap_is_convergence_failure() {
        let cfg = BisectionConfig {
            lower: dec!(0),
            upper: dec!(1000),
            max_iterations: 3,
            tolerance: dec!(0.0000001),
        };
        let err = bisect("slow", &cfg, |x| Ok(x - dec!(333.333))).unwrap_err();
        assert!(matches!(
            err,
            CalcError::ConvergenceFailure { iterations: 3, .. }
        ));
    }

    #[test]
    fn test_bisect_empty_bracket() {
        let err = bisect("empty", &config(dec!(2), dec!(2)), |x| Ok(x)).unwrap_err();
        assert!(matches!(err, CalcError::NoSolution { .. }));
    }

    fn cents(lower: Decimal, upper: Decimal) -> BisectionConfig {
        BisectionConfig {
            lower,
            upper,
            max_iterations: 100,
            tolerance: dec!(0.01),
        }
    }

    #[test]
    fn test_bisect_feasible_lands_on_largest_grid_point() {
        // x / 3 <= 10.005 holds up to 30.015
        let root =
            bisect_feasible("third", &cents(dec!(0), dec!(1000)), |x| Ok(x / dec!(3) - dec!(10.005)))
                .unwrap();
        assert_eq!(root.value, dec!(30.01));
        assert!(root.residual <= Decimal::ZERO);
    }

    #[test]
    fn test_bisect_feasible_ignores_bracket_path() {
        let f = |x: Decimal| Ok(x * dec!(0.0062) - dec!(2014.0));
        let a = bisect_feasible("slope", &cents(dec!(0), dec!(900000)), f).unwrap();
        let b = bisect_feasible("slope", &cents(dec!(17.3), dec!(900000.07)), f).unwrap();
        assert_eq!(a.value, b.value);
        assert!(f(a.value).unwrap() <= Decimal::ZERO);
        assert!(f(a.value + dec!(0.01)).unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_bisect_feasible_exact_boundary_is_kept() {
        let root = bisect_feasible("exact", &cents(dec!(0), dec!(100)), |x| Ok(x - dec!(42))).unwrap();
        assert_eq!(root.value, dec!(42));
        assert_eq!(root.residual, Decimal::ZERO);
    }

    #[test]
    fn test_bisect_feasible_boundary_outside_bracket() {
        let below = bisect_feasible("low", &cents(dec!(5), dec!(10)), |x| Ok(x - dec!(1))).unwrap_err();
        assert!(matches!(below, CalcError::NoSolution { .. }));
        let above = bisect_feasible("high", &cents(dec!(5), dec!(10)), |x| Ok(x - dec!(20))).unwrap_err();
        assert!(matches!(above, CalcError::NoSolution { .. }));
    }

    #[test]
    fn test_bisect_feasible_iteration_cap_is_convergence_failure() {
        let mut cfg = cents(dec!(0), dec!(1000));
        cfg.max_iterations = 3;
        let err = bisect_feasible("slow", &cfg, |x| Ok(x - dec!(333.333))).unwrap_err();
        assert!(matches!(
            err,
            CalcError::ConvergenceFailure { iterations: 3, .. }
        ));
    }
}
