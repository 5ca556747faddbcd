//! Internal rate of return: a dependency-free Newton-Raphson solver with a
//! bisection fallback, used wherever the engine needs an IRR rather than
//! reaching for an external numerics crate.

const MAX_ITERATIONS: u32 = 100;
const TOLERANCE: f64 = 1e-9;

/// Net present value of `cash_flows` (period 0 undiscounted) at monthly
/// `rate`.
fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Derivative of [`npv`] with respect to `rate`.
fn npv_derivative(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, cf)| -(t as f64) * cf / (1.0 + rate).powi(t as i32 + 1))
        .sum()
}

/// Monthly internal rate of return for a series of monthly cash flows.
///
/// Returns `None` (treated as zero by callers per the "no positive flow"
/// rule) when the series has no sign change, since no real root exists in
/// that case. Falls back to bisection over `(-0.99, 10.0)` when Newton's
/// method fails to converge from the initial guess, and gives up with
/// `None` if bisection also fails to bracket a root within
/// [`MAX_ITERATIONS`].
pub fn irr_monthly(cash_flows: &[f64]) -> Option<f64> {
    if cash_flows.is_empty() || !cash_flows.iter().any(|cf| *cf > 0.0) {
        return None;
    }
    if !cash_flows.iter().any(|cf| *cf < 0.0) {
        return None;
    }

    if let Some(rate) = newton_raphson(cash_flows) {
        return Some(rate);
    }
    bisection(cash_flows)
}

/// Annualized IRR: `(1 + monthly)^12 - 1`. Returns `0.0` when no real root
/// exists (no positive flow, or failure to converge), per the spec's
/// "reported as zero" rule.
pub fn irr_annualized(cash_flows: &[f64]) -> f64 {
    irr_monthly(cash_flows)
        .map(|m| (1.0 + m).powi(12) - 1.0)
        .unwrap_or(0.0)
}

/// Annualizes a monthly rate under either basis: `simple` multiplies by 12,
/// otherwise compounds as `(1 + monthly)^12 - 1`. Takes the monthly rate
/// directly (rather than a cash-flow slice) so callers outside this crate
/// can select a basis without this crate depending on their settings types.
pub fn annualize(monthly: f64, simple: bool) -> f64 {
    if simple {
        monthly * 12.0
    } else {
        (1.0 + monthly).powi(12) - 1.0
    }
}

/// [`irr_monthly`] followed by [`annualize`], returning `0.0` when no real
/// root exists.
pub fn irr_annualized_with_basis(cash_flows: &[f64], simple: bool) -> f64 {
    irr_monthly(cash_flows).map(|m| annualize(m, simple)).unwrap_or(0.0)
}

fn newton_raphson(cash_flows: &[f64]) -> Option<f64> {
    let mut rate = 0.1;
    for _ in 0..MAX_ITERATIONS {
        let value = npv(rate, cash_flows);
        if value.abs() < TOLERANCE {
            return Some(rate);
        }
        let derivative = npv_derivative(rate, cash_flows);
        if derivative.abs() < f64::EPSILON {
            return None;
        }
        let next_rate = rate - value / derivative;
        if !next_rate.is_finite() || next_rate <= -1.0 {
            return None;
        }
        if (next_rate - rate).abs() < TOLERANCE {
            return Some(next_rate);
        }
        rate = next_rate;
    }
    None
}

fn bisection(cash_flows: &[f64]) -> Option<f64> {
    let mut lo = -0.99;
    let mut hi = 10.0;
    let mut f_lo = npv(lo, cash_flows);
    let f_hi = npv(hi, cash_flows);
    if f_lo.signum() == f_hi.signum() {
        return None;
    }
    for _ in 0..MAX_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        let f_mid = npv(mid, cash_flows);
        if f_mid.abs() < TOLERANCE || (hi - lo).abs() < TOLERANCE {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irr_of_simple_loan_matches_known_rate() {
        // -100 today, +110 one month later -> 10% monthly.
        let flows = vec![-100.0, 110.0];
        let rate = irr_monthly(&flows).unwrap();
        assert!((rate - 0.10).abs() < 1e-6);
    }

    #[test]
    fn no_positive_flow_returns_none() {
        assert_eq!(irr_monthly(&[-100.0, -50.0]), None);
    }

    #[test]
    fn no_negative_flow_returns_none() {
        assert_eq!(irr_monthly(&[100.0, 50.0]), None);
    }

    #[test]
    fn annualized_compounds_monthly_rate() {
        let flows = vec![-100.0, 110.0];
        let annual = irr_annualized(&flows);
        assert!((annual - (1.10f64.powi(12) - 1.0)).abs() < 1e-6);
    }

    #[test]
    fn annualized_is_zero_without_real_root() {
        assert_eq!(irr_annualized(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn annualize_simple_basis_is_linear() {
        assert!((annualize(0.01, true) - 0.12).abs() < 1e-12);
    }

    #[test]
    fn annualize_compounded_basis_matches_irr_annualized() {
        assert!((annualize(0.10, false) - (1.10f64.powi(12) - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn irr_annualized_with_basis_respects_simple_flag() {
        let flows = vec![-100.0, 110.0];
        let simple = irr_annualized_with_basis(&flows, true);
        let compounded = irr_annualized_with_basis(&flows, false);
        assert!((simple - 0.10 * 12.0).abs() < 1e-6);
        assert!((compounded - (1.10f64.powi(12) - 1.0)).abs() < 1e-6);
        assert!(simple < compounded);
    }

    #[test]
    fn irr_on_multi_period_deal_converges() {
        let mut flows = vec![-1_000_000.0];
        flows.extend(std::iter::repeat(8_000.0).take(59));
        flows.push(8_000.0 + 1_200_000.0);
        let rate = irr_monthly(&flows).expect("should converge");
        assert!(rate > 0.0 && rate < 0.05);
    }
}
