//! Confidence bounds and sample-size computation.
//!
//! Two competing half-width formulas drive the sequential sampler:
//!
//! - the *static* (Chernoff-Hoeffding) bound, distribution-free and valid
//!   for any outcome bounded in [0, 1], which yields a finite worst-case
//!   sample size;
//! - the *dynamic* (Student-t) bound, tighter because it uses the observed
//!   sample spread, but only defined from two samples onward.
//!
//! The sampler starts from the smaller of the two implied sample sizes and
//! re-validates its stop decision against the applicable bound after every
//! batch, so the optimistic starting point never decides termination on its
//! own.

pub mod student_t;

use crate::error::{AsmcResult, ExecutionError};

use student_t::student_t_quantile;

/// Upper limit of the minimum-sample-size root search.
const SEARCH_UB: f64 = 2_147_483_647.0;

/// Static (Hoeffding) confidence-interval half-width for `n` runs at
/// confidence risk `alpha`.
///
/// Valid for any outcome bounded in [0, 1], e.g. boolean indicator means.
#[must_use]
pub fn static_bound(n: usize, alpha: f64) -> f64 {
    ((2.0 / alpha).ln() / (2.0 * n as f64)).sqrt()
}

/// Worst-case number of runs guaranteeing `static_bound(n, alpha) <= delta`.
///
/// Always finite; this is the only sample-size bound with a
/// distribution-free correctness guarantee.
#[must_use]
pub fn static_sample_size_ub(delta: f64, alpha: f64) -> usize {
    ((2.0 / alpha).ln() / (2.0 * delta * delta)).ceil() as usize
}

/// Lower bound on the confidence risk achievable with `n` runs at
/// half-width `delta`; the static bound solved for alpha.
#[must_use]
pub fn static_confidence_ub(delta: f64, n: usize) -> f64 {
    2.0 * (-2.0 * delta * delta * n as f64).exp()
}

/// Dynamic (Student-t) confidence-interval half-width.
///
/// `s` is the sample spread statistic reported by a variance-capable
/// aggregator. Tighter than the static bound when the observed spread is
/// small; requires `n >= 2`.
pub fn dynamic_bound(s: f64, n: usize, alpha: f64) -> AsmcResult<f64> {
    if n < 2 {
        return Err(ExecutionError::InsufficientSamples { n, required: 2 }.into());
    }
    let t = student_t_quantile(1.0 - alpha / 2.0, (n - 1) as f64);
    Ok(2.0 * t * s / (n as f64).sqrt())
}

/// Student-t critical value at confidence `1 - alpha/2` for a possibly
/// non-integer `n`, linearly interpolated between the critical values at
/// `floor(n)` and `ceil(n)` degrees of freedom.
fn interpolated_critical_value(n: f64, alpha: f64) -> f64 {
    let p = 1.0 - alpha / 2.0;
    let floor = n.floor();
    let ceil = n.ceil();
    if floor == ceil {
        return student_t_quantile(p, n);
    }
    let t_ceil = student_t_quantile(p, ceil) * (n - floor);
    let t_floor = student_t_quantile(p, floor) * (ceil - n);
    t_ceil + t_floor
}

/// Smallest sample size at which the dynamic bound *could* reach `delta`.
///
/// Finds the smallest real `n >= 1` with `2 * t(n) / sqrt(n) <= delta`,
/// where `t(n)` is the interpolated Student-t critical value, by bisection
/// on `f(n) = 2 * t(n) / sqrt(n) - delta`; the root is rounded up.
///
/// This is a distribution-sensitive *initial* batch size. It carries no
/// correctness guarantee of its own: the stop rules re-check the applicable
/// bound at every batch.
#[must_use]
pub fn minimum_sample_size(delta: f64, alpha: f64) -> usize {
    let f = |n: f64| 2.0 * interpolated_critical_value(n, alpha) / n.sqrt() - delta;

    let mut lo = 1.0;
    let mut hi = SEARCH_UB;
    if f(lo) <= 0.0 {
        // Even a single run already satisfies the target width.
        return 1;
    }
    if f(hi) > 0.0 {
        // No feasible size below the search cap; defer to the static bound.
        return static_sample_size_ub(delta, alpha);
    }

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if f(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-7 {
            break;
        }
    }
    (0.5 * (lo + hi)).ceil() as usize
}

/// Initial sample size for a session: the tighter of the dynamic estimate
/// and the static worst case.
#[must_use]
pub fn initial_sample_size(delta: f64, alpha: f64) -> usize {
    minimum_sample_size(delta, alpha).min(static_sample_size_ub(delta, alpha))
}
