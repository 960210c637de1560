//! Bounded scalar minimization.
//!
//! [`minimize_bounded`] is Brent's method restricted to a closed interval: parabolic
//! interpolation steps where the fit is acceptable, golden-section steps otherwise. The
//! search starts from the same golden-section point every time and involves no randomness,
//! so identical inputs produce bit-identical results.

use derive_builder::Builder;
use tracing::debug;

use crate::core::ScheduleError;

const SQRT_EPS: f64 = 1.4832396974191326e-8; // sqrt(2.2e-16)

/// Tolerances for a bounded search.
#[derive(Builder, Debug, Clone, Copy, PartialEq)]
#[builder(pattern = "owned")]
pub struct BoundedSearch {
    /// Absolute tolerance on the abscissa.
    #[builder(default = "1e-5")]
    pub xatol: f64,
    /// Objective evaluations allowed before the search is declared non-convergent.
    #[builder(default = "500")]
    pub max_evaluations: usize,
}

impl Default for BoundedSearch {
    fn default() -> Self {
        Self {
            xatol: 1e-5,
            max_evaluations: 500,
        }
    }
}

/// Result of a bounded search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub x: f64,
    pub fx: f64,
    pub evaluations: usize,
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Sign that maps zero to +1.
fn nonzero_sign(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        sign(value)
    }
}

/// Find a local minimum of `f` inside `[bounds.0, bounds.1]`.
pub fn minimize_bounded<F>(
    f: F,
    bounds: (f64, f64),
    search: &BoundedSearch,
) -> Result<Minimum, ScheduleError>
where
    F: Fn(f64) -> f64,
{
    let (lower, upper) = bounds;
    if !lower.is_finite() || !upper.is_finite() || lower > upper {
        return Err(ScheduleError::invalid(format!(
            "search bounds [{}, {}] are not a finite interval",
            lower, upper
        )));
    }
    if !(search.xatol > 0.0) || search.max_evaluations == 0 {
        return Err(ScheduleError::invalid(format!(
            "search tolerance {} / evaluation budget {} must be positive",
            search.xatol, search.max_evaluations
        )));
    }

    let golden_mean = 0.5 * (3.0 - 5f64.sqrt());
    let (mut a, mut b) = (lower, upper);

    // xf holds the best point so far, nfc the second best, fulc the previous second best.
    let mut fulc = a + golden_mean * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat = 0.0;
    let mut e: f64 = 0.0;
    let mut x = xf;
    let mut fx = f(x);
    let mut evaluations = 1;
    let mut fu = f64::INFINITY;
    let mut ffulc = fx;
    let mut fnfc = fx;
    let mut xm = 0.5 * (a + b);
    let mut tol1 = SQRT_EPS * xf.abs() + search.xatol / 3.0;
    let mut tol2 = 2.0 * tol1;
    let mut converged = true;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;

        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                x = xf + rat;
                if x - a < tol2 || b - x < tol2 {
                    rat = tol1 * nonzero_sign(xm - xf);
                }
            } else {
                golden = true;
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = golden_mean * e;
        }

        x = xf + nonzero_sign(rat) * rat.abs().max(tol1);
        fu = f(x);
        evaluations += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = x;
                ffulc = fu;
                nfc = xf;
                fnfc = fx;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = SQRT_EPS * xf.abs() + search.xatol / 3.0;
        tol2 = 2.0 * tol1;

        if evaluations >= search.max_evaluations {
            converged = false;
            break;
        }
    }

    if xf.is_nan() || fx.is_nan() || fu.is_nan() {
        return Err(ScheduleError::numerical(format!(
            "bounded search on [{}, {}] produced NaN after {} evaluations",
            lower, upper, evaluations
        )));
    }
    if !converged {
        return Err(ScheduleError::numerical(format!(
            "bounded search on [{}, {}] did not converge within {} evaluations",
            lower, upper, search.max_evaluations
        )));
    }

    debug!(x = xf, fx, evaluations, "bounded search converged");
    Ok(Minimum {
        x: xf,
        fx,
        evaluations,
    })
}

/// Find a local maximum of `f` inside `[bounds.0, bounds.1]`; `fx` of the result is the
/// maximum value.
pub fn maximize_bounded<F>(
    f: F,
    bounds: (f64, f64),
    search: &BoundedSearch,
) -> Result<Minimum, ScheduleError>
where
    F: Fn(f64) -> f64,
{
    let minimum = minimize_bounded(|x| -f(x), bounds, search)?;
    Ok(Minimum {
        fx: -minimum.fx,
        ..minimum
    })
}
