use tracing::debug;

use crate::core::ScheduleError;
use crate::util::{maximize_bounded, BoundedSearch};

/// Truncation order of the series used when none is configured.
pub const DEFAULT_SERIES_ORDER: usize = 10;

/// Interval searched for the peaks of the raw series.
///
/// Sized for [`DEFAULT_SERIES_ORDER`]: at that order the first two maxima of the
/// unshifted series lie inside it. Much larger orders move the located peak, so a
/// configurable order does not rescale this bracket.
pub const PEAK_SEARCH_BRACKET: (f64, f64) = (0.0, 10.0);

/// Shape constants of a [`WaveformUnit`], derived from the series once and cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformParameters {
    pub first_peak_x: f64,
    pub wavelength: f64,
    pub normalization: f64,
}

/// A normalized, periodic, asymmetric oscillation built from a truncated sine series.
///
/// The raw series is
///
/// ```text
/// core(x, w, s) = sum_{k=1..n} C(2n, n-k) / (C(2n, n) * k) * sin(k * w * (x + s))
/// ```
///
/// whose central-binomial weights give a smooth, skewed bump instead of a sine. Its period
/// and scale are not fixed by hand: the first peak of the unshifted series, the position of
/// the next peak seen from the first one, and the height of the first peak become
/// `first_peak_x`, `wavelength` and `normalization`, and
/// `unit(x) = core(x, wavelength, first_peak_x) / normalization`.
#[derive(Debug, Clone)]
pub struct WaveformUnit {
    order: usize,
    coefficients: Vec<f64>,
    params: WaveformParameters,
}

/// `C(2n, n-k) / (C(2n, n) * k)` for `k = 1..=n`.
///
/// The binomial ratio is built as the running product
/// `r_k = r_{k-1} * (n - k + 1) / (n + k)` so no factorial is ever formed and every order
/// stays finite.
fn series_coefficients(order: usize) -> Vec<f64> {
    let n = order as f64;
    let mut ratio = 1.0;
    (1..=order)
        .map(|k| {
            let k = k as f64;
            ratio = ratio * (n - k + 1.0) / (n + k);
            ratio / k
        })
        .collect()
}

fn evaluate_series(coefficients: &[f64], x: f64, wavelength: f64, shift: f64) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .fold(0.0, |total, (i, coefficient)| {
            let k = (i + 1) as f64;
            total + coefficient * (k * wavelength * (x + shift)).sin()
        })
}

impl WaveformUnit {
    pub fn new(order: usize) -> Result<Self, ScheduleError> {
        Self::with_search(order, &BoundedSearch::default())
    }

    /// Derive the waveform with explicit peak-search tolerances.
    pub fn with_search(order: usize, search: &BoundedSearch) -> Result<Self, ScheduleError> {
        if order == 0 {
            return Err(ScheduleError::invalid("series order must be at least 1"));
        }
        let coefficients = series_coefficients(order);

        let first_peak = maximize_bounded(
            |x| evaluate_series(&coefficients, x, 1.0, 0.0),
            PEAK_SEARCH_BRACKET,
            search,
        )?;
        let first_peak_x = first_peak.x;
        let next_peak = maximize_bounded(
            |x| evaluate_series(&coefficients, x, 1.0, first_peak_x),
            PEAK_SEARCH_BRACKET,
            search,
        )?;
        let wavelength = next_peak.x;
        let normalization = evaluate_series(&coefficients, first_peak_x, 1.0, 0.0);

        if !normalization.is_finite() || normalization == 0.0 {
            return Err(ScheduleError::numerical(format!(
                "series of order {} has degenerate peak height {}",
                order, normalization
            )));
        }
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(ScheduleError::numerical(format!(
                "series of order {} has degenerate wavelength {}",
                order, wavelength
            )));
        }

        let params = WaveformParameters {
            first_peak_x,
            wavelength,
            normalization,
        };
        debug!(
            order,
            first_peak_x,
            wavelength,
            normalization,
            evaluations = first_peak.evaluations + next_peak.evaluations,
            "derived waveform parameters"
        );
        Ok(Self {
            order,
            coefficients,
            params,
        })
    }

    /// The raw, unnormalized series.
    pub fn core(&self, x: f64, wavelength: f64, shift: f64) -> f64 {
        evaluate_series(&self.coefficients, x, wavelength, shift)
    }

    /// Normalized waveform value; its maximum over a period is 1.
    pub fn unit(&self, x: f64) -> f64 {
        self.core(x, self.params.wavelength, self.params.first_peak_x) / self.params.normalization
    }

    /// Period of [`WaveformUnit::unit`] in its own argument.
    pub fn period(&self) -> f64 {
        std::f64::consts::TAU / self.params.wavelength
    }

    pub fn params(&self) -> WaveformParameters {
        self.params
    }

    pub fn order(&self) -> usize {
        self.order
    }
}
