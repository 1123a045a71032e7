//! features::aggregation — log scaling and segment averaging.
//!
//! Purpose
//! -------
//! Reduce a per-segment spectrum to one spectrum per component, optionally
//! in decibels.
//!
//! Key behaviors
//! -------------
//! - [`power_to_db`] floors each value at [`LOG_FLOOR`] and returns
//!   `10 × log10(value)` as a new array; the input is never mutated.
//! - [`segment_mean`] and [`segment_mean_complex`] average along the
//!   segment axis.
//! - [`aggregate_power`] applies the two in that order, so the result is
//!   the mean of log-power, not the log of mean-power.
//! - [`coefs_to_db`] and [`aggregate_complex`] do the same for per-taper
//!   coefficients, flooring with the lexicographic complex order
//!   (real part, then imaginary part) and taking the complex `log10`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Zeros and negative values map to `10 × log10(LOG_FLOOR)` ≈ −3076.5 dB,
//!   never `-inf`.
//! - `NaN` inputs stay `NaN`.
//! - An empty segment axis is an error, not a `NaN` result.

use crate::features::errors::{PsdError, PsdResult};
use ndarray::{Array2, Array3, Array4, ArrayView3, ArrayView4, Axis};
use num_complex::Complex64;

/// Smallest positive normal `f64`; values below it are raised to it
/// before taking the logarithm.
pub const LOG_FLOOR: f64 = f64::MIN_POSITIVE;

/// Per-component mean spectrum.
#[derive(Debug, Clone, PartialEq)]
pub enum PsdMean {
    /// components × freqs.
    Power(Array2<f64>),
    /// components × tapers × freqs.
    Complex(Array3<Complex64>),
}

impl PsdMean {
    pub fn shape(&self) -> &[usize] {
        match self {
            PsdMean::Power(values) => values.shape(),
            PsdMean::Complex(values) => values.shape(),
        }
    }
}

/// Convert power to decibels: `10 × log10(max(value, LOG_FLOOR))`.
pub fn power_to_db(psds: ArrayView3<'_, f64>) -> Array3<f64> {
    psds.mapv(|value| {
        let floored = if value.is_nan() { value } else { value.max(LOG_FLOOR) };
        floored.log10() * 10.0
    })
}

/// Mean over the leading (segment) axis of a power spectrum.
///
/// Errors
/// ------
/// - `PsdError::EmptySpectrum` when the segment axis has length 0.
pub fn segment_mean(psds: ArrayView3<'_, f64>) -> PsdResult<Array2<f64>> {
    psds.mean_axis(Axis(0)).ok_or(PsdError::EmptySpectrum)
}

/// Mean over the leading (segment) axis of per-taper coefficients.
pub fn segment_mean_complex(coefs: ArrayView4<'_, Complex64>) -> PsdResult<Array3<Complex64>> {
    coefs.mean_axis(Axis(0)).ok_or(PsdError::EmptySpectrum)
}

/// Convert complex coefficients to decibels: `10 × log10(max(value, LOG_FLOOR))`.
///
/// `max` compares real parts first and imaginary parts on ties, so any
/// value whose real part is below `LOG_FLOOR` becomes `LOG_FLOOR + 0i`.
/// Values with a `NaN` part are kept as they are.
pub fn coefs_to_db(coefs: ArrayView4<'_, Complex64>) -> Array4<Complex64> {
    let floor = Complex64::new(LOG_FLOOR, 0.0);
    coefs.mapv(|value| {
        let has_nan = value.re.is_nan() || value.im.is_nan();
        let floored =
            if has_nan || (value.re, value.im) >= (floor.re, floor.im) { value } else { floor };
        floored.log10() * 10.0
    })
}

/// dB scaling (optional) followed by the segment mean.
pub fn aggregate_power(psds: ArrayView3<'_, f64>, db: bool) -> PsdResult<Array2<f64>> {
    if db {
        let scaled = power_to_db(psds);
        segment_mean(scaled.view())
    } else {
        segment_mean(psds)
    }
}

/// Complex counterpart of [`aggregate_power`].
pub fn aggregate_complex(coefs: ArrayView4<'_, Complex64>, db: bool) -> PsdResult<Array3<Complex64>> {
    if db {
        let scaled = coefs_to_db(coefs);
        segment_mean_complex(scaled.view())
    } else {
        segment_mean_complex(coefs)
    }
}
