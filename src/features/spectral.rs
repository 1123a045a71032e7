//! features::spectral — the multi-taper estimator seam.
//!
//! Purpose
//! -------
//! Define what the PSD pipeline hands to, and expects back from, an external
//! multi-taper spectral estimator: typed estimator parameters
//! ([`MultitaperParams`]), the request ([`SpectralRequest`]), the response
//! ([`Spectrum`]) and the capability itself ([`SpectralEstimator`]).
//!
//! Key behaviors
//! -------------
//! - [`effective_fmax`] computes the upper frequency bound from recording
//!   metadata, `min(1.25 × lowpass, sfreq / 2)`. It is the only upper bound
//!   ever passed to the estimator.
//! - [`Normalization`] and [`SpectrumOutput`] parse from the exact strings
//!   `"length" | "full"` and `"power" | "complex"`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Requests carry only the selected components.
//! - Power spectra are segments × components × freqs; complex spectra are
//!   segments × components × tapers × freqs.
//! - `n_jobs` is a hint; the crate itself never spawns threads.
//!
//! Downstream usage
//! ----------------
//! - Implement [`SpectralEstimator`] over a DPSS multi-taper routine (or a
//!   fake in tests) and pass it to [`get_psds`](crate::features::psd::get_psds).

use crate::features::{
    errors::{EstimatorError, PsdError},
    recording::RecordingInfo,
};
use ndarray::{Array1, Array3, Array4, ArrayView3};
use num_complex::Complex64;
use std::str::FromStr;

/// Headroom applied to the recording's low-pass cutoff.
pub const LOWPASS_HEADROOM: f64 = 1.25;

/// Upper frequency bound used for every estimate on this recording.
///
/// Equal to `min(1.25 × lowpass, sfreq / 2)`.
pub fn effective_fmax(info: &RecordingInfo) -> f64 {
    fmax_bound(info.sfreq(), info.lowpass())
}

/// [`effective_fmax`] from raw rates, for callers without a
/// [`RecordingInfo`]. Inputs are not validated.
pub fn fmax_bound(sfreq: f64, lowpass: f64) -> f64 {
    (lowpass * LOWPASS_HEADROOM).min(sfreq / 2.0)
}

/// Normalization applied by the estimator to the PSD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Scale by the signal length.
    Length,
    /// Full normalization, yielding a true spectral density.
    Full,
}

impl FromStr for Normalization {
    type Err = PsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(Normalization::Length),
            "full" => Ok(Normalization::Full),
            _ => Err(PsdError::InvalidParameter {
                name: "normalization",
                value: s.to_string(),
                reason: "expected 'length' or 'full'",
            }),
        }
    }
}

/// What the estimator returns per segment and component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumOutput {
    /// Power averaged over tapers.
    Power,
    /// Complex Fourier coefficients per taper.
    Complex,
}

impl FromStr for SpectrumOutput {
    type Err = PsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power" => Ok(SpectrumOutput::Power),
            "complex" => Ok(SpectrumOutput::Complex),
            _ => Err(PsdError::InvalidParameter {
                name: "output",
                value: s.to_string(),
                reason: "expected 'power' or 'complex'",
            }),
        }
    }
}

/// Validated multi-taper parameters passed through to the estimator.
///
/// `fmax` is always [`effective_fmax`] of the recording; the remaining
/// fields are the caller's values.
#[derive(Debug, Clone, PartialEq)]
pub struct MultitaperParams {
    pub fmin: f64,
    pub fmax: f64,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    /// Full taper bandwidth in Hz; `None` lets the estimator choose.
    pub bandwidth: Option<f64>,
    pub adaptive: bool,
    pub low_bias: bool,
    pub normalization: Normalization,
    pub output: SpectrumOutput,
    pub proj: bool,
    pub n_jobs: usize,
}

/// A single estimation request.
#[derive(Debug, Clone, Copy)]
pub struct SpectralRequest<'a> {
    /// Source signals, segments × selected components × samples.
    pub data: ArrayView3<'a, f64>,
    /// Sampling rate in Hz.
    pub sfreq: f64,
    /// Time in seconds of each segment's first sample, used to resolve
    /// `params.tmin` / `params.tmax`.
    pub segment_tmin: f64,
    pub params: &'a MultitaperParams,
}

/// Spectral values returned by an estimator.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectralValues {
    /// segments × components × freqs.
    Power(Array3<f64>),
    /// segments × components × tapers × freqs.
    Complex(Array4<Complex64>),
}

impl SpectralValues {
    pub fn shape(&self) -> &[usize] {
        match self {
            SpectralValues::Power(values) => values.shape(),
            SpectralValues::Complex(values) => values.shape(),
        }
    }

    pub fn n_freqs(&self) -> usize {
        self.shape().last().copied().unwrap_or(0)
    }

    pub fn output(&self) -> SpectrumOutput {
        match self {
            SpectralValues::Power(_) => SpectrumOutput::Power,
            SpectralValues::Complex(_) => SpectrumOutput::Complex,
        }
    }
}

/// Estimator response: values plus their frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub values: SpectralValues,
    pub freqs: Array1<f64>,
}

/// External multi-taper PSD estimator.
///
/// Implementations must return values for exactly the segments and
/// components in `request.data`, restricted to
/// `[params.fmin, params.fmax]`, in the layout selected by
/// `params.output`.
pub trait SpectralEstimator {
    fn psd(&self, request: &SpectralRequest<'_>) -> Result<Spectrum, EstimatorError>;
}

impl<E: SpectralEstimator + ?Sized> SpectralEstimator for &E {
    fn psd(&self, request: &SpectralRequest<'_>) -> Result<Spectrum, EstimatorError> {
        (**self).psd(request)
    }
}
