//! features::errors — error types for PSD feature extraction.
//!
//! Purpose
//! -------
//! Define the single error enum, [`PsdError`], returned by every stage of the
//! PSD feature pipeline (component selection, source reconstruction,
//! spectral estimation, aggregation) together with the [`PsdResult`] alias
//! and a boxed wrapper, [`EstimatorError`], for failures raised inside an
//! external spectral estimator.
//!
//! Key behaviors
//! -------------
//! - Group variants by the stage that raises them so callers can match on
//!   selection, parameter, and metadata failures separately.
//! - Carry estimator failures untranslated: [`PsdError::Estimator`] keeps the
//!   original error and exposes it through [`std::error::Error::source`].
//! - Convert into `PyValueError` at the PyO3 boundary when the
//!   `python-bindings` feature is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - Configuration errors ([`PsdError::InvalidParameter`]) are raised before
//!   any source reconstruction or estimator call.
//! - Selection errors ([`PsdError::InvalidSelection`]) are raised before any
//!   source reconstruction.
//! - No variant is ever recovered from inside the crate.
//!
//! Testing notes
//! -------------
//! - Unit tests cover payload embedding in `Display` messages and the
//!   `source()` chain of estimator errors. The PyO3 conversion is exercised
//!   by Python-level tests.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for every fallible operation in [`crate::features`].
pub type PsdResult<T> = Result<T, PsdError>;

/// Boxed error produced by a [`SpectralEstimator`](crate::features::spectral::SpectralEstimator).
///
/// The wrapped error is stored as-is; `Display` forwards to it and
/// `source()` returns the wrapped error's own source.
#[derive(Debug)]
pub struct EstimatorError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl EstimatorError {
    /// Wrap any error (or message) raised by an estimator implementation.
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        EstimatorError(err.into())
    }

    /// Borrow the wrapped error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Unwrap into the original boxed error.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.0
    }
}

impl std::fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for EstimatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// PsdError — failures of the PSD feature pipeline.
///
/// Variants
/// --------
/// - `InvalidSelection { selection, n_components, reason }`
///   Component selection contains an out-of-range index, an unknown
///   component name, an empty set, or an invalid range.
/// - `InvalidParameter { name, value, reason }`
///   A configuration value is outside its enumerated set or numeric domain.
/// - `MetadataMismatch { reason }`
///   The recording cannot be projected with the decomposition (missing
///   channel, wrong channel count).
/// - `InvalidRecording { reason }` / `InvalidDecomposition { reason }`
///   A container failed its constructor checks.
/// - `RecordingTooShort { n_times, segment_samples }`
///   A continuous recording holds no complete fixed-length window.
/// - `AllSegmentsRejected { n_segments }`
///   Rejection dropped every segment, leaving nothing to estimate.
/// - `SpectrumShapeMismatch { expected, actual }`
///   The estimator returned an array inconsistent with the request.
/// - `EmptySpectrum`
///   Aggregation was asked to average over zero segments.
/// - `Estimator(EstimatorError)`
///   The external estimator failed; the original error is preserved.
#[derive(Debug)]
pub enum PsdError {
    // ---- Component selection ----
    InvalidSelection { selection: String, n_components: usize, reason: &'static str },

    // ---- Configuration ----
    InvalidParameter { name: &'static str, value: String, reason: &'static str },

    // ---- Recording / decomposition compatibility ----
    MetadataMismatch { reason: String },

    // ---- Container construction ----
    InvalidRecording { reason: String },
    InvalidDecomposition { reason: String },

    // ---- Segmentation / rejection ----
    RecordingTooShort { n_times: usize, segment_samples: usize },
    AllSegmentsRejected { n_segments: usize },

    // ---- Estimation / aggregation ----
    SpectrumShapeMismatch { expected: String, actual: String },
    EmptySpectrum,
    Estimator(EstimatorError),
}

impl std::error::Error for PsdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PsdError::Estimator(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for PsdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Component selection ----
            PsdError::InvalidSelection { selection, n_components, reason } => {
                write!(
                    f,
                    "Invalid component selection {selection} for {n_components} components: {reason}"
                )
            }
            // ---- Configuration ----
            PsdError::InvalidParameter { name, value, reason } => {
                write!(f, "Invalid value {value:?} for parameter {name}: {reason}")
            }
            // ---- Recording / decomposition compatibility ----
            PsdError::MetadataMismatch { reason } => {
                write!(f, "Recording does not match the decomposition: {reason}")
            }
            // ---- Container construction ----
            PsdError::InvalidRecording { reason } => write!(f, "Invalid recording: {reason}"),
            PsdError::InvalidDecomposition { reason } => {
                write!(f, "Invalid decomposition: {reason}")
            }
            // ---- Segmentation / rejection ----
            PsdError::RecordingTooShort { n_times, segment_samples } => {
                write!(
                    f,
                    "Recording has {n_times} samples, fewer than one segment of {segment_samples} samples."
                )
            }
            PsdError::AllSegmentsRejected { n_segments } => {
                write!(f, "All {n_segments} segments were rejected; nothing left to estimate.")
            }
            // ---- Estimation / aggregation ----
            PsdError::SpectrumShapeMismatch { expected, actual } => {
                write!(f, "Estimator returned spectrum of shape {actual}, expected {expected}")
            }
            PsdError::EmptySpectrum => write!(f, "Cannot average a spectrum with zero segments."),
            PsdError::Estimator(err) => write!(f, "Spectral estimator failed: {err}"),
        }
    }
}

impl From<EstimatorError> for PsdError {
    fn from(err: EstimatorError) -> Self {
        PsdError::Estimator(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<PsdError> for PyErr {
    fn from(err: PsdError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
