//! features — PSD features of independent components for classification.
//!
//! Purpose
//! -------
//! Compute, for each selected component of a fitted ICA decomposition, the
//! power spectral density averaged across the segments of a recording. This
//! is the spectral input consumed by ICLabel-style component classifiers.
//!
//! Key behaviors
//! -------------
//! - Describe recordings ([`recording`]) and fitted decompositions
//!   ([`decomposition`]) as validated, read-only containers.
//! - Resolve component selections ([`picks`]) and rejection policies
//!   ([`rejection`]) before any numerical work.
//! - Reconstruct component sources per segment ([`sources`]), delegate the
//!   multi-taper estimate to a caller-supplied [`SpectralEstimator`]
//!   ([`spectral`]), then scale and average ([`aggregation`]).
//! - Tie the stages together in [`get_psds`] ([`psd`]), configured through
//!   [`PsdOptions`] ([`options`]).
//! - Report every failure through [`PsdError`] ([`errors`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are never mutated; results are freshly allocated.
//! - All numerics use `f64`; complex coefficients use `Complex64`.
//! - The estimator's upper frequency bound is always
//!   `min(1.25 × lowpass, sfreq / 2)`.
//!
//! Conventions
//! -----------
//! - Array layouts: continuous data channels × samples, epochs
//!   epochs × channels × samples, sources segments × components × samples,
//!   power spectra segments × components × freqs, mean spectra
//!   components × freqs.
//! - Components are named `ICA000`, `ICA001`, … by index.
//! - The stack logs through the `log` facade at debug level and never
//!   installs a logger.

pub mod aggregation;
pub mod decomposition;
pub mod errors;
pub mod options;
pub mod picks;
pub mod psd;
pub mod recording;
pub mod rejection;
pub mod sources;
pub mod spectral;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::aggregation::{LOG_FLOOR, PsdMean, power_to_db, segment_mean};
pub use self::decomposition::{Decomposition, FittedIca};
pub use self::errors::{EstimatorError, PsdError, PsdResult};
pub use self::options::PsdOptions;
pub use self::picks::{Picks, resolve_picks};
pub use self::psd::{PsdFeatures, get_psds};
pub use self::recording::{
    Annotation, ChannelType, EpochedRecording, RawRecording, Recording, RecordingInfo, SegmentKind,
};
pub use self::rejection::{RejectPolicy, RejectThresholds};
pub use self::spectral::{
    MultitaperParams, Normalization, SpectralEstimator, SpectralRequest, SpectralValues, Spectrum,
    SpectrumOutput, effective_fmax,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_icalabel::features::prelude::*;
//
// to import the feature-extraction surface in a single line.

pub mod prelude {
    pub use super::decomposition::{Decomposition, FittedIca};
    pub use super::errors::{EstimatorError, PsdError, PsdResult};
    pub use super::options::PsdOptions;
    pub use super::picks::Picks;
    pub use super::psd::{PsdFeatures, get_psds};
    pub use super::recording::{ChannelType, EpochedRecording, RawRecording, Recording, RecordingInfo};
    pub use super::rejection::{RejectPolicy, RejectThresholds};
    pub use super::spectral::{SpectralEstimator, SpectralRequest, SpectralValues, Spectrum};
}
