//! features::psd — per-component PSD features from a fitted decomposition.
//!
//! Purpose
//! -------
//! Provide [`get_psds`], the entry point that turns a fitted decomposition and
//! a recording into one mean power spectrum per selected component, the input
//! expected by component classifiers.
//!
//! Key behaviors
//! -------------
//! - Validate every option and resolve the component selection before any
//!   source is reconstructed or the estimator is called.
//! - Reconstruct sources with the requested rejection, keep only the selected
//!   components, and call the estimator exactly once with
//!   `fmax = min(1.25 × lowpass, sfreq / 2)`.
//! - Check the estimator response against the request, optionally convert to
//!   dB per segment, and average across segments.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are only read; the same inputs and a deterministic estimator
//!   give bit-identical results.
//! - Component order in the result follows the resolved selection.
//! - Estimator errors are surfaced untranslated as `PsdError::Estimator`.
//!
//! Downstream usage
//! ----------------
//! - Build a [`FittedIca`](crate::features::decomposition::FittedIca) (or
//!   implement [`Decomposition`]), wrap the data in a [`Recording`], supply a
//!   [`SpectralEstimator`] and call [`get_psds`] with [`PsdOptions`].
//!
//! Testing notes
//! -------------
//! - Unit tests here use a call-counting fake estimator to check the
//!   validate-before-compute ordering and the response shape check.
//! - `tests/integration_psd_pipeline.rs` runs the full pipeline on raw and
//!   epoched inputs.

use crate::features::{
    aggregation::{PsdMean, aggregate_complex, aggregate_power},
    decomposition::Decomposition,
    errors::{PsdError, PsdResult},
    options::PsdOptions,
    picks::resolve_picks,
    recording::{Recording, SegmentKind},
    sources::prepare_sources,
    spectral::{SpectralEstimator, SpectralRequest, SpectralValues, Spectrum, SpectrumOutput},
};
use ndarray::{Array1, Array2, Axis};

/// PsdFeatures — mean spectra for the selected components.
///
/// Fields
/// ------
/// - `mean`: components × freqs power (dB when requested), or
///   components × tapers × freqs coefficients for complex output (also in
///   dB when requested).
/// - `freqs`: frequency axis in Hz, as returned by the estimator.
/// - `kind`: whether segments were cut from a continuous recording or
///   supplied as epochs.
/// - `n_segments`: segments that survived rejection and were averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdFeatures {
    pub mean: PsdMean,
    pub freqs: Array1<f64>,
    pub kind: SegmentKind,
    pub n_segments: usize,
}

impl PsdFeatures {
    /// The power matrix, if the output kind is power.
    pub fn power(&self) -> Option<&Array2<f64>> {
        match &self.mean {
            PsdMean::Power(values) => Some(values),
            PsdMean::Complex(_) => None,
        }
    }

    pub fn into_power(self) -> Option<Array2<f64>> {
        match self.mean {
            PsdMean::Power(values) => Some(values),
            PsdMean::Complex(_) => None,
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.mean.shape()
    }
}

/// Compute the segment-averaged PSD of each selected component.
///
/// Parameters
/// ----------
/// - `decomposition`: fitted solution.
/// - `recording`: continuous or epoched data containing every channel the
///   solution was fitted on.
/// - `estimator`: multi-taper PSD estimator.
/// - `options`: selection, rejection and spectral settings.
///
/// Returns
/// -------
/// [`PsdFeatures`] with one row per selected component.
///
/// Errors
/// ------
/// - `InvalidParameter` / `InvalidSelection`: raised before any computation.
/// - `MetadataMismatch`, `RecordingTooShort`, `AllSegmentsRejected`,
///   `InvalidDecomposition`: raised while reconstructing sources.
/// - `Estimator`: the estimator failed.
/// - `SpectrumShapeMismatch`, `EmptySpectrum`: the estimator response does
///   not fit the request.
pub fn get_psds<D, E>(
    decomposition: &D, recording: &Recording, estimator: &E, options: &PsdOptions,
) -> PsdResult<PsdFeatures>
where
    D: Decomposition + ?Sized,
    E: SpectralEstimator + ?Sized,
{
    let info = recording.info();
    let params = options.multitaper_params(info)?;
    let picks = resolve_picks(options.picks.as_ref(), decomposition.n_components())?;

    let sources = prepare_sources(
        decomposition,
        recording,
        &options.reject,
        options.reject_by_annotation,
        options.segment_duration,
    )?;
    let selected = sources.data.select(Axis(1), &picks);
    log::debug!(
        "estimating PSD of {} components over {} segments, fmin={} fmax={}",
        picks.len(),
        selected.dim().0,
        params.fmin,
        params.fmax
    );

    let request = SpectralRequest {
        data: selected.view(),
        sfreq: info.sfreq(),
        segment_tmin: sources.tmin,
        params: &params,
    };
    let spectrum = estimator.psd(&request)?;
    check_spectrum(&spectrum, &request)?;

    let Spectrum { values, freqs } = spectrum;
    let n_segments = selected.dim().0;
    let mean = match values {
        SpectralValues::Power(psds) => PsdMean::Power(aggregate_power(psds.view(), options.db)?),
        SpectralValues::Complex(coefs) => {
            PsdMean::Complex(aggregate_complex(coefs.view(), options.db)?)
        }
    };

    Ok(PsdFeatures { mean, freqs, kind: sources.kind, n_segments })
}

/// Response layout must match the request: segments, components, output
/// kind, and one frequency per value along the last axis.
fn check_spectrum(spectrum: &Spectrum, request: &SpectralRequest<'_>) -> PsdResult<()> {
    let (n_segments, n_components, _) = request.data.dim();
    let shape = spectrum.values.shape();
    let n_freqs = spectrum.freqs.len();
    let expected_rank = match request.params.output {
        SpectrumOutput::Power => 3,
        SpectrumOutput::Complex => 4,
    };

    let matches = spectrum.values.output() == request.params.output
        && shape.len() == expected_rank
        && shape[0] == n_segments
        && shape[1] == n_components
        && spectrum.values.n_freqs() == n_freqs;
    if !matches {
        let middle = if expected_rank == 4 { " × tapers" } else { "" };
        return Err(PsdError::SpectrumShapeMismatch {
            expected: format!("{n_segments} × {n_components}{middle} × {n_freqs} ({:?})", request.params.output),
            actual: format!("{shape:?} ({:?})", spectrum.values.output()),
        });
    }
    if n_segments == 0 || n_freqs == 0 {
        return Err(PsdError::EmptySpectrum);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{
        decomposition::FittedIca,
        errors::EstimatorError,
        picks::Picks,
        recording::{ChannelType, RawRecording, RecordingInfo},
    };
    use ndarray::{Array2, Array3, Array4, array};
    use num_complex::Complex64;
    use std::cell::{Cell, RefCell};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation and selection errors raised before the estimator runs.
    // - The effective fmax and selected components seen by the estimator.
    // - The response shape check and complex output.
    // -------------------------------------------------------------------------

    /// Returns a constant spectrum of the requested shape and records what
    /// it was asked for.
    struct CountingEstimator {
        calls: Cell<usize>,
        seen_fmax: Cell<f64>,
        seen_shape: RefCell<Vec<usize>>,
        n_freqs: usize,
        extra_component: bool,
    }

    impl CountingEstimator {
        fn new(n_freqs: usize) -> Self {
            CountingEstimator {
                calls: Cell::new(0),
                seen_fmax: Cell::new(f64::NAN),
                seen_shape: RefCell::new(Vec::new()),
                n_freqs,
                extra_component: false,
            }
        }
    }

    impl SpectralEstimator for CountingEstimator {
        fn psd(&self, request: &SpectralRequest<'_>) -> Result<Spectrum, EstimatorError> {
            self.calls.set(self.calls.get() + 1);
            self.seen_fmax.set(request.params.fmax);
            *self.seen_shape.borrow_mut() = request.data.shape().to_vec();

            let (n_seg, n_comp, _) = request.data.dim();
            let n_comp = n_comp + usize::from(self.extra_component);
            let freqs = Array1::linspace(request.params.fmin, request.params.fmax, self.n_freqs);
            let values = match request.params.output {
                SpectrumOutput::Power => {
                    SpectralValues::Power(Array3::from_elem((n_seg, n_comp, self.n_freqs), 100.0))
                }
                SpectrumOutput::Complex => SpectralValues::Complex(
                    Array4::from_elem((n_seg, n_comp, 2, self.n_freqs), Complex64::new(1.0, -1.0)),
                ),
            };
            Ok(Spectrum { values, freqs })
        }
    }

    fn fixture() -> (FittedIca, Recording) {
        let names = vec!["Fz".to_string(), "Cz".to_string()];
        let ica = FittedIca::new(
            names.clone(),
            array![0.0, 0.0],
            array![1.0, 1.0],
            array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            None,
        )
        .unwrap();
        let info = RecordingInfo::new(10.0, 4.0, names, vec![ChannelType::Eeg; 2]).unwrap();
        let data = Array2::from_shape_fn((2, 60), |(ch, t)| ((t * (ch + 1)) as f64).sin());
        let raw = RawRecording::new(data, info, Vec::new()).unwrap();
        (ica, Recording::from(raw))
    }

    #[test]
    // Purpose
    // -------
    // Verify the estimator sees only the selected components and the
    // recording-derived fmax.
    //
    // Given
    // -----
    // - 3 components, 60 samples at 10 Hz (three 2 s segments), lowpass 4 Hz.
    // - picks = [2, 0], caller fmax = 1000.
    //
    // Expect
    // ------
    // - One call with data shape [3, 2, 20] and fmax = 5.
    // - Result shape (2, n_freqs), values 20 dB.
    fn get_psds_passes_selected_sources_and_effective_fmax() {
        let (ica, recording) = fixture();
        let estimator = CountingEstimator::new(4);
        let options = PsdOptions {
            picks: Some(Picks::Indices(vec![2, 0])),
            fmax: 1000.0,
            ..Default::default()
        };

        let features = get_psds(&ica, &recording, &estimator, &options).unwrap();

        assert_eq!(estimator.calls.get(), 1);
        assert_eq!(estimator.seen_fmax.get(), 5.0);
        assert_eq!(*estimator.seen_shape.borrow(), vec![3, 2, 20]);
        assert_eq!(features.shape(), &[2, 4]);
        assert_eq!(features.kind, SegmentKind::Segment);
        assert_eq!(features.n_segments, 3);
        assert!(features.power().unwrap().iter().all(|&v| (v - 20.0).abs() < 1e-12));
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid options and selections fail before any estimation.
    //
    // Given
    // -----
    // - normalization = "fulll"; separately picks = [7] with 3 components.
    //
    // Expect
    // ------
    // - `InvalidParameter` and `InvalidSelection`, with zero estimator calls.
    fn get_psds_validates_before_estimating() {
        let (ica, recording) = fixture();
        let estimator = CountingEstimator::new(4);

        let bad_norm = PsdOptions { normalization: "fulll".to_string(), ..Default::default() };
        match get_psds(&ica, &recording, &estimator, &bad_norm) {
            Err(PsdError::InvalidParameter { name: "normalization", .. }) => {}
            other => panic!("expected InvalidParameter, got {other:?}"),
        }

        let bad_picks = PsdOptions { picks: Some(Picks::Index(7)), ..Default::default() };
        match get_psds(&ica, &recording, &estimator, &bad_picks) {
            Err(PsdError::InvalidSelection { n_components: 3, .. }) => {}
            other => panic!("expected InvalidSelection, got {other:?}"),
        }

        assert_eq!(estimator.calls.get(), 0);
    }

    #[test]
    fn get_psds_rejects_mismatched_response() {
        let (ica, recording) = fixture();
        let mut estimator = CountingEstimator::new(4);
        estimator.extra_component = true;

        let result = get_psds(&ica, &recording, &estimator, &PsdOptions::default());

        assert!(matches!(result, Err(PsdError::SpectrumShapeMismatch { .. })), "got {result:?}");
    }

    #[test]
    fn get_psds_averages_complex_coefficients() {
        let (ica, recording) = fixture();
        let estimator = CountingEstimator::new(3);
        let options = PsdOptions { output: "complex".to_string(), db: false, ..Default::default() };

        let features = get_psds(&ica, &recording, &estimator, &options).unwrap();

        assert_eq!(features.shape(), &[3, 2, 3]);
        assert!(features.power().is_none());
        match features.mean {
            PsdMean::Complex(coefs) => {
                assert!(coefs.iter().all(|&c| c == Complex64::new(1.0, -1.0)))
            }
            other => panic!("expected complex mean, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify complex output works with the default dB flag.
    //
    // Given
    // -----
    // - output = "complex", everything else default (dB on); the estimator
    //   returns 1 − 1i for every coefficient.
    //
    // Expect
    // ------
    // - One estimator call and no validation error.
    // - Every mean equals 10·log10(1 − 1i) = 5·log10(2) − i·10·(π/4)/ln 10.
    fn get_psds_converts_complex_coefficients_to_db_by_default() {
        let (ica, recording) = fixture();
        let estimator = CountingEstimator::new(3);
        let options = PsdOptions { output: "complex".to_string(), ..Default::default() };

        let features = get_psds(&ica, &recording, &estimator, &options).unwrap();

        assert_eq!(estimator.calls.get(), 1);
        assert_eq!(features.shape(), &[3, 2, 3]);
        let expected_re = 5.0 * 2.0_f64.log10();
        let expected_im = -10.0 * std::f64::consts::FRAC_PI_4 / std::f64::consts::LN_10;
        match features.mean {
            PsdMean::Complex(coefs) => {
                for c in coefs.iter() {
                    approx::assert_relative_eq!(c.re, expected_re, epsilon = 1e-12);
                    approx::assert_relative_eq!(c.im, expected_im, epsilon = 1e-12);
                }
            }
            other => panic!("expected complex mean, got {other:?}"),
        }
    }
}
