//! features::options — caller-facing configuration for PSD feature extraction.
//!
//! Purpose
//! -------
//! Collect every knob of [`get_psds`](crate::features::psd::get_psds) in one
//! plain data carrier ([`PsdOptions`]) and turn it, in a single validating
//! step, into the typed [`MultitaperParams`] handed to the estimator.
//!
//! Key behaviors
//! -------------
//! - [`PsdOptions::default`] selects all components with fit-time and
//!   annotation rejection, `fmin = 0`, "length" normalization, "power"
//!   output, dB scaling and 2 s segments.
//! - [`PsdOptions::multitaper_params`] validates every option before any
//!   data is touched and replaces the caller's `fmax` with
//!   [`effective_fmax`] of the recording.
//!
//! Invariants & assumptions
//! ------------------------
//! - `fmax` on [`PsdOptions`] is accepted for interface compatibility only.
//! - `normalization` and `output` are kept as strings so that callers
//!   coming from dynamic front ends get an `InvalidParameter` error rather
//!   than a type error; parsing is exact and case-sensitive.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the default values, each validation failure, and the
//!   fmax override.

use crate::features::{
    errors::{PsdError, PsdResult},
    picks::Picks,
    recording::RecordingInfo,
    rejection::RejectPolicy,
    sources::DEFAULT_SEGMENT_DURATION,
    spectral::{MultitaperParams, Normalization, SpectrumOutput, effective_fmax},
};

/// PsdOptions — configuration for one feature-extraction call.
///
/// Fields
/// ------
/// - `picks`: components to keep; `None` keeps all of them.
/// - `reject`: amplitude rejection policy.
/// - `reject_by_annotation`: drop continuous windows overlapping
///   annotations whose description starts with "bad".
/// - `fmin`: lower frequency bound in Hz.
/// - `fmax`: ignored; the bound is derived from the recording.
/// - `tmin`, `tmax`: optional time window within each segment, in seconds.
/// - `bandwidth`: multi-taper bandwidth in Hz; `None` lets the estimator
///   choose.
/// - `adaptive`, `low_bias`, `proj`, `n_jobs`: passed to the estimator.
/// - `normalization`: `"length"` or `"full"`.
/// - `output`: `"power"` or `"complex"`.
/// - `db`: convert each value to decibels before averaging.
/// - `segment_duration`: window length in seconds for continuous input.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdOptions {
    pub picks: Option<Picks>,
    pub reject: RejectPolicy,
    pub reject_by_annotation: bool,
    pub fmin: f64,
    pub fmax: f64,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub bandwidth: Option<f64>,
    pub adaptive: bool,
    pub low_bias: bool,
    pub proj: bool,
    pub n_jobs: usize,
    pub normalization: String,
    pub output: String,
    pub db: bool,
    pub segment_duration: f64,
}

impl Default for PsdOptions {
    fn default() -> Self {
        PsdOptions {
            picks: None,
            reject: RejectPolicy::Auto,
            reject_by_annotation: true,
            fmin: 0.0,
            fmax: f64::INFINITY,
            tmin: None,
            tmax: None,
            bandwidth: None,
            adaptive: false,
            low_bias: true,
            proj: false,
            n_jobs: 1,
            normalization: "length".to_string(),
            output: "power".to_string(),
            db: true,
            segment_duration: DEFAULT_SEGMENT_DURATION,
        }
    }
}

impl PsdOptions {
    /// Validate the options against a recording and build estimator
    /// parameters.
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidParameter`
    ///   Returned for an unknown normalization or output, a negative or
    ///   non-finite `fmin`, an invalid time window, a non-positive
    ///   bandwidth, `n_jobs == 0`, or an invalid segment duration.
    pub fn multitaper_params(&self, info: &RecordingInfo) -> PsdResult<MultitaperParams> {
        let normalization: Normalization = self.normalization.parse()?;
        let output: SpectrumOutput = self.output.parse()?;

        let fmax = effective_fmax(info);
        if self.fmax.is_finite() && self.fmax != fmax {
            log::debug!("fmax={} overridden by the recording bound {fmax}", self.fmax);
        }
        if !self.fmin.is_finite() || self.fmin < 0.0 {
            return Err(invalid("fmin", self.fmin, "fmin must be finite and >= 0"));
        }

        for (name, bound) in [("tmin", self.tmin), ("tmax", self.tmax)] {
            if let Some(value) = bound {
                if !value.is_finite() {
                    return Err(invalid(name, value, "time bounds must be finite"));
                }
            }
        }
        if let (Some(tmin), Some(tmax)) = (self.tmin, self.tmax) {
            if tmin > tmax {
                return Err(invalid("tmin", tmin, "tmin must not exceed tmax"));
            }
        }

        if let Some(bandwidth) = self.bandwidth {
            if !bandwidth.is_finite() || bandwidth <= 0.0 {
                return Err(invalid("bandwidth", bandwidth, "bandwidth must be finite and > 0"));
            }
        }
        if self.n_jobs == 0 {
            return Err(PsdError::InvalidParameter {
                name: "n_jobs",
                value: "0".to_string(),
                reason: "n_jobs must be >= 1",
            });
        }
        if !self.segment_duration.is_finite() || self.segment_duration <= 0.0 {
            return Err(invalid(
                "segment_duration",
                self.segment_duration,
                "segment_duration must be finite and > 0",
            ));
        }

        Ok(MultitaperParams {
            fmin: self.fmin,
            fmax,
            tmin: self.tmin,
            tmax: self.tmax,
            bandwidth: self.bandwidth,
            adaptive: self.adaptive,
            low_bias: self.low_bias,
            normalization,
            output,
            proj: self.proj,
            n_jobs: self.n_jobs,
        })
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> PsdError {
    PsdError::InvalidParameter { name, value: value.to_string(), reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::recording::ChannelType;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Default option values.
    // - Each eager validation failure.
    // - The fmax override.
    // -------------------------------------------------------------------------

    fn info() -> RecordingInfo {
        RecordingInfo::new(250.0, 40.0, vec!["Fz".to_string()], vec![ChannelType::Eeg]).unwrap()
    }

    fn expect_invalid(options: PsdOptions, expected: &str) {
        match options.multitaper_params(&info()) {
            Err(PsdError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
            other => panic!("expected InvalidParameter({expected}), got {other:?}"),
        }
    }

    #[test]
    fn defaults_select_all_components_in_db() {
        let options = PsdOptions::default();

        assert!(options.picks.is_none());
        assert_eq!(options.reject, RejectPolicy::Auto);
        assert!(options.reject_by_annotation);
        assert_eq!(options.fmin, 0.0);
        assert_eq!(options.normalization, "length");
        assert_eq!(options.output, "power");
        assert!(options.db && options.low_bias && !options.adaptive && !options.proj);
        assert_eq!(options.n_jobs, 1);
        assert_eq!(options.segment_duration, 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify the caller's fmax never reaches the estimator.
    //
    // Given
    // -----
    // - sfreq = 250 Hz, lowpass = 40 Hz, caller fmax = 120 Hz.
    //
    // Expect
    // ------
    // - Parameters carry fmax = 50 and the parsed enums.
    fn multitaper_params_override_fmax() {
        let options = PsdOptions { fmax: 120.0, normalization: "full".to_string(), ..Default::default() };

        let params = options.multitaper_params(&info()).unwrap();

        assert_eq!(params.fmax, 50.0);
        assert_eq!(params.normalization, Normalization::Full);
        assert_eq!(params.output, SpectrumOutput::Power);
    }

    #[test]
    // Purpose
    // -------
    // Ensure every invalid option is reported under its own name.
    //
    // Given
    // -----
    // - One invalid field per case, everything else default.
    //
    // Expect
    // ------
    // - `InvalidParameter` naming the offending option.
    fn multitaper_params_reject_invalid_options() {
        let base = PsdOptions::default;
        expect_invalid(PsdOptions { normalization: "Length".to_string(), ..base() }, "normalization");
        expect_invalid(PsdOptions { output: "magnitude".to_string(), ..base() }, "output");
        expect_invalid(PsdOptions { fmin: -1.0, ..base() }, "fmin");
        expect_invalid(PsdOptions { fmin: f64::NAN, ..base() }, "fmin");
        expect_invalid(PsdOptions { tmin: Some(1.0), tmax: Some(0.5), ..base() }, "tmin");
        expect_invalid(PsdOptions { tmax: Some(f64::INFINITY), ..base() }, "tmax");
        expect_invalid(PsdOptions { bandwidth: Some(0.0), ..base() }, "bandwidth");
        expect_invalid(PsdOptions { n_jobs: 0, ..base() }, "n_jobs");
        expect_invalid(PsdOptions { segment_duration: 0.0, ..base() }, "segment_duration");
    }

    #[test]
    // Purpose
    // -------
    // Verify complex output is passed through with the default dB flag.
    //
    // Given
    // -----
    // - output = "complex", dB left at its default (true).
    //
    // Expect
    // ------
    // - Parameters carry `SpectrumOutput::Complex`; no validation error.
    fn complex_output_with_default_db_is_accepted() {
        let options = PsdOptions { output: "complex".to_string(), ..Default::default() };
        let params = options.multitaper_params(&info()).unwrap();
        assert_eq!(params.output, SpectrumOutput::Complex);
    }

    #[test]
    fn fmin_above_effective_fmax_is_left_to_the_estimator() {
        let options = PsdOptions { fmin: 80.0, ..Default::default() };
        let params = options.multitaper_params(&info()).unwrap();
        assert_eq!((params.fmin, params.fmax), (80.0, 50.0));
    }
}
