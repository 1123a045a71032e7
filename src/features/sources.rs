//! features::sources — segment, reject, and reconstruct component sources.
//!
//! Purpose
//! -------
//! Turn a [`Recording`] into the 3-D source array (segments × components ×
//! samples) the spectral estimator consumes, dropping segments that fail
//! amplitude or annotation rejection.
//!
//! Key behaviors
//! -------------
//! - Gather recording rows into the decomposition's channel order; a missing
//!   channel is a [`PsdError::MetadataMismatch`].
//! - Continuous recordings are cut into non-overlapping windows of
//!   `round(segment_duration × sfreq)` samples; the trailing partial window
//!   is discarded.
//! - Windows overlapping a bad annotation are dropped when
//!   `reject_by_annotation` is set (continuous input only).
//! - Segments with a peak-to-peak exceedance under the active
//!   [`RejectPolicy`] are dropped.
//! - Surviving segments are unmixed one by one into components × samples.
//!
//! Invariants & assumptions
//! ------------------------
//! - Returned `data` has shape `(n_kept, n_components, segment_samples)` with
//!   `n_kept ≥ 1`.
//! - `dropped` holds ascending segment indices in the pre-rejection
//!   numbering.
//! - Amplitude checks use every recording channel whose type has a
//!   threshold, not just the channels the decomposition was fitted on.

use crate::features::{
    decomposition::Decomposition,
    errors::{PsdError, PsdResult},
    recording::{Recording, RecordingInfo, SegmentKind},
    rejection::{RejectPolicy, RejectThresholds},
};
use ndarray::{Array3, ArrayView2, Axis, s};

/// Window length, in seconds, used to segment continuous recordings.
pub const DEFAULT_SEGMENT_DURATION: f64 = 2.0;

/// `SourceSegments` — reconstructed component time series.
///
/// Fields
/// ------
/// - `data`: segments × components × samples.
/// - `kind`: whether segments were cut from a continuous recording or
///   supplied as epochs.
/// - `dropped`: indices of rejected segments.
/// - `tmin`: time in seconds of each segment's first sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSegments {
    pub data: Array3<f64>,
    pub kind: SegmentKind,
    pub dropped: Vec<usize>,
    pub tmin: f64,
}

impl SourceSegments {
    pub fn n_segments(&self) -> usize {
        self.data.dim().0
    }
}

/// Reconstruct component sources for every segment that survives rejection.
///
/// Parameters
/// ----------
/// - `decomposition`: fitted solution providing channel order, fit-time
///   thresholds and the unmixing projection.
/// - `recording`: continuous or epoched data.
/// - `reject`: amplitude rejection policy.
/// - `reject_by_annotation`: drop continuous windows overlapping bad
///   annotations.
/// - `segment_duration`: window length in seconds for continuous input;
///   must be finite and > 0.
///
/// Errors
/// ------
/// - `PsdError::MetadataMismatch`
///   A decomposition channel is missing from the recording, or the
///   decomposition rejects the gathered block.
/// - `PsdError::InvalidParameter`
///   `segment_duration` is invalid or shorter than one sample.
/// - `PsdError::RecordingTooShort`
///   A continuous recording holds no complete window.
/// - `PsdError::AllSegmentsRejected`
///   Every segment was dropped.
/// - `PsdError::InvalidDecomposition`
///   `unmix` returned a block of the wrong shape.
pub fn prepare_sources<D>(
    decomposition: &D, recording: &Recording, reject: &RejectPolicy, reject_by_annotation: bool,
    segment_duration: f64,
) -> PsdResult<SourceSegments>
where
    D: Decomposition + ?Sized,
{
    let info = recording.info();
    let picks = gather_channels(decomposition, info)?;
    let thresholds = reject.resolve(decomposition.fit_reject());

    match recording {
        Recording::Continuous(raw) => {
            let segment_samples = segment_samples(segment_duration, info.sfreq())?;
            let n_segments = raw.n_times() / segment_samples;
            if n_segments == 0 {
                return Err(PsdError::RecordingTooShort { n_times: raw.n_times(), segment_samples });
            }

            let sfreq = info.sfreq();
            let windows = (0..n_segments).map(|idx| {
                let start = idx * segment_samples;
                raw.data().slice(s![.., start..start + segment_samples])
            });
            let (kept, dropped) = screen_segments(windows, info, thresholds, |idx| {
                if !reject_by_annotation {
                    return false;
                }
                let start = (idx * segment_samples) as f64 / sfreq;
                let stop = ((idx + 1) * segment_samples) as f64 / sfreq;
                raw.overlaps_bad_annotation(start, stop)
            });

            let data = unmix_segments(decomposition, &picks, &kept, n_segments, segment_samples, |idx| {
                let start = idx * segment_samples;
                raw.data().slice(s![.., start..start + segment_samples])
            })?;
            Ok(SourceSegments { data, kind: SegmentKind::Segment, dropped, tmin: 0.0 })
        }
        Recording::Epoched(epochs) => {
            if reject_by_annotation {
                log::debug!("reject_by_annotation has no effect on epoched input");
            }
            let n_segments = epochs.n_epochs();
            let n_times = epochs.data().dim().2;
            let (kept, dropped) =
                screen_segments(epochs.data().outer_iter(), info, thresholds, |_| false);

            let data = unmix_segments(decomposition, &picks, &kept, n_segments, n_times, |idx| {
                epochs.data().index_axis(Axis(0), idx)
            })?;
            Ok(SourceSegments { data, kind: SegmentKind::Epochs, dropped, tmin: epochs.tmin() })
        }
    }
}

/// Recording row index of every decomposition channel, in fit order.
fn gather_channels<D>(decomposition: &D, info: &RecordingInfo) -> PsdResult<Vec<usize>>
where
    D: Decomposition + ?Sized,
{
    decomposition
        .ch_names()
        .iter()
        .map(|name| {
            info.channel_index(name).ok_or_else(|| PsdError::MetadataMismatch {
                reason: format!("channel {name:?} used by the decomposition is not in the recording"),
            })
        })
        .collect()
}

fn segment_samples(segment_duration: f64, sfreq: f64) -> PsdResult<usize> {
    if !segment_duration.is_finite() || segment_duration <= 0.0 {
        return Err(PsdError::InvalidParameter {
            name: "segment_duration",
            value: segment_duration.to_string(),
            reason: "segment duration must be finite and > 0",
        });
    }
    let samples = (segment_duration * sfreq).round();
    if samples < 1.0 {
        return Err(PsdError::InvalidParameter {
            name: "segment_duration",
            value: segment_duration.to_string(),
            reason: "segment duration is shorter than one sample",
        });
    }
    Ok(samples as usize)
}

/// Split segment indices into kept and dropped.
fn screen_segments<'a>(
    segments: impl Iterator<Item = ArrayView2<'a, f64>>, info: &RecordingInfo,
    thresholds: Option<&RejectThresholds>, mut annotated_bad: impl FnMut(usize) -> bool,
) -> (Vec<usize>, Vec<usize>) {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (idx, segment) in segments.enumerate() {
        if annotated_bad(idx) {
            log::debug!("segment {idx} overlaps a bad annotation");
            dropped.push(idx);
            continue;
        }
        let exceedance =
            thresholds.and_then(|limits| limits.first_exceedance(segment, info.ch_types()));
        if let Some((row, peak_to_peak)) = exceedance {
            log::debug!(
                "segment {idx} rejected: channel {} peak-to-peak {peak_to_peak:e}",
                info.ch_names()[row]
            );
            dropped.push(idx);
        } else {
            kept.push(idx);
        }
    }
    (kept, dropped)
}

fn unmix_segments<'a, D>(
    decomposition: &D, picks: &[usize], kept: &[usize], n_segments: usize, n_times: usize,
    segment: impl Fn(usize) -> ArrayView2<'a, f64>,
) -> PsdResult<Array3<f64>>
where
    D: Decomposition + ?Sized,
{
    if kept.is_empty() {
        return Err(PsdError::AllSegmentsRejected { n_segments });
    }
    if kept.len() < n_segments {
        log::debug!("dropped {} of {n_segments} segments", n_segments - kept.len());
    }

    let n_components = decomposition.n_components();
    let mut sources = Array3::<f64>::zeros((kept.len(), n_components, n_times));
    for (out_idx, &seg_idx) in kept.iter().enumerate() {
        let channels = segment(seg_idx).select(Axis(0), picks);
        let unmixed = decomposition.unmix(channels.view())?;
        if unmixed.dim() != (n_components, n_times) {
            return Err(PsdError::InvalidDecomposition {
                reason: format!(
                    "unmix returned shape {:?}, expected ({n_components}, {n_times})",
                    unmixed.dim()
                ),
            });
        }
        sources.index_axis_mut(Axis(0), out_idx).assign(&unmixed);
    }
    Ok(sources)
}
