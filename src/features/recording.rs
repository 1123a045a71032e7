//! features::recording — validated recording containers.
//!
//! Purpose
//! -------
//! Provide the time-series containers the PSD pipeline reads from: channel
//! metadata ([`RecordingInfo`]), annotations ([`Annotation`]), continuous
//! recordings ([`RawRecording`]) and epoched recordings
//! ([`EpochedRecording`]), unified by [`Recording`].
//!
//! Key behaviors
//! -------------
//! - Validate sampling metadata, channel lists and sample values once, at
//!   construction, so downstream stages can index without re-checking.
//! - Answer the two lookups the pipeline delegates to the container:
//!   channel-name → row index, and "does this window overlap a bad
//!   annotation".
//!
//! Invariants & assumptions
//! ------------------------
//! - `sfreq` and `lowpass` are finite and strictly positive.
//! - Channel names are unique and `ch_names.len() == ch_types.len() > 0`.
//! - Raw data is channels × samples, epoched data is epochs × channels ×
//!   samples; every sample is finite and every axis is non-empty.
//! - Annotation onsets are seconds relative to the first sample of the
//!   continuous recording.
//!
//! Conventions
//! -----------
//! - Time windows are half-open, `[start, stop)`, in seconds.
//! - Annotations whose description starts with `"bad"` (any case) mark data
//!   to exclude, e.g. `"BAD_blink"`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover each constructor's error branches, channel lookup and
//!   annotation overlap edge cases (touching windows, zero-length spans).

use crate::features::errors::{PsdError, PsdResult};
use ndarray::{Array2, Array3};
use std::collections::HashSet;
use std::str::FromStr;

/// Acquisition channel type, used to key rejection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelType {
    Eeg,
    Mag,
    Grad,
    Eog,
    Ecg,
    Emg,
    Seeg,
    Misc,
}

impl ChannelType {
    /// Lowercase name as used in threshold mappings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Eeg => "eeg",
            ChannelType::Mag => "mag",
            ChannelType::Grad => "grad",
            ChannelType::Eog => "eog",
            ChannelType::Ecg => "ecg",
            ChannelType::Emg => "emg",
            ChannelType::Seeg => "seeg",
            ChannelType::Misc => "misc",
        }
    }
}

impl FromStr for ChannelType {
    type Err = PsdError;

    /// Parse a lowercase channel type name (`"eeg"`, `"grad"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eeg" => Ok(ChannelType::Eeg),
            "mag" => Ok(ChannelType::Mag),
            "grad" => Ok(ChannelType::Grad),
            "eog" => Ok(ChannelType::Eog),
            "ecg" => Ok(ChannelType::Ecg),
            "emg" => Ok(ChannelType::Emg),
            "seeg" => Ok(ChannelType::Seeg),
            "misc" => Ok(ChannelType::Misc),
            _ => Err(PsdError::InvalidParameter {
                name: "ch_type",
                value: s.to_string(),
                reason: "expected one of 'eeg', 'mag', 'grad', 'eog', 'ecg', 'emg', 'seeg', 'misc'",
            }),
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `RecordingInfo` — sampling and channel metadata of a recording.
///
/// Fields
/// ------
/// - `sfreq`: sampling rate in Hz.
/// - `lowpass`: low-pass cutoff in Hz applied during acquisition or
///   preprocessing.
/// - `ch_names`: channel names, one per data row.
/// - `ch_types`: channel types, aligned with `ch_names`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    sfreq: f64,
    lowpass: f64,
    ch_names: Vec<String>,
    ch_types: Vec<ChannelType>,
}

impl RecordingInfo {
    /// Construct validated recording metadata.
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidRecording`
    ///   Returned when `sfreq` or `lowpass` is non-finite or ≤ 0, when there
    ///   are no channels, when names and types differ in length, or when a
    ///   channel name repeats.
    pub fn new(
        sfreq: f64, lowpass: f64, ch_names: Vec<String>, ch_types: Vec<ChannelType>,
    ) -> PsdResult<Self> {
        if !sfreq.is_finite() || sfreq <= 0.0 {
            return Err(PsdError::InvalidRecording {
                reason: format!("sampling rate must be finite and > 0; got {sfreq}"),
            });
        }
        if !lowpass.is_finite() || lowpass <= 0.0 {
            return Err(PsdError::InvalidRecording {
                reason: format!("low-pass cutoff must be finite and > 0; got {lowpass}"),
            });
        }
        if ch_names.is_empty() {
            return Err(PsdError::InvalidRecording {
                reason: "recording must have at least one channel".to_string(),
            });
        }
        if ch_names.len() != ch_types.len() {
            return Err(PsdError::InvalidRecording {
                reason: format!(
                    "{} channel names but {} channel types",
                    ch_names.len(),
                    ch_types.len()
                ),
            });
        }
        let mut seen = HashSet::with_capacity(ch_names.len());
        for name in &ch_names {
            if !seen.insert(name.as_str()) {
                return Err(PsdError::InvalidRecording {
                    reason: format!("duplicate channel name {name:?}"),
                });
            }
        }

        Ok(RecordingInfo { sfreq, lowpass, ch_names, ch_types })
    }

    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    pub fn lowpass(&self) -> f64 {
        self.lowpass
    }

    /// Half the sampling rate.
    pub fn nyquist(&self) -> f64 {
        self.sfreq / 2.0
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    pub fn ch_types(&self) -> &[ChannelType] {
        &self.ch_types
    }

    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }

    /// Row index of the channel called `name`, if present.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.ch_names.iter().position(|candidate| candidate == name)
    }
}

/// `Annotation` — a labelled span of a continuous recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Start of the span in seconds from the first sample.
    pub onset: f64,
    /// Length of the span in seconds.
    pub duration: f64,
    pub description: String,
}

impl Annotation {
    /// Construct an annotation.
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidRecording`
    ///   Returned when `onset` is non-finite or `duration` is non-finite or
    ///   negative.
    pub fn new(onset: f64, duration: f64, description: impl Into<String>) -> PsdResult<Self> {
        if !onset.is_finite() {
            return Err(PsdError::InvalidRecording {
                reason: format!("annotation onset must be finite; got {onset}"),
            });
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(PsdError::InvalidRecording {
                reason: format!("annotation duration must be finite and >= 0; got {duration}"),
            });
        }
        Ok(Annotation { onset, duration, description: description.into() })
    }

    /// Whether this annotation marks data to exclude.
    pub fn is_bad(&self) -> bool {
        self.description.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("bad"))
    }

    /// Whether the span intersects the half-open window `[start, stop)`.
    ///
    /// A zero-length annotation overlaps a window that contains its onset.
    pub fn overlaps(&self, start: f64, stop: f64) -> bool {
        let end = self.onset + self.duration;
        if self.duration == 0.0 {
            return self.onset >= start && self.onset < stop;
        }
        self.onset < stop && end > start
    }
}

/// `RawRecording` — a continuous multichannel recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecording {
    data: Array2<f64>,
    info: RecordingInfo,
    annotations: Vec<Annotation>,
}

impl RawRecording {
    /// Construct a validated continuous recording.
    ///
    /// Parameters
    /// ----------
    /// - `data`: `Array2<f64>`
    ///   Channels × samples; one row per channel in `info`.
    /// - `info`: [`RecordingInfo`]
    /// - `annotations`: `Vec<Annotation>`
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidRecording`
    ///   Returned when the row count differs from the channel count, when
    ///   there are no samples, or when a sample is non-finite.
    pub fn new(
        data: Array2<f64>, info: RecordingInfo, annotations: Vec<Annotation>,
    ) -> PsdResult<Self> {
        if data.nrows() != info.n_channels() {
            return Err(PsdError::InvalidRecording {
                reason: format!(
                    "data has {} rows but info lists {} channels",
                    data.nrows(),
                    info.n_channels()
                ),
            });
        }
        if data.ncols() == 0 {
            return Err(PsdError::InvalidRecording {
                reason: "recording has no samples".to_string(),
            });
        }
        check_finite(data.iter())?;

        Ok(RawRecording { data, info, annotations })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn info(&self) -> &RecordingInfo {
        &self.info
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Whether any bad annotation intersects `[start, stop)` (seconds).
    pub fn overlaps_bad_annotation(&self, start: f64, stop: f64) -> bool {
        self.annotations.iter().any(|annot| annot.is_bad() && annot.overlaps(start, stop))
    }
}

/// `EpochedRecording` — fixed-length epochs cut from a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochedRecording {
    data: Array3<f64>,
    info: RecordingInfo,
    tmin: f64,
}

impl EpochedRecording {
    /// Construct validated epochs.
    ///
    /// Parameters
    /// ----------
    /// - `data`: `Array3<f64>`
    ///   Epochs × channels × samples.
    /// - `info`: [`RecordingInfo`]
    /// - `tmin`: `f64`
    ///   Time in seconds of each epoch's first sample relative to its event.
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidRecording`
    ///   Returned for a channel-count mismatch, an empty epoch or sample
    ///   axis, a non-finite `tmin`, or a non-finite sample.
    pub fn new(data: Array3<f64>, info: RecordingInfo, tmin: f64) -> PsdResult<Self> {
        let (n_epochs, n_channels, n_times) = data.dim();
        if n_channels != info.n_channels() {
            return Err(PsdError::InvalidRecording {
                reason: format!(
                    "epochs have {n_channels} channels but info lists {}",
                    info.n_channels()
                ),
            });
        }
        if n_epochs == 0 || n_times == 0 {
            return Err(PsdError::InvalidRecording {
                reason: format!("epochs must be non-empty; got shape ({n_epochs}, {n_channels}, {n_times})"),
            });
        }
        if !tmin.is_finite() {
            return Err(PsdError::InvalidRecording {
                reason: format!("epoch tmin must be finite; got {tmin}"),
            });
        }
        check_finite(data.iter())?;

        Ok(EpochedRecording { data, info, tmin })
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn info(&self) -> &RecordingInfo {
        &self.info
    }

    pub fn tmin(&self) -> f64 {
        self.tmin
    }

    pub fn n_epochs(&self) -> usize {
        self.data.dim().0
    }
}

/// Where the segments handed to the estimator came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Fixed-length windows cut from a continuous recording.
    Segment,
    /// Epochs supplied by the caller.
    Epochs,
}

/// A recording in either continuous or epoched form.
#[derive(Debug, Clone, PartialEq)]
pub enum Recording {
    Continuous(RawRecording),
    Epoched(EpochedRecording),
}

impl Recording {
    pub fn info(&self) -> &RecordingInfo {
        match self {
            Recording::Continuous(raw) => raw.info(),
            Recording::Epoched(epochs) => epochs.info(),
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Recording::Continuous(_) => SegmentKind::Segment,
            Recording::Epoched(_) => SegmentKind::Epochs,
        }
    }
}

impl From<RawRecording> for Recording {
    fn from(raw: RawRecording) -> Self {
        Recording::Continuous(raw)
    }
}

impl From<EpochedRecording> for Recording {
    fn from(epochs: EpochedRecording) -> Self {
        Recording::Epoched(epochs)
    }
}

fn check_finite<'a>(values: impl Iterator<Item = &'a f64>) -> PsdResult<()> {
    for (index, &value) in values.enumerate() {
        if !value.is_finite() {
            return Err(PsdError::InvalidRecording {
                reason: format!("sample at flat index {index} is non-finite: {value}"),
            });
        }
    }
    Ok(())
}
