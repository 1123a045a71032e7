//! features::rejection — amplitude thresholds and rejection policy.
//!
//! Purpose
//! -------
//! Represent peak-to-peak rejection thresholds per channel type
//! ([`RejectThresholds`]), the caller's choice of which thresholds apply
//! ([`RejectPolicy`]), and the per-segment check used before sources are
//! reconstructed.
//!
//! Key behaviors
//! -------------
//! - `RejectPolicy::Auto` defers to the thresholds recorded when the
//!   decomposition was fitted; `Explicit` uses the caller's mapping; `None`
//!   disables amplitude rejection.
//! - A segment is bad when any channel of a thresholded type has a
//!   peak-to-peak amplitude (`max − min`) strictly above its threshold.
//!
//! Invariants & assumptions
//! ------------------------
//! - Thresholds are finite and strictly positive.
//! - Channel types without a threshold are never inspected; thresholds for
//!   types absent from the recording are ignored.

use crate::features::{
    errors::{PsdError, PsdResult},
    recording::ChannelType,
};
use ndarray::ArrayView2;
use std::collections::BTreeMap;

/// Peak-to-peak rejection thresholds keyed by channel type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RejectThresholds {
    thresholds: BTreeMap<ChannelType, f64>,
}

impl RejectThresholds {
    /// Build thresholds from `(channel type, peak-to-peak limit)` pairs.
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidParameter`
    ///   Returned when a limit is non-finite or ≤ 0.
    pub fn new(pairs: impl IntoIterator<Item = (ChannelType, f64)>) -> PsdResult<Self> {
        let mut thresholds = BTreeMap::new();
        for (ch_type, limit) in pairs {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(PsdError::InvalidParameter {
                    name: "reject",
                    value: format!("{ch_type}={limit}"),
                    reason: "rejection thresholds must be finite and > 0",
                });
            }
            thresholds.insert(ch_type, limit);
        }
        Ok(RejectThresholds { thresholds })
    }

    /// Build thresholds from string keys such as `("eeg", 100e-6)`.
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidParameter`
    ///   Returned for unknown channel type names and invalid limits.
    pub fn from_named<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> PsdResult<Self> {
        let parsed = pairs
            .into_iter()
            .map(|(name, limit)| -> PsdResult<(ChannelType, f64)> { Ok((name.parse()?, limit)) })
            .collect::<PsdResult<Vec<_>>>()?;
        Self::new(parsed)
    }

    pub fn get(&self, ch_type: ChannelType) -> Option<f64> {
        self.thresholds.get(&ch_type).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelType, f64)> + '_ {
        self.thresholds.iter().map(|(&ch_type, &limit)| (ch_type, limit))
    }

    /// First channel whose peak-to-peak amplitude exceeds its threshold.
    ///
    /// Parameters
    /// ----------
    /// - `segment`: channels × samples.
    /// - `ch_types`: one type per row of `segment`.
    ///
    /// Returns
    /// -------
    /// `Some((row, peak_to_peak))` for the first offending row, else `None`.
    pub fn first_exceedance(
        &self, segment: ArrayView2<'_, f64>, ch_types: &[ChannelType],
    ) -> Option<(usize, f64)> {
        if self.thresholds.is_empty() {
            return None;
        }
        segment.outer_iter().zip(ch_types).enumerate().find_map(|(row, (channel, ch_type))| {
            let limit = self.get(*ch_type)?;
            let (lo, hi) = channel
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            let peak_to_peak = hi - lo;
            (peak_to_peak > limit).then_some((row, peak_to_peak))
        })
    }
}

/// Which amplitude thresholds apply when preparing sources.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RejectPolicy {
    /// Use the thresholds recorded when the decomposition was fitted.
    #[default]
    Auto,
    /// Use the given thresholds.
    Explicit(RejectThresholds),
    /// Do not reject on amplitude.
    None,
}

impl RejectPolicy {
    /// Thresholds in effect, given the decomposition's fit-time thresholds.
    pub fn resolve<'a>(
        &'a self, fit_reject: Option<&'a RejectThresholds>,
    ) -> Option<&'a RejectThresholds> {
        let active = match self {
            RejectPolicy::Auto => fit_reject,
            RejectPolicy::Explicit(thresholds) => Some(thresholds),
            RejectPolicy::None => None,
        };
        active.filter(|thresholds| !thresholds.is_empty())
    }
}

impl From<RejectThresholds> for RejectPolicy {
    fn from(thresholds: RejectThresholds) -> Self {
        RejectPolicy::Explicit(thresholds)
    }
}
