//! features::decomposition — fitted decompositions that map channels to sources.
//!
//! Purpose
//! -------
//! Describe the read-only capability the PSD pipeline needs from a fitted
//! independent-component decomposition ([`Decomposition`]) and provide the
//! usual linear implementation ([`FittedIca`]) for solutions fitted
//! elsewhere and loaded by the caller.
//!
//! Key behaviors
//! -------------
//! - Report the component count, the channels the solution was fitted on
//!   (in fit order), and the rejection thresholds recorded at fit time.
//! - Project a channels × samples block into components × samples.
//!
//! Invariants & assumptions
//! ------------------------
//! - `unmix` receives rows in `ch_names()` order; gathering recording rows
//!   into that order is the caller's job.
//! - Implementations never mutate themselves while unmixing.
//!
//! Conventions
//! -----------
//! - [`FittedIca`] computes `unmixing · ((x − mean) / pre_whitener)` with
//!   per-channel `mean` and `pre_whitener` broadcast along samples.

use crate::features::{
    errors::{PsdError, PsdResult},
    rejection::RejectThresholds,
};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Read-only view of a fitted decomposition.
pub trait Decomposition {
    /// Number of extracted components.
    fn n_components(&self) -> usize;

    /// Channels the solution was fitted on, in fit order.
    fn ch_names(&self) -> &[String];

    /// Peak-to-peak thresholds used to drop segments while fitting, if any.
    fn fit_reject(&self) -> Option<&RejectThresholds>;

    /// Project `data` (channels in `ch_names()` order × samples) into
    /// components × samples.
    fn unmix(&self, data: ArrayView2<'_, f64>) -> PsdResult<Array2<f64>>;
}

impl<D: Decomposition + ?Sized> Decomposition for &D {
    fn n_components(&self) -> usize {
        (**self).n_components()
    }

    fn ch_names(&self) -> &[String] {
        (**self).ch_names()
    }

    fn fit_reject(&self) -> Option<&RejectThresholds> {
        (**self).fit_reject()
    }

    fn unmix(&self, data: ArrayView2<'_, f64>) -> PsdResult<Array2<f64>> {
        (**self).unmix(data)
    }
}

/// `FittedIca` — a linear ICA solution.
///
/// Fields
/// ------
/// - `ch_names`: channels the solution was fitted on.
/// - `mean`: per-channel mean removed before whitening.
/// - `pre_whitener`: per-channel scale dividing the centred data.
/// - `unmixing`: components × channels matrix (the product of the ICA
///   unmixing matrix and the retained PCA components).
/// - `reject`: thresholds recorded while fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedIca {
    ch_names: Vec<String>,
    mean: Array1<f64>,
    pre_whitener: Array1<f64>,
    unmixing: Array2<f64>,
    reject: Option<RejectThresholds>,
}

impl FittedIca {
    /// Construct a validated linear solution.
    ///
    /// Errors
    /// ------
    /// - `PsdError::InvalidDecomposition`
    ///   Returned when there are no channels or no components, when `mean`,
    ///   `pre_whitener` or the unmixing columns disagree with the channel
    ///   count, when an entry is non-finite, or when a whitener entry is 0.
    pub fn new(
        ch_names: Vec<String>, mean: Array1<f64>, pre_whitener: Array1<f64>,
        unmixing: Array2<f64>, reject: Option<RejectThresholds>,
    ) -> PsdResult<Self> {
        let n_channels = ch_names.len();
        if n_channels == 0 {
            return Err(PsdError::InvalidDecomposition {
                reason: "solution must be fitted on at least one channel".to_string(),
            });
        }
        if unmixing.nrows() == 0 {
            return Err(PsdError::InvalidDecomposition {
                reason: "solution must have at least one component".to_string(),
            });
        }
        if mean.len() != n_channels
            || pre_whitener.len() != n_channels
            || unmixing.ncols() != n_channels
        {
            return Err(PsdError::InvalidDecomposition {
                reason: format!(
                    "{n_channels} channels but mean has {}, pre_whitener has {} and unmixing has {} columns",
                    mean.len(),
                    pre_whitener.len(),
                    unmixing.ncols()
                ),
            });
        }
        let all_finite = mean.iter().chain(pre_whitener.iter()).chain(unmixing.iter()).all(|v| v.is_finite());
        if !all_finite {
            return Err(PsdError::InvalidDecomposition {
                reason: "mean, pre_whitener and unmixing must be finite".to_string(),
            });
        }
        if let Some(index) = pre_whitener.iter().position(|&w| w == 0.0) {
            return Err(PsdError::InvalidDecomposition {
                reason: format!("pre_whitener entry {index} is zero"),
            });
        }

        Ok(FittedIca { ch_names, mean, pre_whitener, unmixing, reject })
    }

    pub fn unmixing(&self) -> &Array2<f64> {
        &self.unmixing
    }
}

impl Decomposition for FittedIca {
    fn n_components(&self) -> usize {
        self.unmixing.nrows()
    }

    fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    fn fit_reject(&self) -> Option<&RejectThresholds> {
        self.reject.as_ref()
    }

    fn unmix(&self, data: ArrayView2<'_, f64>) -> PsdResult<Array2<f64>> {
        if data.nrows() != self.ch_names.len() {
            return Err(PsdError::MetadataMismatch {
                reason: format!(
                    "solution expects {} channels, got {}",
                    self.ch_names.len(),
                    data.nrows()
                ),
            });
        }
        let mean = self.mean.view().insert_axis(Axis(1));
        let scale = self.pre_whitener.view().insert_axis(Axis(1));
        let whitened = (&data - &mean) / &scale;
        Ok(self.unmixing.dot(&whitened))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `FittedIca::new` shape and value checks.
    // - `unmix` arithmetic against a hand-computed projection.
    // - Channel-count mismatch reported as `MetadataMismatch`.
    // -------------------------------------------------------------------------

    fn two_channel_ica() -> FittedIca {
        FittedIca::new(
            vec!["Fz".to_string(), "Cz".to_string()],
            array![1.0, -1.0],
            array![2.0, 0.5],
            array![[1.0, 0.0], [1.0, 1.0], [0.0, -1.0]],
            None,
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify `unmix` centres, scales, then projects.
    //
    // Given
    // -----
    // - mean = [1, -1], pre_whitener = [2, 0.5], three components.
    // - Data [[3, 1], [0, -1]] (channels × samples).
    //
    // Expect
    // ------
    // - Whitened data [[1, 0], [2, 0]], so sources
    //   [[1, 0], [3, 0], [-2, 0]].
    fn unmix_centres_scales_and_projects() {
        let ica = two_channel_ica();
        let data = array![[3.0, 1.0], [0.0, -1.0]];

        let sources = ica.unmix(data.view()).unwrap();

        assert_eq!(ica.n_components(), 3);
        assert_eq!(ica.unmixing().dim(), (3, 2));
        let expected = array![[1.0, 0.0], [3.0, 0.0], [-2.0, 0.0]];
        for (a, b) in sources.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn unmix_rejects_wrong_channel_count() {
        let ica = two_channel_ica();
        let data = Array2::<f64>::zeros((3, 4));
        assert!(matches!(ica.unmix(data.view()), Err(PsdError::MetadataMismatch { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Ensure constructor invariants are enforced.
    //
    // Given
    // -----
    // - Mismatched mean length, zero components, a zero whitener entry, and
    //   a NaN in the unmixing matrix.
    //
    // Expect
    // ------
    // - `InvalidDecomposition` for each.
    fn fitted_ica_rejects_inconsistent_solution() {
        let names = vec!["Fz".to_string(), "Cz".to_string()];
        let cases = vec![
            FittedIca::new(names.clone(), array![0.0], array![1.0, 1.0], Array2::eye(2), None),
            FittedIca::new(
                names.clone(),
                array![0.0, 0.0],
                array![1.0, 1.0],
                Array2::zeros((0, 2)),
                None,
            ),
            FittedIca::new(names.clone(), array![0.0, 0.0], array![1.0, 0.0], Array2::eye(2), None),
            FittedIca::new(
                names,
                array![0.0, 0.0],
                array![1.0, 1.0],
                array![[f64::NAN, 0.0], [0.0, 1.0]],
                None,
            ),
        ];
        for case in cases {
            assert!(matches!(case, Err(PsdError::InvalidDecomposition { .. })), "got {case:?}");
        }
    }
}
