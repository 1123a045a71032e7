//! rust_icalabel — ICA component PSD features with optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the feature helpers to Python via the `_rust_icalabel` extension
//! module when the `python-bindings` feature is enabled.
//!
//! Key behaviors
//! -------------
//! - Re-export the [`features`] stack (recordings, decompositions, component
//!   selection, source reconstruction, spectral seam, aggregation) as the
//!   public crate surface.
//! - Define the `#[pymodule]` initializer and register the
//!   `rust_icalabel.features` submodule in `sys.modules` so dotted imports
//!   work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in [`features`]; this file performs only FFI
//!   glue, argument conversion, and error mapping.
//! - `PsdError` values cross the boundary as `ValueError`.
//!
//! Downstream usage
//! ----------------
//! - Rust callers depend on [`features`] (or `features::prelude`) and can
//!   ignore every item gated on `python-bindings`.
//! - The Python package imports `_rust_icalabel.features` for
//!   `effective_fmax`, `resolve_picks` and `psd_mean`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in [`features`] and by
//!   `tests/integration_psd_pipeline.rs`; the bindings are exercised from
//!   Python.

pub mod features;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray3};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    features::{aggregation::aggregate_power, picks, spectral::fmax_bound},
    utils::{extract_picks, extract_positive_rate},
};

/// Upper frequency bound used by the PSD features,
/// `min(1.25 × lowpass, sfreq / 2)`.
///
/// Errors
/// ------
/// - `ValueError` when `sfreq` or `lowpass` is non-finite or ≤ 0.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "effective_fmax", signature = (sfreq, lowpass))]
fn py_effective_fmax(sfreq: f64, lowpass: f64) -> PyResult<f64> {
    let sfreq = extract_positive_rate("sfreq", sfreq)?;
    let lowpass = extract_positive_rate("lowpass", lowpass)?;
    Ok(fmax_bound(sfreq, lowpass))
}

/// Resolve a component selection into sorted-by-request, de-duplicated
/// indices. `picks=None` selects every component.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "resolve_picks", signature = (n_components, picks=None))]
fn py_resolve_picks(n_components: usize, picks: Option<&Bound<'_, PyAny>>) -> PyResult<Vec<usize>> {
    let picks = picks.map(extract_picks).transpose()?;
    Ok(picks::resolve_picks(picks.as_ref(), n_components)?)
}

/// Average a segments × components × freqs power array over segments,
/// converting to dB first when `dB` is true.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "psd_mean", signature = (psds, dB=true))]
#[allow(non_snake_case)]
fn py_psd_mean<'py>(
    py: Python<'py>, psds: PyReadonlyArray3<'py, f64>, dB: bool,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let mean = aggregate_power(psds.as_array(), dB)?;
    Ok(mean.into_pyarray(py))
}

/// _rust_icalabel — PyO3 module initializer for the Python extension.
///
/// Key behaviors
/// -------------
/// - Create the `features` submodule and attach it to `_rust_icalabel`.
/// - Register it in `sys.modules` as `rust_icalabel.features`.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_icalabel<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let features_mod = PyModule::new(_py, "features")?;
    features(_py, m, &features_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_icalabel.features", features_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn features<'py>(
    _py: Python, rust_icalabel: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_effective_fmax, m)?)?;
    m.add_function(wrap_pyfunction!(py_resolve_picks, m)?)?;
    m.add_function(wrap_pyfunction!(py_psd_mean, m)?)?;
    m.add("COMPONENT_PREFIX", picks::COMPONENT_PREFIX)?;
    rust_icalabel.add_submodule(m)?;
    Ok(())
}
