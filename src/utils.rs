//! utils — conversion helpers for the Python bindings.
//!
//! Only compiled with the `python-bindings` feature. Each helper turns a
//! loosely typed Python argument into the strongly typed value expected by
//! [`crate::features`], raising `TypeError` for the wrong kind of object and
//! leaving value checks to the Rust side.

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::features::picks::Picks;

/// Convert a Python component selection into [`Picks`].
///
/// Accepts an `int`, a component name such as `"ICA003"`, a sequence of
/// `int`s, or a sequence of names.
#[cfg(feature = "python-bindings")]
pub fn extract_picks(raw_picks: &Bound<'_, PyAny>) -> PyResult<Picks> {
    if let Ok(index) = raw_picks.extract::<i64>() {
        return Ok(Picks::Index(index));
    }
    if let Ok(name) = raw_picks.extract::<String>() {
        return Ok(Picks::Names(vec![name]));
    }
    if let Ok(indices) = raw_picks.extract::<Vec<i64>>() {
        return Ok(Picks::Indices(indices));
    }
    if let Ok(names) = raw_picks.extract::<Vec<String>>() {
        return Ok(Picks::Names(names));
    }
    Err(PyTypeError::new_err(
        "picks must be an int, a component name, or a sequence of ints or names",
    ))
}

/// Check a sampling rate or cutoff frequency received from Python.
#[cfg(feature = "python-bindings")]
pub fn extract_positive_rate(name: &str, value: f64) -> PyResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{name} must be finite and > 0; got {value}"
        )))
    }
}
