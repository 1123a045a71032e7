//! features::picks — component selection.
//!
//! Purpose
//! -------
//! Resolve a caller's component selection into a validated, ordered,
//! duplicate-free list of component indices before any signal is touched.
//!
//! Key behaviors
//! -------------
//! - `None` selects every component, `0..n_components`.
//! - Single indices, index lists, half-open ranges and component names
//!   (`"ICA000"`, `"ICA013"`, ...) are accepted through [`Picks`].
//! - Duplicates are removed keeping the first occurrence, so the caller's
//!   order is preserved.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every returned index satisfies `idx < n_components`.
//! - Negative indices are rejected; there is no Python-style wrap-around.
//! - An explicit selection that resolves to nothing is an error.
//!
//! Conventions
//! -----------
//! - Component names follow the `ICA` prefix plus a zero-padded, three-digit
//!   index used by the downstream classifier tooling.
//! - All failures are [`PsdError::InvalidSelection`].

use crate::features::errors::{PsdError, PsdResult};

/// Prefix shared by every component name.
pub const COMPONENT_PREFIX: &str = "ICA";

/// Caller-facing component selection.
///
/// Variants
/// --------
/// - `Index(i)`: one component.
/// - `Indices(v)`: an ordered collection of components.
/// - `Range { start, stop }`: the half-open range `start..stop`.
/// - `Names(v)`: components addressed by name, e.g. `"ICA004"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Picks {
    Index(i64),
    Indices(Vec<i64>),
    Range { start: usize, stop: usize },
    Names(Vec<String>),
}

impl From<i64> for Picks {
    fn from(index: i64) -> Self {
        Picks::Index(index)
    }
}

impl From<Vec<i64>> for Picks {
    fn from(indices: Vec<i64>) -> Self {
        Picks::Indices(indices)
    }
}

impl From<std::ops::Range<usize>> for Picks {
    fn from(range: std::ops::Range<usize>) -> Self {
        Picks::Range { start: range.start, stop: range.end }
    }
}

/// Name of the component at `index`, e.g. `component_name(3) == "ICA003"`.
pub fn component_name(index: usize) -> String {
    format!("{COMPONENT_PREFIX}{index:03}")
}

/// Resolve a component selection against the decomposition size.
///
/// Parameters
/// ----------
/// - `picks`: `Option<&Picks>`
///   Requested components; `None` selects all of them.
/// - `n_components`: `usize`
///   Number of components in the fitted decomposition.
///
/// Returns
/// -------
/// `PsdResult<Vec<usize>>`
///   Indices in request order with later duplicates removed.
///
/// Errors
/// ------
/// - `PsdError::InvalidSelection`
///   Returned for negative or out-of-range indices, names that do not
///   parse as `ICA<digits>` or point past the last component, ranges with
///   `start >= stop` or `stop > n_components`, and empty explicit selections.
pub fn resolve_picks(picks: Option<&Picks>, n_components: usize) -> PsdResult<Vec<usize>> {
    let picks = match picks {
        None => return Ok((0..n_components).collect()),
        Some(picks) => picks,
    };

    let invalid = |reason: &'static str| PsdError::InvalidSelection {
        selection: format!("{picks:?}"),
        n_components,
        reason,
    };

    let raw: Vec<usize> = match picks {
        Picks::Index(index) => vec![checked_index(*index, n_components).ok_or_else(|| {
            invalid("component indices must satisfy 0 <= index < n_components")
        })?],
        Picks::Indices(indices) => indices
            .iter()
            .map(|&index| {
                checked_index(index, n_components).ok_or_else(|| {
                    invalid("component indices must satisfy 0 <= index < n_components")
                })
            })
            .collect::<PsdResult<_>>()?,
        Picks::Range { start, stop } => {
            if start >= stop {
                return Err(invalid("range start must be smaller than range stop"));
            }
            if *stop > n_components {
                return Err(invalid("range stop must not exceed n_components"));
            }
            (*start..*stop).collect()
        }
        Picks::Names(names) => names
            .iter()
            .map(|name| {
                parse_component_name(name)
                    .ok_or_else(|| invalid("component names must look like 'ICA000'"))
                    .and_then(|index| {
                        if index < n_components {
                            Ok(index)
                        } else {
                            Err(invalid("named component does not exist"))
                        }
                    })
            })
            .collect::<PsdResult<_>>()?,
    };

    if raw.is_empty() {
        return Err(invalid("selection must contain at least one component"));
    }

    let mut seen = vec![false; n_components];
    let resolved: Vec<usize> = raw
        .into_iter()
        .filter(|&index| !std::mem::replace(&mut seen[index], true))
        .collect();

    Ok(resolved)
}

fn checked_index(index: i64, n_components: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&idx| idx < n_components)
}

fn parse_component_name(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(COMPONENT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The `None` default and every `Picks` variant.
    // - Bounds checks (negative, == n, > n), empty selections, bad names.
    // - Order-preserving de-duplication.
    // -------------------------------------------------------------------------

    fn assert_invalid_selection(result: PsdResult<Vec<usize>>) {
        match result {
            Err(PsdError::InvalidSelection { .. }) => (),
            other => panic!("expected InvalidSelection error, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that omitting the selection yields every component in order.
    //
    // Given
    // -----
    // - `picks = None`, `n_components = 4`.
    //
    // Expect
    // ------
    // - `[0, 1, 2, 3]`.
    fn resolve_picks_none_selects_all_components() {
        let picks = resolve_picks(None, 4).unwrap();
        assert_eq!(picks, vec![0, 1, 2, 3]);
    }

    #[test]
    // Purpose
    // -------
    // Verify that explicit index lists keep caller order and drop repeats.
    //
    // Given
    // -----
    // - `Indices([3, 1, 3, 0, 1])` against 5 components.
    //
    // Expect
    // ------
    // - `[3, 1, 0]`.
    fn resolve_picks_indices_deduplicate_preserving_order() {
        let picks = resolve_picks(Some(&Picks::Indices(vec![3, 1, 3, 0, 1])), 5).unwrap();
        assert_eq!(picks, vec![3, 1, 0]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure indices at or beyond the component count are rejected.
    //
    // Given
    // -----
    // - `Index(5)` and `Indices([0, 9])` against 5 components.
    //
    // Expect
    // ------
    // - Both return `InvalidSelection`.
    fn resolve_picks_out_of_range_index_is_invalid() {
        assert_invalid_selection(resolve_picks(Some(&Picks::Index(5)), 5));
        assert_invalid_selection(resolve_picks(Some(&Picks::Indices(vec![0, 9])), 5));
    }

    #[test]
    // Purpose
    // -------
    // Ensure negative indices are rejected instead of wrapping around.
    //
    // Given
    // -----
    // - `Index(-1)` against 5 components.
    //
    // Expect
    // ------
    // - `InvalidSelection`.
    fn resolve_picks_negative_index_is_invalid() {
        assert_invalid_selection(resolve_picks(Some(&Picks::Index(-1)), 5));
    }

    #[test]
    // Purpose
    // -------
    // Verify range handling, including the empty and overlong cases.
    //
    // Given
    // -----
    // - `1..4`, `3..3`, and `2..7` against 5 components.
    //
    // Expect
    // ------
    // - `[1, 2, 3]`, then two `InvalidSelection` errors.
    fn resolve_picks_range_variants() {
        assert_eq!(resolve_picks(Some(&Picks::from(1..4)), 5).unwrap(), vec![1, 2, 3]);
        assert_invalid_selection(resolve_picks(Some(&Picks::from(3..3)), 5));
        assert_invalid_selection(resolve_picks(Some(&Picks::from(2..7)), 5));
    }

    #[test]
    // Purpose
    // -------
    // Verify name resolution and rejection of malformed names.
    //
    // Given
    // -----
    // - Names "ICA002", "ICA000" against 3 components; then "ICA003",
    //   "EEG001", and "ICA" alone.
    //
    // Expect
    // ------
    // - `[2, 0]` for the valid names; `InvalidSelection` for the rest.
    fn resolve_picks_names() {
        let names = Picks::Names(vec!["ICA002".to_string(), "ICA000".to_string()]);
        assert_eq!(resolve_picks(Some(&names), 3).unwrap(), vec![2, 0]);

        for bad in ["ICA003", "EEG001", "ICA", "ICA-01"] {
            assert_invalid_selection(resolve_picks(
                Some(&Picks::Names(vec![bad.to_string()])),
                3,
            ));
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure an explicit but empty selection is rejected.
    //
    // Given
    // -----
    // - `Indices([])` and `Names([])`.
    //
    // Expect
    // ------
    // - `InvalidSelection` for both.
    fn resolve_picks_empty_explicit_selection_is_invalid() {
        assert_invalid_selection(resolve_picks(Some(&Picks::Indices(vec![])), 3));
        assert_invalid_selection(resolve_picks(Some(&Picks::Names(vec![])), 3));
    }

    #[test]
    fn component_name_is_zero_padded() {
        assert_eq!(component_name(0), "ICA000");
        assert_eq!(component_name(13), "ICA013");
        assert_eq!(component_name(1234), "ICA1234");
    }
}
