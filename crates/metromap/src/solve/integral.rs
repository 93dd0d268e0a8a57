//! Rounding a solved placement to integers without breaking equalities.
//!
//! Rounding every coordinate on its own keeps two-term rows like
//! `X(a) = X(b)` intact, but not rows with more terms: a diagonal
//! `X(a) - X(b) = Y(a) - Y(b)` or an `equal` sum can end up one unit off.
//! Instead the free variables of the reduced system are rounded and every
//! pivot variable is recomputed from its row. Unit pivots keep those rows
//! integral, so the recomputed values are integers as well.

use log::{trace, warn};

use crate::{
    MetroMapError,
    solve::{equations::LinearEquality, lsq},
};

/// Rounds `values` to integers so that every equality still holds.
///
/// # Errors
///
/// Returns [`MetroMapError::Solver`] when the equalities contradict each
/// other.
pub(super) fn integral_solution(
    values: &[f64],
    equalities: &[LinearEquality],
) -> Result<Vec<f64>, MetroMapError> {
    let echelon = lsq::row_echelon(values.len(), equalities)?;

    let mut is_pivot = vec![false; values.len()];
    for pivot in &echelon.pivots {
        is_pivot[pivot.column] = true;
    }

    let mut rounded: Vec<f64> = values
        .iter()
        .zip(&is_pivot)
        .map(|(value, pivot)| if *pivot { 0.0 } else { snap(*value) })
        .collect();

    // A row only refers to pivots reduced after it, so solve from the back.
    for (pivot, equality) in echelon.pivots.iter().zip(&echelon.kept).rev() {
        let others: f64 = pivot
            .coefficients
            .iter()
            .enumerate()
            .filter(|(column, _)| *column != pivot.column)
            .map(|(column, coefficient)| coefficient * rounded[column])
            .sum();
        let value = denoise(pivot.constant - others);
        if value.fract() != 0.0 {
            warn!(
                source_line = equality.source_line(),
                value;
                "Constraint has no integral solution near the optimum, rounding"
            );
        }
        rounded[pivot.column] = value.round();
    }

    trace!(pivots = echelon.pivots.len(); "Rounded placement to integers");
    Ok(rounded)
}

/// Discards solver noise below a millionth.
fn denoise(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Rounds half away from zero after discarding solver noise, so values that
/// the equalities make equal round to the same integer.
fn snap(value: f64) -> f64 {
    denoise(value).round()
}
