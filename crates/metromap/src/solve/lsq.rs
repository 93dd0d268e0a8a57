//! Equality-constrained weighted least squares.
//!
//! The station placement problem is
//!
//! ```text
//! minimize   Σ w_i (x_i - t_i)²
//! subject to A x = b
//! ```
//!
//! [`KktSolver`] first drops redundant rows of `A` (authors often restate a
//! constraint through another one) and rejects contradictory rows, then
//! solves the KKT system
//!
//! ```text
//! | 2W  Aᵀ | | x |   | 2W t |
//! | A   0  | | λ | = |  b   |
//! ```
//!
//! with a dense LU decomposition.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::{MetroMapError, solve::equations::LinearEquality};

const PIVOT_TOLERANCE: f64 = 1e-9;
const CONSISTENCY_TOLERANCE: f64 = 1e-6;

/// One placement problem.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresProblem {
    targets: Vec<f64>,
    weights: Vec<f64>,
    equalities: Vec<LinearEquality>,
}

impl LeastSquaresProblem {
    /// Creates a problem over `targets.len()` variables.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Solver`] when the weights do not match the
    /// targets, a weight is not positive, or an equality names an unknown
    /// variable.
    pub fn new(
        targets: Vec<f64>,
        weights: Vec<f64>,
        equalities: Vec<LinearEquality>,
    ) -> Result<Self, MetroMapError> {
        if targets.len() != weights.len() {
            return Err(MetroMapError::Solver(format!(
                "{} targets but {} weights",
                targets.len(),
                weights.len()
            )));
        }
        if let Some(weight) = weights.iter().find(|weight| !(**weight > 0.0)) {
            return Err(MetroMapError::Solver(format!(
                "objective weights must be positive, got {weight}"
            )));
        }
        let variables = targets.len();
        if let Some(equality) = equalities
            .iter()
            .find(|equality| equality.terms().iter().any(|(var, _)| *var >= variables))
        {
            return Err(MetroMapError::Solver(format!(
                "constraint on line {} refers to an unknown coordinate",
                equality.source_line()
            )));
        }

        Ok(Self {
            targets,
            weights,
            equalities,
        })
    }

    pub fn variable_count(&self) -> usize {
        self.targets.len()
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn equalities(&self) -> &[LinearEquality] {
        &self.equalities
    }
}

/// Solves equality-constrained weighted least-squares problems.
pub trait EqualityLeastSquares {
    /// Returns the value of every variable at the constrained optimum.
    ///
    /// # Errors
    ///
    /// Returns [`MetroMapError::Solver`] when the equalities cannot all hold.
    fn solve_equality_lsq(&self, problem: &LeastSquaresProblem) -> Result<Vec<f64>, MetroMapError>;
}

/// Dense KKT solver backed by nalgebra.
#[derive(Debug, Default, Clone, Copy)]
pub struct KktSolver;

/// A reduced row with a unit pivot.
///
/// The row has zeros in the pivot columns of every row reduced before it.
pub(super) struct PivotRow {
    pub column: usize,
    pub coefficients: DVector<f64>,
    pub constant: f64,
}

/// The linearly independent equalities of a problem, in row echelon form.
pub(super) struct RowEchelon<'e> {
    /// Pivot rows in reduction order.
    pub pivots: Vec<PivotRow>,
    /// The original equality behind each pivot row.
    pub kept: Vec<&'e LinearEquality>,
}

/// Reduces `equalities` by Gaussian elimination against the rows kept so
/// far: a row that reduces to zero is redundant when its constant reduces
/// to zero too, and contradicts an earlier row otherwise.
///
/// Pivots prefer a coefficient of magnitude one, so rows with integer
/// coefficients stay integral through the reduction.
pub(super) fn row_echelon(
    variables: usize,
    equalities: &[LinearEquality],
) -> Result<RowEchelon<'_>, MetroMapError> {
    let mut pivots: Vec<PivotRow> = Vec::new();
    let mut kept = Vec::new();

    for equality in equalities {
        let mut coefficients = DVector::<f64>::zeros(variables);
        for (var, coefficient) in equality.terms() {
            coefficients[*var] += coefficient;
        }
        let mut constant = equality.constant();

        for pivot in &pivots {
            let factor = coefficients[pivot.column];
            if factor != 0.0 {
                coefficients.axpy(-factor, &pivot.coefficients, 1.0);
                constant -= factor * pivot.constant;
            }
        }

        let Some((column, value)) = pivot_entry(&coefficients) else {
            if constant.abs() > CONSISTENCY_TOLERANCE {
                return Err(MetroMapError::Solver(format!(
                    "constraint on line {} contradicts earlier constraints",
                    equality.source_line()
                )));
            }
            debug!(source_line = equality.source_line(); "Dropping redundant equality");
            continue;
        };

        coefficients /= value;
        pivots.push(PivotRow {
            column,
            coefficients,
            constant: constant / value,
        });
        kept.push(equality);
    }

    Ok(RowEchelon { pivots, kept })
}

/// The first unit coefficient of a row, else its largest one. `None` for a
/// row that has reduced to zero.
fn pivot_entry(coefficients: &DVector<f64>) -> Option<(usize, f64)> {
    let entries = || {
        coefficients
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, value)| value.abs() >= PIVOT_TOLERANCE)
    };
    entries()
        .find(|(_, value)| (value.abs() - 1.0).abs() < PIVOT_TOLERANCE)
        .or_else(|| entries().max_by(|a, b| a.1.abs().total_cmp(&b.1.abs())))
}

impl EqualityLeastSquares for KktSolver {
    fn solve_equality_lsq(&self, problem: &LeastSquaresProblem) -> Result<Vec<f64>, MetroMapError> {
        let n = problem.variable_count();
        let rows = row_echelon(n, problem.equalities())?.kept;
        let m = rows.len();
        debug!(variables = n, equalities = m; "Assembling KKT system");

        let mut kkt = DMatrix::<f64>::zeros(n + m, n + m);
        let mut rhs = DVector::<f64>::zeros(n + m);

        for (i, (target, weight)) in problem.targets().iter().zip(problem.weights()).enumerate() {
            kkt[(i, i)] = 2.0 * weight;
            rhs[i] = 2.0 * weight * target;
        }
        for (row, equality) in rows.iter().enumerate() {
            for (var, coefficient) in equality.terms() {
                kkt[(n + row, *var)] += coefficient;
                kkt[(*var, n + row)] += coefficient;
            }
            rhs[n + row] = equality.constant();
        }

        let solution = kkt.lu().solve(&rhs).ok_or_else(|| {
            MetroMapError::Solver("the constraint system is singular".to_string())
        })?;

        Ok(solution.rows(0, n).iter().copied().collect())
    }
}
