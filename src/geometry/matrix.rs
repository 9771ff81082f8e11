//! Matrix operations.
//!
//! This module provides the small linear algebra helpers used by geometric
//! predicates: an LU-based determinant and an adaptive tolerance scaled by
//! matrix magnitude. The lifted dimension D+1 is a runtime value, so the
//! carrier is [`nalgebra::DMatrix`] rather than a const-generic matrix.

use nalgebra::DMatrix;

/// Default tolerance for matrix singularity checks.
///
/// Appropriately small for typical geometric computations while large enough
/// to absorb floating-point noise.
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Compute an LU-based determinant, returning 0.0 for singular matrices and
/// NaN when the matrix contains non-finite entries.
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use delaunay_lift::geometry::matrix::determinant;
///
/// let m = DMatrix::<f64>::identity(3, 3);
/// assert_eq!(determinant(&m), 1.0);
///
/// let z = DMatrix::<f64>::zeros(2, 2);
/// assert_eq!(determinant(&z), 0.0);
/// ```
///
/// # Panics
///
/// Panics if the matrix is not square.
#[must_use]
pub fn determinant(m: &DMatrix<f64>) -> f64 {
    assert!(m.is_square(), "determinant requires a square matrix");
    if m.iter().any(|v| !v.is_finite()) {
        return f64::NAN;
    }
    let det = m.determinant();
    if det.is_finite() { det } else { f64::NAN }
}

/// Compute an adaptive tolerance scaled by matrix magnitude (infinity norm).
///
/// Returns `base_tol + 1e-12 * ||A||_inf`, where the infinity norm is the
/// maximum absolute row sum. If the last column is (approximately) all ones,
/// it is excluded from the magnitude estimate to avoid inflating the
/// tolerance on small simplices, since orientation matrices carry a constant
/// ones column.
#[must_use]
pub fn adaptive_tolerance(m: &DMatrix<f64>, base_tol: f64) -> f64 {
    let nrows = m.nrows();
    let ncols = m.ncols();

    let last_col_is_all_ones =
        ncols > 0 && (0..nrows).all(|i| (m[(i, ncols - 1)] - 1.0).abs() <= f64::EPSILON);
    let col_limit = if last_col_is_all_ones {
        ncols - 1
    } else {
        ncols
    };

    let mut max_row_sum = 0.0_f64;
    for i in 0..nrows {
        let mut row_sum = 0.0_f64;
        for j in 0..col_limit {
            row_sum += m[(i, j)].abs();
        }
        max_row_sum = max_row_sum.max(row_sum);
    }

    let rel_factor = 1e-12_f64;
    rel_factor.mul_add(max_row_sum, base_tol)
}
