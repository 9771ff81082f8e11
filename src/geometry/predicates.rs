//! Geometric predicates at runtime dimension.
//!
//! The hull solver works in the lifted space, whose dimension D+1 is only
//! known at runtime, so every predicate here takes coordinate slices rather
//! than fixed-size points. Orientation and hyperplane construction both go
//! through LU determinants with an adaptive, magnitude-scaled tolerance.

use nalgebra::DMatrix;
use thiserror::Error;

use crate::geometry::matrix::{adaptive_tolerance, determinant};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for predicate evaluation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PredicateError {
    /// The predicate received the wrong number of points.
    #[error("Expected {expected} points, got {actual}")]
    WrongPointCount {
        /// Required number of points.
        expected: usize,
        /// Number of points received.
        actual: usize,
    },
    /// A point has the wrong number of coordinates.
    #[error("Point has {actual} coordinates, expected {expected}")]
    DimensionMismatch {
        /// Required coordinate count.
        expected: usize,
        /// Coordinate count received.
        actual: usize,
    },
    /// The facet vertices are affinely dependent; no hyperplane exists.
    #[error("Degenerate facet: vertices are affinely dependent")]
    DegenerateFacet,
    /// The reference point lies on the facet hyperplane, so the outward
    /// side cannot be determined.
    #[error("Reference point lies on the facet hyperplane")]
    AmbiguousOrientation,
}

// =============================================================================
// ORIENTATION
// =============================================================================

/// Represents the orientation of a simplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The simplex has negative orientation (determinant < 0)
    NEGATIVE,
    /// The simplex is degenerate (determinant ≈ 0)
    DEGENERATE,
    /// The simplex has positive orientation (determinant > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Determine the orientation of a k-dimensional simplex from its k+1 points.
///
/// Builds the standard orientation matrix — one row per point, its k
/// coordinates followed by a constant 1 — and classifies the sign of its
/// determinant against an adaptive tolerance.
///
/// # Arguments
///
/// * `simplex` - exactly k+1 points, each with k coordinates
/// * `base_tolerance` - base tolerance before magnitude scaling
///
/// # Errors
///
/// Returns [`PredicateError::WrongPointCount`] or
/// [`PredicateError::DimensionMismatch`] when the inputs are not a full
/// simplex of consistent dimension.
///
/// # Examples
///
/// ```
/// use delaunay_lift::geometry::predicates::{simplex_orientation, Orientation};
///
/// let a = [0.0, 0.0];
/// let b = [1.0, 0.0];
/// let c = [0.0, 1.0];
/// let orientation = simplex_orientation(&[&a, &b, &c], 1e-12).unwrap();
/// assert_eq!(orientation, Orientation::POSITIVE);
/// ```
pub fn simplex_orientation(
    simplex: &[&[f64]],
    base_tolerance: f64,
) -> Result<Orientation, PredicateError> {
    let k = simplex
        .len()
        .checked_sub(1)
        .ok_or(PredicateError::WrongPointCount {
            expected: 1,
            actual: 0,
        })?;
    for point in simplex {
        if point.len() != k {
            return Err(PredicateError::DimensionMismatch {
                expected: k,
                actual: point.len(),
            });
        }
    }

    let mut matrix = DMatrix::<f64>::zeros(k + 1, k + 1);
    for (i, point) in simplex.iter().enumerate() {
        for (j, &v) in point.iter().enumerate() {
            matrix[(i, j)] = v;
        }
        matrix[(i, k)] = 1.0;
    }

    let tolerance = adaptive_tolerance(&matrix, base_tolerance);
    let det = determinant(&matrix);

    if det > tolerance {
        Ok(Orientation::POSITIVE)
    } else if det < -tolerance {
        Ok(Orientation::NEGATIVE)
    } else {
        Ok(Orientation::DEGENERATE)
    }
}

// =============================================================================
// FACET HYPERPLANE
// =============================================================================

/// Oriented hyperplane supporting a hull facet: unit outward normal and
/// offset, so that `signed_distance` is positive strictly outside.
#[derive(Clone, Debug, PartialEq)]
pub struct FacetPlane {
    normal: Vec<f64>,
    offset: f64,
}

impl FacetPlane {
    /// Signed distance from `point` to the plane; positive on the outward side.
    ///
    /// # Panics
    ///
    /// Panics if `point` has a different dimension than the plane normal.
    #[must_use]
    pub fn signed_distance(&self, point: &[f64]) -> f64 {
        assert_eq!(point.len(), self.normal.len());
        self.normal
            .iter()
            .zip(point)
            .map(|(n, x)| n * x)
            .sum::<f64>()
            - self.offset
    }

    /// Unit outward normal.
    #[must_use]
    pub fn normal(&self) -> &[f64] {
        &self.normal
    }

    /// Last component of the outward normal.
    ///
    /// In the lifted space this is the component along the paraboloid axis;
    /// its sign separates the upper and lower envelopes.
    #[must_use]
    pub fn last_normal_component(&self) -> f64 {
        *self
            .normal
            .last()
            .unwrap_or_else(|| unreachable!("facet plane normal is never empty"))
    }

    fn negate(&mut self) {
        for n in &mut self.normal {
            *n = -*n;
        }
        self.offset = -self.offset;
    }
}

/// Construct the oriented hyperplane through `vertices`, facing away from
/// `below`.
///
/// The normal is the generalized cross product of the edge vectors, computed
/// by cofactor expansion (one (k-1)×(k-1) determinant per component), then
/// normalized and flipped so that `below` — a point known to be strictly
/// inside the hull — has negative signed distance.
///
/// # Arguments
///
/// * `vertices` - exactly k points with k coordinates each (a (k-1)-simplex
///   spanning the hyperplane)
/// * `below` - interior reference point
///
/// # Errors
///
/// - [`PredicateError::WrongPointCount`] / [`PredicateError::DimensionMismatch`]
///   on malformed input.
/// - [`PredicateError::DegenerateFacet`] if the vertices are affinely
///   dependent.
/// - [`PredicateError::AmbiguousOrientation`] if `below` lies on the plane.
pub fn facet_plane(vertices: &[&[f64]], below: &[f64]) -> Result<FacetPlane, PredicateError> {
    let k = vertices.len();
    if k < 2 {
        return Err(PredicateError::WrongPointCount {
            expected: 2,
            actual: k,
        });
    }
    for point in vertices.iter().chain(std::iter::once(&below)) {
        if point.len() != k {
            return Err(PredicateError::DimensionMismatch {
                expected: k,
                actual: point.len(),
            });
        }
    }

    // Edge vectors relative to the first vertex: (k-1) rows of length k.
    let base = vertices[0];
    let edges: Vec<Vec<f64>> = vertices[1..]
        .iter()
        .map(|v| v.iter().zip(base).map(|(a, b)| a - b).collect())
        .collect();

    // Generalized cross product by cofactor expansion along a virtual last row.
    let mut normal = vec![0.0_f64; k];
    let mut minor = DMatrix::<f64>::zeros(k - 1, k - 1);
    for (j, component) in normal.iter_mut().enumerate() {
        for (r, edge) in edges.iter().enumerate() {
            let mut c = 0;
            for (col, &v) in edge.iter().enumerate() {
                if col != j {
                    minor[(r, c)] = v;
                    c += 1;
                }
            }
        }
        let det = determinant(&minor);
        if det.is_nan() {
            return Err(PredicateError::DegenerateFacet);
        }
        *component = if j % 2 == 0 { det } else { -det };
    }

    let norm = normal.iter().map(|v| v * v).sum::<f64>().sqrt();
    if !norm.is_finite() || norm <= f64::MIN_POSITIVE.sqrt() {
        return Err(PredicateError::DegenerateFacet);
    }
    for n in &mut normal {
        *n /= norm;
    }
    let offset = normal.iter().zip(base).map(|(n, x)| n * x).sum::<f64>();

    let mut plane = FacetPlane { normal, offset };
    let d = plane.signed_distance(below);
    let below_magnitude = below.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    let guard = f64::EPSILON * (1.0 + below_magnitude + plane.offset.abs());
    if d.abs() <= guard {
        return Err(PredicateError::AmbiguousOrientation);
    }
    if d > 0.0 {
        plane.negate();
    }
    Ok(plane)
}
