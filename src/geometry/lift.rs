//! Paraboloid lifting.
//!
//! The standard reduction: a D-dimensional point gains a last coordinate
//! equal to the sum of squares of its coordinates, and the Delaunay
//! triangulation is the lower envelope of the lifted set's convex hull.
//!
//! Three conditioning steps are applied on top of the plain lift:
//!
//! - the lifted coordinate is rescaled into the span of the input
//!   coordinates, so the hull does not operate on a needle-shaped cloud;
//! - every height receives a tiny deterministic joggle, far below geometric
//!   scale but decisively above the visibility tolerance, so cospherical
//!   inputs still produce a simplicial hull;
//! - a synthetic apex is appended far above the paraboloid. It keeps the
//!   hull full-dimensional for inputs whose lift is flat (cospherical sets,
//!   or exactly D+1 points), and every facet containing it is an upper
//!   envelope artifact by construction.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::facet::VertexId;
use crate::core::traits::hull_engine::HullConfig;
use crate::geometry::point::PointBuffer;

/// Compute the squared Euclidean norm of a coordinate slice.
///
/// This is the paraboloid height of the lift.
///
/// # Examples
///
/// ```
/// use delaunay_lift::geometry::lift::squared_norm;
///
/// assert_eq!(squared_norm(&[3.0, 4.0]), 25.0);
/// ```
#[must_use]
pub fn squared_norm(coords: &[f64]) -> f64 {
    coords.iter().map(|&x| x * x).sum()
}

// =============================================================================
// LIFTED POINTS
// =============================================================================

/// The lifted point set handed to a hull engine.
///
/// Holds `n_input + 1` rows of `input_dims + 1` coordinates: every input
/// point with its (scaled, joggled) height, plus the synthetic apex as the
/// last row. Internal to the pipeline; callers never see lifted
/// coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct LiftedPoints {
    coords: Vec<f64>,
    dims: usize,
    n_input: usize,
}

impl LiftedPoints {
    /// Lifted dimension (input dimension + 1).
    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Dimension of the original points.
    #[must_use]
    pub const fn input_dims(&self) -> usize {
        self.dims - 1
    }

    /// Number of input points (the apex excluded).
    #[must_use]
    pub const fn n_input(&self) -> usize {
        self.n_input
    }

    /// Total number of rows, apex included.
    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_input + 1
    }

    /// Vertex id of the synthetic apex (one past the last input point).
    ///
    /// # Panics
    ///
    /// Panics if the point count does not fit in a [`VertexId`].
    #[must_use]
    pub fn apex_id(&self) -> VertexId {
        VertexId::try_from(self.n_input).unwrap_or_else(|_| {
            unreachable!("point count checked against VertexId range at lift time")
        })
    }

    /// Coordinates of lifted row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dims..(i + 1) * self.dims]
    }

    /// Largest absolute coordinate over all rows, apex included.
    #[must_use]
    pub fn max_abs_coordinate(&self) -> f64 {
        self.coords.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
    }
}

// =============================================================================
// LIFT
// =============================================================================

/// Lift a point buffer onto the paraboloid.
///
/// Heights are rescaled into the input coordinate span, joggled by a
/// deterministic seeded sequence, and capped with the synthetic apex row.
/// The same buffer and configuration always produce the same lift.
#[must_use]
pub fn lift_points(points: &PointBuffer, config: &HullConfig) -> LiftedPoints {
    let d = points.dims();
    let n = points.n_points();
    let dims = d + 1;

    let heights: Vec<f64> = points.rows().map(squared_norm).collect();

    // Coordinate span per input dimension, for Qbb-style height rescaling.
    let mut mins = vec![f64::INFINITY; d];
    let mut maxs = vec![f64::NEG_INFINITY; d];
    for row in points.rows() {
        for (j, &v) in row.iter().enumerate() {
            mins[j] = mins[j].min(v);
            maxs[j] = maxs[j].max(v);
        }
    }
    let width = mins
        .iter()
        .zip(&maxs)
        .fold(0.0_f64, |acc, (lo, hi)| acc.max(hi - lo));

    let h_min = heights.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let h_max = heights.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let h_span = h_max - h_min;
    let target_span = if width > 0.0 { width } else { 1.0 };

    let mut rng = StdRng::seed_from_u64(config.joggle_seed);
    let amplitude = config.joggle_amplitude * target_span;

    let mut coords = Vec::with_capacity((n + 1) * dims);
    let mut lifted_max = f64::NEG_INFINITY;
    for (row, &h) in points.rows().zip(&heights) {
        coords.extend_from_slice(row);
        let scaled = if h_span > 0.0 {
            (h - h_min) * (target_span / h_span)
        } else {
            0.0
        };
        let joggled = amplitude.mul_add(rng.random::<f64>() - 0.5, scaled);
        lifted_max = lifted_max.max(joggled);
        coords.push(joggled);
    }

    // Apex above the bounding-box center; clears the highest lifted point
    // by a margin that stays positive even for tiny coordinate spans.
    for (lo, hi) in mins.iter().zip(&maxs) {
        coords.push(0.5 * (lo + hi));
    }
    coords.push(lifted_max + (config.apex_margin * target_span).max(1.0));

    LiftedPoints {
        coords,
        dims,
        n_input: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn square() -> PointBuffer {
        let data = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        PointBuffer::from_flat(&data, 4, 2).unwrap()
    }

    #[test]
    fn heights_are_scaled_into_coordinate_span() {
        let lifted = lift_points(&square(), &HullConfig::default());
        assert_eq!(lifted.dims(), 3);
        assert_eq!(lifted.n_rows(), 5);
        // Raw heights 0, 1, 1, 2 rescale to 0, 0.5, 0.5, 1 before joggle.
        assert_relative_eq!(lifted.row(0)[2], 0.0, epsilon = 1e-9);
        assert_relative_eq!(lifted.row(1)[2], 0.5, epsilon = 1e-9);
        assert_relative_eq!(lifted.row(3)[2], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn input_coordinates_pass_through_unchanged() {
        let lifted = lift_points(&square(), &HullConfig::default());
        assert_eq!(&lifted.row(3)[..2], &[1.0, 1.0]);
    }

    #[test]
    fn apex_is_strictly_above_every_height() {
        let lifted = lift_points(&square(), &HullConfig::default());
        let apex = lifted.row(lifted.apex_id() as usize);
        assert_eq!(apex.len(), 3);
        assert_relative_eq!(apex[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(apex[1], 0.5, epsilon = 1e-12);
        for i in 0..lifted.n_input() {
            assert!(apex[2] > lifted.row(i)[2] + 0.5);
        }
    }

    #[test]
    fn joggle_breaks_exact_height_ties() {
        let lifted = lift_points(&square(), &HullConfig::default());
        // Points 1 and 2 are cocircular with equal raw heights; the joggle
        // must separate them without moving either meaningfully.
        let h1 = lifted.row(1)[2];
        let h2 = lifted.row(2)[2];
        assert_ne!(h1, h2);
        assert!((h1 - h2).abs() < 1e-8);
    }

    #[test]
    fn lift_is_deterministic() {
        let config = HullConfig::default();
        let a = lift_points(&square(), &config);
        let b = lift_points(&square(), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn coincident_points_lift_without_panicking() {
        let data = [2.0, 2.0, 2.0, 2.0];
        let points = PointBuffer::from_flat(&data, 2, 2).unwrap();
        let lifted = lift_points(&points, &HullConfig::default());
        assert_eq!(lifted.n_rows(), 3);
        assert!(lifted.row(2)[2] > 0.9);
    }
}
