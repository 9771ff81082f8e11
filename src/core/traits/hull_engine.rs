//! Hull solver seam.
//!
//! The Delaunay reduction only needs one capability from a hull solver:
//! given the lifted point set, produce the full facet set of its convex
//! hull, every facet tagged upper/lower envelope and simplicial (exactly
//! D+1 vertices). [`HullEngine`] is that capability; the extractor depends
//! on the trait, never on a concrete backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::facet::HullFacetSet;
use crate::geometry::lift::LiftedPoints;
use crate::geometry::matrix::SINGULARITY_TOLERANCE;

/// Largest dimension treated with the tight low-dimensional tolerance
/// policy; above this, tolerances are scaled up to trade exactness checking
/// for scalability.
pub const LOW_DIMENSION_LIMIT: usize = 3;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for hull construction.
///
/// Any of these aborts the whole triangulation call; no partial output is
/// ever produced.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum HullError {
    /// The input is degenerate: fewer than D+2 affinely independent lifted
    /// points, so no full-dimensional hull exists.
    #[error("Degenerate input: {message}")]
    Degenerate {
        /// Human-readable description of the degeneracy.
        message: String,
    },
    /// Numerical breakdown while constructing a facet hyperplane.
    #[error("Numerical breakdown during hull construction: {message}")]
    NumericalBreakdown {
        /// Human-readable description of the failure.
        message: String,
    },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Robustness configuration for a hull run.
///
/// The defaults reproduce the classical setup for Delaunay-via-lifting:
/// a tight base tolerance for D ≤ [`LOW_DIMENSION_LIMIT`], a scaled-up
/// tolerance above it, a deterministic joggle that keeps degenerate
/// (cospherical) inputs simplicial, and a synthetic apex margin for the
/// point placed above the paraboloid.
///
/// The joggle amplitude must stay well above the visibility tolerance —
/// ties are only resolved if the perturbation is decisively larger than
/// the noise floor the solver ignores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HullConfig {
    /// Base visibility tolerance before magnitude scaling.
    pub base_tolerance: f64,
    /// Multiplier applied to `base_tolerance` when D > [`LOW_DIMENSION_LIMIT`].
    pub high_dimension_tolerance_scale: f64,
    /// Relative amplitude of the deterministic height joggle.
    pub joggle_amplitude: f64,
    /// Seed of the joggle sequence; fixed so repeated runs are byte-identical.
    pub joggle_seed: u64,
    /// Relative margin by which the synthetic apex clears the highest lifted point.
    pub apex_margin: f64,
}

impl Default for HullConfig {
    fn default() -> Self {
        Self {
            base_tolerance: SINGULARITY_TOLERANCE,
            high_dimension_tolerance_scale: 1e2,
            joggle_amplitude: 1e-8,
            joggle_seed: 0x00de_1a00_4a11,
            apex_margin: 1.0,
        }
    }
}

impl HullConfig {
    /// Visibility tolerance for a run over points of dimension `input_dims`
    /// whose largest absolute coordinate is `coordinate_scale`.
    #[must_use]
    pub fn visibility_tolerance(&self, input_dims: usize, coordinate_scale: f64) -> f64 {
        let base = if input_dims <= LOW_DIMENSION_LIMIT {
            self.base_tolerance
        } else {
            self.base_tolerance * self.high_dimension_tolerance_scale
        };
        base * (1.0 + coordinate_scale)
    }
}

// =============================================================================
// HULL ENGINE
// =============================================================================

/// A convex hull solver over the lifted point set.
///
/// Contract:
/// - the returned set covers the **entire** hull, upper and lower envelope,
///   every facet simplicial with exactly D+1 vertices and D+1 neighbor
///   slots, neighbor slot `j` opposite vertex slot `j`;
/// - facet ids are stable and unique for the run, and iteration order of
///   the returned set is deterministic;
/// - all working memory is scoped to the call and released before return,
///   on the failure path included.
pub trait HullEngine {
    /// Compute the convex hull of the lifted points.
    ///
    /// # Errors
    ///
    /// Returns [`HullError`] if the input is degenerate or the construction
    /// breaks down numerically. No partial facet set is ever returned.
    fn compute_hull(&self, lifted: &LiftedPoints) -> Result<HullFacetSet, HullError>;
}
