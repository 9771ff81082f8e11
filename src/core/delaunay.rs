//! Delaunay triangulation entry point.
//!
//! [`Delaunay`] orchestrates the whole reduction: validate the input
//! buffer, lift the points onto the paraboloid, hand the lifted set to the
//! hull engine, and extract the lower envelope into a [`Triangulation`].
//! Every failure aborts the call before any output exists; the caller
//! never sees partial arrays.

use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::extract::{ExtractError, extract};
use crate::core::traits::hull_engine::{HullConfig, HullEngine, HullError};
use crate::geometry::algorithms::incremental_hull::IncrementalHull;
use crate::geometry::lift::lift_points;
use crate::geometry::point::{PointBuffer, PointBufferError};
use crate::geometry::traits::coordinate::CoordinateScalar;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for a triangulation call.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum DelaunayError {
    /// Fewer than D+1 points were supplied.
    #[error("Insufficient points for a {n_dims}D triangulation: got {n_points}, need at least {}", .n_dims + 1)]
    InsufficientPoints {
        /// Number of points supplied.
        n_points: usize,
        /// Requested dimension.
        n_dims: usize,
    },
    /// More points than the index representation supports.
    #[error("Too many points: {n_points} exceeds the supported maximum")]
    TooManyPoints {
        /// Number of points supplied.
        n_points: usize,
    },
    /// The input buffer failed validation.
    #[error(transparent)]
    Buffer(#[from] PointBufferError),
    /// Hull construction failed (degenerate input or numerical breakdown).
    #[error(transparent)]
    Hull(#[from] HullError),
    /// The hull facet set violated the extraction contract.
    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

/// Error type for triangulation output validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriangulationValidationError {
    /// A vertex entry falls outside `1..=n_points`.
    #[error("Facet at index {facet_index} has vertex entry {entry} outside 1..={n_points}")]
    VertexOutOfRange {
        /// Output index of the facet.
        facet_index: usize,
        /// Offending vertex entry.
        entry: u32,
        /// Number of input points.
        n_points: usize,
    },
    /// A nonzero neighbor entry does not appear in the facet list.
    #[error("Facet at index {facet_index} references neighbor {entry} absent from the facet list")]
    UnknownNeighbor {
        /// Output index of the facet.
        facet_index: usize,
        /// Offending neighbor entry.
        entry: u32,
    },
    /// Facet A lists facet B as a neighbor but B does not list A.
    #[error("Facets {facet} and {neighbor} disagree about their adjacency")]
    AsymmetricAdjacency {
        /// 1-based id of the facet naming the neighbor.
        facet: u32,
        /// 1-based id of the neighbor that does not reciprocate.
        neighbor: u32,
    },
}

// =============================================================================
// TRIANGULATION OUTPUT
// =============================================================================

/// A Delaunay triangulation in the flattened-array form consumed by host
/// callers.
///
/// All ids are 1-based; `0` in the neighbor list is the sentinel for "no
/// Delaunay neighbor on this side". The vertex and neighbor lists are
/// row-major with `dim + 1` entries per facet, and neighbor slot `j` of a
/// facet is the neighbor opposite its vertex slot `j`.
///
/// # Examples
///
/// ```
/// use delaunay_lift::prelude::*;
///
/// let square = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
/// let tri = triangulate(&square, 4, 2).unwrap();
/// assert_eq!(tri.n_facets(), 2);
/// assert_eq!(tri.facet_vertices(0).len(), 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangulation {
    dim: usize,
    n_points: usize,
    facet_list: Vec<u32>,
    vertex_list: Vec<u32>,
    neighbor_list: Vec<u32>,
}

impl Triangulation {
    pub(crate) fn from_parts(
        dim: usize,
        n_points: usize,
        facet_list: Vec<u32>,
        vertex_list: Vec<u32>,
        neighbor_list: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(vertex_list.len(), facet_list.len() * (dim + 1));
        debug_assert_eq!(neighbor_list.len(), facet_list.len() * (dim + 1));
        Self {
            dim,
            n_points,
            facet_list,
            vertex_list,
            neighbor_list,
        }
    }

    /// Dimension D of the triangulated points.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Number of input points.
    #[must_use]
    pub const fn n_points(&self) -> usize {
        self.n_points
    }

    /// Number of simplices in the triangulation.
    #[must_use]
    pub fn n_facets(&self) -> usize {
        self.facet_list.len()
    }

    /// 1-based facet ids, one per simplex.
    #[must_use]
    pub fn facet_list(&self) -> &[u32] {
        &self.facet_list
    }

    /// Flattened `n_facets * (dim + 1)` vertex matrix, 1-based entries.
    #[must_use]
    pub fn vertex_list(&self) -> &[u32] {
        &self.vertex_list
    }

    /// Flattened `n_facets * (dim + 1)` neighbor matrix; entries are
    /// 1-based facet ids or the 0 sentinel.
    #[must_use]
    pub fn neighbor_list(&self) -> &[u32] {
        &self.neighbor_list
    }

    /// Vertex row of the facet at output index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_facets`.
    #[must_use]
    pub fn facet_vertices(&self, i: usize) -> &[u32] {
        let w = self.dim + 1;
        &self.vertex_list[i * w..(i + 1) * w]
    }

    /// Neighbor row of the facet at output index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_facets`.
    #[must_use]
    pub fn facet_neighbors(&self, i: usize) -> &[u32] {
        let w = self.dim + 1;
        &self.neighbor_list[i * w..(i + 1) * w]
    }

    /// Consume the triangulation into its raw arrays:
    /// `(vertex_list, neighbor_list, facet_list, n_facets)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u32>, Vec<u32>, Vec<u32>, usize) {
        let n = self.facet_list.len();
        (self.vertex_list, self.neighbor_list, self.facet_list, n)
    }

    /// Check the structural invariants of the output arrays: vertex range,
    /// neighbor resolution, and mutual adjacency.
    ///
    /// # Errors
    ///
    /// Returns the first [`TriangulationValidationError`] found.
    pub fn validate(&self) -> Result<(), TriangulationValidationError> {
        let index_of: FxHashMap<u32, usize> = self
            .facet_list
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        for (i, &facet_id) in self.facet_list.iter().enumerate() {
            for &entry in self.facet_vertices(i) {
                if entry == 0 || entry as usize > self.n_points {
                    return Err(TriangulationValidationError::VertexOutOfRange {
                        facet_index: i,
                        entry,
                        n_points: self.n_points,
                    });
                }
            }
            for &entry in self.facet_neighbors(i) {
                if entry == 0 {
                    continue;
                }
                let Some(&j) = index_of.get(&entry) else {
                    return Err(TriangulationValidationError::UnknownNeighbor {
                        facet_index: i,
                        entry,
                    });
                };
                if !self.facet_neighbors(j).contains(&facet_id) {
                    return Err(TriangulationValidationError::AsymmetricAdjacency {
                        facet: facet_id,
                        neighbor: entry,
                    });
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// DELAUNAY FACADE
// =============================================================================

/// Delaunay triangulation by paraboloid lifting.
///
/// Holds only configuration; every [`triangulate`](Self::triangulate) call
/// runs in fresh solver state, so concurrent calls on clones (or on a
/// shared reference) are safe by construction.
#[derive(Clone, Debug, Default)]
pub struct Delaunay {
    config: HullConfig,
}

impl Delaunay {
    /// Create a triangulator with default robustness configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a triangulator with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: HullConfig) -> Self {
        Self { config }
    }

    /// The active robustness configuration.
    #[must_use]
    pub const fn config(&self) -> &HullConfig {
        &self.config
    }

    /// Triangulate `n_points` points of dimension `n_dims` given as a flat
    /// row-major buffer.
    ///
    /// # Errors
    ///
    /// - [`DelaunayError::Buffer`] on length mismatch, zero dimension, or
    ///   non-finite coordinates;
    /// - [`DelaunayError::InsufficientPoints`] when `n_points < n_dims + 1`;
    /// - [`DelaunayError::Hull`] on affinely degenerate input or numerical
    ///   breakdown;
    /// - [`DelaunayError::Extraction`] when the hull engine violates its
    ///   output contract.
    ///
    /// # Examples
    ///
    /// ```
    /// use delaunay_lift::core::delaunay::Delaunay;
    ///
    /// let square = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    /// let tri = Delaunay::new().triangulate(&square, 4, 2).unwrap();
    /// assert_eq!(tri.n_facets(), 2);
    /// assert!(tri.validate().is_ok());
    /// ```
    pub fn triangulate<T: CoordinateScalar>(
        &self,
        points: &[T],
        n_points: usize,
        n_dims: usize,
    ) -> Result<Triangulation, DelaunayError> {
        let buffer = PointBuffer::from_flat(points, n_points, n_dims)?;
        if n_points < n_dims + 1 {
            return Err(DelaunayError::InsufficientPoints { n_points, n_dims });
        }
        if n_points >= u32::MAX as usize {
            return Err(DelaunayError::TooManyPoints { n_points });
        }

        let lifted = lift_points(&buffer, &self.config);
        let engine = IncrementalHull::new(self.config.clone());
        let hull = engine.compute_hull(&lifted)?;
        let triangulation = extract(&hull, n_points)?;
        debug!(
            "triangulated {} points in {}D into {} simplices",
            n_points,
            n_dims,
            triangulation.n_facets()
        );
        Ok(triangulation)
    }
}

/// Triangulate with the default configuration.
///
/// Convenience wrapper over [`Delaunay::triangulate`].
///
/// # Errors
///
/// See [`Delaunay::triangulate`].
pub fn triangulate<T: CoordinateScalar>(
    points: &[T],
    n_points: usize,
    n_dims: usize,
) -> Result<Triangulation, DelaunayError> {
    Delaunay::new().triangulate(points, n_points, n_dims)
}
