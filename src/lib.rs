//! # delaunay-lift
//!
//! Delaunay triangulation of a point set in arbitrary dimension, computed
//! by the classical reduction: lift every point onto a paraboloid in D+1
//! dimensions, take the convex hull of the lifted set, and keep the lower
//! envelope — its facets project exactly onto the Delaunay simplices.
//!
//! The crate consumes a flat row-major point buffer and produces three
//! parallel arrays in the form host callers expect: 1-based facet ids,
//! a flattened `n_facets × (D+1)` vertex-index matrix, and a flattened
//! neighbor-index matrix where `0` marks a side with no Delaunay neighbor.
//! Neighbor slot `j` of a facet is always the neighbor opposite its vertex
//! slot `j`.
//!
//! # Basic Usage
//!
//! ```rust
//! use delaunay_lift::prelude::*;
//!
//! // The unit square: four cocircular points.
//! let points = [
//!     0.0, 0.0, //
//!     1.0, 0.0, //
//!     0.0, 1.0, //
//!     1.0, 1.0,
//! ];
//!
//! let tri = triangulate(&points, 4, 2).unwrap();
//!
//! // Two triangles, mutually adjacent across the shared diagonal.
//! assert_eq!(tri.n_facets(), 2);
//! assert_eq!(tri.facet_vertices(0).len(), 3);
//! assert!(tri.facet_neighbors(0).iter().any(|&k| k != 0));
//! assert!(tri.validate().is_ok());
//! ```
//!
//! Higher dimensions work the same way; only the buffer stride changes:
//!
//! ```rust
//! use delaunay_lift::prelude::*;
//!
//! // A 3-simplex: the smallest 3D triangulation.
//! let points = [
//!     0.0, 0.0, 0.0, //
//!     1.0, 0.0, 0.0, //
//!     0.0, 1.0, 0.0, //
//!     0.0, 0.0, 1.0,
//! ];
//!
//! let tri = triangulate(&points, 4, 3).unwrap();
//! assert_eq!(tri.n_facets(), 1);
//! // A lone simplex borders nothing: every neighbor slot is the sentinel.
//! assert!(tri.facet_neighbors(0).iter().all(|&k| k == 0));
//! ```
//!
//! # Degenerate input
//!
//! Inputs that cannot span the requested dimension fail with a structured
//! error instead of producing partial output:
//!
//! ```rust
//! use delaunay_lift::prelude::*;
//!
//! let collinear = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
//! let result = triangulate(&collinear, 3, 2);
//! assert!(matches!(result, Err(DelaunayError::Hull(_))));
//! ```
//!
//! # Architecture
//!
//! - [`core::delaunay`] — the entry point and the [`Triangulation`]
//!   output type.
//! - [`core::extract`] — lower-envelope filtering and 1-based re-indexing,
//!   the postprocessing contract of the reduction.
//! - [`core::traits::hull_engine`] — the solver seam: any backend that can
//!   produce the full facet set of the lifted hull plugs in here.
//! - [`geometry::algorithms::incremental_hull`] — the bundled
//!   beneath-beyond backend at runtime dimension.
//! - [`geometry::lift`] — paraboloid lifting with height rescaling, a
//!   deterministic tie-breaking joggle, and the synthetic apex that keeps
//!   cospherical inputs full-dimensional.
//!
//! [`Triangulation`]: core::delaunay::Triangulation

#![forbid(unsafe_code)]

/// Primary data structures and the triangulation pipeline.
pub mod core {
    pub mod delaunay;
    pub mod extract;
    pub mod facet;
    /// Traits for pluggable solver backends.
    pub mod traits {
        pub mod hull_engine;
        pub use hull_engine::*;
    }
    pub use delaunay::*;
    pub use extract::*;
    pub use facet::*;
    pub use traits::*;
}

/// Geometric types, predicates, and the bundled hull backend.
pub mod geometry {
    /// Geometric algorithms over the lifted point set.
    pub mod algorithms {
        pub mod incremental_hull;
        pub use incremental_hull::*;
    }
    pub mod lift;
    pub mod matrix;
    pub mod point;
    pub mod predicates;
    /// Coordinate abstractions for input scalars.
    pub mod traits {
        pub mod coordinate;
        pub use coordinate::*;
    }
    pub use algorithms::*;
    pub use lift::*;
    pub use matrix::*;
    pub use point::*;
    pub use predicates::*;
    pub use traits::*;
}

/// Re-exports of the commonly used types and entry points.
pub mod prelude {
    pub use crate::core::{
        delaunay::{
            Delaunay, DelaunayError, Triangulation, TriangulationValidationError, triangulate,
        },
        extract::{ExtractError, extract},
        facet::{FacetError, FacetId, HullFacet, HullFacetSet, VertexId},
        traits::hull_engine::{HullConfig, HullEngine, HullError},
    };
    pub use crate::geometry::{
        algorithms::incremental_hull::IncrementalHull,
        lift::{LiftedPoints, lift_points},
        point::{PointBuffer, PointBufferError},
        traits::coordinate::CoordinateScalar,
    };
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// Compile-time check that the exported types are normal auto-trait
    /// citizens.
    const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
        true
    }

    #[test]
    fn exported_types_are_normal() {
        assert!(is_normal::<Triangulation>());
        assert!(is_normal::<Delaunay>());
        assert!(is_normal::<HullFacetSet>());
        assert!(is_normal::<HullConfig>());
        assert!(is_normal::<IncrementalHull>());
    }

    #[test]
    fn prelude_covers_the_pipeline() {
        let points = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let buffer = PointBuffer::from_flat(&points, 3, 2).unwrap();
        let lifted = lift_points(&buffer, &HullConfig::default());
        let hull = IncrementalHull::default().compute_hull(&lifted).unwrap();
        let tri = extract(&hull, 3).unwrap();
        assert_eq!(tri.n_facets(), 1);

        let direct = triangulate(&points, 3, 2).unwrap();
        assert_eq!(tri, direct);
    }
}
