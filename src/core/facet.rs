//! Hull facet representation.
//!
//! A facet of the lifted convex hull is a D-simplex: exactly D+1 vertex
//! references and D+1 neighbor slots, where neighbor slot `j` is the facet
//! across the ridge opposite vertex slot `j`. That positional correspondence
//! is a load-bearing contract — the extractor copies both lists in native
//! slot order, and reordering either one independently silently breaks
//! vertex–neighbor alignment in the output.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Identifier of an input point (zero-based row index in the point buffer).
pub type VertexId = u32;

/// Identifier of a hull facet, stable and unique for the run.
pub type FacetId = u32;

/// Inline capacity for per-facet buffers; dimensions up to 7 stay on the stack.
pub const MAX_INLINE_DIMENSION: usize = 8;

/// Small buffer used for per-facet vertex and neighbor tuples.
pub type FacetBuffer<T> = SmallVec<[T; MAX_INLINE_DIMENSION]>;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for facet invariant violations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FacetError {
    /// A facet does not carry exactly D+1 vertices.
    #[error(
        "Facet {facet_id} must have exactly {expected} vertices for a {dimension}D triangulation, got {actual}"
    )]
    VertexCardinality {
        /// Offending facet id.
        facet_id: FacetId,
        /// Required vertex count (D+1).
        expected: usize,
        /// Actual vertex count.
        actual: usize,
        /// Triangulation dimension D.
        dimension: usize,
    },
    /// A facet does not carry exactly D+1 neighbor slots.
    #[error(
        "Facet {facet_id} must have exactly {expected} neighbor slots for a {dimension}D triangulation, got {actual}"
    )]
    NeighborCardinality {
        /// Offending facet id.
        facet_id: FacetId,
        /// Required neighbor slot count (D+1).
        expected: usize,
        /// Actual neighbor slot count.
        actual: usize,
        /// Triangulation dimension D.
        dimension: usize,
    },
}

// =============================================================================
// HULL FACET
// =============================================================================

/// One facet of the lifted convex hull, as produced by a hull engine.
///
/// Vertex and neighbor slots share the engine's native enumeration order;
/// an empty neighbor slot (`None`) means the facet has no neighbor across
/// that ridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HullFacet {
    id: FacetId,
    vertices: FacetBuffer<VertexId>,
    neighbors: FacetBuffer<Option<FacetId>>,
    upper_delaunay: bool,
}

impl HullFacet {
    /// Create a facet record.
    #[must_use]
    pub fn new(
        id: FacetId,
        vertices: FacetBuffer<VertexId>,
        neighbors: FacetBuffer<Option<FacetId>>,
        upper_delaunay: bool,
    ) -> Self {
        Self {
            id,
            vertices,
            neighbors,
            upper_delaunay,
        }
    }

    /// Facet id, unique and stable for the run.
    #[must_use]
    pub const fn id(&self) -> FacetId {
        self.id
    }

    /// Vertex references in native slot order.
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Neighbor references in native slot order; slot `j` is opposite
    /// vertex slot `j`.
    #[must_use]
    pub fn neighbors(&self) -> &[Option<FacetId>] {
        &self.neighbors
    }

    /// Whether the facet belongs to the upper (non-Delaunay) envelope.
    #[must_use]
    pub const fn is_upper_delaunay(&self) -> bool {
        self.upper_delaunay
    }

    /// Verify the D+1 vertex/neighbor cardinality invariant.
    ///
    /// # Errors
    ///
    /// Returns [`FacetError::VertexCardinality`] or
    /// [`FacetError::NeighborCardinality`] when the facet is malformed.
    pub fn check_cardinality(&self, dimension: usize) -> Result<(), FacetError> {
        let expected = dimension + 1;
        if self.vertices.len() != expected {
            return Err(FacetError::VertexCardinality {
                facet_id: self.id,
                expected,
                actual: self.vertices.len(),
                dimension,
            });
        }
        if self.neighbors.len() != expected {
            return Err(FacetError::NeighborCardinality {
                facet_id: self.id,
                expected,
                actual: self.neighbors.len(),
                dimension,
            });
        }
        Ok(())
    }
}

// =============================================================================
// HULL FACET SET
// =============================================================================

/// The full facet set of one hull run, iterated in ascending facet id order.
///
/// Deterministic iteration order is part of the contract: the extractor
/// assigns output indices by traversal order, and repeated extraction over
/// the same set must be byte-identical.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HullFacetSet {
    facets: Vec<HullFacet>,
    input_dims: usize,
}

impl HullFacetSet {
    /// Build a facet set from facets sorted by ascending id.
    ///
    /// `input_dims` is the dimension D of the original (unlifted) points.
    #[must_use]
    pub fn new(facets: Vec<HullFacet>, input_dims: usize) -> Self {
        debug_assert!(
            facets.windows(2).all(|w| w[0].id < w[1].id),
            "hull facets must be sorted by ascending id"
        );
        Self { facets, input_dims }
    }

    /// Dimension D of the original points.
    #[must_use]
    pub const fn input_dims(&self) -> usize {
        self.input_dims
    }

    /// Number of facets (both envelopes).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.facets.len()
    }

    /// Whether the set contains no facets.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Iterate facets in ascending id order.
    pub fn iter(&self) -> std::slice::Iter<'_, HullFacet> {
        self.facets.iter()
    }

    /// Look up a facet by id.
    #[must_use]
    pub fn get(&self, id: FacetId) -> Option<&HullFacet> {
        self.facets
            .binary_search_by_key(&id, HullFacet::id)
            .ok()
            .map(|i| &self.facets[i])
    }

    /// Whether the facet with `id` belongs to the lower (Delaunay) envelope.
    #[must_use]
    pub fn is_lower(&self, id: FacetId) -> Option<bool> {
        self.get(id).map(|f| !f.is_upper_delaunay())
    }

    /// Number of lower-envelope facets.
    #[must_use]
    pub fn lower_count(&self) -> usize {
        self.facets.iter().filter(|f| !f.is_upper_delaunay()).count()
    }
}

impl<'a> IntoIterator for &'a HullFacetSet {
    type Item = &'a HullFacet;
    type IntoIter = std::slice::Iter<'a, HullFacet>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use smallvec::smallvec;

    fn facet(id: FacetId, upper: bool) -> HullFacet {
        HullFacet::new(
            id,
            smallvec![0, 1, 2],
            smallvec![None, Some(id + 1), None],
            upper,
        )
    }

    #[test]
    fn cardinality_check_accepts_well_formed_facet() {
        assert!(facet(0, false).check_cardinality(2).is_ok());
    }

    #[test]
    fn cardinality_check_rejects_missing_vertex() {
        let f = HullFacet::new(7, smallvec![0, 1], smallvec![None, None, None], false);
        assert!(matches!(
            f.check_cardinality(2),
            Err(FacetError::VertexCardinality {
                facet_id: 7,
                expected: 3,
                actual: 2,
                dimension: 2,
            })
        ));
    }

    #[test]
    fn cardinality_check_rejects_extra_neighbor_slot() {
        let f = HullFacet::new(
            3,
            smallvec![0, 1, 2],
            smallvec![None, None, None, Some(4)],
            false,
        );
        assert!(matches!(
            f.check_cardinality(2),
            Err(FacetError::NeighborCardinality { facet_id: 3, .. })
        ));
    }

    #[test]
    fn facet_set_lookup_by_id() {
        let set = HullFacetSet::new(vec![facet(0, false), facet(2, true), facet(5, false)], 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(2).map(HullFacet::id), Some(2));
        assert_eq!(set.get(1), None);
        assert_eq!(set.is_lower(0), Some(true));
        assert_eq!(set.is_lower(2), Some(false));
        assert_eq!(set.is_lower(9), None);
        assert_eq!(set.lower_count(), 2);
    }

    #[test]
    fn facet_set_iterates_in_id_order() {
        let set = HullFacetSet::new(vec![facet(1, false), facet(4, false)], 2);
        let ids: Vec<FacetId> = set.iter().map(HullFacet::id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
