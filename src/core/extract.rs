//! Lower-envelope extraction.
//!
//! This is the reduction's postprocessing core: consume the full hull
//! facet set, keep the lower envelope, and re-index everything 1-based for
//! the caller. The off-by-one shift applies to facet ids, vertex ids, and
//! neighbor ids alike — but never to the 0 sentinel, which marks a side
//! with no Delaunay neighbor (a true boundary, or a side whose geometric
//! neighbor is an upper-envelope artifact).
//!
//! Both passes traverse the facet set in its deterministic iteration order,
//! so the output index assigned to each facet is stable, and vertex and
//! neighbor slots are copied in the facet's native enumeration order —
//! reordering either list independently would silently break the
//! slot-j-opposite-vertex-j correspondence.

use thiserror::Error;

use crate::core::delaunay::Triangulation;
use crate::core::facet::{FacetBuffer, FacetError, FacetId, HullFacetSet, VertexId};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for extraction failures.
///
/// All of these are defensive: they indicate a hull engine that violated
/// its contract, and extraction fails fast rather than coercing the facet.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractError {
    /// A hull facet violates the D+1 vertex/neighbor cardinality invariant.
    #[error(transparent)]
    MalformedFacet(#[from] FacetError),
    /// A lower-envelope facet references a vertex outside the input range.
    #[error("Facet {facet_id} references vertex {vertex_id}, but only {n_points} points exist")]
    ForeignVertex {
        /// Offending facet id.
        facet_id: FacetId,
        /// Out-of-range vertex id.
        vertex_id: VertexId,
        /// Number of input points.
        n_points: usize,
    },
    /// A facet references a neighbor id absent from the facet set.
    #[error("Facet {facet_id} references unknown neighbor facet {neighbor_id}")]
    DanglingNeighbor {
        /// Offending facet id.
        facet_id: FacetId,
        /// Unresolvable neighbor id.
        neighbor_id: FacetId,
    },
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// One output simplex in structured form; flattened only at the boundary.
struct DelaunayRow {
    facet: u32,
    vertices: FacetBuffer<u32>,
    neighbors: FacetBuffer<u32>,
}

/// Extract the Delaunay triangulation from a hull facet set.
///
/// First pass counts the lower-envelope facets; second pass fills the
/// output rows in the same traversal order. Upper-envelope facets are
/// excluded entirely — they never receive an output index and can only
/// appear as a zeroed neighbor slot.
///
/// A hull with no lower-envelope facets yields a valid empty
/// triangulation, not an error.
///
/// # Errors
///
/// Returns [`ExtractError`] when a facet violates the cardinality
/// invariant, references a vertex outside `0..n_points`, or references a
/// neighbor id that does not resolve.
pub fn extract(hull: &HullFacetSet, n_points: usize) -> Result<Triangulation, ExtractError> {
    let dims = hull.input_dims();

    let n_facets = hull.iter().filter(|f| !f.is_upper_delaunay()).count();

    let mut rows: Vec<DelaunayRow> = Vec::with_capacity(n_facets);
    for facet in hull.iter().filter(|f| !f.is_upper_delaunay()) {
        facet.check_cardinality(dims)?;

        let mut vertices: FacetBuffer<u32> = FacetBuffer::new();
        for &vertex_id in facet.vertices() {
            if vertex_id as usize >= n_points {
                return Err(ExtractError::ForeignVertex {
                    facet_id: facet.id(),
                    vertex_id,
                    n_points,
                });
            }
            vertices.push(1 + vertex_id);
        }

        let mut neighbors: FacetBuffer<u32> = FacetBuffer::new();
        for &slot in facet.neighbors() {
            let entry = match slot {
                None => 0,
                Some(neighbor_id) => {
                    let lower = hull.is_lower(neighbor_id).ok_or(
                        ExtractError::DanglingNeighbor {
                            facet_id: facet.id(),
                            neighbor_id,
                        },
                    )?;
                    if lower { 1 + neighbor_id } else { 0 }
                }
            };
            neighbors.push(entry);
        }

        rows.push(DelaunayRow {
            facet: 1 + facet.id(),
            vertices,
            neighbors,
        });
    }
    debug_assert_eq!(rows.len(), n_facets);

    // Flatten to the documented row-major (D+1)*i + j layout.
    let row_len = dims + 1;
    let mut facet_list = Vec::with_capacity(n_facets);
    let mut vertex_list = Vec::with_capacity(n_facets * row_len);
    let mut neighbor_list = Vec::with_capacity(n_facets * row_len);
    for row in rows {
        facet_list.push(row.facet);
        vertex_list.extend_from_slice(&row.vertices);
        neighbor_list.extend_from_slice(&row.neighbors);
    }

    Ok(Triangulation::from_parts(
        dims,
        n_points,
        facet_list,
        vertex_list,
        neighbor_list,
    ))
}
