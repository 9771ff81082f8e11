//! Incremental convex hull at runtime dimension.
//!
//! The concrete [`HullEngine`] backend: a beneath-beyond construction over
//! the lifted point set. Facets are simplices with stored hyperplanes; a
//! new point replaces the facets it can see with a cone of new facets over
//! the horizon ridges. Facet ids are monotonic and never reused, retired
//! facets are tombstoned in place, and the arena is iterated in id order so
//! every run over the same input is identical.
//!
//! Neighbor slots are positional: slot `j` of a facet is the neighbor
//! across the ridge opposite vertex slot `j`. Cone facets put the inserted
//! point at vertex slot 0, so the surviving outer neighbor lands at
//! neighbor slot 0; the remaining slots are wired pairwise between cone
//! siblings through a sorted-sub-ridge map.

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::core::facet::{FacetBuffer, FacetId, HullFacet, HullFacetSet, VertexId};
use crate::core::traits::hull_engine::{HullConfig, HullEngine, HullError};
use crate::geometry::lift::LiftedPoints;
use crate::geometry::predicates::{
    FacetPlane, Orientation, PredicateError, facet_plane, simplex_orientation,
};

/// Classification tolerance on the unit normal's last component: facets
/// steeper than this toward the paraboloid axis are upper envelope.
const UPPER_CLASSIFY_TOLERANCE: f64 = 1e-10;

/// Sentinel for a neighbor slot not yet wired during cone construction.
const UNLINKED: FacetId = FacetId::MAX;

// =============================================================================
// ENGINE
// =============================================================================

/// Beneath-beyond incremental hull engine.
///
/// Stateless between calls; each [`compute_hull`](HullEngine::compute_hull)
/// runs in a fresh session whose working memory is released on return,
/// success or failure.
#[derive(Clone, Debug, Default)]
pub struct IncrementalHull {
    config: HullConfig,
}

impl IncrementalHull {
    /// Create an engine with the given robustness configuration.
    #[must_use]
    pub const fn new(config: HullConfig) -> Self {
        Self { config }
    }
}

impl HullEngine for IncrementalHull {
    fn compute_hull(&self, lifted: &LiftedPoints) -> Result<HullFacetSet, HullError> {
        Session::new(lifted, &self.config).run()
    }
}

// =============================================================================
// SESSION
// =============================================================================

struct FacetNode {
    vertices: FacetBuffer<VertexId>,
    neighbors: FacetBuffer<FacetId>,
    plane: FacetPlane,
}

struct Ridge {
    vertices: FacetBuffer<VertexId>,
    outer: FacetId,
    outer_slot: usize,
}

/// Per-call solver state. Dropped (and with it all scratch memory) before
/// `compute_hull` returns.
struct Session<'a> {
    points: &'a LiftedPoints,
    dims: usize,
    tolerance: f64,
    interior: Vec<f64>,
    /// Facet arena indexed by id; `None` marks a retired facet.
    arena: Vec<Option<FacetNode>>,
    retired: usize,
}

impl<'a> Session<'a> {
    fn new(points: &'a LiftedPoints, config: &HullConfig) -> Self {
        let tolerance =
            config.visibility_tolerance(points.input_dims(), points.max_abs_coordinate());
        Self {
            points,
            dims: points.dims(),
            tolerance,
            interior: Vec::new(),
            arena: Vec::new(),
            retired: 0,
        }
    }

    fn run(mut self) -> Result<HullFacetSet, HullError> {
        let simplex = self.find_initial_simplex()?;
        self.build_initial_facets(&simplex)?;

        let in_simplex: FxHashSet<usize> = simplex.iter().copied().collect();
        let mut skipped = 0_usize;
        for i in 0..self.points.n_rows() {
            if in_simplex.contains(&i) {
                continue;
            }
            if !self.insert_point(i)? {
                skipped += 1;
            }
        }
        debug!(
            "hull complete: {} rows, {} facets created, {} retired, {} interior/coincident",
            self.points.n_rows(),
            self.arena.len(),
            self.retired,
            skipped
        );
        self.finish()
    }

    // -------------------------------------------------------------------------
    // Initial simplex
    // -------------------------------------------------------------------------

    /// Pick L+1 affinely independent rows by greedy max-residual extension
    /// of an orthonormal basis.
    fn find_initial_simplex(&self) -> Result<Vec<usize>, HullError> {
        let l = self.dims;
        let n = self.points.n_rows();

        let mut selected = vec![0_usize];
        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(l);
        let origin = self.points.row(0).to_vec();

        for rank in 1..=l {
            let mut best: Option<(usize, Vec<f64>, f64)> = None;
            for i in 0..n {
                if selected.contains(&i) {
                    continue;
                }
                let mut residual: Vec<f64> = self
                    .points
                    .row(i)
                    .iter()
                    .zip(&origin)
                    .map(|(a, b)| a - b)
                    .collect();
                for b in &basis {
                    let dot: f64 = residual.iter().zip(b).map(|(r, v)| r * v).sum();
                    for (r, v) in residual.iter_mut().zip(b) {
                        *r -= dot * v;
                    }
                }
                let norm = residual.iter().map(|v| v * v).sum::<f64>().sqrt();
                if best.as_ref().is_none_or(|(_, _, bn)| norm > *bn) {
                    best = Some((i, residual, norm));
                }
            }
            let (index, mut direction, norm) =
                best.unwrap_or_else(|| unreachable!("n_rows >= dims + 1 by construction"));
            if norm <= self.tolerance {
                return Err(HullError::Degenerate {
                    message: format!(
                        "points span an affine subspace of dimension {} (need {l})",
                        rank - 1
                    ),
                });
            }
            for v in &mut direction {
                *v /= norm;
            }
            basis.push(direction);
            selected.push(index);
        }
        Ok(selected)
    }

    fn build_initial_facets(&mut self, simplex: &[usize]) -> Result<(), HullError> {
        let l = self.dims;

        // The rank check bounds the residuals; the orientation determinant
        // is the authoritative non-degeneracy verdict for the simplex.
        let rows: Vec<&[f64]> = simplex.iter().map(|&i| self.points.row(i)).collect();
        match simplex_orientation(&rows, self.tolerance) {
            Ok(Orientation::POSITIVE | Orientation::NEGATIVE) => {}
            Ok(Orientation::DEGENERATE) => {
                return Err(HullError::Degenerate {
                    message: "initial simplex is degenerate".to_string(),
                });
            }
            Err(source) => {
                return Err(HullError::NumericalBreakdown {
                    message: format!("initial simplex orientation failed: {source}"),
                });
            }
        }

        self.interior = vec![0.0; l];
        for &i in simplex {
            for (acc, v) in self.interior.iter_mut().zip(self.points.row(i)) {
                *acc += v;
            }
        }
        let count = f64::from(u32::try_from(simplex.len()).unwrap_or(u32::MAX));
        for acc in &mut self.interior {
            *acc /= count;
        }

        // Facet m omits simplex[m]; its neighbor opposite vertex slot j is
        // the facet omitting that vertex, whose id equals the vertex's
        // position in the simplex.
        for m in 0..=l {
            let mut vertices: FacetBuffer<VertexId> = SmallVec::new();
            let mut neighbors: FacetBuffer<FacetId> = SmallVec::new();
            for (k, &row) in simplex.iter().enumerate() {
                if k == m {
                    continue;
                }
                vertices.push(to_vertex_id(row));
                neighbors.push(to_facet_id(k));
            }
            let plane = self.plane_for(&vertices)?;
            self.arena.push(Some(FacetNode {
                vertices,
                neighbors,
                plane,
            }));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Point insertion
    // -------------------------------------------------------------------------

    /// Insert row `i`; returns false when the point is inside the current
    /// hull (or coincident with it) and leaves the hull unchanged.
    fn insert_point(&mut self, i: usize) -> Result<bool, HullError> {
        let point = self.points.row(i);

        let visible: Vec<FacetId> = self
            .arena
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.as_ref().and_then(|node| {
                    (node.plane.signed_distance(point) > self.tolerance).then(|| to_facet_id(id))
                })
            })
            .collect();
        if visible.is_empty() {
            return Ok(false);
        }
        let visible_set: FxHashSet<FacetId> = visible.iter().copied().collect();

        // Horizon: ridges between a visible facet and a hidden neighbor.
        let mut horizon: Vec<Ridge> = Vec::new();
        for &f in &visible {
            let node = self.node(f);
            for (slot, &g) in node.neighbors.iter().enumerate() {
                if visible_set.contains(&g) {
                    continue;
                }
                let mut ridge_vertices: FacetBuffer<VertexId> = SmallVec::new();
                for (k, &v) in node.vertices.iter().enumerate() {
                    if k != slot {
                        ridge_vertices.push(v);
                    }
                }
                let outer_slot = self
                    .node(g)
                    .neighbors
                    .iter()
                    .position(|&back| back == f)
                    .ok_or_else(|| HullError::NumericalBreakdown {
                        message: format!("facet {g} lost its back-reference to facet {f}"),
                    })?;
                horizon.push(Ridge {
                    vertices: ridge_vertices,
                    outer: g,
                    outer_slot,
                });
            }
        }

        for &f in &visible {
            self.arena[f as usize] = None;
            self.retired += 1;
        }

        // Cone: one new facet per horizon ridge, inserted point at vertex
        // slot 0 so the outer neighbor sits at neighbor slot 0.
        let cone_start = self.arena.len();
        for ridge in &horizon {
            let mut vertices: FacetBuffer<VertexId> = SmallVec::new();
            vertices.push(to_vertex_id(i));
            vertices.extend_from_slice(&ridge.vertices);
            let mut neighbors: FacetBuffer<FacetId> = SmallVec::new();
            neighbors.push(ridge.outer);
            neighbors.extend(std::iter::repeat_n(UNLINKED, self.dims - 1));
            let plane = self.plane_for(&vertices)?;
            self.arena.push(Some(FacetNode {
                vertices,
                neighbors,
                plane,
            }));
        }
        for (offset, ridge) in horizon.iter().enumerate() {
            let new_id = to_facet_id(cone_start + offset);
            self.node_mut(ridge.outer).neighbors[ridge.outer_slot] = new_id;
        }

        // Wire cone siblings: each sub-ridge (new point plus all ridge
        // vertices but one) is shared by exactly two cone facets.
        let mut open_sub_ridges: FxHashMap<FacetBuffer<VertexId>, (usize, usize)> =
            FxHashMap::default();
        for index in cone_start..self.arena.len() {
            for slot in 1..self.dims {
                let node = self.node(to_facet_id(index));
                let mut key: FacetBuffer<VertexId> = SmallVec::new();
                for (k, &v) in node.vertices.iter().enumerate() {
                    if k != slot {
                        key.push(v);
                    }
                }
                key.sort_unstable();
                if let Some((other_index, other_slot)) = open_sub_ridges.remove(&key) {
                    self.node_mut(to_facet_id(index)).neighbors[slot] = to_facet_id(other_index);
                    self.node_mut(to_facet_id(other_index)).neighbors[other_slot] =
                        to_facet_id(index);
                } else {
                    open_sub_ridges.insert(key, (index, slot));
                }
            }
        }
        if !open_sub_ridges.is_empty() {
            return Err(HullError::NumericalBreakdown {
                message: format!(
                    "{} cone ridges left unmatched while inserting point {i}",
                    open_sub_ridges.len()
                ),
            });
        }
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Finish
    // -------------------------------------------------------------------------

    fn finish(&mut self) -> Result<HullFacetSet, HullError> {
        let alive = self.arena.iter().filter(|slot| slot.is_some()).count();
        if self.arena.len() - self.retired != alive {
            // Scratch accounting went wrong somewhere; the output is still
            // wholly determined by the alive facets, so report and continue.
            warn!(
                "hull scratch accounting mismatch: {} created, {} retired, {} alive",
                self.arena.len(),
                self.retired,
                alive
            );
        }

        let apex = self.points.apex_id();
        let mut facets = Vec::with_capacity(alive);
        for (index, slot) in self.arena.iter().enumerate() {
            let Some(node) = slot else { continue };
            if node.neighbors.iter().any(|&g| g == UNLINKED) {
                return Err(HullError::NumericalBreakdown {
                    message: format!("facet {index} has an unwired neighbor slot"),
                });
            }
            let upper = node.vertices.contains(&apex)
                || node.plane.last_normal_component() > -UPPER_CLASSIFY_TOLERANCE;
            let neighbors: FacetBuffer<Option<FacetId>> =
                node.neighbors.iter().map(|&g| Some(g)).collect();
            facets.push(HullFacet::new(
                to_facet_id(index),
                node.vertices.clone(),
                neighbors,
                upper,
            ));
        }
        let set = HullFacetSet::new(facets, self.points.input_dims());
        debug!(
            "hull classified: {} lower-envelope of {} facets",
            set.lower_count(),
            set.len()
        );
        Ok(set)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn node(&self, id: FacetId) -> &FacetNode {
        self.arena[id as usize]
            .as_ref()
            .unwrap_or_else(|| unreachable!("facet {id} accessed after retirement"))
    }

    fn node_mut(&mut self, id: FacetId) -> &mut FacetNode {
        self.arena[id as usize]
            .as_mut()
            .unwrap_or_else(|| unreachable!("facet {id} accessed after retirement"))
    }

    fn plane_for(&self, vertices: &[VertexId]) -> Result<FacetPlane, HullError> {
        let rows: Vec<&[f64]> = vertices
            .iter()
            .map(|&v| self.points.row(v as usize))
            .collect();
        facet_plane(&rows, &self.interior).map_err(|source| match source {
            PredicateError::DegenerateFacet | PredicateError::AmbiguousOrientation => {
                HullError::NumericalBreakdown {
                    message: format!("facet hyperplane failed for vertices {vertices:?}: {source}"),
                }
            }
            other => HullError::NumericalBreakdown {
                message: format!("predicate failure: {other}"),
            },
        })
    }
}

fn to_vertex_id(row: usize) -> VertexId {
    VertexId::try_from(row).unwrap_or_else(|_| unreachable!("row index exceeds VertexId range"))
}

fn to_facet_id(index: usize) -> FacetId {
    FacetId::try_from(index).unwrap_or_else(|_| unreachable!("facet index exceeds FacetId range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::geometry::lift::lift_points;
    use crate::geometry::point::PointBuffer;

    fn hull_of(data: &[f64], n: usize, d: usize) -> Result<HullFacetSet, HullError> {
        let points = PointBuffer::from_flat(data, n, d).unwrap();
        let lifted = lift_points(&points, &HullConfig::default());
        IncrementalHull::default().compute_hull(&lifted)
    }

    /// Every neighbor reference must be mutual, and the neighbor across
    /// slot j must share every vertex except vertex j.
    fn assert_adjacency_consistent(set: &HullFacetSet) {
        for facet in set {
            for (slot, neighbor) in facet.neighbors().iter().enumerate() {
                let neighbor = set
                    .get(neighbor.expect("closed hull has no open neighbor slots"))
                    .expect("neighbor id resolves to a live facet");
                assert!(
                    neighbor
                        .neighbors()
                        .iter()
                        .any(|&back| back == Some(facet.id())),
                    "facet {} -> {} adjacency is not mutual",
                    facet.id(),
                    neighbor.id()
                );
                for (k, &v) in facet.vertices().iter().enumerate() {
                    assert_eq!(
                        neighbor.vertices().contains(&v),
                        k != slot,
                        "neighbor across slot {slot} of facet {} does not match \
                         the opposite-vertex convention",
                        facet.id()
                    );
                }
            }
        }
    }

    #[test]
    fn triangle_produces_single_lower_facet() {
        // Three points in 2D lift (with the apex) to a tetrahedron in 3D.
        let set = hull_of(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 3, 2).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.lower_count(), 1);
        let lower = set.iter().find(|f| !f.is_upper_delaunay()).unwrap();
        let mut vertices = lower.vertices().to_vec();
        vertices.sort_unstable();
        assert_eq!(vertices, vec![0, 1, 2]);
        assert_adjacency_consistent(&set);
    }

    #[test]
    fn square_produces_two_lower_facets() {
        let set = hull_of(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0], 4, 2).unwrap();
        assert_eq!(set.lower_count(), 2);
        assert_adjacency_consistent(&set);
        // Lower facets never reference the apex.
        for facet in set.iter().filter(|f| !f.is_upper_delaunay()) {
            assert!(facet.vertices().iter().all(|&v| v < 4));
        }
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let err = hull_of(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0], 3, 2).unwrap_err();
        assert!(matches!(err, HullError::Degenerate { .. }));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let err = hull_of(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 3, 2).unwrap_err();
        assert!(matches!(err, HullError::Degenerate { .. }));
    }

    #[test]
    fn duplicate_of_hull_vertex_is_skipped() {
        let set = hull_of(
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            5,
            2,
        )
        .unwrap();
        // The duplicate never lands on the hull: same facet structure as
        // the plain square, except possibly which twin was kept.
        assert_eq!(set.lower_count(), 2);
        assert_adjacency_consistent(&set);
    }

    #[test]
    fn interior_point_fans_the_square() {
        let set = hull_of(
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.5, 0.5],
            5,
            2,
        )
        .unwrap();
        // Center below the cocircular corners' plane: a fan of 4 triangles.
        assert_eq!(set.lower_count(), 4);
        assert_adjacency_consistent(&set);
    }

    #[test]
    fn tetrahedron_in_3d() {
        let set = hull_of(
            &[
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ],
            4,
            3,
        )
        .unwrap();
        assert_eq!(set.lower_count(), 1);
        let lower = set.iter().find(|f| !f.is_upper_delaunay()).unwrap();
        assert_eq!(lower.vertices().len(), 4);
        assert_adjacency_consistent(&set);
    }

    #[test]
    fn facet_ids_are_unique_and_ascending() {
        let set = hull_of(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.3, 0.4], 5, 2).unwrap();
        let ids: Vec<FacetId> = set.iter().map(HullFacet::id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let data = [0.1, 0.2, 0.9, 0.1, 0.4, 0.8, 0.7, 0.6, 0.2, 0.9, 0.5, 0.5];
        let a = hull_of(&data, 6, 2).unwrap();
        let b = hull_of(&data, 6, 2).unwrap();
        assert_eq!(a, b);
    }
}
