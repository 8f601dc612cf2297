//! Mesh topology and one-ring adjacency queries.
//!
//! The engine never owns vertex data; it only needs the edge relation of the
//! host mesh. [`MeshTopology`] captures that relation once, and
//! [`AdjacencyGraph`] precomputes per-vertex one-ring lists so that frontier
//! expansions during gradient distribution are cheap.

use bevy::{
    platform::collections::HashSet,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use serde::{Deserialize, Serialize};

use crate::id::VertexId;

/// Set of vertex ids, the currency of all topology queries.
pub type VertexSet = HashSet<VertexId>;

/// An undirected mesh edge, stored canonically with `a < b`.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshEdge {
    pub a: VertexId,
    pub b: VertexId,
}

impl MeshEdge {
    pub fn new(u: VertexId, v: VertexId) -> Self {
        if u.0 <= v.0 {
            Self { a: u, b: v }
        } else {
            Self { a: v, b: u }
        }
    }
}

/// Immutable vertex/edge topology of a host mesh.
///
/// Built once per mesh; must not change for the duration of any engine call.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
pub struct MeshTopology {
    vertex_count: u32,
    edges: Vec<MeshEdge>,
}

impl MeshTopology {
    /// Builds a topology from raw edge pairs. Duplicate edges (in either
    /// direction) and degenerate self-edges are dropped.
    pub fn from_edges(vertex_count: u32, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (u, v) in edges {
            if u == v || u >= vertex_count || v >= vertex_count {
                continue;
            }
            let edge = MeshEdge::new(VertexId(u), VertexId(v));
            if seen.insert(edge) {
                out.push(edge);
            }
        }
        Self {
            vertex_count,
            edges: out,
        }
    }

    /// Builds a topology from a triangle index buffer.
    pub fn from_triangles(vertex_count: u32, triangles: &[[u32; 3]]) -> Self {
        Self::from_edges(
            vertex_count,
            triangles
                .iter()
                .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)]),
        )
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn edges(&self) -> &[MeshEdge] {
        &self.edges
    }
}

/// Read-only one-ring adjacency view over a [`MeshTopology`].
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
pub struct AdjacencyGraph {
    one_ring: Vec<Vec<VertexId>>,
}

impl AdjacencyGraph {
    pub fn build(topology: &MeshTopology) -> Self {
        let mut one_ring: Vec<Vec<VertexId>> = vec![Vec::new(); topology.vertex_count() as usize];
        for edge in topology.edges() {
            one_ring[edge.a.index()].push(edge.b);
            one_ring[edge.b.index()].push(edge.a);
        }
        Self { one_ring }
    }

    pub fn vertex_count(&self) -> usize {
        self.one_ring.len()
    }

    /// One-ring neighbors of a single vertex. Unknown ids have no neighbors.
    pub fn one_ring(&self, vertex: VertexId) -> &[VertexId] {
        self.one_ring
            .get(vertex.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Union of one-ring neighbors of every vertex in `set`.
    ///
    /// The input set is *not* subtracted from the result: seam detection needs
    /// to see boundary vertices that are both in the query set and adjacent to
    /// it, so callers subtract their own visited sets. Stale vertex ids from
    /// the host are silently ignored.
    pub fn neighbors(&self, set: &VertexSet) -> VertexSet {
        let mut out = VertexSet::new();
        for &v in set.iter() {
            out.extend(self.one_ring(v).iter().copied());
        }
        out
    }

    /// True if `vertex` has at least one neighbor inside `set`.
    pub fn touches(&self, vertex: VertexId, set: &VertexSet) -> bool {
        self.one_ring(vertex).iter().any(|n| set.contains(n))
    }

    /// Vertices of `region` with at least one neighbor outside `region`.
    pub fn outward_frontier(&self, region: &VertexSet) -> VertexSet {
        region
            .iter()
            .copied()
            .filter(|&v| self.one_ring(v).iter().any(|n| !region.contains(n)))
            .collect()
    }
}

/// Builds a vertex-id set from raw indices. Test and host-bridge convenience.
pub fn vertex_set(ids: impl IntoIterator<Item = u32>) -> VertexSet {
    ids.into_iter().map(VertexId).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn strip(n: u32) -> AdjacencyGraph {
        AdjacencyGraph::build(&MeshTopology::from_edges(n, (0..n - 1).map(|i| (i, i + 1))))
    }

    #[test]
    fn adjacency_is_symmetric() {
        let topology = MeshTopology::from_triangles(4, &[[0, 1, 2], [1, 2, 3]]);
        let graph = AdjacencyGraph::build(&topology);
        for edge in topology.edges() {
            assert!(graph.one_ring(edge.a).contains(&edge.b));
            assert!(graph.one_ring(edge.b).contains(&edge.a));
        }
    }

    #[test]
    fn duplicate_and_degenerate_edges_are_dropped() {
        let topology = MeshTopology::from_edges(3, [(0, 1), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(topology.edges().len(), 2);
    }

    #[test]
    fn neighbors_does_not_subtract_input() {
        let graph = strip(5);
        // 1 and 2 are adjacent, so each shows up as the other's neighbor even
        // though both are in the query set.
        let result = graph.neighbors(&vertex_set([1, 2]));
        assert_eq!(result, vertex_set([0, 1, 2, 3]));
    }

    #[test]
    fn stale_ids_are_ignored() {
        let graph = strip(3);
        assert_eq!(graph.neighbors(&vertex_set([77])), VertexSet::new());
        assert!(graph.one_ring(VertexId(99)).is_empty());
    }

    #[test]
    fn outward_frontier_of_interior_region() {
        let graph = strip(6);
        let frontier = graph.outward_frontier(&vertex_set([1, 2, 3]));
        assert_eq!(frontier, vertex_set([1, 3]));
    }
}
