//! Influence islands and topological distance.
//!
//! An island is the set of vertices meaningfully influenced by one joint.
//! Islands are derived values: any weight-table mutation invalidates them, so
//! callers recompute per invocation and never persist them across calls.

use crate::{
    id::JointId,
    mesh::{AdjacencyGraph, VertexSet},
    weights::WeightTable,
};

/// Vertices with weight above the epsilon threshold for `joint`.
///
/// Returns an empty set for joints that are not registered influences of the
/// deformer. That is a normal condition (e.g. two unrelated joints picked
/// together), not an error.
pub fn influence_island(table: &WeightTable, joint: JointId) -> VertexSet {
    if !table.is_influence(joint) {
        return VertexSet::new();
    }
    table.influenced_vertices(joint)
}

/// Minimum number of one-ring expansion steps from `island_a` before touching
/// `island_b`, measured along the mesh surface.
///
/// Skin deformation follows topology rather than 3-D space, so this discrete
/// step count is the distance proxy the falloff tables are keyed on. Returns
/// `0` if the islands already overlap, and `max_steps` as the far/disconnected
/// sentinel when no contact is made within the budget.
pub fn topological_distance(
    island_a: &VertexSet,
    island_b: &VertexSet,
    adjacency: &AdjacencyGraph,
    max_steps: usize,
) -> usize {
    if island_a.iter().any(|v| island_b.contains(v)) {
        return 0;
    }

    let mut visited = island_a.clone();
    let mut frontier = island_a.clone();
    for step in 1..=max_steps {
        let next: VertexSet = adjacency
            .neighbors(&frontier)
            .iter()
            .copied()
            .filter(|v| !visited.contains(v))
            .collect();
        if next.is_empty() {
            break;
        }
        if next.iter().any(|v| island_b.contains(v)) {
            return step;
        }
        visited.extend(next.iter().copied());
        frontier = next;
    }
    max_steps
}
