//! Variant A: symmetric pairwise seam blend.
//!
//! For each joint pair, find the seam (island vertices adjacent to the other
//! island), split the seam evenly, then walk a fixed number of layers inward
//! into each island assigning decreasing cross-weights, the dominant joint
//! keeping the remainder.

use crate::{
    gradient::{GradientReport, SeamBlendParams},
    id::JointId,
    island::influence_island,
    mesh::{AdjacencyGraph, VertexSet},
    weights::WeightTable,
};

pub(crate) fn seam_blend(
    adjacency: &AdjacencyGraph,
    weights: &mut WeightTable,
    pairs: &[(JointId, JointId)],
    params: &SeamBlendParams,
    report: &mut GradientReport,
) {
    for &(a, b) in pairs {
        blend_pair(adjacency, weights, a, b, params, report);
    }
}

fn blend_pair(
    adjacency: &AdjacencyGraph,
    weights: &mut WeightTable,
    a: JointId,
    b: JointId,
    params: &SeamBlendParams,
    report: &mut GradientReport,
) {
    // Islands are cached for this pair only; every write below invalidates
    // them for any later use.
    let island_a = influence_island(weights, a);
    let island_b = influence_island(weights, b);
    for (joint, island) in [(a, &island_a), (b, &island_b)] {
        if island.is_empty() {
            report.warn(format!(
                "seam blend: joint {:?} has no influenced vertices, skipping pair",
                joint.id()
            ));
            return;
        }
    }

    let seam_a: VertexSet = island_a
        .iter()
        .copied()
        .filter(|&v| adjacency.touches(v, &island_b))
        .collect();
    let seam_b: VertexSet = island_b
        .iter()
        .copied()
        .filter(|&v| adjacency.touches(v, &island_a))
        .collect();
    if seam_a.is_empty() && seam_b.is_empty() {
        report.warn(format!(
            "seam blend: islands of {:?} and {:?} are not adjacent, skipping pair",
            a.id(),
            b.id()
        ));
        return;
    }

    let seam_weight = params.seam_weight.clamp(0.0, 1.0);
    for seam in [&seam_a, &seam_b] {
        for &v in seam.iter() {
            weights.assign(v, &[(a, seam_weight), (b, 1.0 - seam_weight)]);
            report.modified.insert(v);
        }
    }

    // Expand inward from each seam into its own island; the opposite joint's
    // cross-weight decays per layer, the island's own joint keeps the rest.
    expand_layers(adjacency, weights, &island_a, &seam_a, &seam_b, a, b, params, report);
    expand_layers(adjacency, weights, &island_b, &seam_b, &seam_a, b, a, params, report);
}

#[allow(clippy::too_many_arguments)]
fn expand_layers(
    adjacency: &AdjacencyGraph,
    weights: &mut WeightTable,
    island: &VertexSet,
    seam: &VertexSet,
    opposite_seam: &VertexSet,
    dominant: JointId,
    cross: JointId,
    params: &SeamBlendParams,
    report: &mut GradientReport,
) {
    let mut visited: VertexSet = seam.iter().copied().collect();
    visited.extend(opposite_seam.iter().copied());
    let mut frontier = seam.clone();

    for &cross_weight in &params.layer_weights {
        let layer: VertexSet = adjacency
            .neighbors(&frontier)
            .iter()
            .copied()
            .filter(|v| island.contains(v) && !visited.contains(v))
            .collect();
        if layer.is_empty() {
            break;
        }
        let cross_weight = cross_weight.clamp(0.0, 1.0);
        for &v in layer.iter() {
            weights.assign(v, &[(cross, cross_weight), (dominant, 1.0 - cross_weight)]);
            report.modified.insert(v);
        }
        visited.extend(layer.iter().copied());
        frontier = layer;
    }
}
