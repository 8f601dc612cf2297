//! Variant B: distance-adaptive layered expansion along a joint chain.
//!
//! Every adjacent pair of the chain is processed twice, once with each joint
//! as the source: a full forward sweep (i -> i+1) followed by a full backward
//! sweep (i -> i-1). The topological distance between the two islands picks
//! the falloff profile; expansion starts from the source island's outward
//! frontier and each new layer is intersected with the *target* island so
//! the gradient never overshoots into unrelated territory.
//!
//! Pass order is part of the contract: a later pass may rescale what an
//! earlier pass wrote on shared vertices, but every write runs through the
//! normalizing setter, so the sum-to-one invariant holds regardless.

use crate::{
    falloff::FalloffTable,
    gradient::GradientReport,
    id::JointId,
    island::{influence_island, topological_distance},
    mesh::{AdjacencyGraph, VertexSet},
    weights::WeightTable,
};

pub(crate) fn adaptive_chain(
    adjacency: &AdjacencyGraph,
    weights: &mut WeightTable,
    chain: &[JointId],
    table: &FalloffTable,
    max_steps: usize,
    report: &mut GradientReport,
) {
    for i in 0..chain.len() - 1 {
        expand(adjacency, weights, chain[i], chain[i + 1], table, max_steps, report);
    }
    for i in (1..chain.len()).rev() {
        expand(adjacency, weights, chain[i], chain[i - 1], table, max_steps, report);
    }
}

fn expand(
    adjacency: &AdjacencyGraph,
    weights: &mut WeightTable,
    source: JointId,
    target: JointId,
    table: &FalloffTable,
    max_steps: usize,
    report: &mut GradientReport,
) {
    // Fresh islands per pass: earlier passes have already moved weights.
    let source_island = influence_island(weights, source);
    let target_island = influence_island(weights, target);
    for (joint, island) in [(source, &source_island), (target, &target_island)] {
        if island.is_empty() {
            report.warn(format!(
                "adaptive chain: joint {:?} has no influenced vertices, skipping pass",
                joint.id()
            ));
            return;
        }
    }

    let distance = topological_distance(&source_island, &target_island, adjacency, max_steps);
    let profile = table.profile_for(distance, max_steps);

    let mut visited = source_island.clone();
    let mut frontier = adjacency.outward_frontier(&source_island);
    for &layer_weight in profile.steps() {
        let layer: VertexSet = adjacency
            .neighbors(&frontier)
            .iter()
            .copied()
            .filter(|v| target_island.contains(v) && !visited.contains(v))
            .collect();
        if layer.is_empty() {
            break;
        }
        for &v in layer.iter() {
            // Absolute weight for the source joint; the target and any other
            // influences are scaled down proportionally, never zeroed.
            weights.set_weight(v, source, layer_weight, true);
            report.modified.insert(v);
        }
        visited.extend(layer.iter().copied());
        frontier = layer;
    }
}
