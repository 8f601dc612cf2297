//! Variant C: hierarchical chain blur.
//!
//! A static, non-topological heuristic: vertices are partitioned by their
//! dominant chain joint, then each partition is redistributed toward the
//! chain-index neighbors (i-1, i+1, i+2) with fixed cross-weights. Cheaper
//! than the topological variants and exposed as its own user-facing mode,
//! not a fallback.

use crate::{
    gradient::{ChainBlurWeights, GradientReport},
    id::{JointId, VertexId},
    weights::{WEIGHT_EPSILON, WeightTable},
};

pub(crate) fn chain_blur(
    weights: &mut WeightTable,
    chain: &[JointId],
    params: &ChainBlurWeights,
    report: &mut GradientReport,
) {
    let buckets = partition_by_dominant(weights, chain);
    if buckets.iter().all(Vec::is_empty) {
        report.warn("chain blur: no vertex is dominated by any chain joint".into());
        return;
    }

    for (i, bucket) in buckets.iter().enumerate() {
        let mut entries: Vec<(JointId, f32)> = Vec::with_capacity(4);
        if i >= 1 {
            entries.push((chain[i - 1], params.prev));
        }
        if i + 1 < chain.len() {
            entries.push((chain[i + 1], params.next));
        }
        if i + 2 < chain.len() {
            entries.push((chain[i + 2], params.next2));
        }
        let cross_sum: f32 = entries.iter().map(|(_, w)| w).sum();
        entries.push((chain[i], (1.0 - cross_sum).max(0.0)));

        for &v in bucket {
            weights.assign(v, &entries);
            report.modified.insert(v);
        }
    }
}

/// Assigns each influenced vertex to the chain joint holding its maximum
/// weight. Ties break toward the earlier chain index; vertices whose best
/// chain weight is below epsilon are not meaningfully controlled by this
/// chain and are excluded.
fn partition_by_dominant(weights: &WeightTable, chain: &[JointId]) -> Vec<Vec<VertexId>> {
    let mut buckets: Vec<Vec<VertexId>> = vec![Vec::new(); chain.len()];
    for v in weights.vertices().collect::<Vec<_>>() {
        let mut best: Option<(usize, f32)> = None;
        for (i, &joint) in chain.iter().enumerate() {
            let w = weights.weight(v, joint);
            // Strict comparison keeps the first chain joint on ties.
            if w > best.map(|(_, bw)| bw).unwrap_or(0.0) {
                best = Some((i, w));
            }
        }
        if let Some((i, w)) = best
            && w > WEIGHT_EPSILON
        {
            buckets[i].push(v);
        }
    }
    for bucket in &mut buckets {
        bucket.sort_unstable();
    }
    buckets
}
