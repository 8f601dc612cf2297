//! Sparse skin-weight table keyed by (vertex, joint).
//!
//! The table is owned by host-side code (or an ECS resource wrapping it); the
//! engine borrows it for the duration of one call. All mutation funnels
//! through [`WeightTable::assign`], the single normalization point that keeps
//! the per-vertex sum-to-one invariant intact.

use bevy::{
    platform::collections::HashMap,
    reflect::{Reflect, std_traits::ReflectDefault},
};

use crate::{
    id::{JointId, VertexId},
    mesh::VertexSet,
};

/// Weights at or below this threshold count as "no influence".
pub const WEIGHT_EPSILON: f32 = 0.001;

/// Tolerance for the per-vertex sum-to-one invariant.
pub const NORMALIZE_TOLERANCE: f32 = 1e-6;

/// Influence cap enforced by the host skinning pipeline. The engine validates
/// against it but never silently re-enforces it.
pub const MAX_INFLUENCES: usize = 4;

/// Sparse mapping (vertex, joint) -> weight, plus the registry of joints
/// bound to the skin deformer.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
pub struct WeightTable {
    influences: Vec<JointId>,
    rows: HashMap<VertexId, Vec<(JointId, f32)>>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a joint as an influence of the deformer. Idempotent.
    pub fn register_influence(&mut self, joint: JointId) {
        if !self.influences.contains(&joint) {
            self.influences.push(joint);
        }
    }

    pub fn influences(&self) -> &[JointId] {
        &self.influences
    }

    pub fn is_influence(&self, joint: JointId) -> bool {
        self.influences.contains(&joint)
    }

    pub fn weight(&self, vertex: VertexId, joint: JointId) -> f32 {
        self.rows
            .get(&vertex)
            .and_then(|row| row.iter().find(|(j, _)| *j == joint))
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// All (joint, weight) entries stored for a vertex.
    pub fn vertex_influences(&self, vertex: VertexId) -> &[(JointId, f32)] {
        self.rows.get(&vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vertex_sum(&self, vertex: VertexId) -> f32 {
        self.vertex_influences(vertex).iter().map(|(_, w)| w).sum()
    }

    /// Vertices with weight above `WEIGHT_EPSILON` for `joint`.
    pub fn influenced_vertices(&self, joint: JointId) -> VertexSet {
        self.rows
            .iter()
            .filter(|(_, row)| {
                row.iter()
                    .any(|(j, w)| *j == joint && *w > WEIGHT_EPSILON)
            })
            .map(|(v, _)| *v)
            .collect()
    }

    /// Sets several joints' weights on one vertex in a single normalization
    /// step: the given entries take their (clamped) values and every influence
    /// *not* named in `entries` is scaled proportionally into the remaining
    /// mass. If the untouched influences carry no mass to scale, the assigned
    /// entries are rescaled to sum to one instead, mirroring how host
    /// normalize-on-set behaves for a sole influence.
    pub fn assign(&mut self, vertex: VertexId, entries: &[(JointId, f32)]) {
        let mut assigned: Vec<(JointId, f32)> = entries
            .iter()
            .map(|&(j, w)| (j, w.clamp(0.0, 1.0)))
            .collect();
        let mut assigned_sum: f32 = assigned.iter().map(|(_, w)| w).sum();
        if assigned_sum > 1.0 {
            for (_, w) in assigned.iter_mut() {
                *w /= assigned_sum;
            }
            assigned_sum = 1.0;
        }
        let remainder = (1.0 - assigned_sum).max(0.0);

        let row = self.rows.entry(vertex).or_default();
        let untouched_sum: f32 = row
            .iter()
            .filter(|(j, _)| !assigned.iter().any(|(a, _)| a == j))
            .map(|(_, w)| w)
            .sum();

        if untouched_sum > NORMALIZE_TOLERANCE {
            let scale = remainder / untouched_sum;
            for (j, w) in row.iter_mut() {
                if !assigned.iter().any(|(a, _)| a == &*j) {
                    *w *= scale;
                }
            }
            for (j, w) in &assigned {
                Self::put(row, *j, *w);
            }
        } else if assigned_sum > NORMALIZE_TOLERANCE {
            // Nothing left to absorb the remainder: the assigned joints are
            // the whole story for this vertex.
            row.clear();
            for (j, w) in &assigned {
                Self::put(row, *j, *w / assigned_sum);
            }
        } else {
            // Assigning zero everywhere on a vertex with no other mass would
            // leave it weightless; keep the row as-is.
            return;
        }

        row.retain(|(_, w)| *w > 0.0);
    }

    /// Sets one joint's weight. With `normalize` the other influences absorb
    /// the delta proportionally; without it the raw value is written and the
    /// caller takes responsibility for the invariant (bulk setup paths).
    pub fn set_weight(&mut self, vertex: VertexId, joint: JointId, weight: f32, normalize: bool) {
        if normalize {
            self.assign(vertex, &[(joint, weight)]);
        } else {
            let row = self.rows.entry(vertex).or_default();
            Self::put(row, joint, weight.clamp(0.0, 1.0));
        }
    }

    /// Replaces a vertex's row wholesale with clamped entries, pruning zero
    /// weights. Callers own the sum-to-one invariant here; it exists for
    /// snapshot-driven paths (live blending) that recompute whole rows from
    /// immutable state and must restore them bit-for-bit.
    pub fn set_row(&mut self, vertex: VertexId, entries: &[(JointId, f32)]) {
        let row = self.rows.entry(vertex).or_default();
        row.clear();
        for &(j, w) in entries {
            Self::put(row, j, w.clamp(0.0, 1.0));
        }
        row.retain(|(_, w)| *w > 0.0);
    }

    /// Rescales a vertex's row so its sum is exactly one. No-op for rows with
    /// no mass.
    pub fn normalize_vertex(&mut self, vertex: VertexId) {
        if let Some(row) = self.rows.get_mut(&vertex) {
            let sum: f32 = row.iter().map(|(_, w)| w).sum();
            if sum > NORMALIZE_TOLERANCE {
                for (_, w) in row.iter_mut() {
                    *w /= sum;
                }
            }
        }
    }

    /// Vertices whose count of meaningful influences exceeds `max`. The host
    /// enforces the cap; this is the validation the engine offers on top.
    pub fn influence_violations(&self, max: usize) -> Vec<(VertexId, usize)> {
        let mut out: Vec<(VertexId, usize)> = self
            .rows
            .iter()
            .filter_map(|(v, row)| {
                let count = row.iter().filter(|(_, w)| *w > WEIGHT_EPSILON).count();
                (count > max).then_some((*v, count))
            })
            .collect();
        out.sort_unstable();
        out
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.rows.keys().copied()
    }

    fn put(row: &mut Vec<(JointId, f32)>, joint: JointId, weight: f32) {
        if let Some(entry) = row.iter_mut().find(|(j, _)| *j == joint) {
            entry.1 = weight;
        } else {
            row.push((joint, weight));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn joints() -> (JointId, JointId, JointId) {
        (
            JointId::from_name("spine_01"),
            JointId::from_name("spine_02"),
            JointId::from_name("spine_03"),
        )
    }

    fn table_with(entries: &[(u32, JointId, f32)]) -> WeightTable {
        let mut table = WeightTable::new();
        let (a, b, c) = joints();
        for j in [a, b, c] {
            table.register_influence(j);
        }
        for &(v, j, w) in entries {
            table.set_weight(VertexId(v), j, w, false);
        }
        table
    }

    #[test]
    fn normalized_set_scales_others_proportionally() {
        let (a, b, c) = joints();
        let mut table = table_with(&[(0, a, 0.5), (0, b, 0.3), (0, c, 0.2)]);

        table.set_weight(VertexId(0), a, 0.8, true);

        assert!((table.weight(VertexId(0), a) - 0.8).abs() < NORMALIZE_TOLERANCE);
        // b:c ratio 3:2 preserved inside the remaining 0.2.
        assert!((table.weight(VertexId(0), b) - 0.12).abs() < 1e-6);
        assert!((table.weight(VertexId(0), c) - 0.08).abs() < 1e-6);
        assert!((table.vertex_sum(VertexId(0)) - 1.0).abs() < NORMALIZE_TOLERANCE);
    }

    #[test]
    fn sole_influence_absorbs_full_weight() {
        let (a, _, _) = joints();
        let mut table = table_with(&[(0, a, 1.0)]);

        // No other influence can absorb the remainder, so a keeps full mass.
        table.set_weight(VertexId(0), a, 0.7, true);
        assert!((table.weight(VertexId(0), a) - 1.0).abs() < NORMALIZE_TOLERANCE);
    }

    #[test]
    fn assign_pair_zeroes_untouched_when_pair_saturates() {
        let (a, b, c) = joints();
        let mut table = table_with(&[(0, a, 0.6), (0, b, 0.2), (0, c, 0.2)]);

        table.assign(VertexId(0), &[(a, 0.5), (b, 0.5)]);
        assert_eq!(table.weight(VertexId(0), c), 0.0);
        assert!((table.vertex_sum(VertexId(0)) - 1.0).abs() < NORMALIZE_TOLERANCE);
    }

    #[test]
    fn inputs_are_clamped() {
        let (a, b, _) = joints();
        let mut table = table_with(&[(0, a, 1.0)]);
        table.register_influence(b);
        table.set_weight(VertexId(0), b, 1.7, true);
        assert!((table.weight(VertexId(0), b) - 1.0).abs() < NORMALIZE_TOLERANCE);
        assert_eq!(table.weight(VertexId(0), a), 0.0);
    }

    #[test]
    fn influenced_vertices_respects_epsilon() {
        let (a, _, _) = joints();
        let table = table_with(&[(0, a, 1.0), (1, a, WEIGHT_EPSILON), (2, a, 0.002)]);
        let island = table.influenced_vertices(a);
        assert!(island.contains(&VertexId(0)));
        assert!(!island.contains(&VertexId(1)));
        assert!(island.contains(&VertexId(2)));
    }

    #[test]
    fn influence_violation_query() {
        let mut table = WeightTable::new();
        let joints: Vec<JointId> = (0..6)
            .map(|i| JointId::from_name(&format!("fin_{i}")))
            .collect();
        for &j in &joints {
            table.register_influence(j);
            table.set_weight(VertexId(0), j, 1.0 / 6.0, false);
        }
        table.set_weight(VertexId(1), joints[0], 1.0, false);

        let violations = table.influence_violations(MAX_INFLUENCES);
        assert_eq!(violations, vec![(VertexId(0), 6)]);
    }
}
