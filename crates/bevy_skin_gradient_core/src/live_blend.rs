//! Interactive, snapshot-based live weight blending.
//!
//! A session snapshots the second joint's weights once at start; every update
//! recomputes from that snapshot rather than from the previous update's
//! output. That makes updates idempotent, `update(0)` an exact restore, and
//! cancellation at any moment safe: `stop(commit = false)` simply writes the
//! snapshot back.
//!
//! At most one session per mesh may be active; a second `start` fails fast
//! instead of silently overwriting the snapshot, which would corrupt the
//! rollback guarantee. The host collaborator owns termination on abnormal
//! exits (the blender exposes `abort` for its teardown paths).

use bevy::{log::debug, platform::collections::HashMap};

use crate::{
    errors::SessionError,
    id::{JointId, VertexId},
    island::influence_island,
    mesh::{AdjacencyGraph, VertexSet},
    weights::{NORMALIZE_TOLERANCE, WeightTable},
};

/// Per-layer offset multipliers of the eased (layered) blend mode. Layers
/// past the table use [`EASE_TAIL_MULTIPLIER`].
pub const EASE_MULTIPLIERS: [f32; 7] = [1.0, 0.5, 0.25, 0.1, 0.05, 0.02, 0.01];
pub const EASE_TAIL_MULTIPLIER: f32 = 0.001;

/// Default layer depth of the eased blend mode.
pub const DEFAULT_EASE_DEPTH: usize = 4;

enum BlendShape {
    /// Every affected vertex follows the slider offset directly.
    Uniform,
    /// Layered frontier rings from the seam into joint B's island; deeper
    /// rings follow the offset with smaller multipliers.
    Eased { layers: Vec<Vec<VertexId>> },
}

/// State of one live blending transaction between two joints.
///
/// The snapshot holds each affected vertex's full weight row as it was at
/// session start; updates and rollback derive everything from it, never from
/// the table's current state.
pub struct LiveBlendSession {
    joint_a: JointId,
    joint_b: JointId,
    vertices: VertexSet,
    snapshot: HashMap<VertexId, Vec<(JointId, f32)>>,
    shape: BlendShape,
}

impl LiveBlendSession {
    /// Recomputes one vertex's row for the given (already multiplied) offset:
    /// joint B takes `snapshot + offset` clamped into `[0, 1]`, the remaining
    /// mass goes to the other snapshot influences proportionally. When joint
    /// B was the vertex's sole influence, joint A receives the freed mass.
    fn blended_row(&self, vertex: VertexId, offset: f32) -> Option<Vec<(JointId, f32)>> {
        let row = self.snapshot.get(&vertex)?;
        let base = row
            .iter()
            .find(|(j, _)| *j == self.joint_b)
            .map(|(_, w)| *w)
            .unwrap_or(0.0);
        let next = (base + offset).clamp(0.0, 1.0);
        let others_sum: f32 = row
            .iter()
            .filter(|(j, _)| *j != self.joint_b)
            .map(|(_, w)| w)
            .sum();

        let mut entries: Vec<(JointId, f32)> = if others_sum > NORMALIZE_TOLERANCE {
            let scale = (1.0 - next) / others_sum;
            row.iter()
                .filter(|(j, _)| *j != self.joint_b)
                .map(|&(j, w)| (j, w * scale))
                .collect()
        } else {
            vec![(self.joint_a, 1.0 - next)]
        };
        entries.push((self.joint_b, next));
        Some(entries)
    }
}

impl LiveBlendSession {
    pub fn joints(&self) -> (JointId, JointId) {
        (self.joint_a, self.joint_b)
    }

    /// The vertex set the session affects, for host-side isolation or
    /// per-vertex color feedback.
    pub fn affected_vertices(&self) -> &VertexSet {
        &self.vertices
    }
}

/// Owns the at-most-one active session of a mesh.
#[derive(Default)]
pub struct LiveBlender {
    active: Option<LiveBlendSession>,
}

impl LiveBlender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&LiveBlendSession> {
        self.active.as_ref()
    }

    /// Starts a uniform blend session over the union of both joints' islands.
    ///
    /// Both joints must be registered influences; this is checked before any
    /// state is created so failure leaves nothing half-started.
    pub fn start(
        &mut self,
        weights: &WeightTable,
        joint_a: JointId,
        joint_b: JointId,
    ) -> Result<&LiveBlendSession, SessionError> {
        self.check_preconditions(weights, joint_a, joint_b)?;

        let mut vertices = influence_island(weights, joint_a);
        vertices.extend(influence_island(weights, joint_b).iter().copied());

        Ok(self.activate(weights, joint_a, joint_b, vertices, BlendShape::Uniform))
    }

    /// Starts an eased session: layers are built by expanding the seam
    /// frontier of joint A's island into joint B's island, up to `depth`
    /// rings. Fails if the islands never touch.
    pub fn start_eased(
        &mut self,
        adjacency: &AdjacencyGraph,
        weights: &WeightTable,
        joint_a: JointId,
        joint_b: JointId,
        depth: usize,
    ) -> Result<&LiveBlendSession, SessionError> {
        self.check_preconditions(weights, joint_a, joint_b)?;

        let island_a = influence_island(weights, joint_a);
        let island_b = influence_island(weights, joint_b);

        let mut layers: Vec<Vec<VertexId>> = Vec::new();
        let mut processed = island_a.clone();
        let mut frontier: VertexSet = island_a
            .iter()
            .copied()
            .filter(|&v| adjacency.touches(v, &island_b))
            .collect();
        for _ in 0..depth {
            let next: VertexSet = adjacency
                .neighbors(&frontier)
                .iter()
                .copied()
                .filter(|v| island_b.contains(v) && !processed.contains(v))
                .collect();
            if next.is_empty() {
                break;
            }
            let mut layer: Vec<VertexId> = next.iter().copied().collect();
            layer.sort_unstable();
            layers.push(layer);
            processed.extend(next.iter().copied());
            frontier = next;
        }

        let vertices: VertexSet = layers.iter().flatten().copied().collect();
        if vertices.is_empty() {
            return Err(SessionError::EmptyBlendRegion { joint_a, joint_b });
        }

        Ok(self.activate(weights, joint_a, joint_b, vertices, BlendShape::Eased { layers }))
    }

    /// Applies a slider offset in `[-1, 1]` to the active session, always
    /// recomputing from the snapshot. Returns the number of vertices written.
    pub fn update(&mut self, weights: &mut WeightTable, offset: f32) -> Result<usize, SessionError> {
        let session = self.active.as_ref().ok_or(SessionError::NoActiveSession)?;
        let offset = offset.clamp(-1.0, 1.0);

        let mut written = 0;
        match &session.shape {
            BlendShape::Uniform => {
                for &v in session.vertices.iter() {
                    if let Some(row) = session.blended_row(v, offset) {
                        weights.set_row(v, &row);
                        written += 1;
                    }
                }
            }
            BlendShape::Eased { layers } => {
                for (i, layer) in layers.iter().enumerate() {
                    let multiplier = EASE_MULTIPLIERS
                        .get(i)
                        .copied()
                        .unwrap_or(EASE_TAIL_MULTIPLIER);
                    for &v in layer {
                        if let Some(row) = session.blended_row(v, offset * multiplier) {
                            weights.set_row(v, &row);
                            written += 1;
                        }
                    }
                }
            }
        }
        Ok(written)
    }

    /// Ends the active session. With `commit` the last applied weights stay;
    /// without it every vertex is restored to its snapshot value. Returns the
    /// affected vertex set so the host can clear its visual feedback.
    pub fn stop(
        &mut self,
        weights: &mut WeightTable,
        commit: bool,
    ) -> Result<VertexSet, SessionError> {
        let session = self.active.take().ok_or(SessionError::NoActiveSession)?;
        if !commit {
            for (&v, row) in session.snapshot.iter() {
                weights.set_row(v, row);
            }
        }
        debug!(
            "live blend stopped ({}committed, {} vertices)",
            if commit { "" } else { "not " },
            session.vertices.len()
        );
        Ok(session.vertices)
    }

    /// Rolls back and discards the active session if there is one. For host
    /// teardown paths where a dangling session would otherwise leak.
    pub fn abort(&mut self, weights: &mut WeightTable) {
        if self.is_active() {
            // Cannot fail: a session is active.
            let _ = self.stop(weights, false);
        }
    }

    fn check_preconditions(
        &self,
        weights: &WeightTable,
        joint_a: JointId,
        joint_b: JointId,
    ) -> Result<(), SessionError> {
        if self.active.is_some() {
            return Err(SessionError::SessionAlreadyActive);
        }
        if joint_a == joint_b {
            return Err(SessionError::IdenticalJoints(joint_a));
        }
        for joint in [joint_a, joint_b] {
            if !weights.is_influence(joint) {
                return Err(SessionError::NotInfluencing(joint));
            }
        }
        Ok(())
    }

    fn activate(
        &mut self,
        weights: &WeightTable,
        joint_a: JointId,
        joint_b: JointId,
        vertices: VertexSet,
        shape: BlendShape,
    ) -> &LiveBlendSession {
        let snapshot = vertices
            .iter()
            .map(|&v| (v, weights.vertex_influences(v).to_vec()))
            .collect();
        debug!(
            "live blend started over {} vertices between {:?} and {:?}",
            vertices.len(),
            joint_a.id(),
            joint_b.id()
        );
        self.active.insert(LiveBlendSession {
            joint_a,
            joint_b,
            vertices,
            snapshot,
            shape,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mesh::MeshTopology,
        weights::NORMALIZE_TOLERANCE,
    };

    fn strip_setup() -> (AdjacencyGraph, WeightTable, JointId, JointId) {
        let topology = MeshTopology::from_edges(10, (0..9).map(|i| (i, i + 1)));
        let adjacency = AdjacencyGraph::build(&topology);
        let a = JointId::from_name("spine_01");
        let b = JointId::from_name("spine_02");
        let mut table = WeightTable::new();
        table.register_influence(a);
        table.register_influence(b);
        for v in 0..10 {
            let wb = v as f32 / 9.0;
            table.set_weight(VertexId(v), b, wb, false);
            table.set_weight(VertexId(v), a, 1.0 - wb, false);
        }
        (adjacency, table, a, b)
    }

    #[test]
    fn start_rejects_unregistered_joints() {
        let (_, table, a, _) = strip_setup();
        let stray = JointId::from_name("not_bound");
        let mut blender = LiveBlender::new();
        assert!(matches!(
            blender.start(&table, a, stray),
            Err(SessionError::NotInfluencing(j)) if j == stray
        ));
        assert!(!blender.is_active());
    }

    #[test]
    fn second_session_fails_fast() {
        let (_, table, a, b) = strip_setup();
        let mut blender = LiveBlender::new();
        blender.start(&table, a, b).unwrap();
        assert!(matches!(
            blender.start(&table, a, b),
            Err(SessionError::SessionAlreadyActive)
        ));
        // The original session survives the failed start.
        assert!(blender.is_active());
    }

    #[test]
    fn rollback_restores_snapshot_exactly() {
        let (_, mut table, a, b) = strip_setup();
        let before = table.clone();

        let mut blender = LiveBlender::new();
        blender.start(&table, a, b).unwrap();
        blender.update(&mut table, 0.3).unwrap();
        blender.stop(&mut table, false).unwrap();

        for v in 0..10 {
            let v = VertexId(v);
            assert!((table.weight(v, b) - before.weight(v, b)).abs() < 1e-5);
            assert!((table.weight(v, a) - before.weight(v, a)).abs() < 1e-5);
        }
        assert!(!blender.is_active());
    }

    #[test]
    fn update_is_idempotent_and_zero_offset_restores() {
        let (_, mut table, a, b) = strip_setup();
        let before = table.clone();
        let mut blender = LiveBlender::new();
        blender.start(&table, a, b).unwrap();

        blender.update(&mut table, 0.4).unwrap();
        let after_once = table.clone();
        blender.update(&mut table, 0.4).unwrap();
        for v in 0..10 {
            let v = VertexId(v);
            assert_eq!(table.weight(v, b), after_once.weight(v, b));
            assert_eq!(table.weight(v, a), after_once.weight(v, a));
        }

        blender.update(&mut table, 0.0).unwrap();
        for v in 0..10 {
            let v = VertexId(v);
            assert!((table.weight(v, b) - before.weight(v, b)).abs() < 1e-5);
        }
    }

    #[test]
    fn commit_keeps_applied_weights() {
        let (_, mut table, a, b) = strip_setup();
        let mut blender = LiveBlender::new();
        blender.start(&table, a, b).unwrap();
        blender.update(&mut table, -0.2).unwrap();
        let applied = table.clone();
        let affected = blender.stop(&mut table, true).unwrap();

        assert!(!affected.is_empty());
        for v in 0..10 {
            let v = VertexId(v);
            assert_eq!(table.weight(v, b), applied.weight(v, b));
            assert!((table.vertex_sum(v) - 1.0).abs() < NORMALIZE_TOLERANCE);
        }
    }

    #[test]
    fn update_clamps_into_unit_range() {
        let (_, mut table, a, b) = strip_setup();
        let mut blender = LiveBlender::new();
        blender.start(&table, a, b).unwrap();
        blender.update(&mut table, 1.0).unwrap();
        for v in 1..10 {
            // Snapshot + 1.0 clamps to full weight on b wherever b had any.
            assert!((table.weight(VertexId(v), b) - 1.0).abs() < NORMALIZE_TOLERANCE);
        }
    }

    #[test]
    fn eased_session_builds_layers_from_the_seam() {
        let (adjacency, mut table, a, b) = strip_setup();
        // Rigid split so the seam is unambiguous: a owns 0-4, b owns 5-9.
        for v in 0..10 {
            table.set_weight(VertexId(v), a, if v < 5 { 1.0 } else { 0.0 }, false);
            table.set_weight(VertexId(v), b, if v < 5 { 0.0 } else { 1.0 }, false);
        }

        let mut blender = LiveBlender::new();
        let session = blender
            .start_eased(&adjacency, &table, a, b, 3)
            .unwrap();
        // Layers from the seam (vertex 4): 5, then 6, then 7.
        assert_eq!(
            session.affected_vertices().iter().copied().collect::<std::collections::BTreeSet<_>>(),
            [VertexId(5), VertexId(6), VertexId(7)].into_iter().collect()
        );

        blender.update(&mut table, -1.0).unwrap();
        // First ring follows the offset fully, deeper rings progressively
        // less.
        assert!((table.weight(VertexId(5), b) - 0.0).abs() < 1e-6);
        assert!((table.weight(VertexId(6), b) - 0.5).abs() < 1e-6);
        assert!((table.weight(VertexId(7), b) - 0.75).abs() < 1e-6);

        blender.stop(&mut table, false).unwrap();
        assert!((table.weight(VertexId(5), b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn eased_session_requires_touching_islands() {
        let topology = MeshTopology::from_edges(6, [(0, 1), (4, 5)]);
        let adjacency = AdjacencyGraph::build(&topology);
        let a = JointId::from_name("spine_01");
        let b = JointId::from_name("spine_02");
        let mut table = WeightTable::new();
        table.register_influence(a);
        table.register_influence(b);
        table.set_weight(VertexId(0), a, 1.0, false);
        table.set_weight(VertexId(5), b, 1.0, false);

        let mut blender = LiveBlender::new();
        assert!(matches!(
            blender.start_eased(&adjacency, &table, a, b, 4),
            Err(SessionError::EmptyBlendRegion { .. })
        ));
        assert!(!blender.is_active());
    }

    #[test]
    fn abort_rolls_back_and_clears() {
        let (_, mut table, a, b) = strip_setup();
        let before = table.clone();
        let mut blender = LiveBlender::new();
        blender.start(&table, a, b).unwrap();
        blender.update(&mut table, 0.6).unwrap();
        blender.abort(&mut table);

        assert!(!blender.is_active());
        for v in 0..10 {
            let v = VertexId(v);
            assert!((table.weight(v, b) - before.weight(v, b)).abs() < 1e-5);
        }
        // Aborting with no session is a no-op.
        blender.abort(&mut table);
    }
}
