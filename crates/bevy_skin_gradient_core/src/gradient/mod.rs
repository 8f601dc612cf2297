//! The gradient distributor: one entry point, three redistribution policies.
//!
//! All three variants share the same primitives (island lookup, seam
//! detection, layered frontier expansion, normalized weight assignment) and
//! differ only in falloff table and grouping policy, so they are folded into
//! a single request enum rather than three parallel code paths.
//!
//! Soft conditions (empty islands, non-adjacent islands, exhausted layers)
//! are logged and collected into the report's warning list; they never abort
//! the batch. Hard precondition failures (invalid chains) are detected before
//! any weight is touched.

mod adaptive;
mod blur;
mod seam;

use bevy::{
    log::warn,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::GradientError,
    falloff::FalloffTable,
    id::JointId,
    mesh::{AdjacencyGraph, VertexSet},
    skeleton::{Skeleton, SymmetryMap},
    weights::WeightTable,
};

/// Default `max_steps` budget for topological distance measurements.
pub const DEFAULT_DISTANCE_STEPS: usize = 10;

/// Parameters of the pairwise seam blend (variant A).
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct SeamBlendParams {
    /// Cross-weight on seam vertices themselves (both sides get it).
    pub seam_weight: f32,
    /// Cross-weights for successive layers inward from the seam.
    pub layer_weights: Vec<f32>,
}

impl Default for SeamBlendParams {
    fn default() -> Self {
        Self {
            seam_weight: 0.5,
            layer_weights: vec![0.25, 0.10],
        }
    }
}

/// Per-neighbor cross-weights of the hierarchical chain blur (variant C),
/// measured in chain-index steps rather than mesh-graph steps.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct ChainBlurWeights {
    pub prev: f32,
    pub next: f32,
    pub next2: f32,
}

impl Default for ChainBlurWeights {
    fn default() -> Self {
        Self {
            prev: 0.25,
            next: 0.25,
            next2: 0.10,
        }
    }
}

/// A gradient distribution request: which redistribution policy to run and
/// its parameters. Falloff numbers are caller data, never baked in.
#[derive(Reflect, Clone, Debug)]
pub enum GradientRequest {
    /// Symmetric pairwise blend across island seams.
    SeamBlend {
        pairs: Vec<(JointId, JointId)>,
        params: SeamBlendParams,
    },
    /// Distance-adaptive layered expansion along an explicit joint chain.
    AdaptiveChain {
        chain: Vec<JointId>,
        table: FalloffTable,
        max_steps: usize,
    },
    /// Static chain-index blur over the unique `start` -> `end` bone path.
    ChainBlur {
        start: JointId,
        end: JointId,
        weights: ChainBlurWeights,
    },
}

impl GradientRequest {
    /// The same request retargeted to the mirrored side of the rig, or `None`
    /// if any involved joint has no symmetric pair.
    pub fn mirrored(&self, symmetry: &SymmetryMap) -> Option<GradientRequest> {
        match self {
            Self::SeamBlend { pairs, params } => Some(Self::SeamBlend {
                pairs: pairs
                    .iter()
                    .map(|&(a, b)| Some((symmetry.mirror(a)?, symmetry.mirror(b)?)))
                    .collect::<Option<Vec<_>>>()?,
                params: params.clone(),
            }),
            Self::AdaptiveChain {
                chain,
                table,
                max_steps,
            } => Some(Self::AdaptiveChain {
                chain: symmetry.mirror_chain(chain)?,
                table: table.clone(),
                max_steps: *max_steps,
            }),
            Self::ChainBlur {
                start,
                end,
                weights,
            } => Some(Self::ChainBlur {
                start: symmetry.mirror(*start)?,
                end: symmetry.mirror(*end)?,
                weights: *weights,
            }),
        }
    }
}

/// Outcome of a gradient distribution: which vertices were touched, plus any
/// soft conditions encountered along the way. The modified set is what a UI
/// layer highlights or isolates.
#[derive(Clone, Debug, Default)]
pub struct GradientReport {
    pub modified: VertexSet,
    pub warnings: Vec<String>,
}

impl GradientReport {
    pub(crate) fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    pub fn is_noop(&self) -> bool {
        self.modified.is_empty()
    }
}

/// Runs one gradient distribution over the weight table.
///
/// Precondition failures return `Err` before any mutation; per-pair soft
/// failures are reported as warnings while the rest of the batch proceeds.
pub fn distribute_gradient(
    adjacency: &AdjacencyGraph,
    skeleton: &Skeleton,
    weights: &mut WeightTable,
    request: &GradientRequest,
) -> Result<GradientReport, GradientError> {
    let mut report = GradientReport::default();
    match request {
        GradientRequest::SeamBlend { pairs, params } => {
            seam::seam_blend(adjacency, weights, pairs, params, &mut report);
        }
        GradientRequest::AdaptiveChain {
            chain,
            table,
            max_steps,
        } => {
            if chain.len() < 2 {
                return Err(GradientError::ChainTooShort);
            }
            adaptive::adaptive_chain(adjacency, weights, chain, table, *max_steps, &mut report);
        }
        GradientRequest::ChainBlur {
            start,
            end,
            weights: blur_weights,
        } => {
            // Resolved up front: an invalid chain must fail before mutation.
            let chain = skeleton.chain_between(*start, *end)?;
            if chain.len() < 2 {
                return Err(GradientError::ChainTooShort);
            }
            blur::chain_blur(weights, &chain, blur_weights, &mut report);
        }
    }
    if report.is_noop() && !report.warnings.is_empty() {
        warn!("gradient distribution modified no vertices");
    }
    Ok(report)
}
