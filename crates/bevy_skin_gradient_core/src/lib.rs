//! Topological skin-weight gradient engine.
//!
//! Redistributes skin-cluster influence weights smoothly across joint
//! boundaries by walking the mesh adjacency graph: island detection, seam
//! finding, layered frontier expansion with configurable falloff, and
//! snapshot-based interactive blending with exact rollback.
//!
//! The engine works on two plain, host-owned values — a [`mesh::MeshTopology`]
//! and a [`weights::WeightTable`] — and hands back the modified vertex set
//! for UI feedback. It holds no state across calls except inside an explicit
//! [`live_blend::LiveBlendSession`].

pub mod errors;
pub mod falloff;
pub mod gradient;
pub mod id;
pub mod island;
pub mod live_blend;
pub mod mesh;
pub mod plugin;
pub mod skeleton;
pub mod weights;

pub mod prelude {
    pub use crate::{
        errors::{FalloffError, FalloffLoaderError, GradientError, SessionError},
        falloff::{FalloffLibrary, FalloffProfile, FalloffTable},
        gradient::{
            ChainBlurWeights, GradientReport, GradientRequest, SeamBlendParams,
            distribute_gradient,
        },
        id::{JointId, VertexId},
        island::{influence_island, topological_distance},
        live_blend::{LiveBlendSession, LiveBlender},
        mesh::{AdjacencyGraph, MeshTopology, VertexSet},
        plugin::SkinGradientPlugin,
        skeleton::{PatternMapper, Skeleton, SymmetryMap},
        weights::{MAX_INFLUENCES, WEIGHT_EPSILON, WeightTable},
    };
}
