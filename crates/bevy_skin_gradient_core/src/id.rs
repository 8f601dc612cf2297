use std::hash::{Hash, Hasher};

use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Index of a vertex in the host mesh's vertex buffer.
///
/// Vertex ids are dense (`0..vertex_count`) and owned by the host; the engine
/// never allocates or retires them.
#[derive(
    Reflect,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
)]
#[reflect(Default)]
pub struct VertexId(pub u32);

impl VertexId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for VertexId {
    fn from(value: u32) -> Self {
        VertexId(value)
    }
}

/// Stable identifier of a skinning joint.
///
/// Derived from the joint's name so that ids survive scene reloads and can be
/// recomputed from host data at any time.
#[derive(
    Reflect, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord, Debug,
)]
#[reflect(Default)]
pub struct JointId {
    id: Uuid,
}

impl Hash for JointId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (hi, lo) = self.id.as_u64_pair();
        state.write_u64(hi ^ lo);
    }
}

impl JointId {
    pub fn from_name(name: &str) -> Self {
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}
