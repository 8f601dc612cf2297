//! Joint hierarchy, bone chains and the rig symmetry map.
//!
//! The engine only needs the parent relation of the rig: enough to resolve
//! the unique parent->child path between two joints (hierarchical chain blur)
//! and to walk first-child chains (fin/tail bone runs). The symmetry map is
//! built once at rig-setup time from a name pattern and consulted as a plain
//! table afterwards, so no per-call name matching ever happens.

use bevy::{
    platform::collections::HashMap,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{errors::GradientError, id::JointId};

#[derive(Clone, Debug)]
pub struct Joint {
    pub name: String,
    pub parent: Option<JointId>,
}

/// Parent-map view of the rig's joint hierarchy.
///
/// Insertion order is preserved and doubles as sibling order: the first child
/// added under a joint is the one `direct_chain` follows.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    joints: IndexMap<JointId, Joint>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a joint under `parent` (or as a root) and returns its id, derived
    /// from the name.
    pub fn add_joint(&mut self, name: impl Into<String>, parent: Option<JointId>) -> JointId {
        let name = name.into();
        let id = JointId::from_name(&name);
        self.joints.insert(id, Joint { name, parent });
        id
    }

    pub fn contains(&self, joint: JointId) -> bool {
        self.joints.contains_key(&joint)
    }

    pub fn parent(&self, joint: JointId) -> Option<JointId> {
        self.joints.get(&joint).and_then(|j| j.parent)
    }

    pub fn name(&self, joint: JointId) -> Option<&str> {
        self.joints.get(&joint).map(|j| j.name.as_str())
    }

    pub fn joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.joints.keys().copied()
    }

    /// Resolves the unique parent->child path from `start` down to `end`,
    /// inclusive. Fails with [`GradientError::InvalidChain`] if `end` is not a
    /// descendant of `start`; nothing is mutated on failure.
    pub fn chain_between(&self, start: JointId, end: JointId) -> Result<Vec<JointId>, GradientError> {
        let mut chain = vec![end];
        let mut current = end;
        while current != start {
            let Some(parent) = self.parent(current) else {
                return Err(GradientError::InvalidChain { start, end });
            };
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Walks first-child links from `root` to the chain tip. This is how the
    /// original rig collects fin and tail bone runs: strictly one child per
    /// step, stopping at the first branch-free leaf.
    pub fn direct_chain(&self, root: JointId) -> Vec<JointId> {
        let mut chain = vec![root];
        let mut current = root;
        while let Some(child) = self.first_child(current) {
            chain.push(child);
            current = child;
        }
        chain
    }

    fn first_child(&self, joint: JointId) -> Option<JointId> {
        self.joints
            .iter()
            .find(|(_, j)| j.parent == Some(joint))
            .map(|(id, _)| *id)
    }
}

/// Swaps a left/right key inside joint names, e.g. `fin_L_02` <-> `fin_R_02`.
#[derive(Debug, Reflect, Clone)]
#[reflect(Default)]
pub struct PatternMapper {
    pub key_1: String,
    pub key_2: String,
    pub pattern_before: String,
    pub pattern_after: String,
    #[reflect(ignore, default = "default_regex")]
    regex: Regex,
}

pub fn default_regex() -> Regex {
    Regex::new("").unwrap()
}

impl Default for PatternMapper {
    fn default() -> Self {
        PatternMapperSerial::default().to_value().unwrap()
    }
}

#[derive(Serialize, Deserialize, Reflect, Clone)]
#[reflect(Default)]
pub struct PatternMapperSerial {
    pub key_1: String,
    pub key_2: String,
    pub pattern_before: String,
    pub pattern_after: String,
}

impl Default for PatternMapperSerial {
    fn default() -> Self {
        Self {
            key_1: "L".into(),
            key_2: "R".into(),
            pattern_before: r"^.*_".into(),
            pattern_after: r"(_.*)?$".into(),
        }
    }
}

impl PatternMapperSerial {
    pub fn from_value(value: &PatternMapper) -> Self {
        Self {
            key_1: value.key_1.clone(),
            key_2: value.key_2.clone(),
            pattern_before: value.pattern_before.clone(),
            pattern_after: value.pattern_after.clone(),
        }
    }

    pub fn to_value(&self) -> Result<PatternMapper, regex::Error> {
        let regex = Regex::new(&format!(
            "({})({}|{})({})",
            self.pattern_before, self.key_1, self.key_2, self.pattern_after
        ))?;
        Ok(PatternMapper {
            key_1: self.key_1.clone(),
            key_2: self.key_2.clone(),
            pattern_before: self.pattern_before.clone(),
            pattern_after: self.pattern_after.clone(),
            regex,
        })
    }
}

impl Serialize for PatternMapper {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        PatternMapperSerial::from_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PatternMapper {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        PatternMapperSerial::deserialize(deserializer)?
            .to_value()
            .map_err(serde::de::Error::custom)
    }
}

impl PatternMapper {
    pub fn flip(&self, input: &str) -> Option<String> {
        let captures = self.regex.captures(input)?;
        let key_capture = captures.get(2).unwrap().as_str();
        let replacement_key = if key_capture == self.key_1 {
            &self.key_2
        } else {
            &self.key_1
        };
        Some(
            self.regex
                .replace(input, format!("${{1}}{replacement_key}${{3}}"))
                .into(),
        )
    }
}

/// Explicit joint -> mirrored-joint table.
///
/// Built once when the rig is set up; lookups afterwards are plain table
/// hits. Joints whose flipped name does not exist in the skeleton (centerline
/// joints, unpaired fins) simply have no entry.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
pub struct SymmetryMap {
    map: HashMap<JointId, JointId>,
}

impl SymmetryMap {
    pub fn from_pattern(skeleton: &Skeleton, mapper: &PatternMapper) -> Self {
        let mut map = HashMap::new();
        for joint in skeleton.joints() {
            let Some(name) = skeleton.name(joint) else {
                continue;
            };
            let Some(flipped) = mapper.flip(name) else {
                continue;
            };
            let mirror = JointId::from_name(&flipped);
            if skeleton.contains(mirror) {
                map.insert(joint, mirror);
            }
        }
        Self { map }
    }

    pub fn mirror(&self, joint: JointId) -> Option<JointId> {
        self.map.get(&joint).copied()
    }

    /// Mirrors every joint of a chain; `None` if any joint is unpaired.
    pub fn mirror_chain(&self, chain: &[JointId]) -> Option<Vec<JointId>> {
        chain.iter().map(|&j| self.mirror(j)).collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
