//! Falloff profiles: the layer-weight tables driving gradient distribution.
//!
//! The concrete numbers (the 0.5/0.25/0.1 family) are empirically tuned rig
//! defaults rather than derived constants, so they live here as data: ship as
//! `Default` impls, overridable per call, and loadable as a named preset
//! library from `.falloff.ron` assets.

use bevy::{
    asset::Asset,
    platform::collections::HashMap,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use serde::{Deserialize, Serialize};

use crate::errors::FalloffError;

/// An ordered list of strictly decreasing layer weights in `(0, 1]`.
///
/// `steps()[i]` is the weight assigned to the i-th expansion layer; expansion
/// stops when the profile (or the mesh) runs out.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FalloffProfile {
    steps: Vec<f32>,
}

impl FalloffProfile {
    pub fn new(steps: Vec<f32>) -> Result<Self, FalloffError> {
        if steps.is_empty() {
            return Err(FalloffError::Empty);
        }
        let mut prev = f32::INFINITY;
        for i in 0..steps.len() {
            let w = steps[i];
            if !(0.0..=1.0).contains(&w) || w == 0.0 || w >= prev {
                return Err(FalloffError::NonMonotonic { steps });
            }
            prev = w;
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[f32] {
        &self.steps
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

/// Falloff profiles keyed by topological distance.
///
/// `profiles[i]` serves distance `i + 1`; distances past the end use the last
/// (widest) entry, except for the far/disconnected sentinel which maps back
/// to the narrowest profile — blending aggressively across topology that is
/// not actually connected only smears weights into unrelated territory.
#[derive(Reflect, Clone, Debug, PartialEq)]
#[reflect(Default)]
pub struct FalloffTable {
    profiles: Vec<FalloffProfile>,
}

impl Default for FalloffTable {
    fn default() -> Self {
        let tables: [&[f32]; 5] = [
            &[0.25, 0.10],
            &[0.5, 0.25, 0.10],
            &[0.75, 0.5, 0.25, 0.10],
            &[0.9, 0.75, 0.5, 0.25, 0.10],
            &[1.0, 0.9, 0.75, 0.5, 0.25, 0.10],
        ];
        Self {
            profiles: tables
                .into_iter()
                .map(|t| FalloffProfile::new(t.to_vec()).unwrap())
                .collect(),
        }
    }
}

impl FalloffTable {
    pub fn new(profiles: Vec<FalloffProfile>) -> Result<Self, FalloffError> {
        if profiles.is_empty() {
            return Err(FalloffError::Empty);
        }
        Ok(Self { profiles })
    }

    /// Selects the profile for a measured topological distance.
    ///
    /// `far_sentinel` is the `max_steps` value the distance was measured with;
    /// hitting it means "far or disconnected" and selects the most
    /// conservative (narrowest) profile.
    pub fn profile_for(&self, distance: usize, far_sentinel: usize) -> &FalloffProfile {
        if distance >= far_sentinel {
            return &self.profiles[0];
        }
        let index = distance.max(1).min(self.profiles.len()) - 1;
        &self.profiles[index]
    }

    pub fn profiles(&self) -> &[FalloffProfile] {
        &self.profiles
    }
}

/// Named library of falloff tables, loadable as a `.falloff.ron` asset so
/// riggers can keep per-character presets next to the character data.
#[derive(Asset, Reflect, Clone, Debug, Default)]
#[reflect(Default)]
pub struct FalloffLibrary {
    tables: HashMap<String, FalloffTable>,
}

impl FalloffLibrary {
    pub fn get(&self, name: &str) -> Option<&FalloffTable> {
        self.tables.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, table: FalloffTable) {
        self.tables.insert(name.into(), table);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

#[derive(Serialize, Deserialize, Default)]
pub struct FalloffLibrarySerial {
    pub tables: HashMap<String, Vec<Vec<f32>>>,
}

impl FalloffLibrarySerial {
    pub fn from_value(value: &FalloffLibrary) -> Self {
        Self {
            tables: value
                .tables
                .iter()
                .map(|(name, table)| {
                    (
                        name.clone(),
                        table.profiles().iter().map(|p| p.steps().to_vec()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn to_value(&self) -> Result<FalloffLibrary, FalloffError> {
        let mut library = FalloffLibrary::default();
        for (name, profiles) in &self.tables {
            let profiles = profiles
                .iter()
                .cloned()
                .map(FalloffProfile::new)
                .collect::<Result<Vec<_>, _>>()?;
            library.insert(name.clone(), FalloffTable::new(profiles)?);
        }
        Ok(library)
    }
}

impl Serialize for FalloffLibrary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        FalloffLibrarySerial::from_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FalloffLibrary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        FalloffLibrarySerial::deserialize(deserializer)?
            .to_value()
            .map_err(serde::de::Error::custom)
    }
}

pub mod loader {
    use bevy::asset::{AssetLoader, LoadContext, io::Reader};
    use bevy::reflect::TypePath;

    use super::{FalloffLibrary, FalloffLibrarySerial};
    use crate::errors::FalloffLoaderError;

    #[derive(Default, TypePath)]
    pub struct FalloffLibraryLoader;

    impl AssetLoader for FalloffLibraryLoader {
        type Asset = FalloffLibrary;
        type Settings = ();
        type Error = FalloffLoaderError;

        async fn load(
            &self,
            reader: &mut dyn Reader,
            _settings: &Self::Settings,
            _load_context: &mut LoadContext<'_>,
        ) -> Result<Self::Asset, Self::Error> {
            let mut bytes = vec![];
            reader.read_to_end(&mut bytes).await?;
            let serial: FalloffLibrarySerial = ron::de::from_bytes(&bytes)?;
            Ok(serial.to_value()?)
        }

        fn extensions(&self) -> &[&str] {
            &["falloff.ron"]
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_profiles_strictly_decrease() {
        let table = FalloffTable::default();
        for profile in table.profiles() {
            for pair in profile.steps().windows(2) {
                assert!(pair[1] < pair[0], "profile {:?} not decreasing", profile);
            }
        }
    }

    #[test]
    fn non_monotonic_profiles_are_rejected() {
        assert!(FalloffProfile::new(vec![0.25, 0.25]).is_err());
        assert!(FalloffProfile::new(vec![0.1, 0.5]).is_err());
        assert!(FalloffProfile::new(vec![0.5, 0.0]).is_err());
        assert!(FalloffProfile::new(vec![]).is_err());
        assert!(FalloffProfile::new(vec![0.5, 0.25]).is_ok());
    }

    #[test]
    fn profile_selection_by_distance() {
        let table = FalloffTable::default();
        assert_eq!(table.profile_for(1, 10).depth(), 2);
        assert_eq!(table.profile_for(3, 10).depth(), 4);
        // Distances past the table reuse the widest profile...
        assert_eq!(table.profile_for(7, 10).depth(), 6);
        // ...but the far/disconnected sentinel maps to the narrowest one.
        assert_eq!(table.profile_for(10, 10).depth(), 2);
        assert_eq!(table.profile_for(0, 10).depth(), 2);
    }

    #[test]
    fn library_serial_round_trip_rejects_bad_profiles() {
        let mut serial = FalloffLibrarySerial::default();
        serial.tables.insert("good".into(), vec![vec![0.5, 0.25]]);
        assert!(serial.to_value().is_ok());

        serial.tables.insert("bad".into(), vec![vec![0.25, 0.5]]);
        assert!(serial.to_value().is_err());
    }
}
