use bevy::{
    app::{App, Plugin},
    asset::AssetApp,
};

use crate::{
    falloff::{FalloffLibrary, FalloffProfile, FalloffTable, loader::FalloffLibraryLoader},
    gradient::{ChainBlurWeights, SeamBlendParams},
    id::{JointId, VertexId},
    mesh::{AdjacencyGraph, MeshTopology},
    skeleton::{PatternMapper, PatternMapperSerial, SymmetryMap},
    weights::WeightTable,
};

/// Adds skin-weight gradient support to an app: the falloff preset asset and
/// reflect registrations for the engine's data types. The engine itself is
/// plain synchronous calls; no systems or schedules are installed.
pub struct SkinGradientPlugin;

impl Plugin for SkinGradientPlugin {
    fn build(&self, app: &mut App) {
        self.register_assets(app);
        self.register_types(app);
    }
}

impl SkinGradientPlugin {
    fn register_assets(&self, app: &mut App) {
        app.init_asset::<FalloffLibrary>()
            .init_asset_loader::<FalloffLibraryLoader>()
            .register_asset_reflect::<FalloffLibrary>();
    }

    fn register_types(&self, app: &mut App) {
        app //
            .register_type::<VertexId>()
            .register_type::<JointId>()
            .register_type::<MeshTopology>()
            .register_type::<AdjacencyGraph>()
            .register_type::<WeightTable>()
            .register_type::<FalloffProfile>()
            .register_type::<FalloffTable>()
            .register_type::<SeamBlendParams>()
            .register_type::<ChainBlurWeights>()
            .register_type::<PatternMapper>()
            .register_type::<PatternMapperSerial>()
            .register_type::<SymmetryMap>();
    }
}
