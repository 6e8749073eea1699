//! Built-in block schemas.
//!
//! Each schema is a plain struct with a hand-written `Streamable` impl (its
//! field order on disk) and one `nif_block!` line naming its type tag and
//! reference-bearing fields. Shared leading fields are embedded base structs
//! rather than an inheritance chain.

mod animation;
mod controller;
mod extra_data;
mod node;
mod object;

pub use animation::{
    FloatKey, FloatKeyGroup, KeyType, NiBSplineBasisData, NiBSplineCompFloatInterpolator, NiBSplineData,
    NiFloatData, NiFloatInterpolator,
};
pub use controller::{
    NiAlphaController, NiMultiTargetTransformController, NiTransformController, SingleInterpBase,
    TimeControllerBase,
};
pub use extra_data::{BSXFlags, ExtraDataBase, NiIntegerExtraData, NiStringExtraData};
pub use node::{BSFadeNode, BSLeafAnimNode, NiNode};
pub use object::{AvObjectBase, ObjectNetBase, Transform};

use crate::registry::BlockRegistry;

/// Add every built-in schema to `registry`.
pub fn register_builtins(registry: &mut BlockRegistry) {
    registry.register::<NiNode>();
    registry.register::<BSFadeNode>();
    registry.register::<BSLeafAnimNode>();
    registry.register::<NiStringExtraData>();
    registry.register::<NiIntegerExtraData>();
    registry.register::<BSXFlags>();
    registry.register::<NiTransformController>();
    registry.register::<NiAlphaController>();
    registry.register::<NiMultiTargetTransformController>();
    registry.register::<NiFloatInterpolator>();
    registry.register::<NiFloatData>();
    registry.register::<NiBSplineData>();
    registry.register::<NiBSplineBasisData>();
    registry.register::<NiBSplineCompFloatInterpolator>();
}
