//! Time controllers.

use crate::block::{AvObject, Block, Controller};
use crate::error::Result;
use crate::nif_block;
use crate::refs::{BlockPtr, BlockPtrShortArray, BlockRef};
use crate::stream::{NiStream, Streamable};
use crate::version::{VersionGate, V10_1_0_103, V10_1_0_104};

use super::animation::NiFloatData;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeControllerBase {
    pub next:      BlockRef<dyn Controller>,
    pub flags:     u16,
    pub frequency: f32,
    pub phase:     f32,
    pub start:     f32,
    pub stop:      f32,
    /// The animated object. Weak: the target owns the controller chain,
    /// not the other way round.
    pub target:    BlockPtr<dyn Block>,
}

impl Default for TimeControllerBase {
    fn default() -> Self {
        Self {
            next:      BlockRef::NONE,
            flags:     0x000C,
            frequency: 1.0,
            phase:     0.0,
            start:     0.0,
            stop:      0.0,
            target:    BlockPtr::NONE,
        }
    }
}

impl Streamable for TimeControllerBase {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.next)?;
        stream.sync(&mut self.flags)?;
        stream.sync(&mut self.frequency)?;
        stream.sync(&mut self.phase)?;
        stream.sync(&mut self.start)?;
        stream.sync(&mut self.stop)?;
        stream.sync(&mut self.target)
    }
}

crate::ref_fields!(TimeControllerBase { next, target });

/// Controller driven by a single interpolator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleInterpBase {
    pub controller:   TimeControllerBase,
    pub interpolator: BlockRef<dyn Block>,
}

impl Streamable for SingleInterpBase {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.controller)?;
        stream.sync_if(VersionGate::since(V10_1_0_104), |s| s.sync(&mut self.interpolator))?;
        Ok(())
    }
}

crate::ref_fields!(SingleInterpBase { controller, interpolator });

macro_rules! impl_controller {
    ($($ty:ident => $($path:ident).+),* $(,)?) => {$(
        impl Controller for $ty {
            fn controller(&self) -> &TimeControllerBase {
                &self.$($path).+
            }

            fn controller_mut(&mut self) -> &mut TimeControllerBase {
                &mut self.$($path).+
            }
        }
    )*};
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiTransformController {
    pub base: SingleInterpBase,
}

impl Streamable for NiTransformController {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.base)
    }
}

nif_block!(NiTransformController = "NiTransformController" { base }, controller);

/// Older files carry keyframe data directly on the controller; from
/// 10.1.0.104 it lives behind the interpolator instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiAlphaController {
    pub base: SingleInterpBase,
    pub data: BlockRef<NiFloatData>,
}

impl Streamable for NiAlphaController {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.base)?;
        stream.sync_if(VersionGate::until(V10_1_0_103), |s| s.sync(&mut self.data))?;
        Ok(())
    }
}

nif_block!(NiAlphaController = "NiAlphaController" { base, data }, controller);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiMultiTargetTransformController {
    pub controller:    TimeControllerBase,
    pub extra_targets: BlockPtrShortArray<dyn AvObject>,
}

impl Streamable for NiMultiTargetTransformController {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.controller)?;
        stream.sync(&mut self.extra_targets)
    }
}

nif_block!(
    NiMultiTargetTransformController = "NiMultiTargetTransformController" { controller, extra_targets },
    controller
);

impl_controller!(
    NiTransformController => base.controller,
    NiAlphaController => base.controller,
    NiMultiTargetTransformController => controller,
);
