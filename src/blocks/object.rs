//! Fields shared by every named scene object.

use crate::block::{Controller, ExtraData};
use crate::error::Result;
use crate::refs::{BlockRef, BlockRefArray};
use crate::stream::{NiStream, Streamable};
use crate::strings::StringRef;
use crate::version::VersionGate;

/// Name, attached extra data and the head of the controller chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNetBase {
    pub name:       StringRef,
    pub extra_data: BlockRefArray<dyn ExtraData>,
    pub controller: BlockRef<dyn Controller>,
}

impl Streamable for ObjectNetBase {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.name)?;
        stream.sync(&mut self.extra_data)?;
        stream.sync(&mut self.controller)
    }
}

crate::ref_fields!(ObjectNetBase { name, extra_data, controller });

/// Local transform of a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    pub rotation:    [[f32; 3]; 3],
    pub scale:       f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation:    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            scale:       1.0,
        }
    }
}

impl Streamable for Transform {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.translation)?;
        stream.sync(&mut self.rotation)?;
        stream.sync(&mut self.scale)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvObjectBase {
    pub net:        ObjectNetBase,
    /// Stored as `u16` up to Bethesda stream 26, `u32` after.
    pub flags:      u32,
    pub transform:  Transform,
    pub properties: BlockRefArray<dyn crate::block::Block>,
    pub collision:  BlockRef<dyn crate::block::Block>,
}

impl Streamable for AvObjectBase {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.net)?;

        if stream.version().stream > 26 {
            stream.sync(&mut self.flags)?;
        } else {
            let mut short = self.flags as u16;
            stream.sync(&mut short)?;
            self.flags = short as u32;
        }

        stream.sync(&mut self.transform)?;
        stream.sync_if(VersionGate::ALWAYS.when(|v| v.stream <= 34), |s| s.sync(&mut self.properties))?;
        stream.sync(&mut self.collision)
    }
}

crate::ref_fields!(AvObjectBase { net, properties, collision });
