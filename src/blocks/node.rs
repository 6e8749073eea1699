use crate::block::{AvObject, Block};
use crate::error::Result;
use crate::nif_block;
use crate::refs::BlockRefArray;
use crate::stream::{NiStream, Streamable};
use crate::version::VersionGate;

use super::object::AvObjectBase;

/// Grouping node: the backbone of the scene graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiNode {
    pub av:       AvObjectBase,
    pub children: BlockRefArray<dyn AvObject>,
    /// Dynamic effects; absent from Fallout 4 streams onwards.
    pub effects:  BlockRefArray<dyn Block>,
}

impl Streamable for NiNode {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.av)?;
        stream.sync(&mut self.children)?;
        stream.sync_if(VersionGate::ALWAYS.when(|v| v.stream < 130), |s| s.sync(&mut self.effects))?;
        Ok(())
    }
}

impl AvObject for NiNode {
    fn av(&self) -> &AvObjectBase {
        &self.av
    }

    fn av_mut(&mut self) -> &mut AvObjectBase {
        &mut self.av
    }
}

nif_block!(NiNode = "NiNode" { av, children, effects }, av_object);

/// Node variants that add no fields of their own.
macro_rules! node_alias {
    ($($ty:ident = $name:literal),* $(,)?) => {$(
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $ty {
            pub node: NiNode,
        }

        impl Streamable for $ty {
            fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
                stream.sync(&mut self.node)
            }
        }

        impl AvObject for $ty {
            fn av(&self) -> &AvObjectBase {
                &self.node.av
            }

            fn av_mut(&mut self) -> &mut AvObjectBase {
                &mut self.node.av
            }
        }

        nif_block!($ty = $name { node }, av_object);
    )*};
}

node_alias!(BSFadeNode = "BSFadeNode", BSLeafAnimNode = "BSLeafAnimNode");
