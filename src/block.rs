//! Block capability interface.
//!
//! The engine never matches on concrete block types. Parsing, saving and
//! every graph edit go through the [`Block`] trait: a type name, one
//! reversible `sync`, a value clone, and the reference enumeration inherited
//! from [`RefFields`].
//!
//! Concrete schemas declare themselves with [`nif_block!`](crate::nif_block),
//! naming the on-disk type tag and the fields that carry references; the
//! macro generates the rest. Schemas may additionally opt into capability
//! families ([`AvObject`], [`Controller`], [`ExtraData`]) so that references
//! declared against a family resolve to them.

use std::any::Any;
use std::fmt::Debug;

use crate::blocks::{AvObjectBase, ExtraDataBase, TimeControllerBase};
use crate::error::Result;
use crate::refs::{RefFields, RefKind};
use crate::stream::NiStream;

pub trait Block: RefFields + Debug + 'static {
    /// Stable on-disk type tag.
    fn block_name(&self) -> &str;

    /// Read or write the block's fields, depending on the stream's mode.
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()>;

    fn clone_block(&self) -> Box<dyn Block>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn as_av_object(&self) -> Option<&(dyn AvObject + 'static)> {
        None
    }

    fn as_av_object_mut(&mut self) -> Option<&mut (dyn AvObject + 'static)> {
        None
    }

    fn as_controller(&self) -> Option<&(dyn Controller + 'static)> {
        None
    }

    fn as_controller_mut(&mut self) -> Option<&mut (dyn Controller + 'static)> {
        None
    }

    fn as_extra_data(&self) -> Option<&(dyn ExtraData + 'static)> {
        None
    }

    fn as_extra_data_mut(&mut self) -> Option<&mut (dyn ExtraData + 'static)> {
        None
    }

    /// Copy the block, passing every child and pointer index through
    /// `remap`. Indices for which `remap` returns `None` are kept.
    fn clone_remapped(&self, remap: &dyn Fn(u32) -> Option<u32>) -> Box<dyn Block> {
        let mut copy = self.clone_block();
        copy.visit_refs_mut(&mut |kind, index| {
            if kind != RefKind::String {
                if let Some(mapped) = remap(*index) {
                    *index = mapped;
                }
            }
        });
        copy
    }

    /// Owning references, NONE excluded, in field order.
    fn child_indices(&self) -> Vec<u32> {
        collect(self, RefKind::Child)
    }

    /// Weak references, NONE excluded, in field order.
    fn pointer_indices(&self) -> Vec<u32> {
        collect(self, RefKind::Pointer)
    }

    /// String table indices, NONE excluded, in field order.
    fn string_indices(&self) -> Vec<u32> {
        collect(self, RefKind::String)
    }
}

fn collect<B: Block + ?Sized>(block: &B, wanted: RefKind) -> Vec<u32> {
    let mut out = Vec::new();
    block.visit_refs(&mut |kind, index| {
        if kind == wanted && index != crate::refs::NIF_NONE {
            out.push(index);
        }
    });
    out
}

/// A block type the registry can construct by name.
pub trait NamedBlock: Block + Default {
    const BLOCK_NAME: &'static str;
}

// ── Capability families ──────────────────────────────────────────────────────

/// Scene-graph objects: named, transformed, may carry properties.
pub trait AvObject: Block + 'static {
    fn av(&self) -> &AvObjectBase;
    fn av_mut(&mut self) -> &mut AvObjectBase;
}

/// Time controllers, chained through `next`.
pub trait Controller: Block + 'static {
    fn controller(&self) -> &TimeControllerBase;
    fn controller_mut(&mut self) -> &mut TimeControllerBase;
}

pub trait ExtraData: Block + 'static {
    fn extra(&self) -> &ExtraDataBase;
    fn extra_mut(&mut self) -> &mut ExtraDataBase;
}

/// What a reference may be declared against: a concrete block type or a
/// capability family. Resolution downcasts and fails soft.
pub trait RefTarget: 'static {
    fn cast<'a>(block: &'a (dyn Block + 'static)) -> Option<&'a Self>;
    fn cast_mut<'a>(block: &'a mut (dyn Block + 'static)) -> Option<&'a mut Self>;
}

impl<T: Block> RefTarget for T {
    fn cast<'a>(block: &'a (dyn Block + 'static)) -> Option<&'a Self> {
        block.as_any().downcast_ref::<T>()
    }

    fn cast_mut<'a>(block: &'a mut (dyn Block + 'static)) -> Option<&'a mut Self> {
        block.as_any_mut().downcast_mut::<T>()
    }
}

impl RefTarget for dyn Block {
    fn cast<'a>(block: &'a (dyn Block + 'static)) -> Option<&'a Self> {
        Some(block)
    }

    fn cast_mut<'a>(block: &'a mut (dyn Block + 'static)) -> Option<&'a mut Self> {
        Some(block)
    }
}

impl RefTarget for dyn AvObject {
    fn cast<'a>(block: &'a (dyn Block + 'static)) -> Option<&'a Self> {
        block.as_av_object()
    }

    fn cast_mut<'a>(block: &'a mut (dyn Block + 'static)) -> Option<&'a mut Self> {
        block.as_av_object_mut()
    }
}

impl RefTarget for dyn Controller {
    fn cast<'a>(block: &'a (dyn Block + 'static)) -> Option<&'a Self> {
        block.as_controller()
    }

    fn cast_mut<'a>(block: &'a mut (dyn Block + 'static)) -> Option<&'a mut Self> {
        block.as_controller_mut()
    }
}

impl RefTarget for dyn ExtraData {
    fn cast<'a>(block: &'a (dyn Block + 'static)) -> Option<&'a Self> {
        block.as_extra_data()
    }

    fn cast_mut<'a>(block: &'a mut (dyn Block + 'static)) -> Option<&'a mut Self> {
        block.as_extra_data_mut()
    }
}

// ── Declarative schema macro ─────────────────────────────────────────────────

/// Declare a block schema.
///
/// ```ignore
/// nif_block!(NiNode = "NiNode" { av, children, effects }, av_object);
/// ```
///
/// The type must implement `Clone`, `Debug`, `Default` and
/// [`Streamable`](crate::stream::Streamable); the listed fields must
/// implement [`RefFields`]. Trailing idents opt into capability families
/// (`av_object`, `controller`, `extra_data`); the type must then implement
/// the matching trait.
#[macro_export]
macro_rules! nif_block {
    (@cap av_object) => {
        fn as_av_object(&self) -> Option<&(dyn $crate::block::AvObject + 'static)> { Some(self) }
        fn as_av_object_mut(&mut self) -> Option<&mut (dyn $crate::block::AvObject + 'static)> { Some(self) }
    };
    (@cap controller) => {
        fn as_controller(&self) -> Option<&(dyn $crate::block::Controller + 'static)> { Some(self) }
        fn as_controller_mut(&mut self) -> Option<&mut (dyn $crate::block::Controller + 'static)> { Some(self) }
    };
    (@cap extra_data) => {
        fn as_extra_data(&self) -> Option<&(dyn $crate::block::ExtraData + 'static)> { Some(self) }
        fn as_extra_data_mut(&mut self) -> Option<&mut (dyn $crate::block::ExtraData + 'static)> { Some(self) }
    };
    ($ty:ident = $name:literal { $($field:ident),* $(,)? } $(, $cap:ident)* $(,)?) => {
        $crate::ref_fields!($ty { $($field),* });

        impl $crate::block::NamedBlock for $ty {
            const BLOCK_NAME: &'static str = $name;
        }

        impl $crate::block::Block for $ty {
            fn block_name(&self) -> &str {
                $name
            }

            fn sync(&mut self, stream: &mut $crate::stream::NiStream<'_>) -> $crate::error::Result<()> {
                $crate::stream::Streamable::sync(self, stream)
            }

            fn clone_block(&self) -> Box<dyn $crate::block::Block> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }

            $( $crate::nif_block!(@cap $cap); )*
        }
    };
}

// ── Placeholder ──────────────────────────────────────────────────────────────

/// Stand-in for a type the registry does not know. Holds the block's raw
/// bytes and writes them back unchanged; it exposes no references, so the
/// graph algorithms treat it as a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownBlock {
    name:      String,
    data:      Vec<u8>,
    read_size: usize,
}

impl UnknownBlock {
    /// A placeholder that will read `size` bytes.
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self { name: name.into(), data: Vec::new(), read_size: size as usize }
    }

    pub fn with_data(name: impl Into<String>, data: Vec<u8>) -> Self {
        let read_size = data.len();
        Self { name: name.into(), data, read_size }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

crate::ref_fields!(UnknownBlock {});

impl Block for UnknownBlock {
    fn block_name(&self) -> &str {
        &self.name
    }

    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync_raw(&mut self.data, self.read_size)
    }

    fn clone_block(&self) -> Box<dyn Block> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
