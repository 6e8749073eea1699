use crate::block::ExtraData;
use crate::error::Result;
use crate::nif_block;
use crate::stream::{NiStream, Streamable};
use crate::strings::StringRef;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraDataBase {
    pub name: StringRef,
}

impl Streamable for ExtraDataBase {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.name)
    }
}

crate::ref_fields!(ExtraDataBase { name });

macro_rules! impl_extra_data {
    ($($ty:ident),*) => {$(
        impl ExtraData for $ty {
            fn extra(&self) -> &ExtraDataBase {
                &self.base
            }

            fn extra_mut(&mut self) -> &mut ExtraDataBase {
                &mut self.base
            }
        }
    )*};
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiStringExtraData {
    pub base:  ExtraDataBase,
    pub value: StringRef,
}

impl Streamable for NiStringExtraData {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.base)?;
        stream.sync(&mut self.value)
    }
}

nif_block!(NiStringExtraData = "NiStringExtraData" { base, value }, extra_data);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiIntegerExtraData {
    pub base:  ExtraDataBase,
    pub value: u32,
}

impl Streamable for NiIntegerExtraData {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.base)?;
        stream.sync(&mut self.value)
    }
}

nif_block!(NiIntegerExtraData = "NiIntegerExtraData" { base }, extra_data);

/// Bethesda behaviour flags, conventionally named `BSX`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BSXFlags {
    pub base:  ExtraDataBase,
    pub flags: u32,
}

impl Streamable for BSXFlags {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.base)?;
        stream.sync(&mut self.flags)
    }
}

nif_block!(BSXFlags = "BSXFlags" { base }, extra_data);

impl_extra_data!(NiStringExtraData, NiIntegerExtraData, BSXFlags);
