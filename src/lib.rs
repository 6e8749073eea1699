pub mod error;
pub mod version;
pub mod stream;
pub mod refs;
pub mod strings;
pub mod block;
pub mod blocks;
pub mod registry;
pub mod header;
pub mod graph;
pub mod file;
pub mod summary;

pub use error::{Diagnostic, NifError, Result};
pub use version::{NiVersion, VersionGate};
pub use stream::{NiStream, Streamable};
pub use refs::{BlockPtr, BlockPtrArray, BlockRef, BlockRefArray, RefFields, RefKind, NIF_NONE};
pub use strings::{StringRef, StringTable};
pub use block::{AvObject, Block, Controller, ExtraData, NamedBlock, RefTarget, UnknownBlock};
pub use registry::BlockRegistry;
pub use header::NiHeader;
pub use file::{LoadOptions, NifFile, SaveOptions};
