//! File header.
//!
//! # Layout
//! ```text
//! "Gamebryo File Format, Version 20.2.0.7\n"
//! file version      u32
//! endian            u8           >= 20.0.0.3, must be 1
//! user version      u32          >= 10.0.1.8
//! block count       u32
//! export info                    Bethesda files only
//! block types       u16 count, u32-length strings
//! type indices      u16 × block count
//! block sizes       u32 × block count      >= 20.2.0.5
//! string table      count, max length, strings   >= 20.1.0.1
//! groups            u32 count, u32 each    >= 5.0.0.6
//! ```
//! The header only describes the blocks; the container keeps the type
//! table, indices and sizes in step with the block list on save.

use crate::error::{NifError, Result};
use crate::stream::NiStream;
use crate::version::{
    format_file_version, NiVersion, VersionGate, GAMEBRYO_PREFIX, NETIMMERSE_PREFIX, V10_0_1_8, V20_0_0_3,
    V20_1_0_1, V20_2_0_5, V5_0_0_6,
};

/// Longest header line accepted before giving up on finding `\n`.
const MAX_LINE: usize = 256;

/// Bethesda export metadata. Strings are kept as raw bytes, terminator
/// included, so they write back exactly as read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportInfo {
    pub author:         Vec<u8>,
    /// Present when the stream version is above 130.
    pub unknown:        u32,
    /// Present when the stream version is below 131.
    pub process_script: Vec<u8>,
    pub export_script:  Vec<u8>,
    /// Present from stream version 103.
    pub max_filepath:   Vec<u8>,
}

impl ExportInfo {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        let bs = stream.version().stream;
        stream.sync_export_string(&mut self.author)?;
        if bs > 130 {
            stream.sync(&mut self.unknown)?;
        }
        if bs < 131 {
            stream.sync_export_string(&mut self.process_script)?;
        }
        stream.sync_export_string(&mut self.export_script)?;
        if bs >= 103 {
            stream.sync_export_string(&mut self.max_filepath)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NiHeader {
    /// Header line without the trailing newline.
    pub description:        String,
    pub version:            NiVersion,
    pub endian:             u8,
    pub block_count:        u32,
    pub export_info:        ExportInfo,
    pub block_types:        Vec<String>,
    pub block_type_indices: Vec<u16>,
    pub block_sizes:        Vec<u32>,
    /// Longest string-table entry as declared by the file. Recomputed on save.
    pub max_string_len:     u32,
    pub groups:             Vec<u32>,
}

impl NiHeader {
    pub fn new(version: NiVersion) -> Self {
        Self {
            description:        version.description(),
            version,
            endian:             1,
            block_count:        0,
            export_info:        ExportInfo::default(),
            block_types:        Vec::new(),
            block_type_indices: Vec::new(),
            block_sizes:        Vec::new(),
            max_string_len:     0,
            groups:             Vec::new(),
        }
    }

    /// Whether the header carries a block size table.
    pub fn has_block_sizes(&self) -> bool {
        self.version.file >= V20_2_0_5
    }

    /// Type name of block `index` as declared by the type tables.
    pub fn block_type(&self, index: usize) -> Option<&str> {
        let type_index = *self.block_type_indices.get(index)?;
        self.block_types.get(type_index as usize).map(String::as_str)
    }

    /// Read or write the header. The stream's version is updated as soon as
    /// each version field has been synced, so later gates see it. The string
    /// table section moves the stream's own string table.
    pub fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        let reading = stream.is_reading();

        let start = stream.position();
        stream.sync_line(&mut self.description, MAX_LINE)?;
        if reading
            && !self.description.starts_with(GAMEBRYO_PREFIX)
            && !self.description.starts_with(NETIMMERSE_PREFIX)
        {
            return Err(NifError::MalformedHeader {
                offset: start,
                reason: "not a NetImmerse/Gamebryo header line".into(),
            });
        }

        let at = stream.position();
        stream.sync(&mut self.version.file)?;
        if !self.version.is_supported() {
            return Err(NifError::MalformedHeader {
                offset: at,
                reason: format!("unsupported file version {}", format_file_version(self.version.file)),
            });
        }
        stream.set_version(self.version);

        let at = stream.position();
        if stream.sync_if(VersionGate::since(V20_0_0_3), |s| s.sync(&mut self.endian))? && self.endian != 1 {
            return Err(NifError::MalformedHeader { offset: at, reason: "big-endian files are not supported".into() });
        }

        stream.sync_if(VersionGate::since(V10_0_1_8), |s| s.sync(&mut self.version.user))?;
        stream.set_version(self.version);

        stream.sync(&mut self.block_count)?;

        if self.version.is_bethesda() {
            stream.sync(&mut self.version.stream)?;
            stream.set_version(self.version);
            self.export_info.sync(stream)?;
        }

        let type_count = stream.sync_count::<u16>(self.block_types.len())?;
        sync_string_list(stream, type_count, &mut self.block_types)?;

        stream.sync_vec_with_len(self.block_count as usize, &mut self.block_type_indices)?;

        stream.sync_if(VersionGate::since(V20_2_0_5), |s| {
            s.sync_vec_with_len(self.block_count as usize, &mut self.block_sizes)
        })?;

        stream.sync_if(VersionGate::since(V20_1_0_1), |s| {
            let mut entries = std::mem::take(s.strings_mut().entries_mut());
            let count = s.sync_count::<u32>(entries.len());
            let result = count.and_then(|count| {
                if !s.is_reading() {
                    self.max_string_len = entries.iter().map(|e| e.chars().count() as u32).max().unwrap_or(0);
                }
                s.sync(&mut self.max_string_len)?;
                sync_string_list(s, count, &mut entries)
            });
            *s.strings_mut().entries_mut() = entries;
            result
        })?;

        stream.sync_if(VersionGate::since(V5_0_0_6), |s| s.sync_vec::<u32, _>(&mut self.groups))?;
        Ok(())
    }
}

impl Default for NiHeader {
    fn default() -> Self {
        Self::new(NiVersion::default())
    }
}

/// Reading grows `list` one entry at a time, so a bogus count runs into the
/// end of the stream instead of a huge allocation.
fn sync_string_list(stream: &mut NiStream<'_>, len: usize, list: &mut Vec<String>) -> Result<()> {
    if stream.is_reading() {
        list.clear();
        for _ in 0..len {
            let mut entry = String::new();
            stream.sync_sized_string(&mut entry)?;
            list.push(entry);
        }
        return Ok(());
    }
    for entry in list.iter_mut() {
        stream.sync_sized_string(entry)?;
    }
    Ok(())
}
