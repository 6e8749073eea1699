//! Serialisable overviews of a loaded file, for tooling output.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::block::UnknownBlock;
use crate::file::NifFile;
use crate::strings::StringRef;
use crate::version::format_file_version;

/// Placeholder bytes shown in a block summary.
const PREVIEW_LEN: usize = 16;

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub description:    String,
    pub file_version:   String,
    pub user_version:   u32,
    pub stream_version: u32,
    pub blocks:         usize,
    pub strings:        usize,
    pub roots:          Vec<u32>,
    pub reachable:      usize,
    /// Type name → number of blocks.
    pub block_types:    BTreeMap<String, usize>,
    pub diagnostics:    Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub index:     u32,
    pub type_name: String,
    pub children:  Vec<u32>,
    pub pointers:  Vec<u32>,
    pub strings:   Vec<String>,
    /// Hex of the leading bytes of an unknown block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw:       Option<String>,
}

impl FileSummary {
    pub fn of(file: &NifFile) -> Self {
        let header = file.header();
        let mut block_types = BTreeMap::new();
        for block in file.blocks() {
            *block_types.entry(block.block_name().to_owned()).or_insert(0) += 1;
        }

        Self {
            description:    header.description.clone(),
            file_version:   format_file_version(header.version.file),
            user_version:   header.version.user,
            stream_version: header.version.stream,
            blocks:         file.len(),
            strings:        file.strings().len(),
            roots:          file.roots().indices().collect(),
            reachable:      file.reachable_blocks().len(),
            block_types,
            diagnostics:    file.diagnostics().iter().map(ToString::to_string).collect(),
        }
    }
}

impl BlockSummary {
    pub fn all(file: &NifFile) -> Vec<Self> {
        file.blocks()
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let raw = block.as_any().downcast_ref::<UnknownBlock>().map(|unknown| {
                    let data = unknown.data();
                    hex::encode(&data[..data.len().min(PREVIEW_LEN)])
                });
                Self {
                    index:     index as u32,
                    type_name: block.block_name().to_owned(),
                    children:  block.child_indices(),
                    pointers:  block.pointer_indices(),
                    strings:   block
                        .string_indices()
                        .into_iter()
                        .map(|i| file.string(StringRef::new(i)).unwrap_or("<missing>").to_owned())
                        .collect(),
                    raw,
                }
            })
            .collect()
    }
}
