//! The file container.
//!
//! [`NifFile`] owns the header, the block list, the string table and the
//! footer roots. Blocks address each other by list index, so every operation
//! that changes the list (delete, move, reorder, prune) rewrites the
//! references of all blocks and roots in the same call. No caller ever sees
//! the list and the references out of step.
//!
//! # Loading
//! Blocks are created through a [`BlockRegistry`] and streamed in file
//! order. A type the registry does not know is kept as an
//! [`UnknownBlock`] holding its raw bytes, which needs the block size table
//! (20.2.0.5 and later); without it the block cannot be delimited and the
//! load fails.
//!
//! # Saving
//! Every block is serialised into its own buffer first so the size table
//! can be filled in, then the header, the blocks and the roots are written
//! in one pass. The type table keeps the existing name order; names no
//! longer used are dropped and new ones appended.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::block::{Block, RefTarget, UnknownBlock};
use crate::error::{Diagnostic, NifError, Result};
use crate::graph;
use crate::header::NiHeader;
use crate::refs::{BlockLink, BlockRefArray};
use crate::registry::BlockRegistry;
use crate::stream::NiStream;
use crate::strings::{StringRef, StringTable};
use crate::version::NiVersion;

// ── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Run [`NifFile::validate`] after loading, clearing dangling
    /// references. Off by default so bytes stay verbatim.
    pub repair_references: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Drop blocks not reachable from the roots through child references.
    pub prune_unreachable: bool,
    /// Deduplicate the string table and drop unreferenced entries.
    pub compact_strings: bool,
}

// ── NifFile ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct NifFile {
    header:      NiHeader,
    blocks:      Vec<Box<dyn Block>>,
    strings:     StringTable,
    roots:       BlockRefArray<dyn Block>,
    diagnostics: Vec<Diagnostic>,
}

impl NifFile {
    /// An empty file of the given version.
    pub fn new(version: NiVersion) -> Self {
        Self {
            header:      NiHeader::new(version),
            blocks:      Vec::new(),
            strings:     StringTable::new(),
            roots:       BlockRefArray::new(),
            diagnostics: Vec::new(),
        }
    }

    // ── Load / save ──────────────────────────────────────────────────────────

    pub fn load<R: Read>(reader: R) -> Result<Self> {
        Self::load_with(reader, &BlockRegistry::default(), &LoadOptions::default())
    }

    pub fn load_with<R: Read>(mut reader: R, registry: &BlockRegistry, options: &LoadOptions) -> Result<Self> {
        let mut header = NiHeader::default();
        let mut strings = StringTable::new();
        let mut diagnostics = Vec::new();
        let mut stream = NiStream::reader(&mut reader, NiVersion::default(), &mut strings);

        header.sync(&mut stream)?;
        let type_count = header.block_types.len();
        if let Some(pos) = header.block_type_indices.iter().position(|&t| t as usize >= type_count) {
            return Err(NifError::MalformedHeader {
                offset: stream.position(),
                reason: format!(
                    "block {pos} has type index {} but only {type_count} types are declared",
                    header.block_type_indices[pos]
                ),
            });
        }
        debug!("header: {} with {} blocks", header.version, header.block_count);

        let mut blocks: Vec<Box<dyn Block>> = Vec::with_capacity(header.block_type_indices.len());
        for index in 0..header.block_count {
            let name = header.block_type(index as usize).unwrap_or_default();
            let declared = header.block_sizes.get(index as usize).copied();

            let mut block: Box<dyn Block> = match registry.create(name, index) {
                Ok(block) => block,
                Err(err @ NifError::UnknownBlockType { .. }) => match declared {
                    Some(size) => {
                        let diagnostic = Diagnostic::UnknownBlockType { index, name: name.to_owned() };
                        warn!("{diagnostic}");
                        diagnostics.push(diagnostic);
                        Box::new(UnknownBlock::new(name, size))
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            };

            let start = stream.position();
            block.sync(&mut stream)?;
            let consumed = stream.position() - start;

            if let Some(declared) = declared {
                if consumed > declared as u64 {
                    return Err(NifError::BlockOverrun { index, name: name.to_owned(), declared, consumed });
                }
                if consumed < declared as u64 {
                    stream.skip(declared as u64 - consumed)?;
                    let diagnostic = Diagnostic::BlockSizeMismatch { index, declared, consumed };
                    warn!("{diagnostic}");
                    diagnostics.push(diagnostic);
                }
            }
            debug!("block {index}: {name} ({consumed} bytes)");
            blocks.push(block);
        }

        let mut roots = BlockRefArray::new();
        stream.sync(&mut roots)?;
        let end = stream.position();

        let mut file = Self { header, blocks, strings, roots, diagnostics };
        if options.repair_references {
            file.validate();
        }
        info!(
            "loaded {} blocks, {} strings, {} roots ({end} bytes)",
            file.blocks.len(),
            file.strings.len(),
            file.roots.len()
        );
        Ok(file)
    }

    /// Open and load a file through a buffered reader.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Self::load(reader)
    }

    /// Serialise the file. `options` may prune and compact first; both
    /// change the container itself, not just the output.
    pub fn save<W: Write>(&mut self, mut writer: W, options: &SaveOptions) -> Result<()> {
        if options.prune_unreachable {
            self.prune_unreachable();
        }
        if options.compact_strings {
            self.compact_strings();
        }

        let version = self.header.version;
        let mut bodies = Vec::with_capacity(self.blocks.len());
        for block in self.blocks.iter_mut() {
            let mut body = Vec::new();
            let mut stream = NiStream::writer(&mut body, version, &mut self.strings);
            block.sync(&mut stream)?;
            bodies.push(body);
        }

        self.rebuild_type_table()?;
        self.header.block_count = count_u32(self.blocks.len())?;
        self.header.block_sizes.clear();
        if self.header.has_block_sizes() {
            for body in &bodies {
                self.header.block_sizes.push(count_u32(body.len())?);
            }
        }

        let mut stream = NiStream::writer(&mut writer, version, &mut self.strings);
        self.header.sync(&mut stream)?;
        for body in bodies.iter_mut() {
            stream.sync_bytes(body)?;
        }
        stream.sync(&mut self.roots)?;
        let written = stream.position();
        writer.flush()?;

        info!("saved {} blocks ({written} bytes)", self.blocks.len());
        Ok(())
    }

    /// Save through a buffered writer. The destination is not replaced
    /// atomically.
    pub fn save_file<P: AsRef<Path>>(&mut self, path: P, options: &SaveOptions) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        self.save(writer, options)
    }

    pub fn to_bytes(&mut self, options: &SaveOptions) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.save(&mut out, options)?;
        Ok(out)
    }

    fn rebuild_type_table(&mut self) -> Result<()> {
        let used: HashSet<&str> = self.blocks.iter().map(|b| b.block_name()).collect();
        let mut types: Vec<String> =
            self.header.block_types.iter().filter(|t| used.contains(t.as_str())).cloned().collect();

        let mut indices = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let name = block.block_name();
            let pos = match types.iter().position(|t| t == name) {
                Some(pos) => pos,
                None => {
                    types.push(name.to_owned());
                    types.len() - 1
                }
            };
            indices.push(u16::try_from(pos).map_err(|_| NifError::CountOverflow { len: pos + 1 })?);
        }

        self.header.block_types = types;
        self.header.block_type_indices = indices;
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    /// The header as last loaded or saved. Block count, type tables and
    /// sizes are rebuilt from the block list by [`save`](Self::save); until
    /// then they do not reflect blocks added, removed or moved since. Use
    /// [`len`](Self::len) and [`Block::block_name`] for the live values.
    pub fn header(&self) -> &NiHeader {
        &self.header
    }

    /// Edits to the block count, type tables and sizes are overwritten on
    /// save.
    pub fn header_mut(&mut self) -> &mut NiHeader {
        &mut self.header
    }

    pub fn version(&self) -> NiVersion {
        self.header.version
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Box<dyn Block>] {
        &self.blocks
    }

    pub fn block(&self, index: u32) -> Option<&dyn Block> {
        self.blocks.get(index as usize).map(|b| &**b)
    }

    pub fn block_mut(&mut self, index: u32) -> Option<&mut dyn Block> {
        match self.blocks.get_mut(index as usize) {
            Some(b) => Some(&mut **b),
            None => None,
        }
    }

    /// View block `index` as `T`, a concrete type or a capability family.
    /// `None` when out of range or of another type.
    pub fn get<T: RefTarget + ?Sized>(&self, index: u32) -> Option<&T> {
        self.blocks.get(index as usize).and_then(|b| T::cast(&**b))
    }

    pub fn get_mut<T: RefTarget + ?Sized>(&mut self, index: u32) -> Option<&mut T> {
        self.blocks.get_mut(index as usize).and_then(|b| T::cast_mut(&mut **b))
    }

    pub fn resolve<T: RefTarget + ?Sized, K>(&self, link: &BlockLink<T, K>) -> Option<&T> {
        link.resolve(&self.blocks)
    }

    pub fn roots(&self) -> &BlockRefArray<dyn Block> {
        &self.roots
    }

    pub fn roots_mut(&mut self) -> &mut BlockRefArray<dyn Block> {
        &mut self.roots
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Direct access to the table. Entries pushed here are not deduplicated
    /// until [`compact_strings`](Self::compact_strings) runs.
    pub fn strings_mut(&mut self) -> &mut StringTable {
        &mut self.strings
    }

    pub fn intern(&mut self, value: &str) -> StringRef {
        self.strings.intern(value)
    }

    pub fn string(&self, r: StringRef) -> Option<&str> {
        self.strings.get(r)
    }

    /// Findings recorded by the load and by [`validate`](Self::validate).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn child_indices(&self, index: u32) -> Vec<u32> {
        self.block(index).map(|b| b.child_indices()).unwrap_or_default()
    }

    pub fn parents_of(&self, index: u32) -> Vec<u32> {
        graph::parents_of(&self.blocks, index)
    }

    /// Indices reachable from the roots through child references, ascending.
    pub fn reachable_blocks(&self) -> Vec<u32> {
        graph::reachable(&self.blocks, self.roots.indices())
            .into_iter()
            .enumerate()
            .filter(|(_, r)| *r)
            .map(|(i, _)| i as u32)
            .collect()
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Append a block; returns its index. Nothing refers to it yet.
    pub fn add_block(&mut self, block: Box<dyn Block>) -> u32 {
        self.blocks.push(block);
        let index = self.blocks.len() as u32 - 1;
        debug!("added block {index}: {}", self.blocks[index as usize].block_name());
        index
    }

    pub fn add<T: Block>(&mut self, block: T) -> u32 {
        self.add_block(Box::new(block))
    }

    /// Remove one block. References to it become NONE; references past it
    /// shift down.
    pub fn delete_block(&mut self, index: u32) -> Result<()> {
        self.delete_blocks(&[index])
    }

    /// Remove several blocks in one fix-up pass.
    pub fn delete_blocks(&mut self, indices: &[u32]) -> Result<()> {
        let mut removed = vec![false; self.blocks.len()];
        for &index in indices {
            self.check_index(index)?;
            removed[index as usize] = true;
        }
        self.remove_flagged(&removed);
        Ok(())
    }

    /// Copy the owned subgraph under `index` to the end of the list. Child
    /// and pointer references inside the copy are redirected to the copies;
    /// references leaving the subgraph keep their original targets. The copy
    /// is not attached to any parent. Returns the index of the copied root.
    pub fn duplicate_block(&mut self, index: u32) -> Result<u32> {
        self.check_index(index)?;
        let order = graph::subgraph(&self.blocks, index);
        let base = self.blocks.len() as u32;
        let map: HashMap<u32, u32> = order.iter().enumerate().map(|(i, &old)| (old, base + i as u32)).collect();

        let copies: Vec<Box<dyn Block>> = order
            .iter()
            .map(|&old| self.blocks[old as usize].clone_remapped(&|i| map.get(&i).copied()))
            .collect();
        self.blocks.extend(copies);

        debug!("duplicated block {index} as {base} ({} blocks)", order.len());
        Ok(base)
    }

    /// Move block `from` to position `to`, shifting the blocks between.
    pub fn move_block(&mut self, from: u32, to: u32) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let map = graph::move_map(self.blocks.len(), from, to);
        let block = self.blocks.remove(from as usize);
        self.blocks.insert(to as usize, block);
        self.apply_map(&map);
        debug!("moved block {from} to {to}");
        Ok(())
    }

    /// Reorder the list so that `order[new] = old`.
    pub fn reorder_blocks(&mut self, order: &[u32]) -> Result<()> {
        let map = graph::order_map(self.blocks.len(), order)?;
        let mut slots: Vec<Option<Box<dyn Block>>> = self.blocks.drain(..).map(Some).collect();
        self.blocks = order.iter().filter_map(|&old| slots[old as usize].take()).collect();
        self.apply_map(&map);
        debug!("reordered {} blocks", self.blocks.len());
        Ok(())
    }

    /// Remove every block not reachable from the roots. Returns how many
    /// were removed. With no roots nothing is provably reachable, so nothing
    /// is removed.
    pub fn prune_unreachable(&mut self) -> usize {
        if self.roots.is_empty() {
            warn!("prune skipped: file declares no roots");
            return 0;
        }
        let removed: Vec<bool> = graph::reachable(&self.blocks, self.roots.indices()).into_iter().map(|r| !r).collect();
        let count = removed.iter().filter(|&&r| r).count();
        if count > 0 {
            self.remove_flagged(&removed);
            info!("pruned {count} unreachable blocks");
        }
        count
    }

    /// Deduplicate the string table and drop entries nothing references.
    pub fn compact_strings(&mut self) {
        let before = self.strings.len();
        graph::compact_strings(&mut self.blocks, &mut self.strings);
        debug!("compacted strings: {before} -> {}", self.strings.len());
    }

    /// Clear references that point past the block list or string table and
    /// report each one.
    pub fn validate(&mut self) -> Vec<Diagnostic> {
        let block_count = self.blocks.len();
        let string_count = self.strings.len();

        let mut found = Vec::new();
        for (i, block) in self.blocks.iter_mut().enumerate() {
            found.extend(graph::clear_dangling(&mut **block, Some(i as u32), block_count, string_count));
        }
        found.extend(graph::clear_dangling(&mut self.roots, None, block_count, string_count));

        for diagnostic in &found {
            warn!("{diagnostic}");
        }
        self.diagnostics.extend(found.iter().cloned());
        found
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if (index as usize) < self.blocks.len() {
            Ok(())
        } else {
            Err(NifError::BlockIndexOutOfRange { index, len: self.blocks.len() })
        }
    }

    fn remove_flagged(&mut self, removed: &[bool]) {
        let map = graph::removal_map(removed);
        let mut flags = removed.iter();
        self.blocks.retain(|_| !flags.next().copied().unwrap_or(false));
        self.apply_map(&map);
        debug!("removed {} blocks", removed.iter().filter(|&&r| r).count());
    }

    fn apply_map(&mut self, map: &[u32]) {
        for block in self.blocks.iter_mut() {
            graph::remap_refs(&mut **block, map);
        }
        graph::remap_refs(&mut self.roots, map);
    }
}

fn count_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| NifError::CountOverflow { len })
}
