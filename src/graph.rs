//! Graph algorithms over the block list.
//!
//! Everything here works purely through [`RefFields`]: the concrete block
//! types are never inspected. Index fix-up is expressed as a map from old to
//! new index (with [`NIF_NONE`] for removed blocks) applied to every block
//! in a single pass.

use std::collections::{HashMap, VecDeque};

use crate::block::Block;
use crate::error::{Diagnostic, NifError, Result};
use crate::refs::{RefFields, RefKind, NIF_NONE};
use crate::strings::StringTable;

// ── Reachability ─────────────────────────────────────────────────────────────

/// Breadth-first over child references from `roots`. Pointers do not
/// confer reachability. Out-of-range targets are ignored.
pub fn reachable(blocks: &[Box<dyn Block>], roots: impl IntoIterator<Item = u32>) -> Vec<bool> {
    let mut seen = vec![false; blocks.len()];
    let mut queue = VecDeque::new();

    for root in roots {
        if let Some(slot) = seen.get_mut(root as usize) {
            if !*slot {
                *slot = true;
                queue.push_back(root);
            }
        }
    }

    while let Some(index) = queue.pop_front() {
        for child in blocks[index as usize].child_indices() {
            if let Some(slot) = seen.get_mut(child as usize) {
                if !*slot {
                    *slot = true;
                    queue.push_back(child);
                }
            }
        }
    }
    seen
}

/// Blocks holding a child reference to `target`, in list order.
pub fn parents_of(blocks: &[Box<dyn Block>], target: u32) -> Vec<u32> {
    blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.child_indices().contains(&target))
        .map(|(i, _)| i as u32)
        .collect()
}

/// The owned subgraph under `start`: depth-first pre-order over child
/// references, each block listed once.
pub fn subgraph(blocks: &[Box<dyn Block>], start: u32) -> Vec<u32> {
    let mut seen = vec![false; blocks.len()];
    let mut order = Vec::new();
    let mut stack = vec![start];

    while let Some(index) = stack.pop() {
        match seen.get_mut(index as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => continue,
        }
        order.push(index);
        // Reversed so the first child is visited first.
        for child in blocks[index as usize].child_indices().into_iter().rev() {
            stack.push(child);
        }
    }
    order
}

// ── Index maps ───────────────────────────────────────────────────────────────

/// Rewrite every child and pointer index through `map`. Indices at or
/// beyond `map.len()` (already dangling) and NONE are left alone.
pub fn remap_refs<R: RefFields + ?Sized>(fields: &mut R, map: &[u32]) {
    fields.visit_refs_mut(&mut |kind, index| {
        if kind != RefKind::String {
            if let Some(&mapped) = map.get(*index as usize) {
                *index = mapped;
            }
        }
    });
}

/// Map for removing the flagged blocks: removed blocks go to NONE, the rest
/// shift down over the gaps.
pub fn removal_map(removed: &[bool]) -> Vec<u32> {
    let mut next = 0u32;
    removed
        .iter()
        .map(|&gone| {
            if gone {
                NIF_NONE
            } else {
                next += 1;
                next - 1
            }
        })
        .collect()
}

/// Map for moving the block at `from` to position `to`.
pub fn move_map(len: usize, from: u32, to: u32) -> Vec<u32> {
    (0..len as u32)
        .map(|i| {
            if i == from {
                to
            } else if from < to && i > from && i <= to {
                i - 1
            } else if to < from && i >= to && i < from {
                i + 1
            } else {
                i
            }
        })
        .collect()
}

/// `order[new] = old` must be a permutation of `0..len`. Returns the
/// inverse, `map[old] = new`.
pub fn order_map(len: usize, order: &[u32]) -> Result<Vec<u32>> {
    if order.len() != len {
        return Err(NifError::InvalidOrder { len });
    }
    let mut map = vec![NIF_NONE; len];
    for (new, &old) in order.iter().enumerate() {
        match map.get_mut(old as usize) {
            Some(slot) if *slot == NIF_NONE => *slot = new as u32,
            _ => return Err(NifError::InvalidOrder { len }),
        }
    }
    Ok(map)
}

// ── Strings ──────────────────────────────────────────────────────────────────

/// Rebuild `table` from the strings the blocks actually reference, equal
/// values merged, in first-use order. Indices past the old table become
/// NONE.
pub fn compact_strings(blocks: &mut [Box<dyn Block>], table: &mut StringTable) {
    let old: Vec<String> = std::mem::take(table.entries_mut());
    let mut by_value: HashMap<&str, u32> = HashMap::new();
    let mut by_old: HashMap<u32, u32> = HashMap::new();
    let mut fresh: Vec<String> = Vec::new();

    for block in blocks.iter_mut() {
        block.visit_refs_mut(&mut |kind, index| {
            if kind != RefKind::String || *index == NIF_NONE {
                return;
            }
            let Some(value) = old.get(*index as usize) else {
                *index = NIF_NONE;
                return;
            };
            let new = *by_old.entry(*index).or_insert_with(|| {
                *by_value.entry(value.as_str()).or_insert_with(|| {
                    fresh.push(value.clone());
                    fresh.len() as u32 - 1
                })
            });
            *index = new;
        });
    }

    *table.entries_mut() = fresh;
}

// ── Dangling references ──────────────────────────────────────────────────────

/// Clear block references at or past `block_count` and string references
/// past `string_count`. `owner` is the holder reported in diagnostics
/// (`None` for the footer roots).
pub fn clear_dangling<R: RefFields + ?Sized>(
    fields: &mut R,
    owner: Option<u32>,
    block_count: usize,
    string_count: usize,
) -> Vec<Diagnostic> {
    let mut found = Vec::new();
    fields.visit_refs_mut(&mut |kind, index| {
        if *index == NIF_NONE {
            return;
        }
        match kind {
            RefKind::Child | RefKind::Pointer if *index as usize >= block_count => {
                found.push(Diagnostic::DanglingReference { block: owner, target: *index });
                *index = NIF_NONE;
            }
            RefKind::String if *index as usize >= string_count => {
                found.push(Diagnostic::DanglingString { block: owner.unwrap_or(NIF_NONE), index: *index });
                *index = NIF_NONE;
            }
            _ => {}
        }
    });
    found
}
