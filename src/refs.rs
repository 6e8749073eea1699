//! Reference handles.
//!
//! Blocks never own each other. A reference is an index into the container's
//! block list (or string table), with [`NIF_NONE`] as the empty value. Two
//! flavours exist for block references:
//!   - [`BlockRef`] (owning, "child"): makes the holder a parent for
//!     reachability and pruning;
//!   - [`BlockPtr`] (weak, "pointer"): cross/back links that must stay valid
//!     but confer no ownership.
//!
//! The type parameter names the capability the target is expected to have.
//! It is only consulted on resolution, which fails soft: a NONE, out of
//! range, or wrongly typed target resolves to `None`.

use std::fmt;
use std::marker::PhantomData;

use crate::block::RefTarget;
use crate::error::Result;
use crate::stream::{ArrayCount, NiStream, Streamable};

/// On-disk `-1`.
pub const NIF_NONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Child,
    Pointer,
    String,
}

/// Enumeration of the references a value holds. Blocks implement this
/// through `nif_block!`; composite fields delegate to their members.
pub trait RefFields {
    fn visit_refs(&self, visit: &mut dyn FnMut(RefKind, u32));
    fn visit_refs_mut(&mut self, visit: &mut dyn FnMut(RefKind, &mut u32));
}

/// Implement [`RefFields`] for a struct by listing its reference-bearing
/// fields.
#[macro_export]
macro_rules! ref_fields {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::refs::RefFields for $ty {
            #[allow(unused_variables)]
            fn visit_refs(&self, visit: &mut dyn FnMut($crate::refs::RefKind, u32)) {
                $( $crate::refs::RefFields::visit_refs(&self.$field, visit); )*
            }

            #[allow(unused_variables)]
            fn visit_refs_mut(&mut self, visit: &mut dyn FnMut($crate::refs::RefKind, &mut u32)) {
                $( $crate::refs::RefFields::visit_refs_mut(&mut self.$field, visit); )*
            }
        }
    };
}

// ── Link kinds ───────────────────────────────────────────────────────────────

pub trait LinkKind: 'static {
    const KIND: RefKind;
}

#[derive(Debug)]
pub enum Owned {}

#[derive(Debug)]
pub enum Weak {}

impl LinkKind for Owned {
    const KIND: RefKind = RefKind::Child;
}

impl LinkKind for Weak {
    const KIND: RefKind = RefKind::Pointer;
}

// ── BlockLink ────────────────────────────────────────────────────────────────

pub struct BlockLink<T: ?Sized, K> {
    index:   u32,
    _target: PhantomData<fn() -> (Box<T>, K)>,
}

pub type BlockRef<T> = BlockLink<T, Owned>;
pub type BlockPtr<T> = BlockLink<T, Weak>;

impl<T: ?Sized, K> BlockLink<T, K> {
    pub const NONE: Self = Self { index: NIF_NONE, _target: PhantomData };

    pub const fn new(index: u32) -> Self {
        Self { index, _target: PhantomData }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    pub fn is_none(&self) -> bool {
        self.index == NIF_NONE
    }

    pub fn clear(&mut self) {
        self.index = NIF_NONE;
    }
}

impl<T: RefTarget + ?Sized, K> BlockLink<T, K> {
    /// View the target as `T`. `None` for NONE, an index past `blocks`, or a
    /// block without capability `T`.
    pub fn resolve<'b>(&self, blocks: &'b [Box<dyn crate::block::Block>]) -> Option<&'b T> {
        blocks.get(self.index as usize).and_then(|b| T::cast(b.as_ref()))
    }
}

impl<T: ?Sized, K> Clone for BlockLink<T, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized, K> Copy for BlockLink<T, K> {}

impl<T: ?Sized, K> Default for BlockLink<T, K> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<T: ?Sized, K> PartialEq for BlockLink<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T: ?Sized, K> Eq for BlockLink<T, K> {}

impl<T: ?Sized, K: LinkKind> fmt::Debug for BlockLink<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match K::KIND {
            RefKind::Pointer => "Ptr",
            _                => "Ref",
        };
        if self.is_none() {
            write!(f, "{tag}(NONE)")
        } else {
            write!(f, "{tag}({})", self.index)
        }
    }
}

/// Signed 32-bit index on disk. Any negative value other than -1 is kept
/// bit-for-bit so it writes back unchanged.
impl<T: ?Sized, K> Streamable for BlockLink<T, K> {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        let mut raw = self.index as i32;
        stream.sync(&mut raw)?;
        self.index = raw as u32;
        Ok(())
    }
}

impl<T: ?Sized, K: LinkKind> RefFields for BlockLink<T, K> {
    fn visit_refs(&self, visit: &mut dyn FnMut(RefKind, u32)) {
        visit(K::KIND, self.index);
    }

    fn visit_refs_mut(&mut self, visit: &mut dyn FnMut(RefKind, &mut u32)) {
        visit(K::KIND, &mut self.index);
    }
}

// ── LinkArray ────────────────────────────────────────────────────────────────

/// Count-prefixed list of links. Every on-disk slot is kept, NONE slots
/// included: [`capacity`](Self::capacity) is the declared slot count written
/// back verbatim, [`len`](Self::len) the number of slots actually in use.
/// Fix-up after a deletion clears slots instead of removing them.
pub struct LinkArray<T: ?Sized, K, C = u32> {
    links:  Vec<BlockLink<T, K>>,
    _count: PhantomData<C>,
}

pub type BlockRefArray<T>      = LinkArray<T, Owned, u32>;
pub type BlockPtrArray<T>      = LinkArray<T, Weak, u32>;
pub type BlockRefShortArray<T> = LinkArray<T, Owned, u16>;
pub type BlockPtrShortArray<T> = LinkArray<T, Weak, u16>;

impl<T: ?Sized, K, C> LinkArray<T, K, C> {
    pub fn new() -> Self {
        Self { links: Vec::new(), _count: PhantomData }
    }

    /// Slots in use (non-NONE).
    pub fn len(&self) -> usize {
        self.links.iter().filter(|l| !l.is_none()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared slot count, NONE slots included.
    pub fn capacity(&self) -> usize {
        self.links.len()
    }

    pub fn links(&self) -> &[BlockLink<T, K>] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [BlockLink<T, K>] {
        &mut self.links
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.links.iter().filter(|l| !l.is_none()).map(|l| l.index)
    }

    pub fn contains(&self, index: u32) -> bool {
        index != NIF_NONE && self.links.iter().any(|l| l.index == index)
    }

    pub fn push(&mut self, index: u32) {
        self.links.push(BlockLink::new(index));
    }

    /// Clear every slot holding `index`; the slots themselves stay.
    pub fn remove_index(&mut self, index: u32) {
        for link in self.links.iter_mut().filter(|l| l.index == index) {
            link.clear();
        }
    }

    /// Drop NONE slots, shrinking the declared capacity to the logical count.
    pub fn clean_none(&mut self) {
        self.links.retain(|l| !l.is_none());
    }
}

impl<T: ?Sized, K, C> Default for LinkArray<T, K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, K, C> Clone for LinkArray<T, K, C> {
    fn clone(&self) -> Self {
        Self { links: self.links.clone(), _count: PhantomData }
    }
}

impl<T: ?Sized, K, C> PartialEq for LinkArray<T, K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.links == other.links
    }
}

impl<T: ?Sized, K: LinkKind, C> fmt::Debug for LinkArray<T, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.links.iter()).finish()
    }
}

impl<T: ?Sized, K, C> FromIterator<u32> for LinkArray<T, K, C> {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self { links: iter.into_iter().map(BlockLink::new).collect(), _count: PhantomData }
    }
}

impl<T: ?Sized, K, C: ArrayCount> Streamable for LinkArray<T, K, C> {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync_vec::<C, _>(&mut self.links)
    }
}

impl<T: ?Sized, K: LinkKind, C> RefFields for LinkArray<T, K, C> {
    fn visit_refs(&self, visit: &mut dyn FnMut(RefKind, u32)) {
        for link in &self.links {
            link.visit_refs(visit);
        }
    }

    fn visit_refs_mut(&mut self, visit: &mut dyn FnMut(RefKind, &mut u32)) {
        for link in &mut self.links {
            link.visit_refs_mut(visit);
        }
    }
}
