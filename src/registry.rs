//! Name-keyed block factory.
//!
//! The header names every block's type; the registry turns that name into a
//! fresh, default-initialised block which is then streamed in read mode. A
//! name the registry does not know is reported as
//! [`NifError::UnknownBlockType`]; the container decides whether it can keep
//! the block as an opaque placeholder instead.

use std::collections::HashMap;

use crate::block::{Block, NamedBlock};
use crate::blocks;
use crate::error::{NifError, Result};

pub type BlockCtor = fn() -> Box<dyn Block>;

#[derive(Clone)]
pub struct BlockRegistry {
    ctors: HashMap<String, BlockCtor>,
}

impl BlockRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self { ctors: HashMap::new() }
    }

    /// A registry holding every built-in schema.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        blocks::register_builtins(&mut registry);
        registry
    }

    pub fn register<T: NamedBlock>(&mut self) {
        self.register_ctor(T::BLOCK_NAME, construct::<T>);
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register_ctor(&mut self, name: &str, ctor: BlockCtor) {
        self.ctors.insert(name.to_owned(), ctor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct block `index` of type `name`.
    pub fn create(&self, name: &str, index: u32) -> Result<Box<dyn Block>> {
        match self.ctors.get(name) {
            Some(ctor) => Ok(ctor()),
            None => Err(NifError::UnknownBlockType { index, name: name.to_owned() }),
        }
    }
}

fn construct<T: NamedBlock>() -> Box<dyn Block> {
    Box::new(T::default())
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
