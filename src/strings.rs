//! The shared string table and the handles that index into it.
//!
//! From 20.1.0.1 onwards names and other strings are stored once in the
//! header and blocks refer to them by index. Older files inline the string at
//! the point of use; the stream engine interns those into the same table on
//! read and writes them back inline, so callers only ever see [`StringRef`].

use crate::error::Result;
use crate::refs::{RefFields, RefKind, NIF_NONE};
use crate::stream::{NiStream, Streamable};
use crate::version::V20_1_0_1;

// ── StringRef ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringRef {
    index: u32,
}

impl StringRef {
    pub const NONE: StringRef = StringRef { index: NIF_NONE };

    pub const fn new(index: u32) -> Self {
        Self { index }
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
}

impl Default for StringRef {
    fn default() -> Self {
        Self::NONE
    }
}

impl Streamable for StringRef {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        if stream.version().file >= V20_1_0_1 {
            let mut raw = self.index as i32;
            stream.sync(&mut raw)?;
            self.index = raw as u32;
            return Ok(());
        }

        // Inline form: u32 length + bytes, the empty string standing for NONE.
        let mut value = stream.strings().get(*self).unwrap_or_default().to_owned();
        stream.sync_sized_string(&mut value)?;
        if stream.is_reading() {
            *self = stream.strings_mut().intern(&value);
        }
        Ok(())
    }
}

impl RefFields for StringRef {
    fn visit_refs(&self, visit: &mut dyn FnMut(RefKind, u32)) {
        visit(RefKind::String, self.index);
    }

    fn visit_refs_mut(&mut self, visit: &mut dyn FnMut(RefKind, &mut u32)) {
        visit(RefKind::String, &mut self.index);
    }
}

// ── StringTable ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: Vec<String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// `None` for NONE and for indices past the end.
    pub fn get(&self, r: StringRef) -> Option<&str> {
        self.entries.get(r.index as usize).map(String::as_str)
    }

    /// Return the existing entry equal to `value`, or append it. The empty
    /// string is NONE and never stored.
    pub fn intern(&mut self, value: &str) -> StringRef {
        if value.is_empty() {
            return StringRef::NONE;
        }
        match self.entries.iter().position(|s| s == value) {
            Some(pos) => StringRef::new(pos as u32),
            None => self.push(value.to_owned()),
        }
    }

    /// Append without looking for an equal entry.
    pub fn push(&mut self, value: String) -> StringRef {
        self.entries.push(value);
        StringRef::new(self.entries.len() as u32 - 1)
    }

    /// Length of the longest entry, as written into the header.
    pub fn max_len(&self) -> u32 {
        self.entries.iter().map(|s| s.chars().count() as u32).max().unwrap_or(0)
    }

    pub fn has_duplicates(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        !self.entries.iter().all(|s| seen.insert(s.as_str()))
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<String> {
        &mut self.entries
    }
}

impl FromIterator<String> for StringTable {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
