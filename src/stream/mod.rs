//! Reversible stream engine.
//!
//! One [`NiStream`] cursor serves both directions. Every schema describes its
//! fields once, as a sequence of `sync` calls; in read mode each call fills
//! the field from the byte stream, in write mode it emits the field. Because
//! the reader and the writer are literally the same code path they cannot
//! drift apart, and version gates are evaluated on the carried version in
//! both modes alike.
//!
//! # Endianness
//! All binary I/O is strictly little-endian. Big-endian NIF files (endian
//! byte 0) are rejected by the header before any block is touched.
//!
//! # Strings
//! Length-prefixed strings are decoded byte-for-byte (every byte becomes the
//! char with the same code point), so any byte sequence survives a load/save
//! round trip regardless of the code page the exporter used.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{read_error, NifError, Result};
use crate::strings::StringTable;
use crate::version::{NiVersion, VersionGate};

/// Elements allocated per step when reading a bulk array. Counts come from
/// the file and are not trusted until the elements have actually been read.
const READ_CHUNK: usize = 4096;

// ── Streamable ───────────────────────────────────────────────────────────────

/// A value that knows how to move itself through a [`NiStream`] in either
/// direction.
pub trait Streamable {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

enum Io<'a> {
    Read(&'a mut dyn Read),
    Write(&'a mut dyn Write),
}

// ── NiStream ─────────────────────────────────────────────────────────────────

pub struct NiStream<'a> {
    io:       Io<'a>,
    position: u64,
    version:  NiVersion,
    strings:  &'a mut StringTable,
}

impl<'a> NiStream<'a> {
    pub fn reader(reader: &'a mut dyn Read, version: NiVersion, strings: &'a mut StringTable) -> Self {
        Self { io: Io::Read(reader), position: 0, version, strings }
    }

    pub fn writer(writer: &'a mut dyn Write, version: NiVersion, strings: &'a mut StringTable) -> Self {
        Self { io: Io::Write(writer), position: 0, version, strings }
    }

    pub fn mode(&self) -> Mode {
        match self.io {
            Io::Read(_)  => Mode::Read,
            Io::Write(_) => Mode::Write,
        }
    }

    pub fn is_reading(&self) -> bool {
        self.mode() == Mode::Read
    }

    /// Bytes consumed or produced so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn version(&self) -> NiVersion {
        self.version
    }

    /// Used by the header once the version fields have been synced.
    pub fn set_version(&mut self, version: NiVersion) {
        self.version = version;
    }

    pub fn strings(&self) -> &StringTable {
        &*self.strings
    }

    pub fn strings_mut(&mut self) -> &mut StringTable {
        &mut *self.strings
    }

    // ── Generic sync ─────────────────────────────────────────────────────────

    pub fn sync<T: Streamable + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        value.sync(self)
    }

    /// Run `body` only when the carried version passes `gate`. Returns
    /// whether the section was present. A section the version does not
    /// declare is skipped silently; that is not an error.
    pub fn sync_if<F>(&mut self, gate: VersionGate, body: F) -> Result<bool>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if !gate.admits(&self.version) {
            return Ok(false);
        }
        body(self)?;
        Ok(true)
    }

    /// Sync an element count of width `C`. In write mode `len` is written;
    /// in read mode it is ignored and the stored count is returned.
    pub fn sync_count<C: ArrayCount>(&mut self, len: usize) -> Result<usize> {
        let mut count = if self.is_reading() {
            C::default()
        } else {
            C::from_len(len).ok_or(NifError::CountOverflow { len })?
        };
        self.sync(&mut count)?;
        Ok(count.to_len())
    }

    /// Count-prefixed array; the count has width `C`.
    pub fn sync_vec<C, T>(&mut self, items: &mut Vec<T>) -> Result<()>
    where
        C: ArrayCount,
        T: Streamable + Default,
    {
        let len = self.sync_count::<C>(items.len())?;
        self.sync_vec_with_len(len, items)
    }

    /// Array whose count was synced separately. Reading replaces `items`
    /// with `len` fresh elements; writing emits `items` as they are.
    pub fn sync_vec_with_len<T>(&mut self, len: usize, items: &mut Vec<T>) -> Result<()>
    where
        T: Streamable + Default,
    {
        if self.is_reading() {
            items.clear();
            for _ in 0..len {
                let mut item = T::default();
                item.sync(self)?;
                items.push(item);
            }
        } else {
            debug_assert_eq!(len, items.len());
            for item in items.iter_mut() {
                item.sync(self)?;
            }
        }
        Ok(())
    }

    // ── Bulk numeric arrays ──────────────────────────────────────────────────

    pub fn sync_f32_slice(&mut self, values: &mut [f32]) -> Result<()> {
        let offset = self.position;
        match &mut self.io {
            Io::Read(r) => r
                .read_f32_into::<LittleEndian>(values)
                .map_err(|e| read_error(e, offset))?,
            Io::Write(w) => {
                for v in values.iter() {
                    w.write_f32::<LittleEndian>(*v)?;
                }
            }
        }
        self.position += 4 * values.len() as u64;
        Ok(())
    }

    pub fn sync_i16_slice(&mut self, values: &mut [i16]) -> Result<()> {
        let offset = self.position;
        match &mut self.io {
            Io::Read(r) => r
                .read_i16_into::<LittleEndian>(values)
                .map_err(|e| read_error(e, offset))?,
            Io::Write(w) => {
                for v in values.iter() {
                    w.write_i16::<LittleEndian>(*v)?;
                }
            }
        }
        self.position += 2 * values.len() as u64;
        Ok(())
    }

    /// Count-prefixed `f32` array streamed in contiguous slices.
    pub fn sync_f32_array<C: ArrayCount>(&mut self, values: &mut Vec<f32>) -> Result<()> {
        let len = self.sync_count::<C>(values.len())?;
        if !self.is_reading() {
            return self.sync_f32_slice(values);
        }
        values.clear();
        while values.len() < len {
            let start = values.len();
            values.resize(start + (len - start).min(READ_CHUNK), 0.0);
            self.sync_f32_slice(&mut values[start..])?;
        }
        Ok(())
    }

    /// Count-prefixed `i16` array streamed in contiguous slices.
    pub fn sync_i16_array<C: ArrayCount>(&mut self, values: &mut Vec<i16>) -> Result<()> {
        let len = self.sync_count::<C>(values.len())?;
        if !self.is_reading() {
            return self.sync_i16_slice(values);
        }
        values.clear();
        while values.len() < len {
            let start = values.len();
            values.resize(start + (len - start).min(READ_CHUNK), 0);
            self.sync_i16_slice(&mut values[start..])?;
        }
        Ok(())
    }

    // ── Raw bytes and strings ────────────────────────────────────────────────

    pub fn sync_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        let offset = self.position;
        match &mut self.io {
            Io::Read(r)  => r.read_exact(bytes).map_err(|e| read_error(e, offset))?,
            Io::Write(w) => w.write_all(bytes)?,
        }
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Reading replaces `bytes` with the next `len` bytes; writing emits
    /// `bytes` whole and ignores `len`.
    pub fn sync_raw(&mut self, bytes: &mut Vec<u8>, len: usize) -> Result<()> {
        let offset = self.position;
        match &mut self.io {
            Io::Read(r) => {
                bytes.clear();
                let read = (&mut **r).take(len as u64).read_to_end(bytes)?;
                if read < len {
                    return Err(NifError::TruncatedStream { offset: offset + read as u64 });
                }
            }
            Io::Write(w) => w.write_all(bytes)?,
        }
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Discard `len` bytes when reading; emit `len` zero bytes when writing.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let offset = self.position;
        match &mut self.io {
            Io::Read(r) => {
                let skipped = std::io::copy(&mut (&mut **r).take(len), &mut std::io::sink())?;
                if skipped < len {
                    return Err(NifError::TruncatedStream { offset: offset + skipped });
                }
            }
            Io::Write(w) => std::io::copy(&mut std::io::repeat(0).take(len), w).map(|_| ())?,
        }
        self.position += len;
        Ok(())
    }

    /// `u32` length followed by the bytes, no terminator.
    pub fn sync_sized_string(&mut self, value: &mut String) -> Result<()> {
        let mut bytes = encode_latin1(value);
        let len = self.sync_count::<u32>(bytes.len())?;
        self.sync_raw(&mut bytes, len)?;
        if self.is_reading() {
            *value = decode_latin1(&bytes);
        }
        Ok(())
    }

    /// `u8` length followed by the bytes. Kept raw: the length usually
    /// counts a NUL terminator which must come back out unchanged.
    pub fn sync_export_string(&mut self, bytes: &mut Vec<u8>) -> Result<()> {
        let len = self.sync_count::<u8>(bytes.len())?;
        self.sync_raw(bytes, len)
    }

    /// A `\n`-terminated line, as used by the header description. Reading
    /// gives up after `max_len` bytes without a newline.
    pub fn sync_line(&mut self, value: &mut String, max_len: usize) -> Result<()> {
        let start = self.position;
        if self.is_reading() {
            let mut bytes = Vec::new();
            loop {
                let mut byte = 0u8;
                self.sync(&mut byte)?;
                if byte == b'\n' {
                    break;
                }
                if bytes.len() >= max_len {
                    return Err(NifError::MalformedHeader {
                        offset: start,
                        reason: "header line is not terminated".into(),
                    });
                }
                bytes.push(byte);
            }
            *value = decode_latin1(&bytes);
        } else {
            let mut bytes = encode_latin1(value);
            bytes.push(b'\n');
            self.sync_bytes(&mut bytes)?;
        }
        Ok(())
    }
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Chars above U+00FF cannot be represented and become `?`.
pub fn encode_latin1(value: &str) -> Vec<u8> {
    value.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect()
}

// ── Primitive impls ──────────────────────────────────────────────────────────

macro_rules! primitive {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Streamable for $ty {
            fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
                let offset = stream.position;
                match &mut stream.io {
                    Io::Read(r)  => *self = r.$read::<LittleEndian>().map_err(|e| read_error(e, offset))?,
                    Io::Write(w) => w.$write::<LittleEndian>(*self)?,
                }
                stream.position += std::mem::size_of::<$ty>() as u64;
                Ok(())
            }
        }
    };
    ($ty:ty, $read:ident, $write:ident, byte) => {
        impl Streamable for $ty {
            fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
                let offset = stream.position;
                match &mut stream.io {
                    Io::Read(r)  => *self = r.$read().map_err(|e| read_error(e, offset))?,
                    Io::Write(w) => w.$write(*self)?,
                }
                stream.position += 1;
                Ok(())
            }
        }
    };
}

primitive!(u8,  read_u8,  write_u8,  byte);
primitive!(i8,  read_i8,  write_i8,  byte);
primitive!(u16, read_u16, write_u16);
primitive!(i16, read_i16, write_i16);
primitive!(u32, read_u32, write_u32);
primitive!(i32, read_i32, write_i32);
primitive!(u64, read_u64, write_u64);
primitive!(f32, read_f32, write_f32);

impl<T: Streamable, const N: usize> Streamable for [T; N] {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        for item in self.iter_mut() {
            item.sync(stream)?;
        }
        Ok(())
    }
}

// ── Count widths ─────────────────────────────────────────────────────────────

/// On-disk integer type used for an array's element count.
pub trait ArrayCount: Streamable + Copy + Default {
    fn from_len(len: usize) -> Option<Self>;
    fn to_len(self) -> usize;
}

macro_rules! array_count {
    ($($ty:ty),*) => {$(
        impl ArrayCount for $ty {
            fn from_len(len: usize) -> Option<Self> { <$ty>::try_from(len).ok() }
            fn to_len(self) -> usize { self as usize }
        }
    )*};
}

array_count!(u8, u16, u32);
