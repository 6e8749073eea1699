use std::fmt;
use std::io;
use thiserror::Error;

/// Fatal conditions. A load or save that returns one of these leaves no
/// partially built container behind.
#[derive(Error, Debug)]
pub enum NifError {
    #[error("Malformed header at byte {offset}: {reason}")]
    MalformedHeader { offset: u64, reason: String },
    #[error("Unexpected end of stream at byte {offset}")]
    TruncatedStream { offset: u64 },
    /// Raised by the registry on a name miss. The container turns it into a
    /// placeholder whenever the block span is known.
    #[error("Unknown block type {name:?} (block {index})")]
    UnknownBlockType { index: u32, name: String },
    #[error("Block {index} ({name}) read {consumed} bytes but declares {declared}")]
    BlockOverrun { index: u32, name: String, declared: u32, consumed: u64 },
    #[error("Block index {index} out of range (block count {len})")]
    BlockIndexOutOfRange { index: u32, len: usize },
    #[error("Block order is not a permutation of 0..{len}")]
    InvalidOrder { len: usize },
    #[error("Array of {len} elements does not fit its on-disk count field")]
    CountOverflow { len: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, NifError>;

/// Non-fatal findings. Each one has already been recovered from by the time
/// it is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The block was kept as an opaque placeholder.
    UnknownBlockType { index: u32, name: String },
    /// The schema consumed fewer bytes than the size table declares; the
    /// rest was skipped.
    BlockSizeMismatch { index: u32, declared: u32, consumed: u64 },
    /// A block or root reference pointed past the block list and was cleared.
    DanglingReference { block: Option<u32>, target: u32 },
    /// A string reference pointed past the string table and was cleared.
    DanglingString { block: u32, index: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownBlockType { index, name } => {
                write!(f, "block {index}: unknown type {name:?} kept as raw bytes")
            }
            Diagnostic::BlockSizeMismatch { index, declared, consumed } => {
                write!(f, "block {index}: schema read {consumed} of {declared} declared bytes")
            }
            Diagnostic::DanglingReference { block: Some(block), target } => {
                write!(f, "block {block}: reference to missing block {target} cleared")
            }
            Diagnostic::DanglingReference { block: None, target } => {
                write!(f, "root reference to missing block {target} cleared")
            }
            Diagnostic::DanglingString { block, index } => {
                write!(f, "block {block}: reference to missing string {index} cleared")
            }
        }
    }
}

/// Map an I/O error raised while reading at `offset`.
pub(crate) fn read_error(err: io::Error, offset: u64) -> NifError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        NifError::TruncatedStream { offset }
    } else {
        NifError::Io(err)
    }
}
