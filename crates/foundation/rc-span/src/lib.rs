//! Source file spans and locations
//!
//! Tokens in the tree carry a [`FileSpan`]. Nodes synthesized by the
//! compiler itself (default constructors, property accessors, builtin
//! classes) use [`FileSpan::SYNTHETIC`] so diagnostics can tell them apart
//! from user code.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// File id reserved for compiler-generated code
    pub const SYNTHETIC: Self = Self(u32::MAX);

    /// Create a file id from a raw index
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw index usable as a `codespan-reporting` file handle
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A byte offset span in a source file
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl Span {
    /// Create a span from two offsets
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Byte range of the span
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length in bytes
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span covers nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A span with associated file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileSpan {
    /// File containing the span
    pub file: FileId,
    /// Offsets inside the file
    pub span: Span,
}

impl FileSpan {
    /// Location of compiler-generated nodes
    pub const SYNTHETIC: Self = Self {
        file: FileId::SYNTHETIC,
        span: Span { start: 0, end: 0 },
    };

    /// Create a file span
    #[must_use]
    pub const fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }

    /// Byte range of the span
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.span.range()
    }

    /// Whether this location was produced by the compiler
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.file == FileId::SYNTHETIC
    }
}

impl Default for FileSpan {
    fn default() -> Self {
        Self::SYNTHETIC
    }
}
