//! Small shared type aliases used across the index/reader pipeline.

/// A zero-based line number.
pub type LineNum = u64;

/// A byte offset within the data file.
pub type ByteOffset = u64;
