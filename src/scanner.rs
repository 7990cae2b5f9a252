//! Component A — the line scanner.
//!
//! Streams the data file once from offset 0 and yields the start offset of
//! every line, the same forward `memchr`-over-`BufReader` walk tailsrv's
//! `Tracker::update` (`src/tracker.rs`) uses to find newlines, adapted to
//! emit line-start offsets directly rather than newline positions.

use crate::types::ByteOffset;
use std::io::{self, BufRead, BufReader, Read};

/// Streams line-start offsets for `reader`, calling `emit` once per line in
/// file order. Does not normalize, strip, or re-encode bytes — it only
/// tracks where lines begin.
///
/// Edge cases (spec.md §4.A): an empty file emits nothing; a file
/// consisting solely of `"\n"` emits exactly one offset (`0`); a final
/// line with no trailing LF still yields an offset.
pub fn scan_lines<R: Read>(reader: R, mut emit: impl FnMut(ByteOffset)) -> io::Result<u64> {
    let mut reader = BufReader::new(reader);
    let mut offset: u64 = 0;
    let mut count: u64 = 0;
    let mut at_line_start = true;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        match memchr::memchr(b'\n', buf) {
            Some(pos) => {
                if at_line_start {
                    emit(offset);
                    count += 1;
                    at_line_start = false;
                }
                let consumed = pos + 1;
                offset += consumed as u64;
                reader.consume(consumed);
                at_line_start = true;
            }
            None => {
                if at_line_start && !buf.is_empty() {
                    emit(offset);
                    count += 1;
                    at_line_start = false;
                }
                let consumed = buf.len();
                offset += consumed as u64;
                reader.consume(consumed);
            }
        }
    }
    Ok(count)
}

/// Convenience wrapper collecting all offsets into a `Vec`. Used by tests
/// and by the builder when the line count is small enough that holding the
/// whole index in memory before writing is fine (the builder itself
/// streams rather than calling this for real files).
#[cfg(test)]
pub fn scan_to_vec<R: Read>(reader: R) -> io::Result<Vec<ByteOffset>> {
    let mut offsets = Vec::new();
    scan_lines(reader, |o| offsets.push(o))?;
    Ok(offsets)
}
