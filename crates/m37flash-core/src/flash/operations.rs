//! Diff helpers for smart block writes
//!
//! Flash memory can only change bits from 1 to 0 when programming. Raising
//! any bit back to 1 requires erasing the whole block, which sets every byte
//! to [`ERASED_VALUE`].

use alloc::vec::Vec;

/// The erased value for flash memory (all bits set)
pub const ERASED_VALUE: u8 = 0xFF;

/// Outcome of comparing current block contents against the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffScan {
    /// At least one byte differs
    pub write_needed: bool,
    /// At least one differing byte is not in the erased state
    pub erase_needed: bool,
}

impl DiffScan {
    /// Compare `have` (current contents) with `want` (desired contents)
    ///
    /// A byte that differs can only be programmed in place when it is
    /// currently erased. The scan stops at the first byte that rules this
    /// out, because both flags are then known.
    pub fn scan(have: &[u8], want: &[u8]) -> Self {
        assert_eq!(have.len(), want.len());

        let mut result = Self::default();
        for (h, w) in have.iter().zip(want.iter()) {
            if h == w {
                continue;
            }
            result.write_needed = true;
            if *h != ERASED_VALUE {
                result.erase_needed = true;
                break;
            }
        }
        result
    }
}

/// A contiguous range of bytes that needs to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSpan {
    /// Start offset within the compared buffers
    pub start: usize,
    /// Length in bytes
    pub len: usize,
}

impl WriteSpan {
    /// One past the last offset of the span
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Split the span into `(offset, len)` pieces of at most `max` bytes
    pub fn chunks(&self, max: usize) -> impl Iterator<Item = (usize, usize)> {
        let end = self.end();
        (self.start..end)
            .step_by(max)
            .map(move |offset| (offset, max.min(end - offset)))
    }

    /// Number of transactions needed to write this span `max` bytes at a time
    pub fn chunk_count(&self, max: usize) -> usize {
        self.len.div_ceil(max)
    }
}

/// Find the next contiguous range of changed bytes
///
/// Starting from `offset`, finds the first byte where `have != want`,
/// then continues until finding a byte where they match again (or end of data).
///
/// # Returns
/// `Some(WriteSpan)` if there are changes, `None` if no more changes from `offset`
pub fn next_write_span(have: &[u8], want: &[u8], offset: usize) -> Option<WriteSpan> {
    assert_eq!(have.len(), want.len());

    if offset >= have.len() {
        return None;
    }

    let have_slice = &have[offset..];
    let want_slice = &want[offset..];

    let rel_start = have_slice
        .iter()
        .zip(want_slice.iter())
        .position(|(h, w)| h != w)?;

    let after_start = rel_start + 1;
    let rel_end = have_slice[after_start..]
        .iter()
        .zip(want_slice[after_start..].iter())
        .position(|(h, w)| h == w)
        .map(|pos| after_start + pos)
        .unwrap_or(have_slice.len());

    Some(WriteSpan {
        start: offset + rel_start,
        len: rel_end - rel_start,
    })
}

/// Get all write spans (maximal contiguous regions of changed bytes)
pub fn write_spans(have: &[u8], want: &[u8]) -> Vec<WriteSpan> {
    let mut spans = Vec::new();
    let mut offset = 0;

    while let Some(span) = next_write_span(have, want, offset) {
        offset = span.end();
        spans.push(span);
    }

    spans
}

/// Offset and values of the first differing byte, if any
pub fn first_difference(have: &[u8], want: &[u8]) -> Option<(usize, u8, u8)> {
    have.iter()
        .zip(want.iter())
        .position(|(h, w)| h != w)
        .map(|i| (i, have[i], want[i]))
}
