// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

/// Index of a block in the block area. Sentinel values are defined per [`Sizing`](crate::Sizing).
pub(crate) type SegmentId = u16;

/// Number of data bytes, right after the fixed header, that may be borrowed to store the begin
/// offset.
pub(crate) const BEGIN_EXTENSION_SIZE: usize = 2;

/// Largest begin offset that the extension can hold (14 bits).
pub(crate) const MAX_BEGIN: usize = (1 << 14) - 1;

const TWO_BYTE_FLAG: u8 = 0x80;
const LOW_BITS_MASK: u8 = 0x7f;
const LOW_BITS: u32 = 7;

/// Decoded segment header.
///
/// The same fields are used whether the segment is part of the free list or part of a queue:
/// `next`/`last` link the segment into its chain, `begin` is the offset of the first live byte
/// in the data area, and `length` is the number of live bytes (or, for free segments, the number
/// of bytes available after the header).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct SegmentHeader {
    pub(crate) next: SegmentId,
    pub(crate) last: SegmentId,
    pub(crate) free: bool,
    pub(crate) begin: usize,
    pub(crate) length: usize,
}

impl SegmentHeader {
    /// A header for a segment that is the only node of its chain.
    #[inline]
    #[must_use]
    pub(crate) const fn singleton(id: SegmentId, free: bool, begin: usize, length: usize) -> Self {
        Self {
            next: id,
            last: id,
            free,
            begin,
            length,
        }
    }
}

/// Reads a begin offset.
///
/// A zero offset is carried entirely by the `begin_is_zero` flag of the fixed header. Otherwise
/// the first byte of `extension` tells whether the value fits in its own low 7 bits, or if the
/// second byte carries 7 more bits.
#[inline]
pub(crate) fn read_begin(begin_is_zero: bool, extension: &[u8]) -> usize {
    if begin_is_zero {
        return 0;
    }
    let first = extension[0];
    let low = (first & LOW_BITS_MASK) as usize;
    if first & TWO_BYTE_FLAG == 0 {
        low
    } else {
        low | ((extension[1] & LOW_BITS_MASK) as usize) << LOW_BITS
    }
}

/// Writes a begin offset, returning the value of the `begin_is_zero` flag.
///
/// When `begin` is not zero, the bytes in `extension` that get overwritten are data bytes that
/// have already been consumed: offset 1..=127 borrows one byte, 128.. borrows two.
#[inline]
pub(crate) fn write_begin(begin: usize, extension: &mut [u8]) -> bool {
    debug_assert!(begin <= MAX_BEGIN, "`begin` out of bounds");
    if begin == 0 {
        return true;
    }
    if begin <= LOW_BITS_MASK as usize {
        extension[0] = begin as u8;
    } else {
        extension[0] = TWO_BYTE_FLAG | (begin as u8 & LOW_BITS_MASK);
        extension[1] = (begin >> LOW_BITS) as u8 & LOW_BITS_MASK;
    }
    false
}
