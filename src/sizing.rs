// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

#![allow(private_interfaces)]

use crate::header;
use crate::header::SegmentHeader;
use crate::header::SegmentId;
use crate::header::BEGIN_EXTENSION_SIZE;
use core::fmt;

macro_rules! const_assert {
    ( $( $tt:tt )* ) => {
        const _: () = assert!($($tt)*);
    }
}

/// Trait to define the header layout and the addressing limits of a [`QueuePool`](crate::QueuePool).
///
/// This trait is implemented by 2 marker types:
///
/// * [`SizingCompact`]: 4-byte headers, up to 126 blocks.
/// * [`SizingWide`]: 6-byte headers, up to 32766 blocks.
///
/// This is a sealed trait and you cannot implement your own.
///
/// See the [module-level documentation](crate#pool-limits) for more information about the
/// variants and their limits.
pub trait Sizing: Copy + Clone + PartialEq + Eq + fmt::Debug + private::Sealed {}

pub(crate) mod private {
    use crate::header::SegmentHeader;
    use crate::header::SegmentId;

    #[doc(hidden)]
    pub trait Sealed: SizingInternals {}

    #[doc(hidden)]
    pub trait SizingInternals {
        /// Size of the fixed part of a segment header.
        const HEADER_SIZE: usize;
        /// Size of the free-list anchor stored at the start of the buffer.
        const ANCHOR_SIZE: usize;
        /// Width of the `next`/`last` fields, and of queue handles.
        const ID_BITS: u32;
        /// Largest value of the `length` field.
        const MAX_LENGTH: usize;

        /// Handle value of a queue that does not own any block.
        const EMPTY: SegmentId = ((1u32 << Self::ID_BITS) - 2) as SegmentId;
        /// Handle value of a queue that was never created, or that was destroyed.
        const UNINITIALIZED: SegmentId = ((1u32 << Self::ID_BITS) - 1) as SegmentId;
        /// Ids `0..MAX_BLOCKS` are usable; the top two are sentinels.
        const MAX_BLOCKS: usize = Self::EMPTY as usize;

        /// Decodes a header. `src` covers the fixed header plus the begin extension.
        fn read_segment_header(src: &[u8]) -> SegmentHeader;
        /// Encodes a header. `dst` covers the fixed header plus the begin extension.
        fn write_segment_header(dst: &mut [u8], value: &SegmentHeader);

        fn read_anchor(src: &[u8]) -> SegmentId;
        fn write_anchor(dst: &mut [u8], value: SegmentId);
    }
}

use private::SizingInternals;

/// Marker type for [`QueuePool`](crate::QueuePool) with 4-byte segment headers and 7-bit ids.
///
/// See the [module-level documentation](crate#pool-limits) for more information about the
/// variants and their limits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SizingCompact;

impl Sizing for SizingCompact {}

impl private::Sealed for SizingCompact {}

const_assert!(SizingCompact::MAX_BLOCKS == 126);
const_assert!(SizingCompact::MAX_LENGTH == 4095);

impl SizingCompact {
    const ID_MASK: u8 = 0x7f;
    const FLAG: u8 = 0x80;
    const LENGTH_HIGH_MASK: u8 = 0x0f;
}

impl private::SizingInternals for SizingCompact {
    const HEADER_SIZE: usize = 4;
    const ANCHOR_SIZE: usize = 1;
    const ID_BITS: u32 = 7;
    const MAX_LENGTH: usize = (1 << 12) - 1;

    fn read_segment_header(src: &[u8]) -> SegmentHeader {
        let src = &src[..Self::HEADER_SIZE + BEGIN_EXTENSION_SIZE];
        let begin_is_zero = src[1] & Self::FLAG != 0;
        SegmentHeader {
            next: (src[0] & Self::ID_MASK) as SegmentId,
            last: (src[1] & Self::ID_MASK) as SegmentId,
            free: src[0] & Self::FLAG != 0,
            begin: header::read_begin(begin_is_zero, &src[Self::HEADER_SIZE..]),
            length: src[2] as usize | ((src[3] & Self::LENGTH_HIGH_MASK) as usize) << 8,
        }
    }

    fn write_segment_header(dst: &mut [u8], value: &SegmentHeader) {
        debug_assert!(
            value.next <= Self::UNINITIALIZED,
            "`next` out of bounds"
        );
        debug_assert!(
            value.last <= Self::UNINITIALIZED,
            "`last` out of bounds"
        );
        debug_assert!(value.length <= Self::MAX_LENGTH, "`length` out of bounds");

        let dst = &mut dst[..Self::HEADER_SIZE + BEGIN_EXTENSION_SIZE];
        let begin_is_zero = header::write_begin(value.begin, &mut dst[Self::HEADER_SIZE..]);

        dst[0] = (value.next as u8 & Self::ID_MASK) | if value.free { Self::FLAG } else { 0 };
        dst[1] = (value.last as u8 & Self::ID_MASK) | if begin_is_zero { Self::FLAG } else { 0 };
        dst[2] = value.length as u8;
        dst[3] = (value.length >> 8) as u8 & Self::LENGTH_HIGH_MASK;
    }

    fn read_anchor(src: &[u8]) -> SegmentId {
        (src[0] & Self::ID_MASK) as SegmentId
    }

    fn write_anchor(dst: &mut [u8], value: SegmentId) {
        debug_assert!(value <= Self::UNINITIALIZED, "anchor out of bounds");
        dst[0] = value as u8 & Self::ID_MASK;
    }
}

/// Marker type for [`QueuePool`](crate::QueuePool) with 6-byte segment headers and 15-bit ids.
///
/// See the [module-level documentation](crate#pool-limits) for more information about the
/// variants and their limits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SizingWide;

impl Sizing for SizingWide {}

impl private::Sealed for SizingWide {}

const_assert!(SizingWide::MAX_BLOCKS == 32766);
const_assert!(SizingWide::MAX_LENGTH == 65535);

impl SizingWide {
    const ID_MASK: u16 = 0x7fff;
    const FLAG: u8 = 0x80;

    #[inline]
    const fn read_id_and_flag(low: u8, high: u8) -> (SegmentId, bool) {
        let id = (low as u16 | (high as u16) << 8) & Self::ID_MASK;
        (id, high & Self::FLAG != 0)
    }

    #[inline]
    const fn write_id_and_flag(id: SegmentId, flag: bool) -> [u8; 2] {
        let [low, high] = (id & Self::ID_MASK).to_le_bytes();
        [low, high | if flag { Self::FLAG } else { 0 }]
    }
}

impl private::SizingInternals for SizingWide {
    const HEADER_SIZE: usize = 6;
    const ANCHOR_SIZE: usize = 2;
    const ID_BITS: u32 = 15;
    const MAX_LENGTH: usize = u16::MAX as usize;

    fn read_segment_header(src: &[u8]) -> SegmentHeader {
        let src = &src[..Self::HEADER_SIZE + BEGIN_EXTENSION_SIZE];
        let (next, free) = Self::read_id_and_flag(src[0], src[1]);
        let (last, begin_is_zero) = Self::read_id_and_flag(src[2], src[3]);
        SegmentHeader {
            next,
            last,
            free,
            begin: header::read_begin(begin_is_zero, &src[Self::HEADER_SIZE..]),
            length: u16::from_le_bytes([src[4], src[5]]) as usize,
        }
    }

    fn write_segment_header(dst: &mut [u8], value: &SegmentHeader) {
        debug_assert!(
            value.next <= Self::UNINITIALIZED,
            "`next` out of bounds"
        );
        debug_assert!(
            value.last <= Self::UNINITIALIZED,
            "`last` out of bounds"
        );
        debug_assert!(value.length <= Self::MAX_LENGTH, "`length` out of bounds");

        let dst = &mut dst[..Self::HEADER_SIZE + BEGIN_EXTENSION_SIZE];
        let begin_is_zero = header::write_begin(value.begin, &mut dst[Self::HEADER_SIZE..]);

        dst[0..2].copy_from_slice(&Self::write_id_and_flag(value.next, value.free));
        dst[2..4].copy_from_slice(&Self::write_id_and_flag(value.last, begin_is_zero));
        dst[4..6].copy_from_slice(&(value.length as u16).to_le_bytes());
    }

    fn read_anchor(src: &[u8]) -> SegmentId {
        u16::from_le_bytes([src[0], src[1]]) & Self::ID_MASK
    }

    fn write_anchor(dst: &mut [u8], value: SegmentId) {
        debug_assert!(value <= Self::UNINITIALIZED, "anchor out of bounds");
        dst[..2].copy_from_slice(&(value & Self::ID_MASK).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MAX_BEGIN;

    const BUFFER: usize = 16;

    fn sample(id_limit: SegmentId) -> SegmentHeader {
        SegmentHeader {
            next: id_limit / 3,
            last: id_limit / 5,
            free: true,
            begin: 0,
            length: 17,
        }
    }

    fn round_trip_each_field<S: Sizing>() {
        let mut buffer = [0u8; BUFFER];
        let base = sample(S::UNINITIALIZED);
        S::write_segment_header(&mut buffer, &base);
        assert_eq!(S::read_segment_header(&buffer), base);

        for next in 0..=S::UNINITIALIZED {
            let header = SegmentHeader { next, ..base };
            S::write_segment_header(&mut buffer, &header);
            assert_eq!(S::read_segment_header(&buffer), header);
        }
        for last in 0..=S::UNINITIALIZED {
            let header = SegmentHeader { last, ..base };
            S::write_segment_header(&mut buffer, &header);
            assert_eq!(S::read_segment_header(&buffer), header);
        }
        for free in [false, true] {
            let header = SegmentHeader { free, ..base };
            S::write_segment_header(&mut buffer, &header);
            assert_eq!(S::read_segment_header(&buffer), header);
        }
        for length in 0..=S::MAX_LENGTH {
            let header = SegmentHeader { length, ..base };
            S::write_segment_header(&mut buffer, &header);
            assert_eq!(S::read_segment_header(&buffer), header);
        }
        for begin in 0..=MAX_BEGIN {
            let header = SegmentHeader { begin, ..base };
            S::write_segment_header(&mut buffer, &header);
            assert_eq!(S::read_segment_header(&buffer), header);
        }
    }

    fn stays_in_bounds<S: Sizing>() {
        let reserved = S::HEADER_SIZE + BEGIN_EXTENSION_SIZE;
        let mut buffer = [0xa5u8; BUFFER];
        let header = SegmentHeader {
            next: 1,
            last: 2,
            free: false,
            begin: MAX_BEGIN,
            length: S::MAX_LENGTH,
        };
        S::write_segment_header(&mut buffer, &header);
        assert!(buffer[reserved..].iter().all(|&b| b == 0xa5));
    }

    fn anchor_round_trip<S: Sizing>() {
        let mut buffer = [0u8; 2];
        for id in 0..=S::UNINITIALIZED {
            S::write_anchor(&mut buffer, id);
            assert_eq!(S::read_anchor(&buffer), id);
        }
    }

    #[test]
    fn compact_round_trip() {
        round_trip_each_field::<SizingCompact>();
        anchor_round_trip::<SizingCompact>();
    }

    #[test]
    fn wide_round_trip() {
        round_trip_each_field::<SizingWide>();
        anchor_round_trip::<SizingWide>();
    }

    #[test]
    fn header_stays_in_bounds() {
        stays_in_bounds::<SizingCompact>();
        stays_in_bounds::<SizingWide>();
    }

    #[test]
    fn compact_layout() {
        let mut buffer = [0u8; 6];
        let mut header = SegmentHeader {
            next: 5,
            last: 9,
            free: true,
            begin: 0,
            length: 0x123,
        };
        SizingCompact::write_segment_header(&mut buffer, &header);
        assert_eq!(buffer[..4], [0x85, 0x89, 0x23, 0x01]);

        header.free = false;
        header.begin = 100;
        SizingCompact::write_segment_header(&mut buffer, &header);
        assert_eq!(buffer[..5], [0x05, 0x09, 0x23, 0x01, 100]);

        header.begin = 200;
        SizingCompact::write_segment_header(&mut buffer, &header);
        assert_eq!(buffer, [0x05, 0x09, 0x23, 0x01, 0x80 | (200 & 0x7f), 200 >> 7]);
    }

    #[test]
    fn wide_layout() {
        let mut buffer = [0u8; 8];
        let header = SegmentHeader {
            next: 0x1234,
            last: 0x7ffe,
            free: true,
            begin: 0,
            length: 0xbeef,
        };
        SizingWide::write_segment_header(&mut buffer, &header);
        assert_eq!(buffer[..6], [0x34, 0x92, 0xfe, 0xff, 0xef, 0xbe]);
    }

    #[test]
    fn sentinels() {
        assert_eq!(SizingCompact::EMPTY, 126);
        assert_eq!(SizingCompact::UNINITIALIZED, 127);
        assert_eq!(SizingWide::EMPTY, 32766);
        assert_eq!(SizingWide::UNINITIALIZED, 32767);
    }
}
