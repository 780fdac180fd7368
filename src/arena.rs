// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

use crate::config::Config;
use crate::error::Error;
use crate::header::SegmentHeader;
use crate::header::SegmentId;
use crate::header::BEGIN_EXTENSION_SIZE;
use crate::header::MAX_BEGIN;
use crate::list::CircularList;
use crate::sizing::Sizing;
use core::cmp;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Range;

/// The buffer of a pool, seen as an anchor followed by an array of blocks.
///
/// ```text
/// +--------+-----------------+-----------------+-----+
/// | anchor | header | data   | header | data   | ... |
/// +--------+-----------------+-----------------+-----+
///          ^ block 0         ^ block 1
/// ```
///
/// Trailing bytes that do not fill a whole block are never touched.
pub(crate) struct Arena<'a, S: Sizing> {
    memory: &'a mut [u8],
    block_size: usize,
    blocks: usize,
    large_segments: bool,
    phantom: PhantomData<S>,
}

impl<'a, S: Sizing> Arena<'a, S> {
    /// Checks `config` against `memory` and the limits of `S`, then turns the whole block area
    /// into free segments.
    pub(crate) fn new(memory: &'a mut [u8], config: &Config) -> Result<Self, Error> {
        let block_size = config.block_size();
        let (min, max) = Self::block_size_bounds();
        if !(min..=max).contains(&block_size) {
            return Err(Error::InvalidBlockSize {
                block_size,
                min,
                max,
            });
        }

        let required = S::ANCHOR_SIZE + block_size;
        if memory.len() < required {
            return Err(Error::BufferTooSmall {
                size: memory.len(),
                required,
            });
        }

        let blocks = (memory.len() - S::ANCHOR_SIZE) / block_size;
        if blocks > S::MAX_BLOCKS {
            return Err(Error::TooManyBlocks {
                blocks,
                max: S::MAX_BLOCKS,
            });
        }

        let mut arena = Self {
            memory,
            block_size,
            blocks,
            large_segments: config.large_segments(),
            phantom: PhantomData,
        };
        arena.init_free_list();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "pool of {} blocks of {} bytes, large segments {}",
            arena.blocks,
            arena.block_size,
            arena.large_segments
        );

        Ok(arena)
    }

    /// Smallest and largest accepted block sizes.
    ///
    /// A block must leave room for the begin extension right after its header; a single block's
    /// data must fit the length field, and every offset inside a block must fit the begin
    /// extension.
    #[inline]
    #[must_use]
    pub(crate) fn block_size_bounds() -> (usize, usize) {
        let min = S::HEADER_SIZE + BEGIN_EXTENSION_SIZE;
        let max = cmp::min(S::MAX_LENGTH + S::HEADER_SIZE, MAX_BEGIN + 1);
        (min, max)
    }

    #[inline]
    #[must_use]
    pub(crate) const fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    #[must_use]
    pub(crate) const fn blocks(&self) -> usize {
        self.blocks
    }

    #[inline]
    #[must_use]
    pub(crate) const fn large_segments(&self) -> bool {
        self.large_segments
    }

    #[inline]
    #[must_use]
    pub(crate) const fn config(&self) -> Config {
        Config::new(self.block_size).with_large_segments(self.large_segments)
    }

    #[inline]
    #[must_use]
    pub(crate) const fn is_segment(&self, id: SegmentId) -> bool {
        (id as usize) < self.blocks
    }

    /// Number of data bytes available in a segment spanning `blocks` blocks.
    #[inline]
    #[must_use]
    pub(crate) const fn capacity(&self, blocks: usize) -> usize {
        blocks * self.block_size - S::HEADER_SIZE
    }

    /// Number of blocks spanned by a segment, from its header up to its last live byte.
    #[inline]
    #[must_use]
    pub(crate) const fn blocks_count(&self, header: &SegmentHeader) -> usize {
        (header.begin + header.length + S::HEADER_SIZE).div_ceil(self.block_size)
    }

    #[inline]
    #[must_use]
    fn block_offset(&self, id: SegmentId) -> usize {
        debug_assert!(self.is_segment(id), "`id` out of bounds");
        S::ANCHOR_SIZE + id as usize * self.block_size
    }

    #[inline]
    #[must_use]
    fn header_range(&self, id: SegmentId) -> Range<usize> {
        let start = self.block_offset(id);
        start..start + S::HEADER_SIZE + BEGIN_EXTENSION_SIZE
    }

    #[inline]
    #[must_use]
    fn data_offset(&self, id: SegmentId, index: usize) -> usize {
        self.block_offset(id) + S::HEADER_SIZE + index
    }

    /// Reads the header of a segment, or returns `None` if `id` is not a segment id.
    #[inline]
    #[must_use]
    pub(crate) fn get_header(&self, id: SegmentId) -> Option<SegmentHeader> {
        if self.is_segment(id) {
            Some(self.read(id))
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn read(&self, id: SegmentId) -> SegmentHeader {
        S::read_segment_header(&self.memory[self.header_range(id)])
    }

    #[inline]
    pub(crate) fn write(&mut self, id: SegmentId, header: &SegmentHeader) {
        let range = self.header_range(id);
        S::write_segment_header(&mut self.memory[range], header)
    }

    #[inline]
    #[must_use]
    pub(crate) fn read_data(&self, id: SegmentId, index: usize) -> u8 {
        self.memory[self.data_offset(id, index)]
    }

    #[inline]
    pub(crate) fn write_data(&mut self, id: SegmentId, index: usize, byte: u8) {
        let offset = self.data_offset(id, index);
        self.memory[offset] = byte;
    }

    /// First segment of the free list, or `None` if every block is in use.
    #[inline]
    #[must_use]
    pub(crate) fn free_list(&self) -> Option<SegmentId> {
        let anchor = S::read_anchor(&self.memory[..S::ANCHOR_SIZE]);
        if self.is_segment(anchor) {
            Some(anchor)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn set_free_list(&mut self, id: Option<SegmentId>) {
        let anchor = id.unwrap_or(S::EMPTY);
        S::write_anchor(&mut self.memory[..S::ANCHOR_SIZE], anchor)
    }
}

impl<S: Sizing> CircularList for Arena<'_, S> {
    type Node = SegmentId;

    #[inline]
    fn get_next(&self, node: SegmentId) -> SegmentId {
        self.read(node).next
    }

    #[inline]
    fn get_last(&self, node: SegmentId) -> SegmentId {
        self.read(node).last
    }

    #[inline]
    fn set_next(&mut self, node: SegmentId, next: SegmentId) {
        let mut header = self.read(node);
        header.next = next;
        self.write(node, &header);
    }

    #[inline]
    fn set_last(&mut self, node: SegmentId, last: SegmentId) {
        let mut header = self.read(node);
        header.last = last;
        self.write(node, &header);
    }

    #[inline]
    fn is_same_node(&self, a: SegmentId, b: SegmentId) -> bool {
        a == b
    }

    #[inline]
    fn is_null(&self, node: SegmentId) -> bool {
        !self.is_segment(node)
    }
}

impl<S: Sizing> fmt::Debug for Arena<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("size", &self.memory.len())
            .field("block_size", &self.block_size)
            .field("blocks", &self.blocks)
            .field("large_segments", &self.large_segments)
            .field("free_list", &self.free_list())
            .finish()
    }
}
