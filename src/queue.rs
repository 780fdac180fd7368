// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Queue grow/shrink protocol.
//!
//! A queue is a chain of segments ordered from oldest to newest. Bytes are dequeued from the
//! first segment (at `begin`) and enqueued into the last segment (at `begin + length`). The
//! queue is identified by the id of its first segment, which changes when the first segment
//! empties or moves.

use crate::arena::Arena;
use crate::header::SegmentHeader;
use crate::header::SegmentId;
use crate::list::CircularList;
use crate::sizing::Sizing;

impl<S: Sizing> Arena<'_, S> {
    /// Reads the header of a queue segment: a valid id, not in the free list.
    #[inline]
    fn queue_header(&self, id: SegmentId) -> Option<SegmentHeader> {
        self.get_header(id).filter(|header| !header.free)
    }

    /// Makes room for one more byte at the end of the queue starting at `head`, and returns the
    /// new head.
    ///
    /// `head` may be the empty sentinel. On failure nothing is modified.
    pub(crate) fn try_grow_queue_by_1(&mut self, head: SegmentId) -> Option<SegmentId> {
        if head == S::EMPTY {
            let id = self.alloc_block()?;
            self.write(id, &SegmentHeader::singleton(id, false, 0, 1));
            return Some(id);
        }

        self.queue_header(head)?;
        let tail = self.last(head);
        let mut header = self.read(tail);

        let occupied = header.begin + header.length + S::HEADER_SIZE;
        if occupied.div_ceil(self.block_size()) == (occupied + 1).div_ceil(self.block_size()) {
            header.length += 1;
            self.write(tail, &header);
            return Some(head);
        }

        if self.large_segments() && self.try_extend_into_neighbor(tail, &header) {
            header.length += 1;
            self.write(tail, &header);
            return Some(head);
        }

        let id = self.alloc_block()?;
        self.write(id, &SegmentHeader::singleton(id, false, 0, 1));
        self.insert_list(tail, id);
        Some(head)
    }

    /// Takes the free block right after the full segment `tail`, so that `tail` can grow into
    /// it without a new header.
    fn try_extend_into_neighbor(&mut self, tail: SegmentId, header: &SegmentHeader) -> bool {
        let blocks = self.blocks_count(header);
        if self.capacity(blocks + 1) > S::MAX_LENGTH {
            return false;
        }
        let neighbor = tail as usize + blocks;
        if neighbor >= self.blocks() {
            return false;
        }
        let neighbor = neighbor as SegmentId;
        if !self.read(neighbor).free {
            return false;
        }
        if self.alloc_segment_from_free_list(neighbor).is_none() {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("extend segment {tail} into block {neighbor}");

        true
    }

    /// Takes a block from the head of the free list.
    fn alloc_block(&mut self) -> Option<SegmentId> {
        let Some(anchor) = self.free_list() else {
            #[cfg(feature = "tracing")]
            tracing::debug!("out of blocks");
            return None;
        };
        self.alloc_segment_from_free_list(anchor)
    }

    /// Drops the first byte of the queue starting at `head`, and returns the new head.
    ///
    /// The byte must have been read before calling this: advancing `begin` may overwrite it.
    /// Returns `None` if `head` does not refer to a non-empty queue.
    pub(crate) fn try_shrink_queue_by_1(&mut self, head: SegmentId) -> Option<SegmentId> {
        let mut header = self.queue_header(head)?;
        if header.length == 0 {
            return None;
        }
        header.begin += 1;
        header.length -= 1;

        if header.length == 0 {
            let blocks = self.blocks_count(&header);
            let single = self.is_single_node(head);
            let next = self.disconnect_node(head);
            let freed = SegmentHeader::singleton(head, true, 0, self.capacity(blocks));
            self.write(head, &freed);
            self.push_free_segment(head);
            return Some(if single { S::EMPTY } else { next });
        }

        if header.begin < self.block_size() {
            self.write(head, &header);
            return Some(head);
        }

        self.release_leading_blocks(head, &header)
    }

    /// Moves the header of `head` past the blocks that no longer hold live bytes, and returns
    /// those blocks to the free list.
    fn release_leading_blocks(
        &mut self,
        head: SegmentId,
        header: &SegmentHeader,
    ) -> Option<SegmentId> {
        let skipped = header.begin / self.block_size();
        let new_head = self.trim_segment_from_left(head, header)?;
        let freed = SegmentHeader::singleton(head, true, 0, self.capacity(skipped));
        self.write(head, &freed);
        self.push_free_segment(head);
        Some(new_head)
    }

    /// Position of the last byte of the queue: `(segment, index)`.
    pub(crate) fn try_peek_front(&self, head: SegmentId) -> Option<(SegmentId, usize)> {
        self.queue_header(head)?;
        let tail = self.last(head);
        let header = self.read(tail);
        if header.length == 0 {
            return None;
        }
        Some((tail, header.begin + header.length - 1))
    }

    /// Position of the first byte of the queue: `(segment, index)`.
    pub(crate) fn try_peek_back(&self, head: SegmentId) -> Option<(SegmentId, usize)> {
        let header = self.queue_header(head)?;
        if header.length == 0 {
            return None;
        }
        Some((head, header.begin))
    }
}
