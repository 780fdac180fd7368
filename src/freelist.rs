// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Free-list management.
//!
//! Free segments are chained in a single circular list whose head is stored in the anchor. A
//! free segment always has `begin == 0` and `length` equal to the capacity of the blocks it
//! spans, so its block span is exactly the run of free blocks it describes.

use crate::arena::Arena;
use crate::header::SegmentHeader;
use crate::header::SegmentId;
use crate::list::CircularList;
use crate::sizing::Sizing;
use core::cmp;

impl<S: Sizing> Arena<'_, S> {
    /// Splits the whole block area into free runs no longer than a header can describe, chained
    /// in id order.
    pub(crate) fn init_free_list(&mut self) {
        let max_run = (S::MAX_LENGTH + S::HEADER_SIZE) / self.block_size();
        let mut head = None;
        let mut start = 0;

        while start < self.blocks() {
            let run = cmp::min(max_run, self.blocks() - start);
            let id = start as SegmentId;
            let header = SegmentHeader::singleton(id, true, 0, self.capacity(run));
            self.write(id, &header);
            match head {
                None => head = Some(id),
                Some(head) => self.prepend_list(head, id),
            }
            start += run;
        }

        self.set_free_list(head);
    }

    /// Rewrites a segment as free, keeping its links and the blocks it spans.
    pub(crate) fn init_free_segment(&mut self, id: SegmentId) {
        let mut header = self.read(id);
        let blocks = self.blocks_count(&header);
        header.free = true;
        header.begin = 0;
        header.length = self.capacity(blocks);
        self.write(id, &header);

        #[cfg(feature = "tracing")]
        tracing::trace!("release {blocks} blocks at segment {id}");
    }

    /// Puts a singleton free segment at the head of the free list.
    pub(crate) fn push_free_segment(&mut self, id: SegmentId) {
        if let Some(anchor) = self.free_list() {
            self.prepend_list(anchor, id);
        }
        self.set_free_list(Some(id));
    }

    /// Takes the first block of the free segment `candidate` and returns it as an empty,
    /// non-free singleton.
    ///
    /// `candidate` is either the head of the free list, or a free block found next to a queue
    /// tail. If `candidate` spans more than one block, the rest of the run stays in the free
    /// list, at the same position, with its header moved to the following block.
    pub(crate) fn alloc_segment_from_free_list(
        &mut self,
        candidate: SegmentId,
    ) -> Option<SegmentId> {
        let mut header = self.get_header(candidate)?;
        if !header.free {
            return None;
        }
        debug_assert_eq!(header.begin, 0, "free segment with non-zero `begin`");

        let anchor = self.free_list();
        let was_anchor = anchor == Some(candidate);

        if self.blocks_count(&header) <= 1 {
            let single = self.is_single_node(candidate);
            let remainder = self.disconnect_node(candidate);
            if was_anchor {
                self.set_free_list(if single { None } else { Some(remainder) });
            }
        } else {
            header.begin = self.block_size();
            header.length -= self.block_size();
            let rest = self.trim_segment_from_left(candidate, &header);
            debug_assert!(rest.is_some(), "free run has no blocks left after the first");
            if was_anchor {
                self.set_free_list(rest);
            }
        }

        self.write(candidate, &SegmentHeader::singleton(candidate, false, 0, 0));

        #[cfg(feature = "tracing")]
        tracing::trace!("allocate block {candidate}");

        Some(candidate)
    }

    /// Moves the header of segment `id` to the first block that holds data described by
    /// `header`, and returns the new id of the segment.
    ///
    /// `header` is the updated header of `id`, possibly with `begin` past the first block. The
    /// relocated segment takes the chain position of `id`; `id` is left as a singleton with stale
    /// contents, to be rewritten by the caller. If `begin` is still inside the first block,
    /// `header` is written at `id` and nothing moves.
    pub(crate) fn trim_segment_from_left(
        &mut self,
        id: SegmentId,
        header: &SegmentHeader,
    ) -> Option<SegmentId> {
        let skipped = header.begin / self.block_size();
        if skipped == 0 {
            self.write(id, header);
            return Some(id);
        }

        let new_id = id as usize + skipped;
        if new_id >= self.blocks() {
            self.disconnect_node(id);
            return None;
        }
        let new_id = new_id as SegmentId;

        let begin = header.begin - skipped * self.block_size();
        let relocated = SegmentHeader::singleton(new_id, header.free, begin, header.length);
        self.write(new_id, &relocated);
        self.swap_nodes(id, new_id);

        #[cfg(feature = "tracing")]
        tracing::trace!("move segment {id} to {new_id}");

        Some(new_id)
    }

    /// Returns every segment of the chain starting at `head` to the free list.
    ///
    /// The released chain is placed in front of the current free list, and `head` becomes the
    /// next segment to be allocated.
    pub(crate) fn release_queue_to_freelist(&mut self, head: SegmentId) {
        let anchor = self.free_list();
        self.for_each(head, |arena, id| arena.init_free_segment(id));
        if let Some(anchor) = anchor {
            self.prepend_list(anchor, head);
        }
        self.set_free_list(Some(head));
    }
}
