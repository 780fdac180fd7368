// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

use crate::arena::Arena;
use crate::header::SegmentHeader;
use crate::header::SegmentId;
use crate::sizing::Sizing;

/// A segment found while walking the block area.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Chunk {
    pub(crate) header: SegmentHeader,
    pub(crate) blocks: usize,
}

/// Walks the block area in address order, one segment at a time.
///
/// Every block is either the first block of a segment (holding its header) or part of the span
/// of the segment before it, so stepping by each segment's span visits every header once.
#[derive(Clone, Debug)]
pub(crate) struct ArenaChunks<'r, 'a, S: Sizing> {
    arena: &'r Arena<'a, S>,
    next: usize,
}

impl<'r, 'a, S: Sizing> ArenaChunks<'r, 'a, S> {
    pub(crate) const fn new(arena: &'r Arena<'a, S>) -> Self {
        Self { arena, next: 0 }
    }
}

impl<S: Sizing> Iterator for ArenaChunks<'_, '_, S> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.arena.blocks() {
            return None;
        }
        let id = self.next as SegmentId;
        let header = self.arena.read(id);
        let blocks = self.arena.blocks_count(&header).max(1);
        self.next += blocks;
        Some(Chunk { header, blocks })
    }
}
