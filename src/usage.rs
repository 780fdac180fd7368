// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

use crate::arena::Arena;
use crate::iter::ArenaChunks;
use crate::sizing::Sizing;

/// Memory usage information.
///
/// This structure is returned by [`QueuePool::usage`](crate::QueuePool::usage). See that method
/// documentation for information and examples.
///
/// The fields always satisfy `total == used + free + overhead + slack`.
#[derive(Default, Clone, PartialEq, Eq, Debug)]
pub struct Usage {
    /// Memory covered by blocks.
    ///
    /// This is the size of the buffer passed to the [`QueuePool`](crate::QueuePool) constructor,
    /// minus the free-list anchor at its start, minus the trailing bytes that do not fill a whole
    /// block.
    pub total: usize,
    /// Bytes currently stored in queues.
    pub used: usize,
    /// Data bytes held by free segments.
    ///
    /// Not all of this can necessarily be filled: every block that a queue takes from the free
    /// list needs its own header, unless large segments are enabled and the block can be merged
    /// with the queue's last segment.
    pub free: usize,
    /// Memory taken by segment headers, both free and in use.
    pub overhead: usize,
    /// Memory in queue segments that holds no queued byte: space already dequeued at the front
    /// of a segment, and space not yet filled at its end.
    pub slack: usize,
    /// Number of blocks owned by queues.
    pub blocks: usize,
}

impl Usage {
    pub(crate) fn get<S: Sizing>(arena: &Arena<'_, S>) -> Self {
        let mut usage = Self {
            total: arena.blocks() * arena.block_size(),
            ..Self::default()
        };

        for chunk in ArenaChunks::new(arena) {
            let span = chunk.blocks * arena.block_size();
            usage.overhead += S::HEADER_SIZE;
            if chunk.header.free {
                usage.free += span - S::HEADER_SIZE;
            } else {
                usage.used += chunk.header.length;
                usage.slack += span - S::HEADER_SIZE - chunk.header.length;
                usage.blocks += chunk.blocks;
            }
        }

        usage
    }
}
