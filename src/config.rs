// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

/// Construction parameters for a [`QueuePool`](crate::QueuePool).
///
/// The block size is the allocation unit: every queue owns a whole number of blocks, and every
/// block starts with a segment header. Smaller blocks waste less memory on partially filled
/// queues; larger blocks waste less memory on headers.
///
/// Limits on the block size depend on the [`Sizing`](crate::Sizing) and are checked by
/// [`QueuePool::new`](crate::QueuePool::new).
///
/// # Examples
///
/// ```
/// use queuepool::Config;
///
/// let config = Config::new(32).with_large_segments(true);
/// assert_eq!(config.block_size(), 32);
/// assert!(config.large_segments());
///
/// assert_eq!(Config::default(), Config::new(Config::DEFAULT_BLOCK_SIZE));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Config {
    block_size: usize,
    large_segments: bool,
}

impl Config {
    /// Block size used by [`Config::default`].
    pub const DEFAULT_BLOCK_SIZE: usize = 24;

    /// Creates a configuration with the given block size, and large segments disabled.
    #[inline]
    #[must_use]
    pub const fn new(block_size: usize) -> Self {
        Self {
            block_size,
            large_segments: false,
        }
    }

    /// Enables or disables large segments.
    ///
    /// When enabled, a queue whose last block is full first tries to take over the block that
    /// immediately follows it in memory, if that block is free. The queue then keeps a single
    /// header for both blocks, so more of the buffer is available for queued bytes. When
    /// disabled, every block carries its own header.
    #[inline]
    #[must_use]
    pub const fn with_large_segments(mut self, large_segments: bool) -> Self {
        self.large_segments = large_segments;
        self
    }

    /// Size of each block, header included.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether queues may grow into adjacent free blocks.
    #[inline]
    #[must_use]
    pub const fn large_segments(&self) -> bool {
        self.large_segments
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
