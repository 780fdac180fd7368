// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Queuepool: many FIFO byte queues in one fixed-size buffer.
//!
//! Queuepool splits a byte buffer that you provide into fixed-size blocks, and uses those blocks
//! to store any number of independent, growable FIFO byte queues. Queues take blocks when they
//! grow and give them back when they shrink or are destroyed; nothing is ever allocated on the
//! heap.
//!
//! This is a no-`std` and no-`alloc` crate. It is meant for embedded systems, or in general for
//! situations where a bounded set of queues must share one static memory region.
//!
//! # Features
//!
//! * Constant-time queue creation, enqueue and dequeue
//! * Queue destruction in time proportional to the number of blocks held by the queue
//! * 4 bytes of overhead per block with [`SizingCompact`], and no overhead per queue
//! * No `unsafe` code
//!
//! # Quick start & examples
//!
//! A [`QueuePool`] borrows its buffer, for example an array on the stack:
//!
//! ```
//! use queuepool::QueuePoolCompact;
//!
//! let mut memory = [0u8; 2048];
//! let mut pool = QueuePoolCompact::from_slice(&mut memory).expect("buffer too small");
//!
//! let mut q0 = pool.make_queue();
//! let mut q1 = pool.make_queue();
//!
//! assert!(pool.try_enqueue_byte(&mut q0, 0));
//! assert!(pool.try_enqueue_byte(&mut q0, 1));
//! assert!(pool.try_enqueue_byte(&mut q1, 3));
//! assert!(pool.try_enqueue_byte(&mut q0, 2));
//! assert!(pool.try_enqueue_byte(&mut q1, 4));
//!
//! assert_eq!(pool.try_dequeue_byte(&mut q0), Some(0));
//! assert_eq!(pool.try_dequeue_byte(&mut q0), Some(1));
//! assert_eq!(pool.try_dequeue_byte(&mut q1), Some(3));
//! assert_eq!(pool.try_dequeue_byte(&mut q1), Some(4));
//!
//! pool.destroy_queue(&mut q0);
//! pool.destroy_queue(&mut q1);
//! ```
//!
//! The block size and the large segments optimization can be set through a [`Config`]:
//!
//! ```
//! use queuepool::Config;
//! use queuepool::QueuePoolWide;
//!
//! let mut memory = [0u8; 4096];
//! let config = Config::new(64).with_large_segments(true);
//! let mut pool = QueuePoolWide::new(&mut memory, config).expect("invalid configuration");
//!
//! let mut queue = pool.make_queue();
//! for byte in 0..=255 {
//!     assert!(pool.try_enqueue_byte(&mut queue, byte));
//! }
//! for byte in 0..=255 {
//!     assert_eq!(pool.try_dequeue_byte(&mut queue), Some(byte));
//! }
//! assert!(queue.is_empty());
//! ```
//!
//! To share one pool between free functions, for example behind a C-style interface, see
//! [`LazyQueuePool`](lazy::LazyQueuePool) (requires the `lazy` feature).
//!
//! # Pool limits
//!
//! The layout of segment headers is chosen by the [`Sizing`] type parameter:
//!
//! |                   | Anchor  | Header  | Maximum blocks | Maximum segment data | Block size     |
//! |-------------------|---------|---------|----------------|----------------------|----------------|
//! | [`SizingCompact`] | 1 byte  | 4 bytes | 126            | 4095 bytes           | 6..=4099 bytes |
//! | [`SizingWide`]    | 2 bytes | 6 bytes | 32766          | 65535 bytes          | 8..=16384 bytes|
//!
//! * **Anchor:** bytes reserved at the start of the buffer for the head of the free list.
//! * **Header:** bytes at the start of every segment.
//! * **Maximum blocks:** construction fails if the buffer holds more blocks than this.
//! * **Maximum segment data:** the number of bytes that a single segment can describe. Without
//!   large segments every segment is exactly one block, so this only bounds the block size.
//!
//! Queue handles store one segment id. The two highest ids are reserved to mark empty and
//! uninitialized handles, which is why the maximum number of blocks is 2 less than the id range.
//!
//! # Internal details
//!
//! The buffer starts with the *anchor*, followed by an array of blocks. A *segment* is a run of
//! one or more consecutive blocks with a header on the first block, and data after it. Segments
//! are linked in circular doubly-linked chains through the `next`/`last` ids in their headers:
//! one chain for the free list, and one chain per queue.
//!
//! Enqueuing writes at the end of the last segment of a queue. When that segment is full, a new
//! block is taken from the free list and appended to the chain; with large segments, the block
//! right after the full segment is taken instead if it is free, and the segment grows over it.
//! Dequeuing advances the `begin` offset of the first segment; when the segment empties it goes
//! back to the free list, and when `begin` passes whole blocks those blocks go back to the free
//! list while the header moves forward.
//!
//! # Cargo feature flags
//!
//! * `lazy`: enables the [`LazyQueuePool`](lazy::LazyQueuePool) type along with its sized
//!   variants.
//! * `tracing`: emits [`tracing`](https://docs.rs/tracing) events on construction, allocation,
//!   release and out-of-memory conditions.

#![no_std]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stderr)]
#![warn(clippy::print_stdout)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_macro_rules)]
#![warn(unused_qualifications)]
#![doc(test(attr(deny(warnings))))]

#[cfg(test)]
extern crate alloc;

mod arena;
mod config;
mod error;
mod freelist;
mod handle;
mod header;
mod iter;
mod list;
mod queue;
mod sizing;
mod usage;


#[cfg(feature = "lazy")]
pub mod lazy;

use crate::arena::Arena;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::handle::QueueHandle;
pub use crate::sizing::Sizing;
pub use crate::sizing::SizingCompact;
pub use crate::sizing::SizingWide;
pub use crate::usage::Usage;

/// Queue pool with 4-byte headers, up to 126 blocks.
///
/// See the [module-level documentation](crate#pool-limits) for more information about the
/// variants and their limits.
pub type QueuePoolCompact<'a> = QueuePool<'a, SizingCompact>;

/// Queue pool with 6-byte headers, up to 32766 blocks.
///
/// See the [module-level documentation](crate#pool-limits) for more information about the
/// variants and their limits.
pub type QueuePoolWide<'a> = QueuePool<'a, SizingWide>;

/// A set of FIFO byte queues stored in one borrowed buffer.
///
/// The pool comes in 2 variants that set different header layouts and limits. The `S` parameter
/// specifies the variant, which may be:
///
/// * [`SizingCompact`]: 4-byte headers, up to 126 blocks
/// * [`SizingWide`]: 6-byte headers, up to 32766 blocks
///
/// Queues are referred to by [`QueueHandle`]s, which the pool updates in place on every
/// operation.
#[derive(Debug)]
pub struct QueuePool<'a, S: Sizing> {
    arena: Arena<'a, S>,
}

impl<'a, S: Sizing> QueuePool<'a, S> {
    /// Constructs a pool over `memory` with the given configuration.
    ///
    /// The whole buffer is formatted: any previous content is lost.
    ///
    /// # Errors
    ///
    /// Fails if the block size is out of the range accepted by `S`, if `memory` cannot hold a
    /// single block, or if it holds more blocks than `S` can address.
    ///
    /// # Examples
    ///
    /// ```
    /// use queuepool::Config;
    /// use queuepool::Error;
    /// use queuepool::QueuePoolCompact;
    ///
    /// let mut memory = [0u8; 2048];
    /// assert!(QueuePoolCompact::new(&mut memory, Config::new(32)).is_ok());
    ///
    /// let mut memory = [0u8; 4096];
    /// assert_eq!(
    ///     QueuePoolCompact::new(&mut memory, Config::new(16)).unwrap_err(),
    ///     Error::TooManyBlocks {
    ///         blocks: 255,
    ///         max: 126
    ///     }
    /// );
    /// ```
    pub fn new(memory: &'a mut [u8], config: Config) -> Result<Self, Error> {
        let arena = Arena::new(memory, &config)?;
        Ok(Self { arena })
    }

    /// Constructs a pool over `memory` with the default [`Config`].
    ///
    /// # Errors
    ///
    /// See [`QueuePool::new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use queuepool::QueuePoolCompact;
    ///
    /// let mut memory = [0u8; 1024];
    /// # #[allow(unused_variables)]
    /// let pool = QueuePoolCompact::from_slice(&mut memory).expect("buffer too small");
    /// ```
    #[inline]
    pub fn from_slice(memory: &'a mut [u8]) -> Result<Self, Error> {
        Self::new(memory, Config::default())
    }

    /// Returns the configuration this pool was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> Config {
        self.arena.config()
    }

    /// Creates a new, empty queue.
    ///
    /// This does not take any memory from the pool: blocks are taken on the first enqueue.
    #[inline]
    #[must_use]
    pub fn make_queue(&self) -> QueueHandle<S> {
        QueueHandle::new(S::EMPTY)
    }

    /// Appends `byte` to the queue referred by `handle`.
    ///
    /// Returns `false` if the pool has no free block left to store the byte, or if `handle` is
    /// uninitialized. In that case neither the pool nor `handle` are modified.
    #[must_use]
    pub fn try_enqueue_byte(&mut self, handle: &mut QueueHandle<S>, byte: u8) -> bool {
        if handle.is_uninitialized() {
            return false;
        }
        let Some(head) = self.arena.try_grow_queue_by_1(handle.id) else {
            return false;
        };
        let Some((id, index)) = self.arena.try_peek_front(head) else {
            return false;
        };
        self.arena.write_data(id, index, byte);
        handle.id = head;
        true
    }

    /// Removes and returns the oldest byte of the queue referred by `handle`.
    ///
    /// Returns `None` if the queue is empty, or if `handle` is uninitialized.
    #[must_use]
    pub fn try_dequeue_byte(&mut self, handle: &mut QueueHandle<S>) -> Option<u8> {
        let byte = self.try_peek_byte(handle)?;
        handle.id = self.arena.try_shrink_queue_by_1(handle.id)?;
        Some(byte)
    }

    /// Returns the oldest byte of the queue referred by `handle`, without removing it.
    ///
    /// # Examples
    ///
    /// ```
    /// use queuepool::QueuePoolCompact;
    ///
    /// let mut memory = [0u8; 256];
    /// let mut pool = QueuePoolCompact::from_slice(&mut memory).expect("buffer too small");
    /// let mut queue = pool.make_queue();
    ///
    /// assert_eq!(pool.try_peek_byte(&queue), None);
    /// assert!(pool.try_enqueue_byte(&mut queue, b'a'));
    /// assert!(pool.try_enqueue_byte(&mut queue, b'b'));
    /// assert_eq!(pool.try_peek_byte(&queue), Some(b'a'));
    /// assert_eq!(pool.try_dequeue_byte(&mut queue), Some(b'a'));
    /// assert_eq!(pool.try_peek_byte(&queue), Some(b'b'));
    /// ```
    #[must_use]
    pub fn try_peek_byte(&self, handle: &QueueHandle<S>) -> Option<u8> {
        let (id, index) = self.arena.try_peek_back(handle.id)?;
        Some(self.arena.read_data(id, index))
    }

    /// Destroys the queue referred by `handle`, returning all of its blocks to the pool.
    ///
    /// `handle` becomes uninitialized. Destroying an uninitialized handle does nothing.
    pub fn destroy_queue(&mut self, handle: &mut QueueHandle<S>) {
        if handle.is_uninitialized() {
            return;
        }
        if self.arena.get_header(handle.id).is_some_and(|header| !header.free) {
            #[cfg(feature = "tracing")]
            tracing::debug!("destroy queue at segment {}", handle.id);
            self.arena.release_queue_to_freelist(handle.id);
        }
        *handle = QueueHandle::uninitialized();
    }

    /// Returns memory usage information for this pool.
    ///
    /// See the [`Usage`] documentation for the exact meaning of each field returned.
    ///
    /// The usage is computed by visiting every segment, so this is a linear-time operation
    /// (`O(n)`, where `n` is the number of blocks in the pool).
    ///
    /// # Examples
    ///
    /// ```
    /// use queuepool::QueuePoolCompact;
    /// use queuepool::Usage;
    ///
    /// let mut memory = [0u8; 2048];
    /// let mut pool = QueuePoolCompact::from_slice(&mut memory).expect("buffer too small");
    ///
    /// assert_eq!(
    ///     pool.usage(),
    ///     Usage {
    ///         total: 2040,
    ///         used: 0,
    ///         free: 2036,
    ///         overhead: 4,
    ///         slack: 0,
    ///         blocks: 0,
    ///     }
    /// );
    ///
    /// let mut queue = pool.make_queue();
    /// assert!(pool.try_enqueue_byte(&mut queue, 1));
    ///
    /// assert_eq!(
    ///     pool.usage(),
    ///     Usage {
    ///         total: 2040,
    ///         used: 1,
    ///         free: 2012,
    ///         overhead: 8,
    ///         slack: 19,
    ///         blocks: 1,
    ///     }
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn usage(&self) -> Usage {
        Usage::get(&self.arena)
    }

    #[cfg(test)]
    pub(crate) fn arena(&self) -> &Arena<'a, S> {
        &self.arena
    }
}

impl<'a, S: Sizing> TryFrom<&'a mut [u8]> for QueuePool<'a, S> {
    type Error = Error;

    #[inline]
    fn try_from(memory: &'a mut [u8]) -> Result<Self, Error> {
        Self::from_slice(memory)
    }
}

impl<'a, S: Sizing, const N: usize> TryFrom<&'a mut [u8; N]> for QueuePool<'a, S> {
    type Error = Error;

    #[inline]
    fn try_from(array: &'a mut [u8; N]) -> Result<Self, Error> {
        Self::from_slice(array.as_mut_slice())
    }
}
