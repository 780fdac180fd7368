// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

use crate::header::SegmentId;
use crate::sizing::Sizing;
use core::fmt;
use core::marker::PhantomData;

/// Reference to a queue stored in a [`QueuePool`](crate::QueuePool).
///
/// A handle is created by [`QueuePool::make_queue`](crate::QueuePool::make_queue) in the *empty*
/// state, and is updated in place by every enqueue and dequeue. After
/// [`QueuePool::destroy_queue`](crate::QueuePool::destroy_queue) it is *uninitialized*, and every
/// operation on it fails (or does nothing).
///
/// Handles are neither [`Copy`] nor [`Clone`]: every operation updates the handle in place, and
/// a copy would keep pointing at blocks the queue no longer owns.
///
/// A handle only makes sense for the pool that created it. Using a handle with a different pool
/// does not cause undefined behavior, but may corrupt the queues of that pool.
pub struct QueueHandle<S: Sizing> {
    pub(crate) id: SegmentId,
    phantom: PhantomData<S>,
}

impl<S: Sizing> QueueHandle<S> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(id: SegmentId) -> Self {
        Self {
            id,
            phantom: PhantomData,
        }
    }

    /// Returns a handle that does not refer to any queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use queuepool::QueueHandle;
    /// use queuepool::SizingCompact;
    ///
    /// let handle = QueueHandle::<SizingCompact>::uninitialized();
    /// assert!(handle.is_uninitialized());
    /// ```
    #[inline]
    #[must_use]
    pub const fn uninitialized() -> Self {
        Self::new(S::UNINITIALIZED)
    }

    /// Returns `true` if the queue holds no blocks, and therefore no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id == S::EMPTY
    }

    /// Returns `true` if the handle was never created by a pool, or if its queue was destroyed.
    #[inline]
    #[must_use]
    pub const fn is_uninitialized(&self) -> bool {
        self.id == S::UNINITIALIZED
    }
}

impl<S: Sizing> Default for QueueHandle<S> {
    #[inline]
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl<S: Sizing> fmt::Debug for QueueHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("QueueHandle(empty)")
        } else if self.is_uninitialized() {
            f.write_str("QueueHandle(uninitialized)")
        } else {
            f.debug_tuple("QueueHandle").field(&self.id).finish()
        }
    }
}
