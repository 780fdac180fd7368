// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Lazily-initialized, lock-protected queue pools.
//!
//! See [`LazyQueuePool`] for information and examples.

use crate::sizing::Sizing;
use crate::sizing::SizingCompact;
use crate::sizing::SizingWide;
use crate::QueueHandle;
use crate::QueuePool;
use crate::Usage;
use spin::Mutex;
use spin::MutexGuard;
use spin::Once;

/// Lazy-initialized version of [`QueuePoolCompact`](crate::QueuePoolCompact).
///
/// This can be used in `static` items. See the documentation for [`LazyQueuePool`] for more
/// information and examples.
pub type LazyQueuePoolCompact<F = fn() -> QueuePool<'static, SizingCompact>> =
    LazyQueuePool<SizingCompact, F>;

/// Lazy-initialized version of [`QueuePoolWide`](crate::QueuePoolWide).
///
/// This can be used in `static` items. See the documentation for [`LazyQueuePool`] for more
/// information and examples.
pub type LazyQueuePoolWide<F = fn() -> QueuePool<'static, SizingWide>> =
    LazyQueuePool<SizingWide, F>;

/// Lazy-initialized version of [`QueuePool`].
///
/// The pool is not constructed when `LazyQueuePool` is constructed, but when it is first
/// accessed, by calling the function passed to [`new`](LazyQueuePool::new). Access is then
/// serialized through a spin lock, so that the pool can live in a `static` item and be shared by
/// free functions that only see queue handles.
///
/// # Examples
///
/// ```
/// use core::ptr::addr_of_mut;
/// use queuepool::lazy::LazyQueuePoolCompact;
/// use queuepool::QueuePoolCompact;
///
/// static POOL: LazyQueuePoolCompact = LazyQueuePoolCompact::new(|| {
///     static mut MEMORY: [u8; 2048] = [0u8; 2048];
///     // SAFETY: This closure is called only once, therefore `MEMORY` is entirely owned by
///     // this `QueuePoolCompact`, and no other reference can be created.
///     let memory = unsafe { &mut *addr_of_mut!(MEMORY) };
///     QueuePoolCompact::from_slice(memory).expect("2048 bytes hold 85 blocks")
/// });
///
/// let mut queue = POOL.make_queue();
/// assert!(POOL.try_enqueue_byte(&mut queue, 7));
/// assert_eq!(POOL.try_dequeue_byte(&mut queue), Some(7));
/// POOL.destroy_queue(&mut queue);
/// ```
pub struct LazyQueuePool<S: Sizing, F = fn() -> QueuePool<'static, S>> {
    pool: Once<Mutex<QueuePool<'static, S>>>,
    init: F,
}

impl<S: Sizing, F> LazyQueuePool<S, F> {
    /// Constructs a new [`LazyQueuePool`] from the given initialization function.
    ///
    /// The initialization function will be called when the `LazyQueuePool` is first used.
    #[inline]
    #[must_use]
    pub const fn new(init: F) -> Self {
        Self {
            pool: Once::new(),
            init,
        }
    }
}

impl<S: Sizing, F: Fn() -> QueuePool<'static, S>> LazyQueuePool<S, F> {
    /// Returns the lock protecting the underlying [`QueuePool`], initializing the pool if needed.
    #[inline]
    pub fn get(&self) -> &Mutex<QueuePool<'static, S>> {
        self.pool.call_once(|| Mutex::new((self.init)()))
    }

    /// Locks the underlying [`QueuePool`], initializing it if needed.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, QueuePool<'static, S>> {
        self.get().lock()
    }

    /// See [`QueuePool::make_queue`].
    #[inline]
    #[must_use]
    pub fn make_queue(&self) -> QueueHandle<S> {
        self.lock().make_queue()
    }

    /// See [`QueuePool::try_enqueue_byte`].
    #[inline]
    #[must_use]
    pub fn try_enqueue_byte(&self, handle: &mut QueueHandle<S>, byte: u8) -> bool {
        self.lock().try_enqueue_byte(handle, byte)
    }

    /// See [`QueuePool::try_dequeue_byte`].
    #[inline]
    #[must_use]
    pub fn try_dequeue_byte(&self, handle: &mut QueueHandle<S>) -> Option<u8> {
        self.lock().try_dequeue_byte(handle)
    }

    /// See [`QueuePool::destroy_queue`].
    #[inline]
    pub fn destroy_queue(&self, handle: &mut QueueHandle<S>) {
        self.lock().destroy_queue(handle)
    }

    /// See [`QueuePool::usage`].
    #[inline]
    #[must_use]
    pub fn usage(&self) -> Usage {
        self.lock().usage()
    }
}

impl<S: Sizing, F> core::fmt::Debug for LazyQueuePool<S, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LazyQueuePool")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
