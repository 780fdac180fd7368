// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

use core::fmt;

/// Reasons why a [`QueuePool`](crate::QueuePool) cannot be built over a buffer.
///
/// Once a pool is built, its operations never fail with an `Error`: running out of blocks or
/// using a stale handle are reported by the return value of each operation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The block size cannot hold a header, or its data cannot be described by a header.
    InvalidBlockSize {
        /// The requested block size.
        block_size: usize,
        /// The smallest accepted block size.
        min: usize,
        /// The largest accepted block size.
        max: usize,
    },
    /// The buffer does not hold a single block.
    BufferTooSmall {
        /// Size of the buffer.
        size: usize,
        /// Smallest buffer size for the requested block size.
        required: usize,
    },
    /// The buffer holds more blocks than segment ids can address.
    TooManyBlocks {
        /// Number of blocks that would fit in the buffer.
        blocks: usize,
        /// Largest number of blocks supported by the sizing.
        max: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBlockSize {
                block_size,
                min,
                max,
            } => write!(
                f,
                "invalid block size {block_size}: must be between {min} and {max} bytes"
            ),
            Self::BufferTooSmall { size, required } => write!(
                f,
                "buffer too small: got {size} bytes, at least {required} are required"
            ),
            Self::TooManyBlocks { blocks, max } => write!(
                f,
                "buffer holds {blocks} blocks, but at most {max} can be addressed"
            ),
        }
    }
}

impl core::error::Error for Error {}
