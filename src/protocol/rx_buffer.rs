//! Bounded inbound byte buffer shared between the radio callback and the
//! main loop.
//!
//! The GATT write callback runs in the Bluedroid task; the main loop drains
//! once per iteration.  No lock is taken on either side:
//!
//! - `append` (producer) writes past the current length and publishes the
//!   new length with a compare-exchange.  If the consumer reset the buffer
//!   meanwhile, the chunk is rewritten at the fresh length.
//! - `take` (consumer) copies `0..len` and resets the length only if it is
//!   still the one it copied; otherwise it copies again.
//!
//! Bytes below the published length are never rewritten while published,
//! so a take sees each byte exactly once.  Only bytes beyond capacity are
//! lost.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Capacity of the inbound buffer in bytes.
pub const RX_BUF_SIZE: usize = 512;

pub struct RxBuffer {
    data: [AtomicU8; RX_BUF_SIZE],
    len: AtomicUsize,
}

impl RxBuffer {
    pub const fn new() -> Self {
        Self {
            data: [const { AtomicU8::new(0) }; RX_BUF_SIZE],
            len: AtomicUsize::new(0),
        }
    }

    /// Append a received chunk, truncating to the remaining capacity.
    /// Returns how many bytes were stored.
    pub fn append(&self, chunk: &[u8]) -> usize {
        let mut start = self.len.load(Ordering::Acquire);
        loop {
            let n = chunk.len().min(RX_BUF_SIZE.saturating_sub(start));
            if n == 0 {
                return 0;
            }
            for (slot, &b) in self.data[start..start + n].iter().zip(chunk) {
                slot.store(b, Ordering::Relaxed);
            }
            match self
                .len
                .compare_exchange(start, start + n, Ordering::Release, Ordering::Acquire)
            {
                Ok(_) => return n,
                Err(current) => start = current,
            }
        }
    }

    /// Move everything buffered so far into `out` and reset the buffer.
    /// Returns the number of bytes copied.
    pub fn take(&self, out: &mut [u8; RX_BUF_SIZE]) -> usize {
        let mut n = self.len.load(Ordering::Acquire);
        loop {
            if n == 0 {
                return 0;
            }
            let n_copy = n.min(RX_BUF_SIZE);
            for (dst, slot) in out[..n_copy].iter_mut().zip(&self.data[..n_copy]) {
                *dst = slot.load(Ordering::Relaxed);
            }
            match self
                .len
                .compare_exchange(n, 0, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return n_copy,
                Err(current) => n = current,
            }
        }
    }

    /// Discard any buffered bytes.
    pub fn clear(&self) {
        self.len.store(0, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RxBuffer {
    fn default() -> Self {
        Self::new()
    }
}
