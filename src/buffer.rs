//! The byte region shared between a writer thread and the parser thread.
//!
//! Grounded in how `rio-backend`'s synchronized-update buffer already does
//! the load-bearing part of this (`performer/handler.rs`'s `SyncState`): a
//! flat `Vec<u8>` that gets bytes appended to it and, once consumed,
//! compacted with `copy_within` + `truncate` rather than reallocated. This
//! module generalises that into a fixed-capacity region with explicit
//! producer/consumer offset bookkeeping, so a writer thread can deposit
//! bytes while the parser thread drains them without either side copying
//! past the other's territory.
//!
//! The byte storage itself is deliberately *not* behind the same lock as the
//! offsets: the lock only ever serialises the four offsets below, so the
//! partitioning is statically provable rather than dynamically checked. Two
//! disjoint
//! ranges — `[sz + pending_write, capacity)` for the writer and `[consumed,
//! sz)` for the parser — are live at once; `unsafe` is confined to proving
//! that disjointness holds given the offsets, never to skipping a bounds
//! check.

use core::cell::UnsafeCell;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::config::BUF_EXTRA;

struct Offsets {
    /// Bytes in `[0, consumed)` have been fully parsed and are logically gone.
    consumed: usize,
    /// Bytes in `[consumed, pos)` are mid-parse; `[pos, sz)` is unread.
    pos: usize,
    /// End of valid input merged so far.
    sz: usize,
    /// Bytes written by the producer but not yet merged into `sz`.
    pending_write: usize,
    /// At most one live [`WriteGuard`] at a time.
    write_in_flight: bool,
    /// When `sz` last transitioned from `consumed == sz` to having new bytes.
    new_input_at: Option<Instant>,
}

/// A fixed-capacity byte region with a producer/consumer interlock.
///
/// No allocation happens after construction: `capacity` bytes (plus
/// [`BUF_EXTRA`] alignment padding) are reserved up front, and `reclaim`
/// shifts already-parsed bytes down in place instead of growing the buffer.
pub struct ByteBuffer {
    data: UnsafeCell<Box<[u8]>>,
    capacity: usize,
    offsets: Mutex<Offsets>,
}

// SAFETY: `data` is only ever sliced within `[consumed, sz)` (readers) or
// `[sz + pending_write, capacity + BUF_EXTRA)` (the single in-flight writer),
// and both bounds are only ever advanced under `offsets`'s lock. The two
// ranges never overlap because a writer always starts past `sz +
// pending_write` and a reader never reads past `sz`.
unsafe impl Sync for ByteBuffer {}

/// A snapshot of the readable region, taken under the lock and then used
/// lock-free while the parser drives `Screen` callbacks.
pub(crate) struct ReadSnapshot {
    pub consumed: usize,
    pub pos: usize,
    pub sz: usize,
    pub new_input_at: Option<Instant>,
    pub had_pending_write: bool,
}

impl ByteBuffer {
    pub fn new(capacity: usize) -> Self {
        ByteBuffer {
            data: UnsafeCell::new(vec![0u8; capacity + BUF_EXTRA].into_boxed_slice()),
            capacity,
            offsets: Mutex::new(Offsets {
                consumed: 0,
                pos: 0,
                sz: 0,
                pending_write: 0,
                write_in_flight: false,
                new_input_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Offsets> {
        self.offsets.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Total addressable capacity, not counting [`BUF_EXTRA`] alignment
    /// padding that exists only so a vectorised scan may overrun the tail.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the producer still has room to write without first waiting
    /// for a `reclaim`.
    pub fn has_space(&self) -> bool {
        let off = self.lock();
        off.sz + off.pending_write < self.capacity
    }

    /// Acquire the unused tail for writing. Returns `None` if a write handle
    /// is already outstanding or the buffer is full.
    pub fn acquire_write(&self) -> Option<WriteGuard<'_>> {
        let mut off = self.lock();
        if off.write_in_flight {
            return None;
        }
        let start = off.sz + off.pending_write;
        if start >= self.capacity {
            return None;
        }
        off.write_in_flight = true;
        let end = self.capacity;
        drop(off);
        // SAFETY: write_in_flight now excludes any other WriteGuard, and the
        // parser is restricted to `[consumed, sz)` with `sz <= start`.
        let slice = unsafe { &mut (*self.data.get())[start..end] };
        Some(WriteGuard {
            buffer: self,
            start,
            slice: Some(slice),
        })
    }

    /// Merge pending writes into `sz`, returning a snapshot of what the
    /// parser may now read. `now` is injected (rather than read from the
    /// clock here) so callers can drive `new_input_at` deterministically in
    /// tests, matching [`crate::parser::ParserCore::parse`]'s own injected
    /// clock.
    pub(crate) fn snapshot(&self, now: Instant) -> ReadSnapshot {
        let mut off = self.lock();
        let had_pending_write = off.pending_write > 0;
        if had_pending_write {
            if off.consumed == off.sz {
                off.new_input_at = Some(now);
            }
            off.sz += off.pending_write;
            off.pending_write = 0;
        }
        ReadSnapshot {
            consumed: off.consumed,
            pos: off.pos,
            sz: off.sz,
            new_input_at: off.new_input_at,
            had_pending_write,
        }
    }

    /// Borrow the readable region `[start, end)` without holding the lock.
    ///
    /// # Safety
    /// Callers must only pass `(start, end)` derived from a [`ReadSnapshot`]
    /// taken from this buffer, with no intervening [`ByteBuffer::reclaim`]
    /// call, so that `end <= sz` at the time of the snapshot.
    pub(crate) fn readable(&self, start: usize, end: usize) -> &[u8] {
        // SAFETY: see function contract; [start, end) is within [0, sz) and
        // therefore disjoint from any writer's [sz + pending_write, cap).
        unsafe { &(*self.data.get())[start..end] }
    }

    /// Record how far the parser has progressed without shifting anything.
    pub(crate) fn advance(&self, consumed: usize, pos: usize) {
        let mut off = self.lock();
        off.consumed = consumed;
        off.pos = pos;
    }

    /// Shift `[consumed, sz)` down to offset 0. Returns whether the producer
    /// had been blocked (no space) immediately before the shift.
    pub fn reclaim(&self) -> bool {
        let mut off = self.lock();
        if off.consumed == 0 {
            return false;
        }
        let was_blocked = off.sz + off.pending_write >= self.capacity;
        let consumed = off.consumed;
        let new_sz = off.sz - consumed;
        // SAFETY: no WriteGuard may be outstanding while holding this lock
        // (acquire_write also takes it), so the region below `sz` is not
        // being written to concurrently.
        unsafe {
            (*self.data.get()).copy_within(consumed..off.sz, 0);
        }
        off.pos -= consumed;
        off.sz = new_sz;
        off.consumed = 0;
        was_blocked
    }

    #[cfg(test)]
    pub(crate) fn debug_offsets(&self) -> (usize, usize, usize, usize) {
        let off = self.lock();
        (off.consumed, off.pos, off.sz, off.pending_write)
    }
}

/// A live handle to the buffer's unused tail. At most one may exist at a
/// time; dropping it without calling [`WriteGuard::commit`] releases the
/// handle as a zero-byte write.
pub struct WriteGuard<'a> {
    buffer: &'a ByteBuffer,
    start: usize,
    slice: Option<&'a mut [u8]>,
}

impl<'a> WriteGuard<'a> {
    pub fn bytes(&mut self) -> &mut [u8] {
        self.slice.as_mut().expect("WriteGuard used after commit")
    }

    /// Commit `n` bytes (clamped to the guard's length) as newly written.
    pub fn commit(mut self, n: usize) {
        let len = self.slice.take().map(|s| s.len()).unwrap_or(0);
        let n = n.min(len);
        let mut off = self.buffer.lock();
        off.pending_write += n;
        off.write_in_flight = false;
        let _ = self.start;
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if self.slice.is_some() {
            let mut off = self.buffer.lock();
            off.write_in_flight = false;
        }
    }
}
