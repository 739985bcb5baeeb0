//! Growable buffer used for bytecode and symbol storage.
//!
//! Capacity at least doubles whenever a push does not fit, so a run of N
//! pushes costs amortized O(1) each. Storage is only given back by
//! [`Buffer::free`]; there is no shrink and no removal.

use std::mem;
use std::ops::Deref;

/// An owned, contiguous, append-only sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer<T> {
    items: Vec<T>,
}

impl<T> Buffer<T> {
    /// Create an empty, unallocated buffer.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append one element.
    pub fn push(&mut self, value: T) {
        self.fit(1);
        self.items.push(value);
    }

    /// Number of elements pushed since the last `clear`/`free`.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Allocated capacity in elements; 0 for an unallocated buffer.
    pub fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            return self.items.len();
        }
        self.items.capacity()
    }

    /// Drop all elements but keep the allocation for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Release the backing storage. Freeing an unallocated buffer is a no-op.
    pub fn free(&mut self) {
        self.items = Vec::new();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Make room for `n` more elements, growing to the larger of double the
    /// current capacity and the exact size needed.
    fn fit(&mut self, n: usize) {
        let len = self.items.len();
        let Some(needed) = len.checked_add(n) else {
            capacity_overflow();
        };
        let cap = self.items.capacity();
        if needed <= cap {
            return;
        }
        let Some(doubled) = cap.checked_mul(2) else {
            capacity_overflow();
        };
        let new_cap = doubled.max(needed);
        let elem_size = mem::size_of::<T>().max(1);
        if new_cap > isize::MAX as usize / elem_size {
            capacity_overflow();
        }
        self.items.reserve_exact(new_cap - len);
    }
}

impl<T: Clone> Buffer<T> {
    /// Append every element of `values` in order.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.fit(values.len());
        self.items.extend_from_slice(values);
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> From<Buffer<T>> for Vec<T> {
    fn from(buffer: Buffer<T>) -> Self {
        buffer.items
    }
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("buffer capacity overflow");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let buf: Buffer<i32> = Buffer::new();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_push_preserves_order() {
        let mut buf = Buffer::new();
        for i in 0..1024 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 1024);
        assert!(buf.capacity() >= 1024);
        for (i, value) in buf.iter().enumerate() {
            assert_eq!(*value, i);
        }
    }

    #[test]
    fn test_growth_doubles() {
        let mut buf = Buffer::new();
        buf.push(1u8);
        let first = buf.capacity();
        assert!(first >= 1);
        for _ in 0..first {
            buf.push(0);
        }
        assert!(buf.capacity() >= first * 2);
    }

    #[test]
    fn test_extend_grows_to_needed_size() {
        let mut buf = Buffer::new();
        buf.push(0u8);
        buf.extend_from_slice(&[1; 100]);
        assert_eq!(buf.len(), 101);
        assert!(buf.capacity() >= 101);
    }

    #[test]
    fn test_free_resets() {
        let mut buf = Buffer::new();
        buf.push(7);
        buf.free();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 0);
        // Second free is a no-op.
        buf.free();
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut buf = Buffer::new();
        buf.extend_from_slice(&[1, 2, 3]);
        let cap = buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), cap);
    }
}
