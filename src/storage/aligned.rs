//! AlignedColumn - fixed-capacity buffer that starts on a cache line.
//!
//! `Vec<T>` only guarantees `align_of::<T>()`, which is 8 bytes at best for
//! the key types this crate stores. The arena needs every node row to start
//! on a [`CACHE_LINE_SIZE`] boundary, so each column allocates its memory
//! with an explicit 64-byte aligned [`Layout`] instead.

use std::alloc::{self, Layout};
use std::mem::{align_of, size_of};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::common::config::CACHE_LINE_SIZE;
use crate::common::{Error, Result};

/// A column of `Copy` elements with a fixed capacity and a cache-line
/// aligned base address.
///
/// Behaves like a `Vec<T>` that never reallocates: elements are appended
/// with [`extend_filled`](Self::extend_filled) until `capacity` is reached
/// and the buffer derefs to a slice of the initialised prefix. Only `Copy`
/// elements can be stored, so dropping the column never runs element
/// destructors.
pub struct AlignedColumn<T> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
    layout: Layout,
}

// SAFETY: the column owns its buffer exclusively, like `Vec<T>`.
unsafe impl<T: Send> Send for AlignedColumn<T> {}
// SAFETY: shared access only hands out `&[T]`.
unsafe impl<T: Sync> Sync for AlignedColumn<T> {}

impl<T: Copy> AlignedColumn<T> {
    /// Allocate room for `capacity` elements.
    ///
    /// # Errors
    /// - `Error::ArenaAllocation` if the size overflows or the allocator
    ///   refuses the request
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let bytes = capacity
            .checked_mul(size_of::<T>())
            .ok_or(Error::ArenaAllocation { bytes: usize::MAX })?;
        let layout = Layout::from_size_align(bytes, CACHE_LINE_SIZE.max(align_of::<T>()))
            .map_err(|_| Error::ArenaAllocation { bytes })?;

        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: layout has a non-zero size.
            let raw = unsafe { alloc::alloc(layout) };
            NonNull::new(raw.cast::<T>()).ok_or(Error::ArenaAllocation { bytes })?
        };

        Ok(Self {
            ptr,
            len: 0,
            capacity,
            layout,
        })
    }

    /// Append `count` copies of `value`.
    ///
    /// # Panics
    /// Panics if the column would exceed its capacity. The arena checks
    /// its node budget before calling this.
    pub fn extend_filled(&mut self, count: usize, value: T) {
        assert!(
            count <= self.capacity - self.len,
            "aligned column overflow: {} + {} > {}",
            self.len,
            count,
            self.capacity
        );
        for i in self.len..self.len + count {
            // SAFETY: i < capacity, so the slot lies inside the allocation.
            // T: Copy, so there is no old value to drop.
            unsafe { self.ptr.as_ptr().add(i).write(value) };
        }
        self.len += count;
    }
}

impl<T> Deref for AlignedColumn<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: the first `len` slots are initialised.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for AlignedColumn<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: the first `len` slots are initialised and we hold `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Drop for AlignedColumn<T> {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: allocated in `with_capacity` with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) };
        }
    }
}
