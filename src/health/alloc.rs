//! Counting global allocator.
//!
//! Wraps another allocator and keeps process-wide heap counters that the
//! memory probe reads. Install it in the binary:
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: CountingAllocator = CountingAllocator::system();
//! ```
//!
//! Counters stay at zero when it is not installed.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATED: AtomicU64 = AtomicU64::new(0);
static TOTAL_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static RECLAIMS: AtomicU64 = AtomicU64::new(0);

/// Point-in-time view of the allocator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorStats {
    /// Bytes currently allocated and not yet freed.
    pub allocated_bytes: u64,
    /// Bytes ever handed out, including those since freed.
    pub total_allocated_bytes: u64,
    /// Number of deallocations performed.
    pub reclaims: u64,
}

/// Read the current counters.
pub fn allocator_stats() -> AllocatorStats {
    AllocatorStats {
        allocated_bytes: ALLOCATED.load(Ordering::Relaxed),
        total_allocated_bytes: TOTAL_ALLOCATED.load(Ordering::Relaxed),
        reclaims: RECLAIMS.load(Ordering::Relaxed),
    }
}

/// Allocator adapter that records every allocation and deallocation.
#[derive(Debug, Default)]
pub struct CountingAllocator<A = System> {
    inner: A,
}

impl CountingAllocator<System> {
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

fn record_alloc(size: usize) {
    ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
    TOTAL_ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
}

fn record_dealloc(size: usize) {
    ALLOCATED.fetch_sub(size as u64, Ordering::Relaxed);
    RECLAIMS.fetch_add(1, Ordering::Relaxed);
}

// SAFETY: every call is forwarded unchanged to `inner`; only counters are touched.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.inner.dealloc(ptr, layout);
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            let old_size = layout.size();
            if new_size >= old_size {
                record_alloc(new_size - old_size);
            } else {
                ALLOCATED.fetch_sub((old_size - new_size) as u64, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The library test binary installs the counting allocator (see lib.rs).
    // Other tests allocate concurrently, so only monotonic counters are
    // asserted exactly.

    #[test]
    fn test_allocation_advances_total() {
        let before = allocator_stats();
        let buffer = vec![0u8; 2 * 1024 * 1024];
        let during = allocator_stats();
        assert!(during.total_allocated_bytes - before.total_allocated_bytes >= buffer.len() as u64);
        drop(buffer);
    }

    #[test]
    fn test_drop_counts_a_reclaim() {
        let buffer = Box::new([0u8; 4096]);
        let before = allocator_stats();
        drop(buffer);
        let after = allocator_stats();
        assert!(after.reclaims > before.reclaims);
    }

    #[test]
    fn test_growing_realloc_is_counted() {
        let mut buffer: Vec<u8> = Vec::with_capacity(16);
        let before = allocator_stats();
        buffer.reserve_exact(1024 * 1024);
        let after = allocator_stats();
        assert!(after.total_allocated_bytes - before.total_allocated_bytes >= 1024 * 1024 - 16);
    }
}
