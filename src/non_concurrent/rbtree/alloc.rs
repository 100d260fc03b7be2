use std::alloc::Layout;
use std::ptr::NonNull;


/// Where an [`RBTree`](super::RBTree) gets the memory for its nodes and sentinel.
///
/// Unlike `std::alloc::GlobalAlloc`, running out of memory is an ordinary
/// `None` here, so the tree can report it instead of aborting.
///
/// SAFETY: a block returned by `allocate` must be valid for `layout` (size and
/// alignment) until it is passed back to `deallocate` with the same layout.
pub unsafe trait NodeAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// SAFETY: `ptr` must have come from `self.allocate(layout)` and not have been freed yet.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The process-wide global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct Global;

unsafe impl NodeAllocator for Global {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None // pls no ZSTs thx
        }
        // SAFETY: the layout has a non-zero size
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: guaranteed by caller
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

unsafe impl<A: NodeAllocator + ?Sized> NodeAllocator for &A {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: guaranteed by caller
        unsafe { (**self).deallocate(ptr, layout) }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_round_trip() {
        let layout = Layout::new::<[u64; 4]>();
        let ptr = Global.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % layout.align(), 0);
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, layout.size());
            assert_eq!(*ptr.as_ptr().add(layout.size() - 1), 0xAB);
            Global.deallocate(ptr, layout);
        }
    }

    #[test]
    fn test_global_rejects_zero_sized() {
        assert!(Global.allocate(Layout::new::<()>()).is_none());
    }
}
