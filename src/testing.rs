use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::sync::Once;

use crate::{Global, NodeAllocator};


pub(crate) fn initialize_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        use simplelog::*;
        // another test harness may already have installed a logger
        let _ = TestLogger::init(LevelFilter::Debug, Config::default());
    });
}

/// A 4-byte record that sorts numerically under `Bytewise`.
pub(crate) fn record(key: u32) -> [u8; 4] {
    key.to_be_bytes()
}

pub(crate) fn key_of(data: &[u8]) -> u32 {
    u32::from_be_bytes(data.try_into().unwrap())
}

/// Wraps `Global`, counting live blocks and optionally failing once a budget
/// of successful allocations is used up.
#[derive(Default)]
pub(crate) struct CountingAllocator {
    live: Cell<usize>,
    budget: Cell<Option<usize>>,
}

impl CountingAllocator {
    pub(crate) fn with_budget(budget: usize) -> Self {
        Self { live: Cell::new(0), budget: Cell::new(Some(budget)) }
    }

    pub(crate) fn live(&self) -> usize {
        self.live.get()
    }

    pub(crate) fn set_budget(&self, budget: Option<usize>) {
        self.budget.set(budget);
    }
}

unsafe impl NodeAllocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        match self.budget.get() {
            Some(0) => return None,
            Some(n) => self.budget.set(Some(n - 1)),
            None => {}
        }
        let ptr = Global.allocate(layout)?;
        self.live.set(self.live.get() + 1);
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        unsafe { Global.deallocate(ptr, layout) }
    }
}
