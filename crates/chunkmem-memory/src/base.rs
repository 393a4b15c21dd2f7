//! Base allocator over the platform heap.
//!
//! Every allocation either succeeds or aborts the process; callers never see
//! a failed allocation and must not check for one. Storage is held as `u64`
//! words, so any offset that is a multiple of [`WORD`] is suitably aligned for
//! pointer-sized data.

use std::alloc::{handle_alloc_error, Layout};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::interface::AllocInterface;

/// Allocation granularity in bytes (the platform pointer size).
pub const WORD: usize = std::mem::size_of::<usize>();

const STORAGE_UNIT: usize = std::mem::size_of::<u64>();

static NEXT_ALLOCATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Hand out a process-unique identity for an arena or pool.
pub(crate) fn next_allocator_id() -> u64 {
    NEXT_ALLOCATOR_ID.fetch_add(1, Ordering::Relaxed)
}

/// Report heap exhaustion and abort.
pub(crate) fn out_of_memory(size: usize) -> ! {
    tracing::error!(size, "heap exhausted");
    match Layout::array::<u8>(size) {
        Ok(layout) => handle_alloc_error(layout),
        Err(_) => std::process::abort(),
    }
}

/// Round `size` up to the allocation granularity.
///
/// Zero-sized requests still reserve one granule so that distinct requests
/// never share an address.
#[must_use]
pub fn round_to_word(size: usize) -> usize {
    match size.max(1).checked_add(WORD - 1) {
        Some(padded) => padded & !(WORD - 1),
        None => out_of_memory(size),
    }
}

/// A zero-filled, word-aligned heap buffer.
///
/// Bytes past [`HeapBlock::len`] inside the last word are kept at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapBlock {
    words: Vec<u64>,
    len: usize,
}

impl HeapBlock {
    /// Usable size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View the block as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.len]
    }

    /// View the block as mutable bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[..self.len]
    }

    fn set_len(&mut self, len: usize) {
        let count = len.div_ceil(STORAGE_UNIT);
        if count > self.words.len() {
            let additional = count - self.words.len();
            reserve_exact(&mut self.words, additional, len);
        }
        self.words.resize(count, 0);
        self.words.shrink_to_fit();
        bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[len..].fill(0);
        self.len = len;
    }
}

fn reserve_exact(words: &mut Vec<u64>, additional: usize, size: usize) {
    if words.try_reserve_exact(additional).is_err() {
        out_of_memory(size);
    }
}

/// Allocate `size` zeroed bytes from the platform heap.
///
/// Aborts the process if the heap is exhausted.
#[must_use]
pub fn allocate(size: usize) -> HeapBlock {
    assert!(size > 0, "zero-sized heap allocation");
    let count = size.div_ceil(STORAGE_UNIT);
    let mut words = Vec::new();
    reserve_exact(&mut words, count, size);
    words.resize(count, 0);
    HeapBlock { words, len: size }
}

/// Grow, shrink, allocate or release depending on the arguments.
///
/// `None` allocates `new_size` bytes; a `new_size` of zero releases the block
/// and yields `None`; otherwise the prefix contents are preserved and any
/// newly exposed bytes are zero.
#[must_use]
pub fn resize(block: Option<HeapBlock>, new_size: usize) -> Option<HeapBlock> {
    match block {
        None => Some(allocate(new_size)),
        Some(block) if new_size == 0 => {
            release(&mut Some(block));
            None
        }
        Some(mut block) => {
            block.set_len(new_size);
            Some(block)
        }
    }
}

/// Return the block held in `slot` to the heap, leaving the slot empty.
///
/// Releasing an empty slot is fatal: it means the block was already released.
pub fn release(slot: &mut Option<HeapBlock>) {
    match slot.take() {
        Some(block) => drop(block),
        None => panic!("release of an empty heap slot (possible double free?)"),
    }
}

/// The platform heap behind the allocation interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heap;

impl AllocInterface for Heap {
    type Block = HeapBlock;

    fn alloc(&mut self, size: usize) -> HeapBlock {
        allocate(size)
    }

    fn bytes<'a>(&'a self, block: &'a HeapBlock) -> &'a [u8] {
        block.as_bytes()
    }

    fn bytes_mut<'a>(&'a mut self, block: &'a mut HeapBlock) -> &'a mut [u8] {
        block.as_bytes_mut()
    }
}
