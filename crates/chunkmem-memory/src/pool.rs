//! Fixed-size pool allocator with per-chunk free lists.
//!
//! The pool owns an append-only list of chunks. Each chunk hands out its
//! virgin slots first, then recycles slots from its own free list. Chunks that
//! still have a slot to give sit on a doubly-linked free-chunks list: freshly
//! grown chunks are linked at the head and serve first, chunks that regain a
//! slot after being full are linked at the tail and serve last.
//!
//! Every slot carries a header that is either the owning chunk (while
//! allocated) or the next free slot (while free), so `free` routes a block to
//! its chunk in O(1) and detects a second free of the same block.

use serde::Serialize;

use crate::base::{self, HeapBlock};
use crate::stats::PoolStats;

/// Minimum slot size: room for one pointer-sized free-list link.
pub const HEADER_SIZE: usize = base::WORD;

/// Normalize a requested element size to the slot size a pool will use.
#[must_use]
pub fn normalize_elem_size(requested: usize) -> usize {
    base::round_to_word(requested.max(HEADER_SIZE))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockHeader {
    Allocated { chunk: usize, generation: u32 },
    Free { next: Option<usize>, generation: u32 },
}

/// Whether a chunk can serve another allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChunkState {
    /// Every slot is allocated; the chunk is off the free-chunks list.
    Full,
    /// At least one virgin or recycled slot; the chunk is on the free-chunks list.
    HasFree,
}

#[derive(Debug)]
struct PoolChunk {
    capacity: usize,
    /// One header per touched slot; its length is the virgin watermark.
    headers: Vec<BlockHeader>,
    free_head: Option<usize>,
    prev_free: Option<usize>,
    next_free: Option<usize>,
    data: HeapBlock,
}

impl PoolChunk {
    fn new(capacity: usize, elem_size: usize) -> Self {
        let bytes = capacity
            .checked_mul(elem_size)
            .unwrap_or_else(|| base::out_of_memory(usize::MAX));
        Self {
            capacity,
            headers: Vec::with_capacity(capacity),
            free_head: None,
            prev_free: None,
            next_free: None,
            data: base::allocate(bytes),
        }
    }

    fn watermark(&self) -> usize {
        self.headers.len()
    }

    fn has_free(&self) -> bool {
        self.watermark() < self.capacity || self.free_head.is_some()
    }
}

/// Handle to a slot handed out by a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolBlock {
    pool: u64,
    chunk: usize,
    slot: usize,
    generation: u32,
}

impl PoolBlock {
    /// Index of the chunk holding the slot.
    #[must_use]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Slot index within the chunk.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Fixed-element-size allocator over a growable chunk list.
#[derive(Debug)]
pub struct Pool {
    id: u64,
    chunks: Vec<PoolChunk>,
    free_head: Option<usize>,
    free_tail: Option<usize>,
    growable: bool,
    elem_size: usize,
    biggest_chunk_size: usize,
    live: usize,
    stats: PoolStats,
}

impl Pool {
    /// Create a pool whose first chunk holds `initial_capacity` slots.
    ///
    /// `elem_size` is normalized with [`normalize_elem_size`]. A non-growable
    /// pool never holds more than `initial_capacity` blocks.
    #[must_use]
    pub fn new(initial_capacity: usize, elem_size: usize, growable: bool) -> Self {
        assert!(initial_capacity > 0, "pool capacity must be non-zero");
        assert!(elem_size > 0, "pool element size must be non-zero");
        let elem_size = normalize_elem_size(elem_size);
        let mut pool = Self {
            id: base::next_allocator_id(),
            chunks: vec![PoolChunk::new(initial_capacity, elem_size)],
            free_head: None,
            free_tail: None,
            growable,
            elem_size,
            biggest_chunk_size: initial_capacity,
            live: 0,
            stats: PoolStats::default(),
        };
        pool.push_free_front(0);
        tracing::debug!(initial_capacity, elem_size, growable, "pool created");
        pool
    }

    /// Take a slot, or `None` if a non-growable pool is exhausted.
    pub fn alloc(&mut self) -> Option<PoolBlock> {
        let index = match self.free_head {
            Some(index) => index,
            None if self.growable => self.grow(),
            None => {
                self.stats.record_exhaustion();
                tracing::debug!(capacity = self.capacity(), "pool exhausted");
                return None;
            }
        };

        let chunk = &mut self.chunks[index];
        let (slot, generation) = if chunk.watermark() < chunk.capacity {
            chunk.headers.push(BlockHeader::Allocated {
                chunk: index,
                generation: 0,
            });
            self.stats.record_virgin_hit();
            (chunk.headers.len() - 1, 0)
        } else {
            let Some(slot) = chunk.free_head else {
                unreachable!("chunk {index} on the free-chunks list has no free slot");
            };
            let BlockHeader::Free { next, generation } = chunk.headers[slot] else {
                unreachable!("free-list slot {slot} of chunk {index} is marked allocated");
            };
            // Handles from earlier tenancies of this slot stop matching.
            let generation = generation.wrapping_add(1);
            chunk.free_head = next;
            chunk.headers[slot] = BlockHeader::Allocated {
                chunk: index,
                generation,
            };
            self.stats.record_recycled_hit();
            (slot, generation)
        };

        if !chunk.has_free() {
            self.unlink_free(index);
        }
        self.live += 1;
        Some(PoolBlock {
            pool: self.id,
            chunk: index,
            slot,
            generation,
        })
    }

    /// Return a block to its chunk.
    ///
    /// Freeing a block twice, a block from another pool, or a stale handle
    /// whose slot has since been handed out again, is fatal.
    pub fn free(&mut self, block: PoolBlock) {
        let index = self.owning_chunk(&block);
        let chunk = &mut self.chunks[index];
        let was_full = !chunk.has_free();
        chunk.headers[block.slot] = BlockHeader::Free {
            next: chunk.free_head,
            generation: block.generation,
        };
        chunk.free_head = Some(block.slot);
        if was_full {
            self.push_free_back(index);
        }
        self.live -= 1;
        self.stats.record_free();
    }

    /// Release every chunk, then the pool itself.
    pub fn destroy(self) {
        tracing::debug!(
            chunks = self.chunks.len(),
            live = self.live,
            "pool destroyed"
        );
        let mut chunks = self.chunks;
        for chunk in chunks.drain(1..) {
            base::release(&mut Some(chunk.data));
        }
    }

    /// Append a chunk twice as large as the last one and link it at the head
    /// of the free-chunks list.
    fn grow(&mut self) -> usize {
        let capacity = self
            .biggest_chunk_size
            .checked_mul(2)
            .unwrap_or_else(|| base::out_of_memory(usize::MAX));
        self.biggest_chunk_size = capacity;
        self.chunks.push(PoolChunk::new(capacity, self.elem_size));
        let index = self.chunks.len() - 1;
        self.push_free_front(index);
        self.stats.record_growth();
        tracing::debug!(chunk = index, capacity, "pool chunk appended");
        index
    }

    /// Resolve the chunk a block belongs to through its header.
    fn owning_chunk(&self, block: &PoolBlock) -> usize {
        assert_eq!(block.pool, self.id, "block belongs to a different pool");
        let header = self
            .chunks
            .get(block.chunk)
            .and_then(|chunk| chunk.headers.get(block.slot));
        match header {
            Some(BlockHeader::Allocated { chunk, generation }) => {
                assert_eq!(
                    *generation, block.generation,
                    "stale pool block (slot reallocated since it was freed)"
                );
                *chunk
            }
            Some(BlockHeader::Free { .. }) => {
                panic!("pool block is not allocated (possible double free?)")
            }
            None => panic!("block does not address a slot of this pool"),
        }
    }

    fn push_free_front(&mut self, index: usize) {
        let old_head = self.free_head;
        let chunk = &mut self.chunks[index];
        chunk.prev_free = None;
        chunk.next_free = old_head;
        match old_head {
            Some(head) => self.chunks[head].prev_free = Some(index),
            None => self.free_tail = Some(index),
        }
        self.free_head = Some(index);
    }

    fn push_free_back(&mut self, index: usize) {
        let old_tail = self.free_tail;
        let chunk = &mut self.chunks[index];
        chunk.prev_free = old_tail;
        chunk.next_free = None;
        match old_tail {
            Some(tail) => self.chunks[tail].next_free = Some(index),
            None => self.free_head = Some(index),
        }
        self.free_tail = Some(index);
    }

    fn unlink_free(&mut self, index: usize) {
        let chunk = &mut self.chunks[index];
        let prev = chunk.prev_free.take();
        let next = chunk.next_free.take();
        match prev {
            Some(prev) => self.chunks[prev].next_free = next,
            None => self.free_head = next,
        }
        match next {
            Some(next) => self.chunks[next].prev_free = prev,
            None => self.free_tail = prev,
        }
    }

    fn slot_range(&self, slot: usize) -> std::ops::Range<usize> {
        let start = slot * self.elem_size;
        start..start + self.elem_size
    }

    /// The bytes of an allocated block (`elem_size` long).
    #[must_use]
    pub fn bytes(&self, block: &PoolBlock) -> &[u8] {
        let index = self.owning_chunk(block);
        let range = self.slot_range(block.slot);
        &self.chunks[index].data.as_bytes()[range]
    }

    /// The bytes of an allocated block, mutably.
    pub fn bytes_mut(&mut self, block: &PoolBlock) -> &mut [u8] {
        let index = self.owning_chunk(block);
        let range = self.slot_range(block.slot);
        &mut self.chunks[index].data.as_bytes_mut()[range]
    }

    /// The chunk a block's header resolves to.
    #[must_use]
    pub fn chunk_of(&self, block: &PoolBlock) -> usize {
        self.owning_chunk(block)
    }

    /// Normalized element size in bytes.
    #[must_use]
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Whether the pool grows on exhaustion.
    #[must_use]
    pub fn is_growable(&self) -> bool {
        self.growable
    }

    /// Slot count of the most recently created chunk.
    #[must_use]
    pub fn biggest_chunk_size(&self) -> usize {
        self.biggest_chunk_size
    }

    /// Number of chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Slot count of chunk `index`.
    #[must_use]
    pub fn chunk_capacity(&self, index: usize) -> Option<usize> {
        self.chunks.get(index).map(|chunk| chunk.capacity)
    }

    /// Never-touched slots left in chunk `index`.
    #[must_use]
    pub fn virgin_slots(&self, index: usize) -> Option<usize> {
        self.chunks
            .get(index)
            .map(|chunk| chunk.capacity - chunk.watermark())
    }

    /// State of chunk `index`.
    #[must_use]
    pub fn chunk_state(&self, index: usize) -> Option<ChunkState> {
        self.chunks.get(index).map(|chunk| {
            if chunk.has_free() {
                ChunkState::HasFree
            } else {
                ChunkState::Full
            }
        })
    }

    /// Chunk indices on the free-chunks list, head first.
    pub fn free_chunks(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.free_head, move |&index| self.chunks[index].next_free)
    }

    /// Total slot count over all chunks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.capacity).sum()
    }

    /// Number of blocks currently allocated.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Snapshot of usage counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}
