//! Chunked bump arena.
//!
//! Blocks are carved from the current chunk by advancing an offset. A request
//! that does not fit scans the chunks after the current one before a new,
//! larger chunk is appended at the tail. Individual blocks are never freed;
//! [`Arena::reset`] rewinds to the first chunk and keeps every chunk for reuse.

use crate::base::{self, HeapBlock};
use crate::interface::AllocInterface;
use crate::stats::ArenaStats;

/// A fixed-capacity storage segment of an arena.
#[derive(Debug)]
struct ArenaChunk {
    data: HeapBlock,
}

impl ArenaChunk {
    fn new(capacity: usize) -> Self {
        Self {
            data: base::allocate(capacity),
        }
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

/// Handle to a block carved from an [`Arena`].
///
/// Valid until the next [`Arena::reset`]; using it afterwards is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaBlock {
    arena: u64,
    generation: u64,
    chunk: usize,
    offset: usize,
    len: usize,
}

impl ArenaBlock {
    /// Index of the chunk holding the block (0 is the first chunk).
    #[must_use]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Byte offset of the block within its chunk.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Requested size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block was requested with size zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Bump allocator over an append-only list of chunks.
#[derive(Debug)]
pub struct Arena {
    id: u64,
    generation: u64,
    chunks: Vec<ArenaChunk>,
    current: usize,
    offset: usize,
    stats: ArenaStats,
}

impl Arena {
    /// Create an arena whose first chunk holds `initial_capacity` bytes.
    ///
    /// Never fails: heap exhaustion aborts the process.
    #[must_use]
    pub fn new(initial_capacity: usize) -> Self {
        assert!(initial_capacity > 0, "arena capacity must be non-zero");
        tracing::debug!(initial_capacity, "arena created");
        Self {
            id: base::next_allocator_id(),
            generation: 0,
            chunks: vec![ArenaChunk::new(initial_capacity)],
            current: 0,
            offset: 0,
            stats: ArenaStats::default(),
        }
    }

    /// Carve a block of `size` bytes, rounded up to the pointer size.
    pub fn alloc(&mut self, size: usize) -> ArenaBlock {
        let rounded = base::round_to_word(size);
        if self.chunks[self.current].capacity() - self.offset < rounded {
            self.offset = 0;
            self.current = match self.find_later_chunk(rounded) {
                Some(index) => {
                    self.stats.record_reuse();
                    index
                }
                None => self.grow(rounded),
            };
        }

        let block = ArenaBlock {
            arena: self.id,
            generation: self.generation,
            chunk: self.current,
            offset: self.offset,
            len: size,
        };
        self.offset += rounded;
        self.stats.record_alloc(size, rounded);
        block
    }

    /// Carve a block and copy `data` into it.
    pub fn alloc_copy(&mut self, data: &[u8]) -> ArenaBlock {
        let block = self.alloc(data.len());
        self.bytes_mut(&block).copy_from_slice(data);
        block
    }

    /// First chunk after `current` large enough for `rounded` bytes.
    fn find_later_chunk(&self, rounded: usize) -> Option<usize> {
        (self.current + 1..self.chunks.len()).find(|&i| self.chunks[i].capacity() >= rounded)
    }

    /// Append a chunk sized for `rounded` and return its index.
    fn grow(&mut self, rounded: usize) -> usize {
        let last = self.chunks[self.chunks.len() - 1].capacity();
        let capacity = last.saturating_mul(2).max(rounded.saturating_mul(2));
        self.chunks.push(ArenaChunk::new(capacity));
        self.stats.record_growth();
        tracing::debug!(
            chunk = self.chunks.len() - 1,
            capacity,
            request = rounded,
            "arena chunk appended"
        );
        self.chunks.len() - 1
    }

    /// Rewind to the first chunk without releasing anything.
    ///
    /// Every block handed out so far becomes invalid.
    pub fn reset(&mut self) {
        tracing::trace!(
            generation = self.generation,
            chunks = self.chunks.len(),
            "arena reset"
        );
        self.current = 0;
        self.offset = 0;
        self.generation += 1;
        self.stats.record_reset();
    }

    /// Release every chunk, then the arena itself.
    pub fn destroy(self) {
        tracing::debug!(
            chunks = self.chunks.len(),
            capacity = self.capacity(),
            "arena destroyed"
        );
        let mut chunks = self.chunks;
        for chunk in chunks.drain(1..) {
            base::release(&mut Some(chunk.data));
        }
    }

    fn check(&self, block: &ArenaBlock) {
        assert_eq!(block.arena, self.id, "block belongs to a different arena");
        assert_eq!(
            block.generation, self.generation,
            "arena block used after reset"
        );
    }

    /// The bytes of `block`.
    #[must_use]
    pub fn bytes(&self, block: &ArenaBlock) -> &[u8] {
        self.check(block);
        &self.chunks[block.chunk].data.as_bytes()[block.offset..block.offset + block.len]
    }

    /// The bytes of `block`, mutably.
    pub fn bytes_mut(&mut self, block: &ArenaBlock) -> &mut [u8] {
        self.check(block);
        &mut self.chunks[block.chunk].data.as_bytes_mut()[block.offset..block.offset + block.len]
    }

    /// Total capacity of all chunks in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.iter().map(ArenaChunk::capacity).sum()
    }

    /// Number of chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Capacity of chunk `index` in bytes.
    #[must_use]
    pub fn chunk_capacity(&self, index: usize) -> Option<usize> {
        self.chunks.get(index).map(ArenaChunk::capacity)
    }

    /// Index of the chunk allocation currently targets.
    #[must_use]
    pub fn current_chunk(&self) -> usize {
        self.current
    }

    /// Bytes consumed in the current chunk.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Snapshot of usage counters.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }
}

impl AllocInterface for Arena {
    type Block = ArenaBlock;

    fn alloc(&mut self, size: usize) -> ArenaBlock {
        Arena::alloc(self, size)
    }

    fn bytes<'a>(&'a self, block: &'a ArenaBlock) -> &'a [u8] {
        Arena::bytes(self, block)
    }

    fn bytes_mut<'a>(&'a mut self, block: &'a mut ArenaBlock) -> &'a mut [u8] {
        Arena::bytes_mut(self, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::WORD;

    #[test]
    fn arena_create() {
        let arena = Arena::new(1024);
        assert_eq!(arena.capacity(), 1024);
        assert_eq!(arena.chunk_count(), 1);
        assert_eq!(arena.current_chunk(), 0);
        assert_eq!(arena.offset(), 0);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn arena_zero_capacity_is_fatal() {
        let _ = Arena::new(0);
    }

    #[test]
    fn bump_advances_by_rounded_size() {
        let mut arena = Arena::new(256);
        let a = arena.alloc(3);
        let b = arena.alloc(WORD);
        let c = arena.alloc(WORD + 1);
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), WORD);
        assert_eq!(c.offset(), 2 * WORD);
        assert_eq!(arena.offset(), 4 * WORD);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn zero_size_blocks_are_distinct() {
        let mut arena = Arena::new(64);
        let a = arena.alloc(0);
        let b = arena.alloc(0);
        assert!(a.is_empty());
        assert_ne!(a.offset(), b.offset());
        assert!(arena.bytes(&a).is_empty());
    }

    #[test]
    fn blocks_are_writable_and_independent() {
        let mut arena = Arena::new(64);
        let a = arena.alloc_copy(b"first");
        let b = arena.alloc_copy(b"second");
        assert_eq!(arena.bytes(&a), b"first");
        assert_eq!(arena.bytes(&b), b"second");
    }

    #[test]
    fn overflow_appends_doubled_chunk() {
        let mut arena = Arena::new(32);
        let _ = arena.alloc(24);
        let b = arena.alloc(16);
        assert_eq!(arena.chunk_count(), 2);
        assert_eq!(arena.chunk_capacity(1), Some(64));
        assert_eq!(b.chunk(), 1);
        assert_eq!(b.offset(), 0);
        assert_eq!(arena.stats().chunk_growths, 1);
    }

    #[test]
    fn oversized_request_gets_twice_its_size() {
        let mut arena = Arena::new(32);
        let block = arena.alloc(1000);
        let rounded = base::round_to_word(1000);
        assert_eq!(arena.chunk_count(), 2);
        assert_eq!(arena.chunk_capacity(1), Some(rounded * 2));
        assert_eq!(block.chunk(), 1);
    }

    #[test]
    fn reset_rewinds_without_releasing() {
        let mut arena = Arena::new(32);
        let _ = arena.alloc(100);
        let before = arena.capacity();
        arena.reset();
        assert_eq!(arena.current_chunk(), 0);
        assert_eq!(arena.offset(), 0);
        assert_eq!(arena.capacity(), before);
        assert_eq!(arena.chunk_count(), 2);
    }

    #[test]
    fn forward_scan_reuses_later_chunk_after_reset() {
        let mut arena = Arena::new(32);
        let _ = arena.alloc(100);
        arena.reset();
        let block = arena.alloc(100);
        assert_eq!(block.chunk(), 1);
        assert_eq!(arena.chunk_count(), 2);
        assert_eq!(arena.stats().chunk_reuses, 1);
    }

    #[test]
    fn forward_scan_skips_small_chunks() {
        let mut arena = Arena::new(16);
        let _ = arena.alloc(16);
        let _ = arena.alloc(16); // chunk 1: 32 bytes
        let _ = arena.alloc(200); // chunk 2: 400 bytes
        assert_eq!(arena.chunk_count(), 3);
        arena.reset();
        let _ = arena.alloc(16);
        let block = arena.alloc(100);
        assert_eq!(block.chunk(), 2);
        assert_eq!(arena.chunk_count(), 3);
    }

    #[test]
    fn earlier_chunk_with_room_is_not_revisited() {
        let mut arena = Arena::new(64);
        let _ = arena.alloc(64);
        let _ = arena.alloc(100); // chunk 1: 208 bytes, 104 still free
        let _ = arena.alloc(200); // chunk 2: 416 bytes
        let _ = arena.alloc(200);
        assert_eq!(arena.offset(), 400);
        let block = arena.alloc(100);
        assert_eq!(block.chunk(), 3);
        assert_eq!(arena.chunk_count(), 4);
        assert_eq!(arena.chunk_capacity(1), Some(208));
        assert_eq!(arena.chunk_capacity(3), Some(832));
        assert_eq!(arena.stats().chunk_reuses, 0);
    }

    #[test]
    fn reset_is_deterministic() {
        let sizes = [5, 17, 3, 64, 1, 200, 9];
        let mut arena = Arena::new(64);
        let first: Vec<(usize, usize)> = sizes
            .iter()
            .map(|&s| {
                let b = arena.alloc(s);
                (b.chunk(), b.offset())
            })
            .collect();
        arena.reset();
        let second: Vec<(usize, usize)> = sizes
            .iter()
            .map(|&s| {
                let b = arena.alloc(s);
                (b.chunk(), b.offset())
            })
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "used after reset")]
    fn stale_block_is_fatal() {
        let mut arena = Arena::new(64);
        let block = arena.alloc(8);
        arena.reset();
        let _ = arena.bytes(&block);
    }

    #[test]
    #[should_panic(expected = "different arena")]
    fn foreign_block_is_fatal() {
        let mut a = Arena::new(64);
        let b = Arena::new(64);
        let block = a.alloc(8);
        let _ = b.bytes(&block);
    }

    #[test]
    fn destroy_consumes_arena() {
        let mut arena = Arena::new(16);
        let _ = arena.alloc(64);
        let _ = arena.alloc(512);
        assert_eq!(arena.chunk_count(), 3);
        arena.destroy();
    }

    #[test]
    fn stats_track_requests() {
        let mut arena = Arena::new(64);
        let _ = arena.alloc(3);
        let _ = arena.alloc(WORD);
        arena.reset();
        let stats = arena.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.bytes_requested, (3 + WORD) as u64);
        assert_eq!(stats.bytes_reserved, (2 * WORD) as u64);
        assert_eq!(stats.resets, 1);
    }
}
