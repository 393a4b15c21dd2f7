//! Uniform allocation interface.
//!
//! Generic consumers (file loading, buffer growth) take any `AllocInterface`
//! and stay agnostic of whether memory comes from the heap or an arena.

use crate::pool::{Pool, PoolBlock};

/// An allocator that hands out `size`-byte blocks.
pub trait AllocInterface {
    /// Handle to an allocated block.
    type Block;

    /// Allocate a block of at least `size` bytes.
    ///
    /// Never fails: exhaustion is fatal.
    fn alloc(&mut self, size: usize) -> Self::Block;

    /// The bytes of `block`.
    fn bytes<'a>(&'a self, block: &'a Self::Block) -> &'a [u8];

    /// The bytes of `block`, mutably.
    fn bytes_mut<'a>(&'a mut self, block: &'a mut Self::Block) -> &'a mut [u8];
}

impl<A: AllocInterface + ?Sized> AllocInterface for &mut A {
    type Block = A::Block;

    fn alloc(&mut self, size: usize) -> Self::Block {
        (**self).alloc(size)
    }

    fn bytes<'a>(&'a self, block: &'a Self::Block) -> &'a [u8] {
        (**self).bytes(block)
    }

    fn bytes_mut<'a>(&'a mut self, block: &'a mut Self::Block) -> &'a mut [u8] {
        (**self).bytes_mut(block)
    }
}

/// Adapts a [`Pool`] to the sized allocation interface.
///
/// Requests larger than the pool's element size, and exhaustion of a
/// non-growable pool, are fatal here because the interface cannot signal
/// failure. Callers that need the exhaustion signal use the pool directly.
pub struct PoolAdapter<'p> {
    pool: &'p mut Pool,
}

impl<'p> PoolAdapter<'p> {
    /// Wrap a pool.
    pub fn new(pool: &'p mut Pool) -> Self {
        Self { pool }
    }

    /// Give the pool back, e.g. to free blocks.
    pub fn into_inner(self) -> &'p mut Pool {
        self.pool
    }
}

impl AllocInterface for PoolAdapter<'_> {
    type Block = PoolBlock;

    fn alloc(&mut self, size: usize) -> PoolBlock {
        assert!(
            size <= self.pool.elem_size(),
            "request of {size} bytes exceeds pool element size {}",
            self.pool.elem_size()
        );
        match self.pool.alloc() {
            Some(block) => block,
            None => panic!("pool exhausted behind the allocation interface"),
        }
    }

    fn bytes<'a>(&'a self, block: &'a PoolBlock) -> &'a [u8] {
        self.pool.bytes(block)
    }

    fn bytes_mut<'a>(&'a mut self, block: &'a mut PoolBlock) -> &'a mut [u8] {
        self.pool.bytes_mut(block)
    }
}
