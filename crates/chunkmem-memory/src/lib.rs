//! # chunkmem-memory
//!
//! Chunked memory management for the `chunkmem` workspace.
//!
//! Provides a fatal-on-exhaustion base heap, a bump arena over a growing
//! chunk list, a fixed-size pool with per-chunk free lists, and the
//! allocation interface that lets consumers stay allocator-agnostic.
#![warn(missing_docs)]

pub mod arena;
pub mod base;
pub mod interface;
pub mod pool;
pub mod stats;

pub use arena::{Arena, ArenaBlock};
pub use base::{Heap, HeapBlock};
pub use interface::{AllocInterface, PoolAdapter};
pub use pool::{ChunkState, Pool, PoolBlock};
pub use stats::{ArenaStats, PoolStats};
