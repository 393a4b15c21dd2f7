//! Report data collected by a workbench run.

use serde::Serialize;

use chunkmem_memory::{Arena, ArenaStats, ChunkState, Pool, PoolStats};

/// One file loaded into an arena.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Path as given on the command line.
    pub path: String,
    /// Bytes of text loaded (0 after a short read).
    pub bytes: usize,
    /// Whether the read came up short.
    pub truncated: bool,
    /// Arena chunk holding the text.
    pub chunk: usize,
    /// Offset of the text within its chunk.
    pub offset: usize,
    /// First line of the text, for display.
    pub first_line: String,
}

/// One step of a pool scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioStep {
    /// What happened, e.g. `alloc #5`.
    pub action: String,
    /// Chunk of the block involved.
    pub chunk: usize,
    /// Slot of the block involved.
    pub slot: usize,
    /// State of that chunk after the step.
    pub chunk_state: ChunkState,
    /// Free-chunks list after the step, head first.
    pub free_chunks: Vec<usize>,
}

/// Arena layout and counters.
#[derive(Debug, Clone, Serialize)]
pub struct ArenaSummary {
    /// Total capacity in bytes.
    pub capacity: usize,
    /// Per-chunk capacities in list order.
    pub chunks: Vec<usize>,
    /// Usage counters.
    pub stats: ArenaStats,
}

impl ArenaSummary {
    /// Summarize an arena.
    #[must_use]
    pub fn of(arena: &Arena) -> Self {
        Self {
            capacity: arena.capacity(),
            chunks: (0..arena.chunk_count())
                .filter_map(|i| arena.chunk_capacity(i))
                .collect(),
            stats: arena.stats(),
        }
    }
}

/// Pool layout and counters.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    /// Normalized element size in bytes.
    pub elem_size: usize,
    /// Per-chunk slot counts in list order.
    pub chunks: Vec<usize>,
    /// Blocks currently allocated.
    pub live: usize,
    /// Usage counters.
    pub stats: PoolStats,
}

impl PoolSummary {
    /// Summarize a pool.
    #[must_use]
    pub fn of(pool: &Pool) -> Self {
        Self {
            elem_size: pool.elem_size(),
            chunks: (0..pool.chunk_count())
                .filter_map(|i| pool.chunk_capacity(i))
                .collect(),
            live: pool.live(),
            stats: pool.stats(),
        }
    }

    /// Total slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.iter().sum()
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Files loaded, in command-line order.
    pub files: Vec<FileEntry>,
    /// Paths that could not be opened.
    pub missing: Vec<String>,
    /// Scenario trace, if one was run.
    pub scenario: Vec<ScenarioStep>,
    /// Arena summary, if an arena was used.
    pub arena: Option<ArenaSummary>,
    /// Pool summary, if a pool was used.
    pub pool: Option<PoolSummary>,
    /// Operations executed by a stress run.
    pub operations: u64,
    /// Wall time of the run in seconds.
    pub elapsed_secs: f64,
}
