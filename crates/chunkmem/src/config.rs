//! Application configuration from CLI flags and environment.

use std::path::PathBuf;

use clap::Parser;

use crate::errors::AppError;

/// chunkmem: workbench for chunked arena and pool allocators.
#[derive(Parser, Debug)]
#[command(name = "chunkmem", version, about)]
pub struct AppConfig {
    /// Files to load into the arena.
    pub files: Vec<PathBuf>,

    /// Initial arena capacity (e.g. "64K", "1M").
    #[arg(long, default_value = "1M", env = "CHUNKMEM_ARENA_SIZE")]
    pub arena_size: String,

    /// Initial pool capacity in slots.
    #[arg(long, default_value = "4")]
    pub pool_capacity: usize,

    /// Pool element size in bytes.
    #[arg(long, default_value = "16")]
    pub elem_size: usize,

    /// Refuse allocations instead of growing the pool.
    #[arg(long)]
    pub no_grow: bool,

    /// Run the pool reuse scenario.
    #[arg(long)]
    pub scenario: bool,

    /// Run this many seeded allocate/free operations.
    #[arg(long, default_value = "0")]
    pub stress: u64,

    /// Seed for the stress run.
    #[arg(long, default_value = "1", env = "CHUNKMEM_SEED")]
    pub seed: u64,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (tab-separated essentials only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Initial arena capacity in bytes.
    pub fn arena_bytes(&self) -> Result<usize, AppError> {
        match parse_byte_size(&self.arena_size).map_err(AppError::Config)? {
            0 => Err(AppError::Config("arena size must be non-zero".into())),
            bytes => Ok(bytes),
        }
    }

    /// Reject settings the allocators would treat as fatal.
    pub fn validate(&self) -> Result<(), AppError> {
        self.arena_bytes()?;
        if self.pool_capacity == 0 {
            return Err(AppError::Config("pool capacity must be non-zero".into()));
        }
        if self.elem_size == 0 {
            return Err(AppError::Config("element size must be non-zero".into()));
        }
        Ok(())
    }

    /// Whether any mode was requested explicitly.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.files.is_empty() || self.scenario || self.stress > 0
    }
}

/// Parse a size string such as "8G", "512M", "64K", "100B" or "4096".
pub fn parse_byte_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s, 1)
    };

    let value: usize = num_str
        .trim()
        .parse()
        .map_err(|e| format!("invalid size {s:?}: {e}"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size {s:?} overflows"))
}
