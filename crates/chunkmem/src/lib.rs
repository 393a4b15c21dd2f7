//! chunkmem library: application logic for the allocator workbench.

pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod file;
