//! Cross-crate integration tests for the chunkmem workspace live in `tests/`.
