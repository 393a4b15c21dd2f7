//! Property-based tests for size parsing and file loading.

use proptest::prelude::*;

use chunkmem_lib::config::parse_byte_size;
use chunkmem_lib::file::{load_as_string, load_from_reader};
use chunkmem_memory::{Arena, Heap, Pool, PoolAdapter};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Suffixed sizes scale by powers of 1024.
    #[test]
    fn byte_size_suffixes_scale(n in 0usize..1_000_000) {
        prop_assert_eq!(parse_byte_size(&n.to_string()).unwrap(), n);
        prop_assert_eq!(parse_byte_size(&format!("{n}B")).unwrap(), n);
        prop_assert_eq!(parse_byte_size(&format!("{n}K")).unwrap(), n * 1024);
        prop_assert_eq!(parse_byte_size(&format!("{n}M")).unwrap(), n * 1024 * 1024);
    }

    /// Loaded text matches the source and is NUL-terminated in the arena.
    #[test]
    fn arena_load_roundtrips_text(text in "[ -~\n]{0,512}", capacity in 1usize..256) {
        let mut arena = Arena::new(capacity);
        let mut reader = text.as_bytes();
        let loaded = load_from_reader(&mut arena, &mut reader, text.len(), "prop");
        prop_assert!(!loaded.is_truncated());
        prop_assert_eq!(loaded.text(&arena).unwrap(), text.as_str());
        prop_assert_eq!(arena.bytes(loaded.block())[text.len()], 0);
    }

    /// A reader shorter than expected always yields an empty, truncated result.
    #[test]
    fn short_reads_are_flagged(text in "[a-z]{0,64}", missing in 1usize..64) {
        let mut heap = Heap;
        let mut reader = text.as_bytes();
        let loaded = load_from_reader(&mut heap, &mut reader, text.len() + missing, "prop");
        prop_assert!(loaded.is_truncated());
        prop_assert!(loaded.is_empty());
        prop_assert_eq!(loaded.into_block().as_bytes()[0], 0);
    }

    /// Short strings fit in pool slots behind the allocation interface.
    #[test]
    fn pool_adapter_holds_small_texts(text in "[a-z]{0,15}") {
        let mut pool = Pool::new(2, 16, true);
        let mut adapter = PoolAdapter::new(&mut pool);
        let mut reader = text.as_bytes();
        let loaded = load_from_reader(&mut adapter, &mut reader, text.len(), "prop");
        prop_assert_eq!(loaded.text(&adapter).unwrap(), text.as_str());
        let block = loaded.into_block();
        adapter.into_inner().free(block);
        prop_assert_eq!(pool.live(), 0);
    }
}

#[test]
fn missing_path_allocates_nothing() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut arena = Arena::new(64);
    assert!(load_as_string(&mut arena, &dir.path().join("absent.txt")).is_none());
    assert_eq!(arena.chunk_count(), 1);
    assert_eq!(arena.offset(), 0);
}
