#![no_main]

use libfuzzer_sys::fuzz_target;

use chunkmem_memory::{ChunkState, Pool, PoolBlock};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    // First bytes pick the pool shape, the rest drive alloc/free
    let capacity = usize::from(data[0] % 16) + 1;
    let elem_size = usize::from(data[1] % 64) + 1;
    let growable = data[2] & 1 == 1;

    let mut pool = Pool::new(capacity, elem_size, growable);
    let mut live: Vec<(PoolBlock, u8)> = Vec::new();

    for &byte in &data[3..] {
        if byte & 1 == 0 || live.is_empty() {
            match pool.alloc() {
                Some(block) => {
                    pool.bytes_mut(&block).fill(byte);
                    live.push((block, byte));
                }
                None => assert!(!growable && pool.live() == capacity),
            }
        } else {
            let victim = usize::from(byte >> 1) % live.len();
            let (block, fill) = live.swap_remove(victim);
            // Contents survive unrelated allocs and frees
            assert!(pool.bytes(&block).iter().all(|&b| b == fill));
            pool.free(block);
        }
        assert_eq!(pool.live(), live.len());
    }

    let listed: Vec<usize> = pool.free_chunks().collect();
    for index in 0..pool.chunk_count() {
        let has_free = pool.chunk_state(index) == Some(ChunkState::HasFree);
        assert_eq!(listed.contains(&index), has_free);
    }
    for (block, _) in live {
        pool.free(block);
    }
    pool.destroy();
});
