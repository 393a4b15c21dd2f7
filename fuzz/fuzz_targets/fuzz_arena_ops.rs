#![no_main]

use libfuzzer_sys::fuzz_target;

use chunkmem_memory::base::WORD;
use chunkmem_memory::Arena;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let mut arena = Arena::new(usize::from(data[0]) + 1);
    let mut blocks = Vec::new();

    for pair in data[1..].chunks(2) {
        // 0xFF resets, anything else is a request size
        if pair[0] == 0xFF {
            arena.reset();
            blocks.clear();
            continue;
        }
        let size = usize::from(pair[0]) * usize::from(pair.get(1).copied().unwrap_or(1));
        let before = arena.capacity();
        let block = arena.alloc(size);
        assert!(arena.capacity() >= before);
        assert_eq!(block.offset() % WORD, 0);
        assert_eq!(arena.bytes(&block).len(), size);
        blocks.push(block);
    }

    // Blocks in the same chunk never overlap
    for (i, a) in blocks.iter().enumerate() {
        for b in &blocks[i + 1..] {
            if a.chunk() == b.chunk() {
                assert!(a.offset() + a.len() <= b.offset() || b.offset() + b.len() <= a.offset());
            }
        }
    }
    arena.destroy();
});
