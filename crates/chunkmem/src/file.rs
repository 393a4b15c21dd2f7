//! Whole-file loading through the allocation interface.
//!
//! The file is read into one block obtained from any [`AllocInterface`] and
//! NUL-terminated. A short read leaves an empty string in the block and sets
//! [`LoadedText::is_truncated`], so callers can tell it apart from an empty
//! file.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use chunkmem_memory::AllocInterface;

/// File contents held in an allocator block.
#[derive(Debug)]
pub struct LoadedText<B> {
    block: B,
    len: usize,
    truncated: bool,
}

impl<B> LoadedText<B> {
    /// The block holding the text and its terminator.
    pub fn block(&self) -> &B {
        &self.block
    }

    /// Length of the text, excluding the terminator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the read came up short and the contents were discarded.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The text bytes, excluding the terminator.
    pub fn bytes<'a, A>(&'a self, alloc: &'a A) -> &'a [u8]
    where
        A: AllocInterface<Block = B>,
    {
        &alloc.bytes(&self.block)[..self.len]
    }

    /// The text as UTF-8.
    pub fn text<'a, A>(&'a self, alloc: &'a A) -> Result<&'a str, std::str::Utf8Error>
    where
        A: AllocInterface<Block = B>,
    {
        std::str::from_utf8(self.bytes(alloc))
    }

    /// Give up the wrapper and keep the block.
    pub fn into_block(self) -> B {
        self.block
    }
}

/// Load the file at `path` into a block from `alloc`.
///
/// Returns `None` if the file cannot be opened.
pub fn load_as_string<A: AllocInterface>(
    alloc: &mut A,
    path: &Path,
) -> Option<LoadedText<A::Block>> {
    let opened = File::open(path).and_then(|file| {
        let len = file.metadata()?.len();
        Ok((file, len))
    });
    let (mut file, len) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot open file");
            return None;
        }
    };
    let Ok(expected) = usize::try_from(len) else {
        tracing::warn!(path = %path.display(), len, "file too large to load");
        return None;
    };
    Some(load_from_reader(
        alloc,
        &mut file,
        expected,
        &path.display().to_string(),
    ))
}

/// Read `expected` bytes from `reader` into a fresh NUL-terminated block.
pub fn load_from_reader<A: AllocInterface, R: Read>(
    alloc: &mut A,
    reader: &mut R,
    expected: usize,
    label: &str,
) -> LoadedText<A::Block> {
    let mut block = alloc.alloc(expected.saturating_add(1));
    let buf = alloc.bytes_mut(&mut block);
    let filled = read_fully(reader, &mut buf[..expected]);
    let truncated = filled != expected;
    if truncated {
        tracing::warn!(
            file = label,
            expected,
            read = filled,
            "couldn't read whole file"
        );
        buf[0] = 0;
    } else {
        buf[expected] = 0;
    }
    LoadedText {
        block,
        len: if truncated { 0 } else { expected },
        truncated,
    }
}

fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::debug!(error = %e, filled, "read failed");
                break;
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkmem_memory::{Arena, Heap};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn load_into_arena_is_nul_terminated() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "test.vs", b"#version 330 core\nvoid main() {}\n");
        let mut arena = Arena::new(1024);
        let loaded = load_as_string(&mut arena, &path).unwrap();
        assert!(!loaded.is_truncated());
        assert_eq!(loaded.len(), 33);
        assert!(loaded.text(&arena).unwrap().starts_with("#version 330"));
        let raw = arena.bytes(loaded.block());
        assert_eq!(raw.len(), 34);
        assert_eq!(raw[33], 0);
    }

    #[test]
    fn load_into_heap() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"abc");
        let mut heap = Heap;
        let loaded = load_as_string(&mut heap, &path).unwrap();
        assert_eq!(loaded.text(&heap).unwrap(), "abc");
        let block = loaded.into_block();
        assert_eq!(block.as_bytes(), b"abc\0");
    }

    #[test]
    fn empty_file_is_not_truncated() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.txt", b"");
        let mut arena = Arena::new(64);
        let loaded = load_as_string(&mut arena, &path).unwrap();
        assert!(loaded.is_empty());
        assert!(!loaded.is_truncated());
    }

    #[test]
    fn missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let mut arena = Arena::new(64);
        assert!(load_as_string(&mut arena, &dir.path().join("nope.fs")).is_none());
        assert_eq!(arena.stats().allocations, 0);
    }

    #[test]
    fn short_read_leaves_empty_string() {
        let mut arena = Arena::new(64);
        let mut reader: &[u8] = b"only";
        let loaded = load_from_reader(&mut arena, &mut reader, 10, "short");
        assert!(loaded.is_truncated());
        assert!(loaded.is_empty());
        assert_eq!(loaded.text(&arena).unwrap(), "");
        assert_eq!(arena.bytes(loaded.block())[0], 0);
    }

    #[test]
    fn reader_longer_than_expected_stops_at_expected() {
        let mut heap = Heap;
        let mut reader: &[u8] = b"abcdef";
        let loaded = load_from_reader(&mut heap, &mut reader, 3, "long");
        assert_eq!(loaded.text(&heap).unwrap(), "abc");
    }

    #[test]
    fn files_share_one_arena() {
        let dir = TempDir::new().unwrap();
        let vs = write_file(&dir, "test.vs", b"vertex");
        let fs = write_file(&dir, "test.fs", b"fragment");
        let mut arena = Arena::new(1024);
        let a = load_as_string(&mut arena, &vs).unwrap();
        let b = load_as_string(&mut arena, &fs).unwrap();
        assert_eq!(a.text(&arena).unwrap(), "vertex");
        assert_eq!(b.text(&arena).unwrap(), "fragment");
        assert_eq!(a.block().chunk(), b.block().chunk());
        assert!(b.block().offset() > a.block().offset());
    }
}
