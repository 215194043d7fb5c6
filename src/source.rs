//! Byte source adapters.

use std::io::{self, Read};

/// Caps every read of the inner source at `chunk` bytes, so a stream can be fed to a
/// scanner in arbitrarily small pieces.
#[derive(Debug)]
pub struct ChunkedReader<R> {
    inner: R,
    chunk: usize,
}

impl<R: Read> ChunkedReader<R> {
    /// `chunk` of 0 is treated as 1.
    pub fn new(inner: R, chunk: usize) -> Self {
        ChunkedReader {
            inner,
            chunk: chunk.max(1),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk);
        self.inner.read(&mut buf[..n])
    }
}
