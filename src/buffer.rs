//! Read buffer used to accumulate bytes from a non-blocking stream until a
//! whole protocol unit can be decoded.

use std::io;
use std::io::Read;

use crate::util::NoBlock;

const DEFAULT_INITIAL_CAPACITY: usize = 8192;

/// Growable buffer with a consumed head and an appended tail. Bytes between
/// `head` and `tail` are available to the decoder; `consume` advances the
/// head only once a decoder has accepted them, so an incomplete decode
/// attempt leaves the buffer untouched.
#[derive(Debug)]
pub struct ReadBuffer<const CHUNK_SIZE: usize = 4096> {
    inner: Vec<u8>,
    head: usize,
    tail: usize,
}

impl<const CHUNK_SIZE: usize> Default for ReadBuffer<CHUNK_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CHUNK_SIZE: usize> ReadBuffer<CHUNK_SIZE> {
    pub fn new() -> Self {
        Self {
            inner: vec![0u8; DEFAULT_INITIAL_CAPACITY.max(CHUNK_SIZE)],
            head: 0,
            tail: 0,
        }
    }

    #[inline]
    pub const fn available(&self) -> usize {
        self.tail - self.head
    }

    /// Unconsumed bytes.
    #[inline]
    pub fn view(&self) -> &[u8] {
        &self.inner[self.head..self.tail]
    }

    /// Marks `len` bytes as consumed. Panics on bounds violation as this
    /// indicates a decoder bug.
    #[inline]
    pub fn consume(&mut self, len: usize) {
        self.head += len;
        assert!(self.head <= self.tail, "bounds violation: head[{}] > tail[{}]", self.head, self.tail);
    }

    /// Performs a single read of up to `CHUNK_SIZE` bytes from the stream,
    /// returning the number of bytes appended. `WouldBlock` surfaces as zero
    /// bytes, end of stream as `UnexpectedEof`.
    pub fn read_from<S: Read>(&mut self, stream: &mut S) -> io::Result<usize> {
        #[cold]
        fn grow(buf: &mut Vec<u8>) {
            buf.resize(buf.len() * 2, 0u8);
        }

        // compact leftover bytes to the front before appending
        if self.head > 0 {
            if self.available() > 0 {
                self.inner.copy_within(self.head..self.tail, 0);
            }
            self.tail -= self.head;
            self.head = 0;
        }

        if self.tail + CHUNK_SIZE > self.inner.len() {
            grow(&mut self.inner);
        }

        let read = stream
            .read(&mut self.inner[self.tail..self.tail + CHUNK_SIZE])
            .no_block()?;
        self.tail += read;
        Ok(read)
    }

    /// Drains the stream of all immediately available bytes, stopping once a
    /// read makes no progress.
    pub fn read_all_from<S: Read>(&mut self, stream: &mut S) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let read = self.read_from(stream)?;
            if read == 0 {
                return Ok(total);
            }
            total += read;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind::{UnexpectedEof, WouldBlock};

    use super::*;

    /// Reader that serves scripted chunks, then reports `WouldBlock`.
    struct ScriptedStream {
        chunks: Vec<Vec<u8>>,
    }

    impl ScriptedStream {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().rev().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(io::Error::from(WouldBlock)),
            }
        }
    }

    #[test]
    fn should_read_and_consume() {
        let mut buf = ReadBuffer::<16>::new();
        let mut stream = ScriptedStream::new(&[b"hello world!"]);

        assert_eq!(12, buf.read_from(&mut stream).unwrap());
        assert_eq!(b"hello world!", buf.view());

        buf.consume(6);
        assert_eq!(6, buf.available());
        assert_eq!(b"world!", buf.view());

        buf.consume(6);
        assert_eq!(0, buf.available());
        assert_eq!(b"", buf.view());
    }

    #[test]
    fn should_append_across_reads() {
        let mut buf = ReadBuffer::<16>::new();
        let mut stream = ScriptedStream::new(&[b"hello ", b"world!"]);

        buf.read_from(&mut stream).unwrap();
        assert_eq!(b"hello ", buf.view());

        buf.read_from(&mut stream).unwrap();
        assert_eq!(b"hello world!", buf.view());
    }

    #[test]
    fn should_compact_leftover_before_next_read() {
        let mut buf = ReadBuffer::<16>::new();
        let mut stream = ScriptedStream::new(&[b"hello ", b"world!"]);

        buf.read_from(&mut stream).unwrap();
        buf.consume(2);
        assert_eq!(b"llo ", buf.view());

        buf.read_from(&mut stream).unwrap();
        assert_eq!(b"llo world!", buf.view());
        assert_eq!(0, buf.head);
        assert_eq!(10, buf.tail);
    }

    #[test]
    fn should_drain_all_available_chunks() {
        let mut buf = ReadBuffer::<16>::new();
        let mut stream = ScriptedStream::new(&[b"hello ", b"world", b"!"]);

        assert_eq!(12, buf.read_all_from(&mut stream).unwrap());
        assert_eq!(b"hello world!", buf.view());
    }

    #[test]
    fn should_report_no_data_as_zero_bytes() {
        let mut buf = ReadBuffer::<16>::new();
        let mut stream = ScriptedStream::new(&[]);

        assert_eq!(0, buf.read_from(&mut stream).unwrap());
        assert_eq!(b"", buf.view());
    }

    #[test]
    fn should_propagate_end_of_stream() {
        struct ClosedStream;

        impl Read for ClosedStream {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Ok(0)
            }
        }

        let mut buf = ReadBuffer::<16>::new();
        assert_eq!(UnexpectedEof, buf.read_from(&mut ClosedStream).unwrap_err().kind());
    }

    #[test]
    fn should_grow_when_appending() {
        let mut buf = ReadBuffer::<8192>::new();
        let payload = vec![0xABu8; 8192];
        let mut stream = ScriptedStream::new(&[&payload, &payload]);

        buf.read_all_from(&mut stream).unwrap();
        assert_eq!(16384, buf.available());
        assert!(buf.inner.len() >= 16384);
    }

    #[test]
    #[should_panic(expected = "bounds violation")]
    fn should_panic_if_bounds_violated_on_consume() {
        let mut buf = ReadBuffer::<16>::new();
        let mut stream = ScriptedStream::new(&[b"hello"]);

        buf.read_from(&mut stream).unwrap();
        buf.consume(32);
    }
}
