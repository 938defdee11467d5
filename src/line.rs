//! Incremental line reading with bounded memory per line.

use std::io::{self, BufRead};

/// Maximum number of bytes recorded for a single line.
///
/// Bytes past this point are consumed from the source but not stored.
pub const MAX_LINE_LEN: usize = 20_000;

/// Base added to every capacity increase of the line buffer.
pub const INITIAL_LINE_CAP: usize = 20;

/// Error type for line reading.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The line buffer could not be grown
    #[error("out of memory while growing the line buffer")]
    Alloc,
    /// The underlying stream failed (not a plain end of stream)
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Outcome of a successful [`BoundedLineReader::read_line`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line was read; its bytes are available through
    /// [`BoundedLineReader::line`].
    Line,
    /// The stream ended before any byte of a new line was read.
    EndOfStream,
}

/// Capacity the line buffer grows to once `len` bytes fill it.
///
/// About 1.5x amortized growth, starting at [`INITIAL_LINE_CAP`].
#[inline]
pub fn grown_capacity(len: usize) -> usize {
    INITIAL_LINE_CAP
        .saturating_add(len)
        .saturating_add(len / 2)
}

/// Reads lines of raw bytes into a single reusable buffer.
///
/// Lines are split on `\n`, which is never stored. A line longer than
/// [`MAX_LINE_LEN`] is truncated: the rest of it is read and dropped, and
/// the next read starts after its terminator.
///
/// ## Example
///
/// ```rust
/// use std::io::Cursor;
/// use tmv::{BoundedLineReader, ReadOutcome};
///
/// let mut source = Cursor::new(b"---\nAA\n".to_vec());
/// let mut reader = BoundedLineReader::new();
///
/// assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
/// assert_eq!(reader.line(), b"---");
/// assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
/// assert_eq!(reader.line(), b"AA");
/// assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::EndOfStream);
/// ```
#[derive(Clone, Debug)]
pub struct BoundedLineReader {
    /// Bytes of the current line (at most `max_len`)
    buf: Vec<u8>,
    /// Logical capacity following the growth policy
    cap: usize,
    /// Recording limit for one line
    max_len: usize,
}

impl Default for BoundedLineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundedLineReader {
    /// Create a reader recording at most [`MAX_LINE_LEN`] bytes per line.
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a reader with a custom per-line recording limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            cap: 0,
            max_len,
        }
    }

    /// Bytes of the most recently read line, without its terminator.
    #[inline]
    pub fn line(&self) -> &[u8] {
        &self.buf
    }

    /// Number of recorded bytes in the current line.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the current line has no recorded bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Logical capacity of the line buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Per-line recording limit.
    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Copy the current line out of the reader.
    pub fn take_line(&self) -> Vec<u8> {
        self.buf.clone()
    }

    /// Read the next line from `source`.
    ///
    /// Returns [`ReadOutcome::EndOfStream`] only when the stream is
    /// exhausted before any byte is read. A final line without a terminator
    /// is still returned as a line.
    ///
    /// On error the buffer is released and the reader is left empty but
    /// usable.
    pub fn read_line<R: BufRead + ?Sized>(
        &mut self,
        source: &mut R,
    ) -> Result<ReadOutcome, ReadError> {
        match self.fill_line(source) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.release();
                Err(err)
            }
        }
    }

    fn fill_line<R: BufRead + ?Sized>(
        &mut self,
        source: &mut R,
    ) -> Result<ReadOutcome, ReadError> {
        self.buf.clear();
        let mut seen_any = false;

        loop {
            let available = source.fill_buf()?;
            if available.is_empty() {
                return Ok(if seen_any {
                    ReadOutcome::Line
                } else {
                    ReadOutcome::EndOfStream
                });
            }
            seen_any = true;

            let (chunk, used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..pos], pos + 1, true),
                None => (available, available.len(), false),
            };

            let room = self.max_len.saturating_sub(self.buf.len());
            let keep = &chunk[..chunk.len().min(room)];
            if !keep.is_empty() {
                Self::reserve(&mut self.buf, &mut self.cap, keep.len())?;
                self.buf.extend_from_slice(keep);
            }

            source.consume(used);
            if done {
                return Ok(ReadOutcome::Line);
            }
        }
    }

    /// Grow `buf` by the 1.5x policy until `additional` more bytes fit.
    fn reserve(buf: &mut Vec<u8>, cap: &mut usize, additional: usize) -> Result<(), ReadError> {
        let needed = buf.len() + additional;
        if needed <= *cap {
            return Ok(());
        }

        let mut new_cap = *cap;
        while new_cap < needed {
            new_cap = grown_capacity(new_cap);
        }
        buf.try_reserve_exact(new_cap - buf.len())
            .map_err(|_| ReadError::Alloc)?;
        *cap = new_cap;
        Ok(())
    }

    /// Drop the buffer and return to the initial empty state.
    fn release(&mut self) {
        self.buf = Vec::new();
        self.cap = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{BufReader, Cursor, Read};

    fn read_all(input: &[u8], max_len: usize) -> Vec<Vec<u8>> {
        let mut source = Cursor::new(input.to_vec());
        let mut reader = BoundedLineReader::with_max_len(max_len);
        let mut lines = Vec::new();
        while reader.read_line(&mut source).unwrap() == ReadOutcome::Line {
            lines.push(reader.take_line());
        }
        lines
    }

    /// Fails after handing out `ok` bytes.
    struct FailingReader {
        ok: Vec<u8>,
        pos: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos < self.ok.len() {
                let n = buf.len().min(self.ok.len() - self.pos);
                buf[..n].copy_from_slice(&self.ok[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            } else {
                Err(io::Error::other("device gone"))
            }
        }
    }

    #[test]
    fn test_splits_lines() {
        let lines = read_all(b"---\nAA\n\nBB\n", MAX_LINE_LEN);
        assert_eq!(lines, vec![b"---".to_vec(), b"AA".to_vec(), b"".to_vec(), b"BB".to_vec()]);
    }

    #[test]
    fn test_last_line_without_terminator() {
        let lines = read_all(b"AA\nBB", MAX_LINE_LEN);
        assert_eq!(lines, vec![b"AA".to_vec(), b"BB".to_vec()]);
    }

    #[test]
    fn test_empty_stream() {
        let mut source = Cursor::new(Vec::new());
        let mut reader = BoundedLineReader::new();
        assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::EndOfStream);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_truncates_long_line_and_resumes() {
        let mut input = vec![b'x'; 50];
        input.extend_from_slice(b"\nnext\n");
        let lines = read_all(&input, 8);
        assert_eq!(lines, vec![vec![b'x'; 8], b"next".to_vec()]);
    }

    #[test]
    fn test_truncation_across_small_buffer_chunks() {
        let mut input = vec![b'y'; 100];
        input.extend_from_slice(b"\nz\n");
        let mut source = BufReader::with_capacity(3, Cursor::new(input));
        let mut reader = BoundedLineReader::with_max_len(10);

        assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
        assert_eq!(reader.line(), &[b'y'; 10][..]);
        assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
        assert_eq!(reader.line(), b"z");
    }

    #[test]
    fn test_growth_policy() {
        assert_eq!(grown_capacity(0), 20);
        assert_eq!(grown_capacity(20), 50);
        assert_eq!(grown_capacity(50), 95);
    }

    #[test]
    fn test_capacity_follows_policy() {
        let mut source = Cursor::new(vec![b'a'; 60]);
        let mut reader = BoundedLineReader::new();
        reader.read_line(&mut source).unwrap();
        // 0 -> 20 -> 50 -> 95
        assert_eq!(reader.capacity(), 95);
        assert_eq!(reader.len(), 60);
    }

    #[test]
    fn test_stream_error_resets_reader() {
        let mut reader = BoundedLineReader::new();
        let mut good = Cursor::new(b"hello\n".to_vec());
        reader.read_line(&mut good).unwrap();
        assert!(reader.capacity() > 0);

        let mut source = BufReader::new(FailingReader {
            ok: b"partial".to_vec(),
            pos: 0,
        });
        let err = reader.read_line(&mut source).unwrap_err();
        assert!(matches!(err, ReadError::Io(_)));
        assert!(reader.is_empty());
        assert_eq!(reader.capacity(), 0);

        // Still usable afterwards
        let mut again = Cursor::new(b"ok\n".to_vec());
        assert_eq!(reader.read_line(&mut again).unwrap(), ReadOutcome::Line);
        assert_eq!(reader.line(), b"ok");
    }

    #[test]
    fn test_real_limit_truncates_long_line() {
        let mut input = vec![b'q'; 25_000];
        input.extend_from_slice(b"\nshort\n");
        let mut source = Cursor::new(input);
        let mut reader = BoundedLineReader::new();

        assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
        assert_eq!(reader.len(), MAX_LINE_LEN);
        assert!(reader.line().iter().all(|&b| b == b'q'));
        assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
        assert_eq!(reader.line(), b"short");
    }

    #[test]
    fn test_reserve_reports_alloc_failure() {
        let mut buf = Vec::new();
        let mut cap = 0;
        let err = BoundedLineReader::reserve(&mut buf, &mut cap, usize::MAX / 2 + 10).unwrap_err();
        assert!(matches!(err, ReadError::Alloc));
        assert_eq!(cap, 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_reader_usable_after_alloc_failure() {
        let mut reader = BoundedLineReader::new();
        let mut source = Cursor::new(b"first\nsecond\n".to_vec());
        reader.read_line(&mut source).unwrap();
        let cap = reader.capacity();

        let err = BoundedLineReader::reserve(&mut reader.buf, &mut reader.cap, usize::MAX / 2 + 10)
            .unwrap_err();
        assert!(matches!(err, ReadError::Alloc));
        assert_eq!(reader.capacity(), cap);

        reader.release();
        assert_eq!(reader.capacity(), 0);
        assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
        assert_eq!(reader.line(), b"second");
    }

    proptest! {
        #[test]
        fn recorded_length_never_exceeds_limit(
            lines in proptest::collection::vec(
                proptest::collection::vec(any::<u8>().prop_filter("no newline", |b| *b != b'\n'), 0..300),
                1..8,
            ),
            max_len in 1usize..64,
        ) {
            let mut input = Vec::new();
            for line in &lines {
                input.extend_from_slice(line);
                input.push(b'\n');
            }

            let read = read_all(&input, max_len);
            prop_assert_eq!(read.len(), lines.len());
            for (got, want) in read.iter().zip(&lines) {
                prop_assert!(got.len() <= max_len);
                prop_assert_eq!(&got[..], &want[..want.len().min(max_len)]);
            }
        }

        #[test]
        fn growth_preserves_bytes(
            line in proptest::collection::vec(any::<u8>().prop_filter("no newline", |b| *b != b'\n'), 0..2000),
            chunk in 1usize..17,
        ) {
            let mut input = line.clone();
            input.push(b'\n');
            let mut source = BufReader::with_capacity(chunk, Cursor::new(input));
            let mut reader = BoundedLineReader::new();

            prop_assert_eq!(reader.read_line(&mut source).unwrap(), ReadOutcome::Line);
            prop_assert_eq!(reader.line(), &line[..]);
            prop_assert!(reader.capacity() >= line.len());
        }
    }
}
