//! Bounded line reader
//!
//! Splits an async byte stream into UTF-8 lines. Lines longer than the
//! configured limit and invalid UTF-8 are reported as `InvalidData` errors,
//! which callers treat like any other read failure.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Reads newline-terminated UTF-8 lines from an async stream
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    max_line_length: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Create a reader with the given maximum line length
    pub fn new(reader: R, max_line_length: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
            max_line_length,
        }
    }

    /// Read the next line without its terminator
    ///
    /// Returns `Ok(None)` at end of stream. A trailing line without a
    /// newline is still returned before end of stream.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();

        // Room for the longest allowed line plus "\r\n"
        let limit = self.max_line_length as u64 + 2;
        let n = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        } else if n as u64 == limit {
            return Err(self.too_long());
        }

        if self.buf.len() > self.max_line_length {
            return Err(self.too_long());
        }

        String::from_utf8(std::mem::take(&mut self.buf))
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn too_long(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", self.max_line_length),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_lines_and_strips_terminators() {
        let input: &[u8] = b"hello\nworld\r\n\nlast";
        let mut reader = LineReader::new(input, 64);

        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("world"));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(reader.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let input: &[u8] = b"abcd\r\nabcd\n";
        let mut reader = LineReader::new(input, 4);

        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("abcd"));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("abcd"));
    }

    #[tokio::test]
    async fn test_line_over_limit_is_rejected() {
        let input: &[u8] = b"abcdefgh\n";
        let mut reader = LineReader::new(input, 4);

        let err = reader.next_line().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_one_byte_over_limit_with_newline_is_rejected() {
        let input: &[u8] = b"abcde\n";
        let mut reader = LineReader::new(input, 4);

        assert!(reader.next_line().await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_rejected() {
        let input: &[u8] = b"\xff\xfe\n";
        let mut reader = LineReader::new(input, 64);

        let err = reader.next_line().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let input: &[u8] = b"";
        let mut reader = LineReader::new(input, 64);

        assert_eq!(reader.next_line().await.unwrap(), None);
    }
}
