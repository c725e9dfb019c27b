use super::{Chunks, ChunksError};

/// The longest line [`Lines`] accepts, not counting the line terminator.
pub const MAX_LINE_LEN: usize = 1024 * 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    LineTooLong,
}

/// A type for reading newline-delimited records from a chunk stream.
///
/// Lines are split on `\n` and a trailing `\r` is dropped. The bytes of
/// a record may arrive across any number of chunks, so lines are kept as
/// raw bytes and left to the caller to decode.
pub struct Lines {
    buf: Vec<u8>,
    // Bytes before this index are known to contain no line feed.
    scanned: usize,
    chunks: Chunks,
    eof: bool,
    max_line_len: usize,
}

impl Lines {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self::with_max_line_len(chunks, MAX_LINE_LEN)
    }

    #[inline]
    pub fn with_max_line_len(chunks: Chunks, max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            chunks,
            eof: false,
            max_line_len,
        }
    }

    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, Error> {
        loop {
            if let Some(line) = self.try_take_line()? {
                return Ok(Some(line));
            }

            // The last line may not be terminated.
            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let mut line = std::mem::take(&mut self.buf);
                self.scanned = 0;
                trim_cr(&mut line);
                return Ok(Some(line));
            }

            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.eof = true,
            }
        }
    }

    fn try_take_line(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let Some(offset) =
            self.buf[self.scanned..].iter().position(|b| *b == b'\n')
        else {
            self.scanned = self.buf.len();
            // One extra byte may be the `\r` of a `\r\n` still in flight.
            if self.buf.len() > self.max_line_len + 1
                || (self.buf.len() == self.max_line_len + 1
                    && self.buf.last() != Some(&b'\r'))
            {
                return Err(Error::LineTooLong);
            }
            return Ok(None);
        };

        let eol_idx = self.scanned + offset;
        let mut line: Vec<u8> = self.buf.drain(..=eol_idx).collect();
        self.scanned = 0;
        line.pop();
        trim_cr(&mut line);
        if line.len() > self.max_line_len {
            return Err(Error::LineTooLong);
        }
        Ok(Some(line))
    }
}

#[inline]
fn trim_cr(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
}
