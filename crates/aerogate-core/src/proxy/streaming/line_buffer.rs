//! SSE line reassembly.
//!
//! Upstream may split one logical `data:` record across multiple reads or
//! deliver several records in one read. This buffer yields only complete
//! lines and carries any trailing partial line across reads, which makes
//! everything downstream invariant to where chunk boundaries fall.

use bytes::{Buf, BytesMut};

#[derive(Default)]
pub struct SseLineBuffer {
    buf: BytesMut,
}

/// Hard cap on buffered bytes; a single SSE line beyond this aborts the
/// stream rather than growing without bound.
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one read's worth of bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Number of bytes currently buffered (including any partial line).
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Next complete line, without its terminator. `None` until a full line
    /// is buffered. Lines that are not valid UTF-8 are dropped.
    ///
    /// UTF-8 continuation bytes never collide with `\n`, so splitting on the
    /// byte level cannot break a multi-byte character across lines.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let pos = self.buf.iter().position(|&b| b == b'\n')?;
            let line = self.buf.split_to(pos);
            self.buf.advance(1);
            match std::str::from_utf8(&line) {
                Ok(s) => return Some(s.trim_end_matches('\r').to_string()),
                Err(e) => {
                    tracing::warn!("Dropping non-UTF-8 SSE line ({} bytes): {}", line.len(), e);
                    continue;
                }
            }
        }
    }
}
