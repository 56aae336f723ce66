use std::collections::VecDeque;

/// Circular buffer that reassembles event frames across read boundaries.
///
/// A frame ends at a blank line (`\n\n`, or `\r\n\r\n`). Bytes after the last
/// terminator stay buffered until the next `extend`.
pub struct CircularFrameBuffer {
    buffer: VecDeque<u8>,
    /// Bytes already searched without finding a terminator
    scanned: usize,
}

/// Longest terminator is `\r\n\r\n`; a match may start this many bytes
/// before the end of the previous scan.
const MAX_TERMINATOR: usize = 4;

impl CircularFrameBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            scanned: 0,
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete frame, without its terminator.
    ///
    /// Returns None if no complete frame is available. Frame text is returned
    /// verbatim; whitespace inside the frame is never trimmed.
    pub fn next_frame(&mut self) -> Option<String> {
        let from = self.scanned.saturating_sub(MAX_TERMINATOR - 1);
        let bytes = self.buffer.make_contiguous();
        let Some((end, terminator_len)) = find_terminator(bytes, from) else {
            self.scanned = bytes.len();
            return None;
        };
        self.scanned = 0;

        let frame_bytes: Vec<u8> = self.buffer.drain(..end + terminator_len).take(end).collect();

        Some(String::from_utf8_lossy(&frame_bytes).into_owned())
    }

    /// Take whatever unterminated bytes remain (used when the transport closes).
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        self.scanned = 0;
        let rest: Vec<u8> = self.buffer.drain(..).collect();
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn find_terminator(bytes: &[u8], from: usize) -> Option<(usize, usize)> {
    (from..bytes.len()).find_map(|i| {
        let rest = &bytes[i..];
        if rest.starts_with(b"\n\n") {
            Some((i, 2))
        } else if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else {
            None
        }
    })
}
