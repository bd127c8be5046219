/// Reassembles server-sent-event frames from arbitrarily split byte chunks.
///
/// Frames are delimited by a blank line, LF or CRLF; a partial frame stays
/// buffered until its terminator arrives.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buffer: String,
}

impl SseBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
    }

    /// Pop the next complete event frame, terminator included.
    pub fn next_event(&mut self) -> Option<String> {
        let (boundary, width) = match (self.buffer.find("\r\n\r\n"), self.buffer.find("\n\n")) {
            (Some(crlf), Some(lf)) if crlf < lf => (crlf, 4),
            (_, Some(lf)) => (lf, 2),
            (Some(crlf), None) => (crlf, 4),
            (None, None) => return None,
        };
        let rest = self.buffer.split_off(boundary + width);
        Some(std::mem::replace(&mut self.buffer, rest))
    }
}

/// Extract the `data: ` payload lines from one event frame.
#[must_use]
pub fn data_payloads(frame: &str) -> Vec<&str> {
    frame
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .collect()
}
