//! Incremental `text/event-stream` decoder.

/// Turns arbitrary byte chunks into event payloads.
///
/// Only the `data` field is kept; `event`, `id` and `retry` are ignored, as
/// are comment lines. Multi-line data is joined with `\n`. An event whose
/// data is empty is dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut completed = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            // a newline byte never occurs inside a multi-byte sequence
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.feed_line(&line) {
                completed.push(payload);
            }
        }
        completed
    }

    fn feed_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            let payload = self.data.join("\n");
            self.data.clear();
            return (!payload.is_empty()).then_some(payload);
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}
