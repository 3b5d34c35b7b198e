//! Incremental `text/event-stream` decoding.
//!
//! Only `data` fields matter for the bridge event stream. `id`, `event` and
//! `retry` fields are accepted and ignored, comments are dropped.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk, returning the payloads of all events it
    /// completed. Partial lines are kept until the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut events = vec![];
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(payload) = self.process_line(line) {
                events.push(payload);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }

        if line.starts_with(':') {
            log::trace!("Event stream comment: {line}");
            return None;
        }

        let (field, value) = line
            .split_once(':')
            .map_or((line, ""), |(field, value)| {
                (field, value.strip_prefix(' ').unwrap_or(value))
            });

        if field == "data" {
            self.data.push(value.to_string());
        }

        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }

        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}
