//! Incremental `text/event-stream` decoder.
//!
//! Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
//! input is buffered until a full line is available. Comment lines (leading
//! `:`) carry the server's keep-alives and are dropped.

use pilot_logging::pilot_warn;

use crate::SseFrame;

const DEFAULT_EVENT: &str = "message";
/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1 << 20;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    /// Dropping the rest of an oversized line.
    skipping: bool,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk and returns every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let end = search_from + offset;
            if !std::mem::take(&mut self.skipping) {
                let line = String::from_utf8_lossy(trim_cr(&self.buffer[start..end])).into_owned();
                if let Some(frame) = self.process_line(&line) {
                    frames.push(frame);
                }
            }
            start = end + 1;
            search_from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            pilot_warn!(
                "event stream line exceeds {} bytes; dropping it",
                MAX_LINE_BYTES
            );
            self.buffer.clear();
            self.scanned = 0;
            self.skipping = true;
        }
        frames
    }

    /// Flushes a trailing frame when the body ends without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if !std::mem::take(&mut self.skipping) && !rest.is_empty() {
            let line = String::from_utf8_lossy(trim_cr(&rest)).into_owned();
            if let Some(frame) = self.process_line(&line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
        })
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::{SseDecoder, MAX_LINE_BYTES};
    use crate::SseFrame;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn named_events_and_keep_alives() {
        let mut decoder = SseDecoder::new();
        let body = concat!(
            "event: status\n",
            "data: {\"data\":{\"status\":\"queued\"}}\n",
            "\n",
            ": keep-alive\n",
            "\n",
            "event: log\r\n",
            "data: {\"data\":{\"step\":1}}\r\n",
            "\r\n",
        );
        assert_eq!(
            decoder.feed(body.as_bytes()),
            vec![
                frame("status", "{\"data\":{\"status\":\"queued\"}}"),
                frame("log", "{\"data\":{\"step\":1}}"),
            ]
        );
    }

    #[test]
    fn frames_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let body = "event: result\ndata: {\"data\":{\"result\":\"Привет\"}}\n\n".as_bytes();
        let mut frames = Vec::new();
        for chunk in body.chunks(3) {
            frames.extend(decoder.feed(chunk));
        }
        assert_eq!(
            frames,
            vec![frame("result", "{\"data\":{\"result\":\"Привет\"}}")]
        );
    }

    #[test]
    fn multi_line_data_is_joined_and_default_name_applies() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: first\ndata:second\nid: 7\n\n");
        assert_eq!(frames, vec![frame("message", "first\nsecond")]);
    }

    #[test]
    fn event_without_data_is_discarded() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: status\n\n").is_empty());
        // The stale event name must not leak into the next frame.
        assert_eq!(decoder.feed(b"data: x\n\n"), vec![frame("message", "x")]);
    }

    #[test]
    fn finish_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: status\ndata: {}").is_empty());
        assert_eq!(decoder.finish(), Some(frame("status", "{}")));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn many_lines_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let body: String = (0..500)
            .map(|step| format!("event: log\ndata: {{\"step\":{step}}}\n\n"))
            .collect();
        let frames = decoder.feed(body.as_bytes());
        assert_eq!(frames.len(), 500);
        assert_eq!(frames[499], frame("log", "{\"step\":499}"));
    }

    #[test]
    fn oversized_line_is_dropped_and_decoding_resumes() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: log\ndata: ").is_empty());
        let filler = vec![b'x'; MAX_LINE_BYTES];
        assert!(decoder.feed(&filler).is_empty());
        assert!(decoder.feed(&filler).is_empty());
        assert_eq!(
            decoder.feed(b"xxx tail\n\nevent: status\ndata: {}\n\n"),
            vec![frame("status", "{}")]
        );
    }
}
