//! Server-Sent Events (SSE) wire decoder.

/// One dispatched SSE event.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseFrame {
    /// Unnamed events, an empty `event:` and `event: message` reach a
    /// subscriber's message handler; named events do not.
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("") | Some("message"))
    }
}

/// Longest line kept while waiting for its terminator.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Incremental decoder over raw body chunks.
///
/// Lines end at `\r\n`, `\n` or a bare `\r`. They are split before UTF-8
/// decoding, so a chunk boundary inside a multi-byte character is harmless.
/// A line that grows past [`MAX_LINE_BYTES`] is dropped together with the
/// event it belongs to.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    current: SseFrame,
    // previous line ended in `\r`; a leading `\n` completes that terminator
    skip_lf: bool,
    discarding: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk and return every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        let mut rest = chunk;

        while !rest.is_empty() {
            if std::mem::take(&mut self.skip_lf) && rest[0] == b'\n' {
                rest = &rest[1..];
                continue;
            }
            let Some(pos) = rest.iter().position(|byte| matches!(*byte, b'\r' | b'\n')) else {
                self.buffer(rest);
                break;
            };
            self.skip_lf = rest[pos] == b'\r';
            if std::mem::take(&mut self.discarding) {
                self.pending.clear();
            } else {
                self.pending.extend_from_slice(&rest[..pos]);
                let raw = std::mem::take(&mut self.pending);
                let line = String::from_utf8_lossy(&raw);
                self.process_line(&line, &mut frames);
            }
            rest = &rest[pos + 1..];
        }

        frames
    }

    fn buffer(&mut self, partial: &[u8]) {
        if self.discarding {
            return;
        }
        self.pending.extend_from_slice(partial);
        if self.pending.len() > MAX_LINE_BYTES {
            tracing::debug!(bytes = self.pending.len(), "dropping oversized sse line");
            self.pending = Vec::new();
            self.current = SseFrame::default();
            self.discarding = true;
        }
    }

    fn process_line(&mut self, line: &str, frames: &mut Vec<SseFrame>) {
        if line.is_empty() {
            let frame = std::mem::take(&mut self.current);
            if !frame.data.is_empty() {
                frames.push(frame);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.current.event = Some(value.to_string()),
            "data" => {
                if !self.current.data.is_empty() {
                    self.current.data.push('\n');
                }
                self.current.data.push_str(value);
            }
            "id" => self.current.id = Some(value.to_string()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_multiline_data() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: {\"a\":\ndata: 1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"a\":\n1}");
        assert!(frames[0].is_message());
    }

    #[test]
    fn skips_comments_and_tags_named_events() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b": keepalive\r\nevent: status\r\ndata: hi\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("status"));
        assert!(!frames[0].is_message());
    }

    #[test]
    fn empty_event_name_is_a_message() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"event:\ndata: {\"n\":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some(""));
        assert!(frames[0].is_message());
    }

    #[test]
    fn bare_carriage_returns_end_lines() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: x\r\rdata: y\r\r");
        let data: Vec<_> = frames.iter().map(|frame| frame.data.as_str()).collect();
        assert_eq!(data, vec!["x", "y"]);
    }

    #[test]
    fn crlf_split_across_chunks_is_one_terminator() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: a\r").is_empty());
        let frames = decoder.feed(b"\ndata: b\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn oversized_line_is_dropped_with_its_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: head\ndata: ").is_empty());
        assert!(decoder.feed(&vec![b'x'; MAX_LINE_BYTES]).is_empty());
        assert!(decoder.feed(&vec![b'x'; 1024]).is_empty());

        let frames = decoder.feed(b"tail\n\ndata: ok\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "ok");
    }

    #[test]
    fn survives_chunk_split_inside_utf8_character() {
        let payload = "data: {\"station\":\"Zürich\"}\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = SseDecoder::new();

        assert!(decoder.feed(&payload[..split]).is_empty());
        let frames = decoder.feed(&payload[split..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"station\":\"Zürich\"}");
    }

    #[test]
    fn events_without_data_are_not_dispatched() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"id: 7\n\ndata: ok\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "ok");
        assert_eq!(frames[0].id, None);
    }
}
