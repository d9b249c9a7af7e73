//! Decoder for the OCR service's event stream.
//!
//! The response body is a sequence of newline-terminated lines. Lines that
//! start with `data: ` carry a JSON object whose `type` field selects the
//! event. Chunk boundaries from the transport do not line up with lines, so
//! the decoder keeps a residual byte buffer between chunks. Buffering bytes
//! (not text) keeps multi-byte UTF-8 sequences intact across a split.

use std::collections::VecDeque;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::OcrError;

/// Prefix that marks a protocol frame.
pub const FRAME_PREFIX: &str = "data: ";

/// One decoded protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A new page started. `total` is stable for the whole stream.
    PageStart { page: u32, total: u32 },
    /// A fragment of recognized text for the current page.
    Content { text: String },
    /// The current page finished.
    PageEnd,
    /// Final event with the server-side filename and page count.
    Done { filename: String, total_pages: u32 },
}

/// Wire shape of a frame payload, keyed by its `type` field.
///
/// Each variant only reads its own fields; anything else in the object is
/// ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Frame {
    PageStart {
        page: u32,
        total: u32,
    },
    Content {
        text: String,
    },
    PageEnd,
    Done {
        #[serde(default)]
        filename: String,
        total_pages: u32,
    },
    #[serde(other)]
    Unknown,
}

impl Frame {
    fn into_event(self) -> Result<Option<StreamEvent>, String> {
        let event = match self {
            Frame::PageStart { page, total } => {
                if page < 1 || total < 1 {
                    return Err(format!("page_start with page {} of {}", page, total));
                }
                StreamEvent::PageStart { page, total }
            }
            Frame::Content { text } => StreamEvent::Content { text },
            Frame::PageEnd => StreamEvent::PageEnd,
            Frame::Done {
                filename,
                total_pages,
            } => {
                if total_pages < 1 {
                    return Err("done with total_pages 0".to_string());
                }
                StreamEvent::Done {
                    filename,
                    total_pages,
                }
            }
            Frame::Unknown => {
                debug!("Ignoring unknown stream event type");
                return Ok(None);
            }
        };
        Ok(Some(event))
    }
}

/// Parse one complete line.
///
/// Returns `Ok(None)` for lines that are not frames and for unknown event
/// types, and `Err(OcrError::MalformedFrame)` for frames that do not parse.
pub fn parse_line(line: &str) -> Result<Option<StreamEvent>, OcrError> {
    let Some(payload) = line.strip_prefix(FRAME_PREFIX) else {
        return Ok(None);
    };

    let frame: Frame =
        serde_json::from_str(payload).map_err(|e| OcrError::MalformedFrame(e.to_string()))?;

    frame.into_event().map_err(OcrError::MalformedFrame)
}

/// Incremental line framer and event parser.
///
/// Single-use: create a fresh decoder for every response.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    dropped: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(event) = self.decode_line(start, end) {
                events.push(event);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        events
    }

    /// Flush the residual fragment at end-of-stream.
    ///
    /// A final frame without a trailing newline is still decoded.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let end = self.buffer.len();
        let event = if end > 0 { self.decode_line(0, end) } else { None };
        self.buffer.clear();
        event.into_iter().collect()
    }

    /// Number of malformed frames dropped so far.
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }

    fn decode_line(&mut self, start: usize, end: usize) -> Option<StreamEvent> {
        let raw = &self.buffer[start..end];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);

        match parse_line(&line) {
            Ok(event) => event,
            Err(e) => {
                self.dropped += 1;
                warn!("Dropping stream frame: {} ({})", e, line);
                None
            }
        }
    }
}

struct DecodeState<S> {
    chunks: std::pin::Pin<Box<S>>,
    decoder: FrameDecoder,
    pending: VecDeque<StreamEvent>,
    done: bool,
}

/// Turn a stream of byte chunks into a stream of events.
///
/// Chunks are consumed strictly in order. A transport error is yielded once
/// as `OcrError::Transport` and ends the stream.
pub fn decode_stream<S, B, E>(chunks: S) -> impl Stream<Item = Result<StreamEvent, OcrError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let state = DecodeState {
        chunks: Box::pin(chunks),
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.done {
                return None;
            }
            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(OcrError::Transport(e.to_string())), state));
                }
                None => {
                    state.done = true;
                    let events = state.decoder.finish();
                    state.pending.extend(events);
                    if state.decoder.dropped_frames() > 0 {
                        debug!(
                            "Stream ended with {} dropped frame(s)",
                            state.decoder.dropped_frames()
                        );
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        "data: {\"type\": \"page_start\", \"page\": 1, \"total\": 2}\n\n",
        "data: {\"type\": \"content\", \"text\": \"Hel\", \"page\": 1}\n\n",
        "data: {\"type\": \"content\", \"text\": \"lo\", \"page\": 1}\n\n",
        "data: {\"type\": \"page_end\", \"page\": 1}\n\n",
        "data: {\"type\": \"page_start\", \"page\": 2, \"total\": 2}\n\n",
        "data: {\"type\": \"content\", \"text\": \"Wörld ✓\", \"page\": 2}\n\n",
        "data: {\"type\": \"page_end\", \"page\": 2}\n\n",
        "data: {\"type\": \"done\", \"filename\": \"20250101_000000_abcd1234.pdf\", \"total_pages\": 2}\n\n",
    );

    fn decode_whole(input: &[u8]) -> Vec<StreamEvent> {
        let mut decoder = FrameDecoder::new();
        let mut events = decoder.push(input);
        events.extend(decoder.finish());
        events
    }

    fn decode_split(input: &[u8], sizes: &[usize]) -> Vec<StreamEvent> {
        let mut decoder = FrameDecoder::new();
        let mut events = Vec::new();
        let mut rest = input;
        let mut i = 0;
        while !rest.is_empty() {
            let n = sizes[i % sizes.len()].min(rest.len());
            events.extend(decoder.push(&rest[..n]));
            rest = &rest[n..];
            i += 1;
        }
        events.extend(decoder.finish());
        events
    }

    #[test]
    fn mid_frame_split_yields_one_event() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"typ").is_empty());
        let events = decoder.push(b"e\":\"content\",\"text\":\"AB\"}\n");
        assert_eq!(
            events,
            vec![StreamEvent::Content {
                text: "AB".to_string()
            }]
        );
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn chunking_does_not_change_events() {
        let whole = decode_whole(SAMPLE.as_bytes());
        assert_eq!(whole.len(), 8);

        for sizes in [&[1][..], &[2, 5], &[7, 3, 11], &[64], &[13, 1, 1]] {
            assert_eq!(decode_split(SAMPLE.as_bytes(), sizes), whole, "sizes {:?}", sizes);
        }
    }

    #[test]
    fn multibyte_text_split_across_chunks() {
        let events = decode_split(SAMPLE.as_bytes(), &[1]);
        assert!(events.contains(&StreamEvent::Content {
            text: "Wörld ✓".to_string()
        }));
    }

    #[test]
    fn malformed_frame_is_dropped() {
        let input = concat!(
            "data: {not valid json\n",
            "data: {\"type\":\"content\",\"text\":\"ok\"}\n",
        );
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(input.as_bytes());
        assert_eq!(
            events,
            vec![StreamEvent::Content {
                text: "ok".to_string()
            }]
        );
        assert_eq!(decoder.dropped_frames(), 1);
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert!(matches!(
            parse_line("data: {\"type\":\"page_start\",\"page\":1}"),
            Err(OcrError::MalformedFrame(_))
        ));
        assert!(matches!(
            parse_line("data: {\"type\":\"content\"}"),
            Err(OcrError::MalformedFrame(_))
        ));
        assert!(matches!(
            parse_line("data: [1, 2]"),
            Err(OcrError::MalformedFrame(_))
        ));
    }

    #[test]
    fn non_frames_and_unknown_types_are_ignored() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line(": keep-alive").unwrap(), None);
        assert_eq!(parse_line("event: message").unwrap(), None);
        assert_eq!(
            parse_line("data: {\"type\":\"progress\",\"pct\":50}").unwrap(),
            None
        );
    }

    #[test]
    fn fields_of_other_events_are_not_checked() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(concat!(
            "data: {\"type\":\"content\",\"text\":\"AB\",\"page\":\"1\"}\n",
            "data: {\"type\":\"progress\",\"total\":\"50%\"}\n",
            "data: {\"type\":\"page_end\",\"page\":\"one\"}\n",
        ).as_bytes());
        assert_eq!(
            events,
            vec![
                StreamEvent::Content {
                    text: "AB".to_string()
                },
                StreamEvent::PageEnd,
            ]
        );
        assert_eq!(decoder.dropped_frames(), 0);
    }

    #[test]
    fn zero_counts_are_malformed() {
        assert!(matches!(
            parse_line("data: {\"type\":\"page_start\",\"page\":0,\"total\":2}"),
            Err(OcrError::MalformedFrame(_))
        ));
        assert!(matches!(
            parse_line("data: {\"type\":\"done\",\"filename\":\"a.pdf\",\"total_pages\":0}"),
            Err(OcrError::MalformedFrame(_))
        ));
    }

    #[test]
    fn crlf_lines() {
        let events = decode_whole(b"data: {\"type\":\"page_end\"}\r\n\r\n");
        assert_eq!(events, vec![StreamEvent::PageEnd]);
    }

    #[test]
    fn trailing_frame_without_newline_is_flushed() {
        let events = decode_whole(b"data: {\"type\":\"done\",\"filename\":\"a.png\",\"total_pages\":1}");
        assert_eq!(
            events,
            vec![StreamEvent::Done {
                filename: "a.png".to_string(),
                total_pages: 1
            }]
        );
    }

    #[tokio::test]
    async fn decode_stream_preserves_order() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = SAMPLE
            .as_bytes()
            .chunks(9)
            .map(|c| Ok(c.to_vec()))
            .collect();
        let events: Vec<_> = decode_stream(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(events, decode_whole(SAMPLE.as_bytes()));
    }

    #[tokio::test]
    async fn decode_stream_surfaces_transport_error_once() {
        let chunks: Vec<Result<&[u8], String>> = vec![
            Ok(&b"data: {\"type\":\"content\",\"text\":\"a\"}\n"[..]),
            Err("connection reset".to_string()),
            Ok(&b"data: {\"type\":\"content\",\"text\":\"b\"}\n"[..]),
        ];
        let items: Vec<_> = decode_stream(futures::stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Ok(StreamEvent::Content { .. })));
        assert!(matches!(&items[1], Err(OcrError::Transport(msg)) if msg == "connection reset"));
    }
}
