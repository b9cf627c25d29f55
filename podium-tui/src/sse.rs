//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; a chunk boundary may fall inside a line,
//! inside a UTF-8 sequence, or between the `\r` and `\n` of a CRLF pair. The
//! decoder buffers partial lines and only interprets complete ones.

use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; empty when the server sent no `event:` field.
    pub event: String,
    pub data: String,
    /// Last event id in effect when the event was dispatched.
    pub id: Option<String>,
}

impl SseEvent {
    /// True for events a plain `message` listener receives.
    pub fn is_message(&self) -> bool {
        self.event.is_empty() || self.event == "message"
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    after_cr: bool,
    bom_checked: bool,
    event_type: String,
    data: String,
    last_event_id: String,
    retry: Option<Duration>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut out = Vec::new();
        for &byte in chunk {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\r' => {
                    self.after_cr = true;
                    self.end_line(&mut out);
                }
                b'\n' => self.end_line(&mut out),
                _ => self.line.push(byte),
            }
        }
        out
    }

    /// Reconnect time suggested by the server's last valid `retry:` field.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    pub fn last_event_id(&self) -> &str {
        &self.last_event_id
    }

    fn end_line(&mut self, out: &mut Vec<SseEvent>) {
        let mut line = std::mem::take(&mut self.line);
        if !self.bom_checked {
            self.bom_checked = true;
            if line.starts_with(BOM) {
                line.drain(..BOM.len());
            }
        }
        let line = String::from_utf8_lossy(&line);
        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                out.push(event);
            }
            return;
        }
        self.process_field(&line);
    }

    fn process_field(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event_type = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = value.to_string();
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event_type.clear();
            return None;
        }
        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        let id = if self.last_event_id.is_empty() {
            None
        } else {
            Some(self.last_event_id.clone())
        };
        Some(SseEvent {
            event: std::mem::take(&mut self.event_type),
            data,
            id,
        })
    }
}

/// Turn a chunked byte stream into the data of every `message` event.
///
/// The returned stream ends when the body ends and yields the body's error
/// as its last item if reading fails.
pub fn message_stream<S, B, E>(body: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send,
    E: Send + 'static,
{
    let state = (body, SseDecoder::new(), VecDeque::<String>::new());
    stream::unfold(Some(state), |state| async move {
        let (mut body, mut decoder, mut ready) = state?;
        loop {
            if let Some(data) = ready.pop_front() {
                return Some((Ok(data), Some((body, decoder, ready))));
            }
            match body.next().await {
                Some(Ok(chunk)) => {
                    let retry_before = decoder.retry();
                    for event in decoder.feed(chunk.as_ref()) {
                        if event.is_message() {
                            ready.push_back(event.data);
                        } else {
                            debug!(event = %event.event, "Ignoring named stream event");
                        }
                    }
                    if decoder.retry() != retry_before {
                        debug!(retry = ?decoder.retry(), "Server suggested retry interval (fixed delay kept)");
                    }
                }
                Some(Err(err)) => return Some((Err(err), None)),
                None => return None,
            }
        }
    })
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_body() -> impl Strategy<Value = String> {
        let line = prop_oneof![
            "[a-z0-9 \\[\\],{}\":]{0,12}".prop_map(|v| format!("data: {v}")),
            Just(": keep-alive".to_string()),
            "[a-z]{1,5}".prop_map(|v| format!("event: {v}")),
            "[0-9]{1,4}".prop_map(|v| format!("retry: {v}")),
            Just(String::new()),
        ];
        let ending = prop_oneof![Just("\n"), Just("\r\n"), Just("\r")];
        prop::collection::vec((line, ending), 0..24).prop_map(|lines| {
            lines
                .into_iter()
                .map(|(line, ending)| format!("{line}{ending}"))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: decoded events do not depend on where chunk boundaries fall
        #[test]
        fn prop_chunking_independent(body in arb_body(), cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8)) {
            let bytes = body.as_bytes();
            let whole = SseDecoder::new().feed(bytes);

            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(bytes.len() + 1)).collect();
            points.sort_unstable();
            points.dedup();

            let mut decoder = SseDecoder::new();
            let mut pieces = Vec::new();
            let mut start = 0;
            for point in points {
                pieces.extend(decoder.feed(&bytes[start..point]));
                start = point;
            }
            pieces.extend(decoder.feed(&bytes[start..]));

            prop_assert_eq!(whole, pieces);
        }
    }
}
