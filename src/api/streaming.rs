//! Live updates over server-sent events.
//!
//! The server keeps one long-lived response open and writes frames of the
//! form
//!
//! ```text
//! event: update
//! data: {"id":"110", ...}
//!
//! ```
//!
//! interleaved with `:thump` keep-alive comments. [`SseDecoder`] turns the
//! raw byte chunks into frames and [`decode_frame`] maps frames onto
//! [`LiveEvent`]s. Frames we do not understand are logged and skipped.

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};

use super::ApiError;
use crate::model::{ItemId, Notification, Post};
use crate::timeline::LiveEvent;

/// How long to wait for the server to accept the subscription. The body
/// itself has no deadline.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental server-sent event parser.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; incomplete lines
/// are buffered until the next chunk arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk, returning every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = text.strip_suffix('\r').unwrap_or(&text);
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        // Comment (keep-alive)
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
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// Map a frame from the user stream onto a live event.
///
/// Returns `None` for event kinds the timeline does not act on and for
/// payloads that fail to decode.
pub fn decode_frame(frame: SseFrame) -> Option<LiveEvent> {
    match frame.event.as_str() {
        "update" => decode_post(&frame).map(LiveEvent::Insert),
        "status.update" => decode_post(&frame).map(LiveEvent::Edit),
        "delete" => {
            let id = frame.data.trim();
            if id.is_empty() {
                tracing::warn!("Delete event without an id");
                return None;
            }
            Some(LiveEvent::Delete(ItemId::from(id)))
        }
        "notification" => match serde_json::from_str::<Notification>(&frame.data) {
            Ok(notification) => Some(LiveEvent::Notification {
                kind: notification.kind,
                from: notification.account.acct,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode notification event");
                None
            }
        },
        other => {
            tracing::debug!(event = other, "Ignoring stream event");
            None
        }
    }
}

fn decode_post(frame: &SseFrame) -> Option<Post> {
    match serde_json::from_str::<Post>(&frame.data) {
        Ok(post) => Some(post),
        Err(e) => {
            tracing::warn!(event = %frame.event, error = %e, "Failed to decode post event");
            None
        }
    }
}

type Body = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

enum State {
    Connect(reqwest::RequestBuilder),
    Reading {
        body: Body,
        decoder: SseDecoder,
        pending: VecDeque<LiveEvent>,
    },
    Finished,
}

async fn connect(request: reqwest::RequestBuilder) -> Result<Body, ApiError> {
    let response = tokio::time::timeout(CONNECT_TIMEOUT, request.send())
        .await
        .map_err(|_| ApiError::Timeout)??;

    if !response.status().is_success() {
        return Err(ApiError::HttpStatus(response.status().as_u16()));
    }

    tracing::info!("Live update stream connected");
    Ok(response
        .bytes_stream()
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
        .boxed())
}

/// Turn a prepared streaming request into a stream of live events.
///
/// The connection is made on first poll. A connect or transport failure
/// yields one [`LiveEvent::StreamError`] and ends the stream; there is no
/// reconnect.
pub(crate) fn live_events(request: reqwest::RequestBuilder) -> BoxStream<'static, LiveEvent> {
    stream::unfold(State::Connect(request), |mut state| async move {
        loop {
            state = match state {
                State::Connect(request) => match connect(request).await {
                    Ok(body) => State::Reading {
                        body,
                        decoder: SseDecoder::new(),
                        pending: VecDeque::new(),
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Live update stream failed to connect");
                        return Some((LiveEvent::StreamError(e.to_string()), State::Finished));
                    }
                },
                State::Reading {
                    mut body,
                    mut decoder,
                    mut pending,
                } => {
                    if let Some(event) = pending.pop_front() {
                        return Some((
                            event,
                            State::Reading {
                                body,
                                decoder,
                                pending,
                            },
                        ));
                    }
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            pending.extend(decoder.feed(&chunk).into_iter().filter_map(decode_frame));
                            State::Reading {
                                body,
                                decoder,
                                pending,
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Live update stream interrupted");
                            return Some((LiveEvent::StreamError(e.to_string()), State::Finished));
                        }
                        None => {
                            tracing::info!("Live update stream closed by server");
                            return None;
                        }
                    }
                }
                State::Finished => return None,
            };
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const POST_JSON: &str =
        r#"{"id":"110","created_at":"2024-05-01T12:00:00Z","account":{"id":"1","acct":"alice"},"content":"<p>hi</p>"}"#;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: upd").is_empty());
        assert!(decoder.feed(b"ate\ndata: {\"a\"").is_empty());
        let frames = decoder.feed(b":1}\n\n");
        assert_eq!(frames, vec![frame("update", "{\"a\":1}")]);
    }

    #[test]
    fn test_decoder_skips_comments_and_handles_crlf() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b":thump\r\n\r\nevent: delete\r\ndata: 42\r\n\r\n");
        assert_eq!(frames, vec![frame("delete", "42")]);
    }

    #[test]
    fn test_decoder_joins_multiline_data() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: one\ndata: two\n\n");
        assert_eq!(frames, vec![frame("message", "one\ntwo")]);
    }

    #[test]
    fn test_decode_update_and_edit() {
        match decode_frame(frame("update", POST_JSON)) {
            Some(LiveEvent::Insert(post)) => assert_eq!(post.id.as_str(), "110"),
            other => panic!("Expected Insert, got {:?}", other),
        }
        match decode_frame(frame("status.update", POST_JSON)) {
            Some(LiveEvent::Edit(post)) => assert_eq!(post.content, "<p>hi</p>"),
            other => panic!("Expected Edit, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_delete_uses_plain_id() {
        assert_eq!(
            decode_frame(frame("delete", "110")),
            Some(LiveEvent::Delete(ItemId::from("110")))
        );
        assert_eq!(decode_frame(frame("delete", "  ")), None);
    }

    #[test]
    fn test_decode_notification() {
        let json = r#"{"type":"favourite","account":{"id":"2","acct":"bob@example.social"}}"#;
        assert_eq!(
            decode_frame(frame("notification", json)),
            Some(LiveEvent::Notification {
                kind: "favourite".to_string(),
                from: "bob@example.social".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_ignores_unknown_and_malformed() {
        assert_eq!(decode_frame(frame("filters_changed", "")), None);
        assert_eq!(decode_frame(frame("update", "{not json")), None);
    }
}
