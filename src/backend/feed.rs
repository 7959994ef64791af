//! Change-feed subscriptions.
//!
//! The platform reports row-level mutations as a server-sent event stream:
//! one frame per mutation, the SSE event name carrying the mutation kind and
//! the `data:` payload carrying the affected row as JSON. This module owns
//! the frame splitter, the typed [`ChangeEvent`] decoding, and the
//! [`ChangeFeed`] handle that releases the subscription on every exit path.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use super::error::BackendError;

/// A row-level mutation reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T> {
    /// A new row was inserted.
    Insert(T),
    /// An existing row changed.
    Update(T),
    /// A row was removed; only the platform's partial echo of it remains.
    Delete(serde_json::Value),
}

/// One parsed server-sent event frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// The `event:` field, if present.
    pub event: Option<String>,
    /// Concatenated `data:` lines.
    pub data: String,
}

impl<T: DeserializeOwned> ChangeEvent<T> {
    /// Decode a change event from an SSE frame.
    ///
    /// Frames without a recognized event name (comments, keep-alives) decode
    /// to `None` and are skipped by the feed.
    pub fn from_frame(frame: &SseFrame) -> Result<Option<Self>, BackendError> {
        let Some(event) = frame.event.as_deref() else {
            return Ok(None);
        };
        match event {
            "insert" => Ok(Some(Self::Insert(serde_json::from_str(&frame.data)?))),
            "update" => Ok(Some(Self::Update(serde_json::from_str(&frame.data)?))),
            "delete" => Ok(Some(Self::Delete(serde_json::from_str(&frame.data)?))),
            _ => Ok(None),
        }
    }
}

/// Split a byte stream into SSE frames.
///
/// Frames are separated by a blank line; within a frame, `event:` and `data:`
/// lines are collected and everything else (comments, `id:`, retries) is
/// ignored. Transport errors terminate the stream.
pub fn sse_frames<S, B, E>(bytes: S) -> impl Stream<Item = Result<SseFrame, BackendError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    async_stream::try_stream! {
        let mut buf = Vec::<u8>::new();

        futures::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| BackendError::Stream(e.to_string()))?;
            buf.extend_from_slice(chunk.as_ref());

            while let Some(pos) = find_double_newline(&buf) {
                let frame = buf.drain(..pos + 2).collect::<Vec<_>>();
                let text = String::from_utf8_lossy(&frame);

                if let Some(parsed) = parse_frame(&text) {
                    yield parsed;
                }
            }
        }
    }
}

/// Parse one raw frame. Returns `None` for frames with no payload at all.
fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut seen = false;

    for line in text.lines() {
        let line = line.trim_end();
        if let Some(rest) = line.strip_prefix("event:") {
            frame.event = Some(rest.trim().to_string());
            seen = true;
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !frame.data.is_empty() {
                frame.data.push('\n');
            }
            frame.data.push_str(rest.trim());
            seen = true;
        }
    }

    seen.then_some(frame)
}

fn find_double_newline(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

/// Releases a subscription when dropped.
///
/// Every feed and presence channel carries one of these so the subscription
/// is withdrawn on every exit path, including early returns and panics.
pub struct FeedGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl FeedGuard {
    /// Guard that runs `release` exactly once, on drop.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Guard for subscriptions whose transport releases itself on drop.
    #[must_use]
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for FeedGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for FeedGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// A live change-feed subscription.
///
/// Yields [`ChangeEvent`]s until the upstream closes; dropping the feed
/// releases the subscription.
pub struct ChangeFeed<T> {
    events: Pin<Box<dyn Stream<Item = Result<ChangeEvent<T>, BackendError>> + Send>>,
    _guard: FeedGuard,
}

impl<T> ChangeFeed<T> {
    /// Wrap an event stream and its release guard.
    pub fn new(
        events: Pin<Box<dyn Stream<Item = Result<ChangeEvent<T>, BackendError>> + Send>>,
        guard: FeedGuard,
    ) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }

    /// Next event, or `None` once the upstream closed.
    pub async fn next(&mut self) -> Option<Result<ChangeEvent<T>, BackendError>> {
        self.events.next().await
    }
}

impl<T> Stream for ChangeFeed<T> {
    type Item = Result<ChangeEvent<T>, BackendError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().events.as_mut().poll_next(cx)
    }
}

impl<T> std::fmt::Debug for ChangeFeed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::Room;
    use futures::stream;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send {
        let owned: Vec<Result<Vec<u8>, std::io::Error>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn frames_split_on_blank_line() {
        let frames = sse_frames(chunks(&["event: insert\ndata: {\"a\":1}\n\nevent: upd", "ate\ndata: {}\n\n"]));
        let frames: Vec<_> = frames.collect().await;

        assert_eq!(frames.len(), 2);
        let first = frames[0].as_ref().unwrap();
        assert_eq!(first.event.as_deref(), Some("insert"));
        assert_eq!(first.data, "{\"a\":1}");
        let second = frames[1].as_ref().unwrap();
        assert_eq!(second.event.as_deref(), Some("update"));
    }

    #[tokio::test]
    async fn comments_and_keepalives_are_dropped() {
        let frames = sse_frames(chunks(&[": keep-alive\n\nretry: 500\n\ndata: x\n\n"]));
        let frames: Vec<_> = frames.collect().await;

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().data, "x");
    }

    #[test]
    fn multi_line_data_joins_with_newline() {
        let frame = parse_frame("data: one\ndata: two\n").unwrap();
        assert_eq!(frame.data, "one\ntwo");
    }

    #[test]
    fn change_event_decodes_room_insert() {
        let frame = SseFrame {
            event: Some("insert".into()),
            data: serde_json::json!({
                "id": "6e5aa030-8c02-4d17-9dbd-780a614f28b3",
                "name": "general",
                "created_by": "26cbb2f1-6b4d-4f4d-9542-b77d31c0a3cf",
                "created_at": "2026-01-05T10:00:00Z"
            })
            .to_string(),
        };

        let event = ChangeEvent::<Room>::from_frame(&frame).unwrap().unwrap();
        match event {
            ChangeEvent::Insert(room) => assert_eq!(room.name, "general"),
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn unknown_event_names_are_skipped() {
        let frame = SseFrame {
            event: Some("system".into()),
            data: "{}".into(),
        };
        assert!(ChangeEvent::<Room>::from_frame(&frame).unwrap().is_none());
    }

    #[test]
    fn guard_releases_exactly_once() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let count = Arc::new(AtomicUsize::new(0));
        let guard = FeedGuard::new({
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });
        drop(guard);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
