//! HTTP implementation of [`ChatBackend`].
//!
//! Speaks the platform's three consumer APIs:
//!
//! - `/rest/v1/…` — row queries and inserts, PostgREST-style filters
//!   (`room_id=eq.<uuid>`, `order=created_at.asc`, `limit=<n>`)
//! - `/realtime/v1/…` — change feeds and presence, delivered as SSE
//! - `/auth/v1/…` — identity lookup and sign-out
//!
//! All requests carry the project API key; identity requests additionally
//! carry the user's access token as the bearer.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use super::ChatBackend;
use super::error::BackendError;
use super::feed::{ChangeEvent, ChangeFeed, FeedGuard, sse_frames};
use super::models::{Message, NewMessage, NewRoom, Participant, PresenceEntry, Room, UserProfile};
use super::presence::{PresenceAgent, PresenceChannel, PresenceEvent};

/// Default per-request timeout for row and auth operations.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `reqwest`-based client for the managed backend.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    /// Applied to row and auth requests. Change feeds and presence streams
    /// are long-lived and never time out here.
    request_timeout: Duration,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Create a client against the given project URL and API key.
    #[must_use]
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client reusing an existing `reqwest::Client` (connection
    /// pools are per-client). The client must not carry its own global
    /// timeout, or long-lived subscriptions will be cut off.
    #[must_use]
    pub fn with_client(http: reqwest::Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout for row and auth operations.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Stream(format!("invalid endpoint {path}: {e}")))
    }

    fn rest(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .timeout(self.request_timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn rest_post(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .timeout(self.request_timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// GET without the row-operation timeout, for long-lived streams.
    fn stream_get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("accept", "text/event-stream")
    }

    /// Map a non-success response into the error taxonomy.
    async fn fail(resp: reqwest::Response) -> BackendError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
            StatusCode::CONFLICT => BackendError::Conflict(body),
            _ => {
                // Unique violations come back as 409 on well-behaved
                // deployments, but some proxies flatten them to 400.
                if body.contains("duplicate") || body.contains("23505") {
                    BackendError::Conflict(body)
                } else {
                    BackendError::Http {
                        status: status.as_u16(),
                        body,
                    }
                }
            }
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Open a change-feed SSE subscription and decode its frames.
    async fn change_feed<T>(&self, url: Url) -> Result<ChangeFeed<T>, BackendError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let resp = self.stream_get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }

        let frames = sse_frames(resp.bytes_stream());
        let events = async_stream::stream! {
            futures::pin_mut!(frames);
            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(frame) => match ChangeEvent::<T>::from_frame(&frame) {
                        Ok(Some(event)) => yield Ok(event),
                        Ok(None) => {}
                        Err(e) => yield Err(e),
                    },
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        // Closing the response stream is the unsubscribe; no extra release
        // call is needed, so the guard only marks the scope.
        Ok(ChangeFeed::new(Box::pin(events), FeedGuard::noop()))
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpBackend {
    async fn list_rooms(&self) -> Result<Vec<Room>, BackendError> {
        let url = self.endpoint("rest/v1/rooms")?;
        let resp = self
            .rest(url)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn create_room(&self, room: NewRoom) -> Result<Room, BackendError> {
        let url = self.endpoint("rest/v1/rooms")?;
        let resp = self
            .rest_post(url)
            .header("prefer", "return=representation")
            .json(&[room])
            .send()
            .await?;
        let mut rows: Vec<Room> = Self::decode(resp).await?;
        rows.pop()
            .ok_or_else(|| BackendError::Stream("create returned no row".into()))
    }

    async fn recent_messages(
        &self,
        room_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>, BackendError> {
        let url = self.endpoint("rest/v1/messages")?;
        let room_filter = format!("eq.{room_id}");
        let limit = limit.to_string();
        let resp = self
            .rest(url)
            .query(&[
                ("select", "*"),
                ("room_id", room_filter.as_str()),
                ("order", "created_at.asc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn send_message(&self, message: NewMessage) -> Result<(), BackendError> {
        let url = self.endpoint("rest/v1/messages")?;
        let resp = self
            .rest_post(url)
            .header("prefer", "return=minimal")
            .json(&[message])
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::fail(resp).await)
        }
    }

    async fn join_room(&self, participant: Participant) -> Result<(), BackendError> {
        let url = self.endpoint("rest/v1/room_participants")?;
        let resp = self
            .rest_post(url)
            .header("prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[participant])
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::fail(resp).await)
        }
    }

    async fn subscribe_rooms(&self) -> Result<ChangeFeed<Room>, BackendError> {
        let mut url = self.endpoint("realtime/v1/changes")?;
        url.query_pairs_mut().append_pair("table", "rooms");
        self.change_feed(url).await
    }

    async fn subscribe_messages(&self, room_id: Uuid) -> Result<ChangeFeed<Message>, BackendError> {
        let mut url = self.endpoint("realtime/v1/changes")?;
        url.query_pairs_mut()
            .append_pair("table", "messages")
            .append_pair("filter", &format!("room_id=eq.{room_id}"))
            .append_pair("events", "insert");
        self.change_feed(url).await
    }

    async fn join_presence(&self, room_id: Uuid) -> Result<PresenceChannel, BackendError> {
        // Each join gets its own channel ref so track/untrack address this
        // connection, not every connection of the same user.
        let channel_ref = Uuid::new_v4();

        let mut url = self.endpoint(&format!("realtime/v1/presence/{room_id}"))?;
        url.query_pairs_mut()
            .append_pair("ref", &channel_ref.to_string());

        let resp = self.stream_get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }

        let frames = sse_frames(resp.bytes_stream());
        let events = async_stream::stream! {
            futures::pin_mut!(frames);
            while let Some(frame) = frames.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "presence stream error");
                        break;
                    }
                };
                match decode_presence(&frame) {
                    Ok(Some(event)) => yield event,
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "undecodable presence frame"),
                }
            }
        };

        let agent = Arc::new(HttpPresenceAgent {
            http: self.http.clone(),
            api_key: self.api_key.clone(),
            track_url: self.endpoint(&format!("realtime/v1/presence/{room_id}/{channel_ref}"))?,
            request_timeout: self.request_timeout,
        });

        Ok(PresenceChannel::new(
            Box::pin(events),
            agent,
            FeedGuard::noop(),
        ))
    }

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let resp = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;
        let resp = self
            .http
            .post(url)
            .timeout(self.request_timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::fail(resp).await)
        }
    }
}

/// Decode one presence frame by its SSE event name.
fn decode_presence(
    frame: &super::feed::SseFrame,
) -> Result<Option<PresenceEvent>, BackendError> {
    let Some(event) = frame.event.as_deref() else {
        return Ok(None);
    };
    let entries = |data: &str| -> Result<Vec<PresenceEntry>, BackendError> {
        Ok(serde_json::from_str(data)?)
    };
    match event {
        "subscribed" => Ok(Some(PresenceEvent::Subscribed)),
        "sync" => Ok(Some(PresenceEvent::Sync(entries(&frame.data)?))),
        "join" => Ok(Some(PresenceEvent::Join(entries(&frame.data)?))),
        "leave" => Ok(Some(PresenceEvent::Leave(entries(&frame.data)?))),
        _ => Ok(None),
    }
}

/// Announce/withdraw over the presence REST surface.
struct HttpPresenceAgent {
    http: reqwest::Client,
    api_key: String,
    track_url: Url,
    request_timeout: Duration,
}

#[async_trait::async_trait]
impl PresenceAgent for HttpPresenceAgent {
    async fn track(&self, entry: PresenceEntry) -> Result<(), BackendError> {
        let resp = self
            .http
            .post(self.track_url.clone())
            .timeout(self.request_timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&entry)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(HttpBackend::fail(resp).await)
        }
    }

    async fn untrack(&self) -> Result<(), BackendError> {
        let resp = self
            .http
            .delete(self.track_url.clone())
            .timeout(self.request_timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(HttpBackend::fail(resp).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::feed::SseFrame;

    #[test]
    fn presence_sync_decodes_entries() {
        let frame = SseFrame {
            event: Some("sync".into()),
            data: serde_json::json!([{
                "user_id": "26cbb2f1-6b4d-4f4d-9542-b77d31c0a3cf",
                "username": "ada",
                "joined_at": "2026-01-05T10:00:00Z"
            }])
            .to_string(),
        };

        match decode_presence(&frame).unwrap().unwrap() {
            PresenceEvent::Sync(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].username, "ada");
            }
            other => panic!("expected sync, got {other:?}"),
        }
    }

    #[test]
    fn subscribed_has_no_payload() {
        let frame = SseFrame {
            event: Some("subscribed".into()),
            data: String::new(),
        };
        assert_eq!(
            decode_presence(&frame).unwrap(),
            Some(PresenceEvent::Subscribed)
        );
    }

    #[test]
    fn unknown_presence_events_are_skipped() {
        let frame = SseFrame {
            event: Some("heartbeat".into()),
            data: String::new(),
        };
        assert!(decode_presence(&frame).unwrap().is_none());
    }
}
