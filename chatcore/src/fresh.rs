//! Lazily fetched, explicitly invalidated snapshot of one remote resource.
//!
//! A [`FreshObject`] keeps the last full response body fetched from the
//! resource's canonical URL. Field reads are served from that snapshot until
//! either the field is missing or the caller has requested a refresh with
//! [`FreshObject::invalidate`]. The refresh request is one-shot: the next
//! read consumes it, whatever field it asks for.
//!
//! Refetches are coalesced per instance. The snapshot lives behind an async
//! mutex that is held for the duration of a fetch, so readers that arrive
//! while a fetch is in flight wait for it and are then served from the new
//! snapshot instead of issuing a GET of their own.

use crate::error::{TransportError, json_kind};
use crate::types::ObjectId;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// The full JSON representation of a resource as last returned by the server.
pub type Payload = serde_json::Map<String, Value>;

/// Something that can perform an authenticated GET and hand back the body.
#[async_trait]
pub trait PayloadSource: Send + Sync {
    async fn fetch_payload(&self, url: &str) -> Result<Payload, TransportError>;
}

/// Interprets a raw response body as a resource payload.
pub fn payload_from_body(url: &str, body: &[u8]) -> Result<Payload, TransportError> {
    let value: Value = serde_json::from_slice(body).map_err(TransportError::MalformedBody)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TransportError::UnexpectedShape {
            url: url.to_string(),
            found: json_kind(&other),
        }),
    }
}

#[derive(Debug)]
pub struct FreshObject {
    id: ObjectId,
    url: String,
    payload: Mutex<Payload>,
    force_refresh: AtomicBool,
}

impl FreshObject {
    /// Creates an empty cache; the first read will fetch.
    pub fn new(id: ObjectId, url: impl Into<String>) -> Self {
        Self::with_payload(id, url, Payload::new())
    }

    /// Creates a cache pre-seeded with data already known for the resource,
    /// e.g. an entry from a listing response.
    pub fn with_payload(id: ObjectId, url: impl Into<String>, payload: Payload) -> Self {
        Self {
            id,
            url: url.into(),
            payload: Mutex::new(payload),
            force_refresh: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Canonical URL the payload is fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Requests that the next read, for any key, bypasses the snapshot.
    pub fn invalidate(&self) {
        self.force_refresh.store(true, Ordering::SeqCst);
    }

    pub fn needs_refresh(&self) -> bool {
        self.force_refresh.load(Ordering::SeqCst)
    }

    /// Copy of the current snapshot. Never fetches.
    pub async fn payload(&self) -> Payload {
        self.payload.lock().await.clone()
    }

    /// Reads `key`, refetching first if it is missing or a refresh was
    /// requested. Returns `fallback` if the key is still missing afterwards.
    ///
    /// The refresh request is cleared before the GET is issued and is not
    /// restored if the GET fails: a failed forced read is not retried as a
    /// forced read by the next call.
    pub async fn resolve(
        &self,
        source: &dyn PayloadSource,
        key: &str,
        fallback: Value,
    ) -> Result<Value, TransportError> {
        let mut payload = self.payload.lock().await;

        let forced = self.force_refresh.swap(false, Ordering::SeqCst);
        if !forced && let Some(found) = present(&payload, key) {
            debug!("cache hit for `{key}` on {}", self.id);
            return Ok(found.clone());
        }

        debug!(
            "refetching {} for `{key}` ({})",
            self.id,
            if forced { "forced" } else { "miss" }
        );
        let fresh = match source.fetch_payload(&self.url).await {
            Ok(fresh) => fresh,
            Err(e) => {
                if forced {
                    warn!("forced refresh of {} failed, request dropped: {e}", self.id);
                }
                return Err(e);
            }
        };
        *payload = fresh;

        Ok(present(&payload, key).cloned().unwrap_or(fallback))
    }

    /// [`FreshObject::resolve`] with a `null` fallback.
    pub async fn get(
        &self,
        source: &dyn PayloadSource,
        key: &str,
    ) -> Result<Value, TransportError> {
        self.resolve(source, key, Value::Null).await
    }
}

fn present<'a>(payload: &'a Payload, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Serves queued responses in order, counting fetches.
    #[derive(Default)]
    struct ScriptedSource {
        responses: std::sync::Mutex<VecDeque<Result<Payload, TransportError>>>,
        fetches: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Value, TransportError>>) -> Self {
            let responses = responses
                .into_iter()
                .map(|r| {
                    r.map(|v| match v {
                        Value::Object(map) => map,
                        _ => panic!("scripted payloads must be objects"),
                    })
                })
                .collect();
            Self {
                responses: std::sync::Mutex::new(responses),
                ..Default::default()
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PayloadSource for ScriptedSource {
        async fn fetch_payload(&self, _url: &str) -> Result<Payload, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TransportError::Http(anyhow::anyhow!("no scripted response")))
                })
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn seeded(value: Value) -> FreshObject {
        let Value::Object(map) = value else {
            panic!("seed must be an object")
        };
        FreshObject::with_payload(ObjectId::from("c1"), "https://api.test/group_channels/c1", map)
    }

    fn status_error() -> TransportError {
        TransportError::Status {
            code: 500,
            body: "boom".into(),
        }
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_fetch() {
        let source = ScriptedSource::new(vec![]);
        let obj = seeded(json!({"name": "Room A"}));

        let name = obj.get(&source, "name").await.unwrap();

        assert_eq!(name, json!("Room A"));
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_replaces_whole_payload() {
        init_logging();
        let source = ScriptedSource::new(vec![Ok(json!({"name": "Room A"}))]);
        let obj = seeded(json!({"stale": true}));

        let name = obj.get(&source, "name").await.unwrap();

        assert_eq!(name, json!("Room A"));
        assert_eq!(source.fetches(), 1);
        let payload = obj.payload().await;
        assert!(!payload.contains_key("stale"), "payload must be replaced, not merged");
    }

    #[tokio::test]
    async fn test_forced_refresh_consumed_by_any_key() {
        init_logging();
        let source = ScriptedSource::new(vec![Ok(json!({"name": "New", "member_count": 4}))]);
        let obj = seeded(json!({"name": "Old", "member_count": 3}));

        obj.invalidate();
        assert!(obj.needs_refresh());

        let count = obj.get(&source, "member_count").await.unwrap();
        assert_eq!(count, json!(4));
        assert!(!obj.needs_refresh());
        assert_eq!(source.fetches(), 1);

        // Subsequent reads are cache-first again.
        assert_eq!(obj.get(&source, "name").await.unwrap(), json!("New"));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_fallback_for_key_absent_after_fetch() {
        let source = ScriptedSource::new(vec![Ok(json!({"name": "Room A"}))]);
        let obj = FreshObject::new(ObjectId::from("c1"), "https://api.test/group_channels/c1");

        let value = obj
            .resolve(&source, "unread_message_count", json!(0))
            .await
            .unwrap();

        assert_eq!(value, json!(0));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_idempotent() {
        let source = ScriptedSource::new(vec![Ok(json!({"name": "Room A"}))]);
        let obj = FreshObject::new(ObjectId::from("c1"), "https://api.test/group_channels/c1");

        let first = obj.get(&source, "name").await.unwrap();
        let second = obj.get(&source, "name").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_falsy_values_are_returned_as_is() {
        let source = ScriptedSource::new(vec![]);
        let obj = seeded(json!({"member_count": 0, "is_hidden": false, "name": ""}));

        assert_eq!(obj.resolve(&source, "member_count", json!(9)).await.unwrap(), json!(0));
        assert_eq!(obj.resolve(&source, "is_hidden", json!(true)).await.unwrap(), json!(false));
        assert_eq!(obj.resolve(&source, "name", json!("x")).await.unwrap(), json!(""));
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_null_value_counts_as_missing() {
        let source = ScriptedSource::new(vec![Ok(json!({"cover_url": null}))]);
        let obj = seeded(json!({"cover_url": null}));

        let value = obj.resolve(&source, "cover_url", json!("fb")).await.unwrap();

        assert_eq!(value, json!("fb"));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_failed_forced_fetch_keeps_old_payload_and_drops_flag() {
        init_logging();
        let source = ScriptedSource::new(vec![Err(status_error())]);
        let obj = seeded(json!({"name": "Old"}));

        obj.invalidate();
        let err = obj.get(&source, "name").await.unwrap_err();
        assert!(matches!(err, TransportError::Status { code: 500, .. }));

        // The flag was consumed by the failed attempt; the next read is a
        // plain cache hit against the untouched old payload.
        assert!(!obj.needs_refresh());
        assert_eq!(obj.get(&source, "name").await.unwrap(), json!("Old"));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_for_missing_key_fails_again() {
        init_logging();
        let source = ScriptedSource::new(vec![Err(status_error()), Err(status_error())]);
        let obj = seeded(json!({"name": "Old"}));

        assert!(obj.get(&source, "member_count").await.is_err());
        assert!(obj.get(&source, "member_count").await.is_err());
        assert_eq!(source.fetches(), 2);
        assert_eq!(obj.payload().await.get("name"), Some(&json!("Old")));
    }

    // Overlapping reads on one instance share a single in-flight fetch.
    #[tokio::test]
    async fn test_concurrent_misses_are_coalesced() {
        init_logging();
        let source = Arc::new(ScriptedSource {
            delay: Some(Duration::from_millis(50)),
            ..ScriptedSource::new(vec![Ok(json!({"name": "Room A", "member_count": 3}))])
        });
        let obj = Arc::new(FreshObject::new(
            ObjectId::from("c1"),
            "https://api.test/group_channels/c1",
        ));

        let (a, b) = tokio::join!(
            obj.get(&*source, "name"),
            obj.get(&*source, "member_count")
        );

        assert_eq!(a.unwrap(), json!("Room A"));
        assert_eq!(b.unwrap(), json!(3));
        assert_eq!(source.fetches(), 1);
    }

    #[test]
    fn test_payload_from_body_rejects_non_objects() {
        let err = payload_from_body("u", b"[1,2]").unwrap_err();
        assert!(matches!(err, TransportError::UnexpectedShape { found: "array", .. }));

        let err = payload_from_body("u", b"not json").unwrap_err();
        assert!(matches!(err, TransportError::MalformedBody(_)));

        let ok = payload_from_body("u", br#"{"a":1}"#).unwrap();
        assert_eq!(ok.get("a"), Some(&json!(1)));
    }
}
