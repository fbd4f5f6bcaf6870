use crate::chat::Chat;
use crate::client::Client;
use crate::user::UserRef;
use async_trait::async_trait;
use chatcore::error::Result;
use chatcore::{FreshObject, ObjectId, Payload, PayloadSource};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

struct ChatUserInner {
    object: FreshObject,
    chat: Chat,
}

/// A user as seen from one chat.
///
/// Carries its own lazily fetched user payload and a handle to the chat it
/// was reached through.
#[derive(Clone)]
pub struct ChatUser {
    inner: Arc<ChatUserInner>,
}

impl std::fmt::Debug for ChatUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatUser")
            .field("id", self.id())
            .field("chat", self.chat().channel_url())
            .finish()
    }
}

impl ChatUser {
    pub fn new(id: impl Into<ObjectId>, chat: &Chat) -> Self {
        Self::with_payload(id, chat, Payload::new())
    }

    pub fn with_payload(id: impl Into<ObjectId>, chat: &Chat, payload: Payload) -> Self {
        let id = id.into();
        let url = chat.client().api().user_url(&id);
        Self {
            inner: Arc::new(ChatUserInner {
                object: FreshObject::with_payload(id, url, payload),
                chat: chat.clone(),
            }),
        }
    }

    pub fn id(&self) -> &ObjectId {
        self.inner.object.id()
    }

    /// The chat this user was reached through.
    pub fn chat(&self) -> &Chat {
        &self.inner.chat
    }

    pub fn client(&self) -> &Arc<Client> {
        self.inner.chat.client()
    }

    pub fn object(&self) -> &FreshObject {
        &self.inner.object
    }

    pub fn fresh(&self) -> Self {
        self.inner.object.invalidate();
        self.clone()
    }

    fn source(&self) -> &dyn PayloadSource {
        &**self.client()
    }

    pub async fn get(&self, key: &str) -> Result<Value> {
        Ok(self.inner.object.get(self.source(), key).await?)
    }

    pub async fn nickname(&self) -> Result<Option<String>> {
        Ok(self.get("nickname").await?.as_str().map(str::to_string))
    }

    pub async fn profile_url(&self) -> Result<Option<String>> {
        Ok(self.get("profile_url").await?.as_str().map(str::to_string))
    }

    pub async fn is_online(&self) -> Result<Option<bool>> {
        Ok(self.get("is_online").await?.as_bool())
    }

    /// Last activity, in milliseconds since the epoch.
    pub async fn last_seen_at(&self) -> Result<Option<i64>> {
        Ok(self.get("last_seen_at").await?.as_i64())
    }

    pub async fn last_seen_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .last_seen_at()
            .await?
            .and_then(DateTime::from_timestamp_millis))
    }

    /// Whether this user is among the operators of [`ChatUser::chat`].
    pub async fn is_operator(&self) -> Result<bool> {
        let operators = self.chat().meta().await?.operator_ids();
        Ok(operators.contains(self.id()))
    }
}

#[async_trait]
impl UserRef for ChatUser {
    fn user_id(&self) -> ObjectId {
        self.id().clone()
    }

    async fn known_payload(&self) -> Option<Payload> {
        let payload = self.inner.object.payload().await;
        (!payload.is_empty()).then_some(payload)
    }
}
