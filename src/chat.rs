//! View over one group channel.
//!
//! Every accessor reads through the channel's [`FreshObject`]; nothing
//! derived (metadata, operators, cover) is stored, it is recomputed from the
//! cached payload on each call. Call [`Chat::fresh`] to make the next read
//! go to the server.

use crate::chat_user::ChatUser;
use crate::client::Client;
use crate::factory::{DefaultEntityFactory, EntityFactory};
use crate::image::Image;
use crate::user::UserRef;
use chatcore::chat::{ChatMeta, ChatType, MemberState, keys, parse_chat_meta, timestamp_from_secs};
use chatcore::endpoints::{ImageOptions, OperatorAction, Presence};
use chatcore::error::Result;
use chatcore::{FreshObject, ObjectId, Payload, PayloadSource};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

struct ChatInner {
    object: FreshObject,
    client: Arc<Client>,
    factory: Arc<dyn EntityFactory>,
}

/// Handle to a chat view. Clones refer to the same view and share its cache.
#[derive(Clone)]
pub struct Chat {
    inner: Arc<ChatInner>,
}

impl std::fmt::Debug for Chat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chat")
            .field("channel_url", self.channel_url())
            .field("needs_refresh", &self.inner.object.needs_refresh())
            .finish()
    }
}

impl Chat {
    pub fn new(client: &Arc<Client>, channel_url: impl Into<ObjectId>) -> Self {
        Self::with_factory(client, channel_url, Payload::new(), Arc::new(DefaultEntityFactory))
    }

    /// View pre-seeded with data already known for the channel.
    pub fn with_payload(
        client: &Arc<Client>,
        channel_url: impl Into<ObjectId>,
        payload: Payload,
    ) -> Self {
        Self::with_factory(client, channel_url, payload, Arc::new(DefaultEntityFactory))
    }

    pub fn with_factory(
        client: &Arc<Client>,
        channel_url: impl Into<ObjectId>,
        payload: Payload,
        factory: Arc<dyn EntityFactory>,
    ) -> Self {
        let channel_url = channel_url.into();
        let url = client.api().group_channel_url(&channel_url);
        Self {
            inner: Arc::new(ChatInner {
                object: FreshObject::with_payload(channel_url, url, payload),
                client: client.clone(),
                factory,
            }),
        }
    }

    pub fn channel_url(&self) -> &ObjectId {
        self.inner.object.id()
    }

    /// Canonical URL the channel is fetched from.
    pub fn url(&self) -> &str {
        self.inner.object.url()
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.inner.client
    }

    pub fn object(&self) -> &FreshObject {
        &self.inner.object
    }

    /// Whether `other` is a handle to this same view.
    pub fn is_same(&self, other: &Chat) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Marks the view stale so the next read refetches, and returns it.
    pub fn fresh(&self) -> Self {
        self.inner.object.invalidate();
        self.clone()
    }

    fn source(&self) -> &dyn PayloadSource {
        &*self.inner.client
    }

    /// Raw payload field; `null` if absent.
    pub async fn get(&self, key: &str) -> Result<Value> {
        Ok(self.inner.object.get(self.source(), key).await?)
    }

    async fn string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).await?.as_str().map(str::to_string))
    }

    async fn int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get(key).await?.as_i64())
    }

    async fn flag(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get(key).await?.as_bool())
    }

    pub async fn name(&self) -> Result<Option<String>> {
        self.string(keys::NAME).await
    }

    /// Alias of [`Chat::name`].
    pub async fn title(&self) -> Result<Option<String>> {
        self.name().await
    }

    /// Raw `custom_type`: `opengroup`, `group` or `chat`.
    pub async fn chat_type(&self) -> Result<Option<String>> {
        self.string(keys::TYPE).await
    }

    pub async fn kind(&self) -> Result<Option<ChatType>> {
        Ok(self.chat_type().await?.as_deref().map(ChatType::parse))
    }

    pub async fn is_public(&self) -> Result<bool> {
        Ok(self.kind().await? == Some(ChatType::Public))
    }

    pub async fn is_private(&self) -> Result<bool> {
        Ok(self.kind().await? == Some(ChatType::Private))
    }

    pub async fn is_direct(&self) -> Result<bool> {
        Ok(self.kind().await? == Some(ChatType::Direct))
    }

    /// Raw `member_state` of the logged-in user: `joined`, `invited`, ...
    pub async fn state(&self) -> Result<Option<String>> {
        self.string(keys::MEMBER_STATE).await
    }

    pub async fn member_state(&self) -> Result<Option<MemberState>> {
        Ok(self.state().await?.as_deref().map(MemberState::parse))
    }

    /// Members who were invited, joined or not.
    pub async fn member_count(&self) -> Result<Option<i64>> {
        self.int(keys::MEMBER_COUNT).await
    }

    pub async fn joined_member_count(&self) -> Result<Option<i64>> {
        self.int(keys::JOINED_MEMBER_COUNT).await
    }

    pub async fn unread_count(&self) -> Result<Option<i64>> {
        self.int(keys::UNREAD_COUNT).await
    }

    pub async fn is_hidden(&self) -> Result<Option<bool>> {
        self.flag(keys::IS_HIDDEN).await
    }

    pub async fn is_push_enabled(&self) -> Result<Option<bool>> {
        self.flag(keys::IS_PUSH_ENABLED).await
    }

    pub async fn is_discoverable(&self) -> Result<Option<bool>> {
        self.flag(keys::IS_DISCOVERABLE).await
    }

    /// Creation time in seconds since the epoch.
    pub async fn created_at(&self) -> Result<Option<i64>> {
        self.int(keys::CREATED_AT).await
    }

    pub async fn created_at_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(timestamp_from_secs(&self.get(keys::CREATED_AT).await?))
    }

    /// Time the logged-in user was invited, in seconds since the epoch.
    pub async fn invited_at(&self) -> Result<Option<i64>> {
        self.int(keys::INVITED_AT).await
    }

    pub async fn invited_at_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(timestamp_from_secs(&self.get(keys::INVITED_AT).await?))
    }

    /// The `chatInfo` block of the `data` field.
    pub async fn meta(&self) -> Result<ChatMeta> {
        parse_chat_meta(&self.get(keys::DATA).await?)
    }

    pub async fn is_frozen(&self) -> Result<Option<bool>> {
        Ok(self.meta().await?.frozen())
    }

    /// Permalink to the chat.
    pub async fn link(&self) -> Result<Option<String>> {
        Ok(self.meta().await?.permalink().map(str::to_string))
    }

    pub async fn operators(&self) -> Result<Vec<ChatUser>> {
        let ids = self.meta().await?.operator_ids();
        Ok(ids
            .into_iter()
            .map(|id| self.inner.factory.chat_user(id, self, None))
            .collect())
    }

    /// Cover image; `None` when the chat has none.
    pub async fn cover(&self) -> Result<Option<Image>> {
        let url = self.string(keys::COVER_URL).await?;
        Ok(url
            .filter(|u| !u.is_empty())
            .map(|u| self.inner.factory.image(u, &self.inner.client)))
    }

    /// Every member of the chat, walking all pages of the listing.
    ///
    /// Stops early if the server hands back a continuation token it already
    /// sent.
    pub async fn members(&self) -> Result<Vec<ChatUser>> {
        let mut members = Vec::new();
        let mut token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self
                .inner
                .client
                .list_chat_members(self, token.as_deref())
                .await?;
            for payload in page.members.iter() {
                let Some(id) = payload.get("user_id").and_then(ObjectId::from_json) else {
                    debug!("skipping member entry without user_id in {}", self.channel_url());
                    continue;
                };
                members.push(self.inner.factory.chat_user(id, self, Some(payload.clone())));
            }
            match page.next_token() {
                Some(next) if !seen_tokens.insert(next.to_string()) => {
                    warn!(
                        "member listing of {} repeated token `{next}`, stopping",
                        self.channel_url()
                    );
                    break;
                }
                Some(next) => token = Some(next.to_string()),
                None => break,
            }
        }
        Ok(members)
    }

    pub async fn send_text_message(&self, content: &str) -> Result<Self> {
        self.inner.client.send_text_message(content, self).await?;
        Ok(self.clone())
    }

    pub async fn send_image_message(&self, url: &str, opts: &ImageOptions) -> Result<Self> {
        self.inner
            .client
            .send_image_message(url, self, opts)
            .await?;
        Ok(self.clone())
    }

    /// Marks the chat as read.
    pub async fn read(&self) -> Result<Self> {
        self.inner.client.mark_chat_read(self).await?;
        Ok(self.fresh())
    }

    pub async fn join(&self) -> Result<Self> {
        self.inner
            .client
            .modify_chat_presence(Presence::Join, self)
            .await?;
        Ok(self.fresh())
    }

    pub async fn exit(&self) -> Result<Self> {
        self.inner
            .client
            .modify_chat_presence(Presence::Exit, self)
            .await?;
        Ok(self.fresh())
    }

    /// Makes `user` an operator and returns the refreshed operator list.
    pub async fn add_operator(&self, user: &(dyn UserRef + '_)) -> Result<Vec<ChatUser>> {
        self.inner
            .client
            .modify_chat_operator(OperatorAction::Add, user, self)
            .await?;
        self.fresh().operators().await
    }

    /// Revokes operator rights and returns the remaining operators.
    pub async fn remove_operator(&self, user: &(dyn UserRef + '_)) -> Result<Vec<ChatUser>> {
        self.inner
            .client
            .modify_chat_operator(OperatorAction::Remove, user, self)
            .await?;
        self.fresh().operators().await
    }

    /// Removes `user` from the chat and returns it as a member view marked
    /// stale.
    pub async fn kick(&self, user: &(dyn UserRef + '_)) -> Result<ChatUser> {
        self.inner.client.kick_chat_user(user, self).await?;
        let seed = user.known_payload().await;
        Ok(self
            .inner
            .factory
            .chat_user(user.user_id(), self, seed)
            .fresh())
    }

    /// Invites `users` and returns them as members of this chat, seeded with
    /// whatever was already known about them.
    pub async fn invite(&self, users: &[&(dyn UserRef + '_)]) -> Result<Vec<ChatUser>> {
        self.inner.client.invite_users_to_chat(users, self).await?;
        let mut invited = Vec::with_capacity(users.len());
        for user in users {
            let seed = user.known_payload().await;
            invited.push(self.inner.factory.chat_user(user.user_id(), self, seed));
        }
        Ok(invited)
    }
}
