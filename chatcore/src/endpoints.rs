//! Request builders for the chat API.
//!
//! Every call made by the client is built here, so the wire shapes live next
//! to each other and can be checked without a runtime. Auth headers are
//! added by the caller at send time.
//!
//! ```text
//! GET    {root}/group_channels/{channel}
//! GET    {root}/group_channels/{channel}/members?limit=N[&token=T]
//! GET    {root}/users/{user}
//! POST   {root}/group_channels/{channel}/messages
//! PUT    {root}/group_channels/{channel}/messages/mark_as_read
//! PUT    {root}/group_channels/{channel}/join
//! PUT    {root}/group_channels/{channel}/leave
//! POST   {root}/group_channels/{channel}/operators
//! DELETE {root}/group_channels/{channel}/operators?operator_ids=U
//! POST   {root}/group_channels/{channel}/invite
//! ```

use crate::error::TransportError;
use crate::net::HttpRequest;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};

/// Builds URLs and requests relative to one API root.
#[derive(Debug, Clone)]
pub struct Api {
    root: String,
}

impl Api {
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }
        Self { root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Canonical URL of a group channel.
    pub fn group_channel_url(&self, channel: &ObjectId) -> String {
        format!("{}/group_channels/{}", self.root, channel)
    }

    /// Canonical URL of a user.
    pub fn user_url(&self, user: &ObjectId) -> String {
        format!("{}/users/{}", self.root, user)
    }

    pub fn members_page(&self, channel: &ObjectId, limit: u32, token: Option<&str>) -> HttpRequest {
        let mut url = format!("{}/members?limit={limit}", self.group_channel_url(channel));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            url.push_str("&token=");
            url.push_str(&urlencoding::encode(token));
        }
        HttpRequest::get(url)
    }

    pub fn send_message(
        &self,
        channel: &ObjectId,
        body: &MessageBody,
    ) -> Result<HttpRequest, TransportError> {
        HttpRequest::post(format!("{}/messages", self.group_channel_url(channel)))
            .with_json(body)
            .map_err(TransportError::Encode)
    }

    pub fn mark_read(
        &self,
        channel: &ObjectId,
        user_id: Option<&ObjectId>,
    ) -> Result<HttpRequest, TransportError> {
        let req = HttpRequest::put(format!(
            "{}/messages/mark_as_read",
            self.group_channel_url(channel)
        ));
        with_optional_user(req, user_id)
    }

    pub fn presence(
        &self,
        channel: &ObjectId,
        presence: Presence,
        user_id: Option<&ObjectId>,
    ) -> Result<HttpRequest, TransportError> {
        let req = HttpRequest::put(format!(
            "{}/{}",
            self.group_channel_url(channel),
            presence.path()
        ));
        with_optional_user(req, user_id)
    }

    pub fn modify_operator(
        &self,
        channel: &ObjectId,
        action: OperatorAction,
        user: &ObjectId,
    ) -> Result<HttpRequest, TransportError> {
        let url = format!("{}/operators", self.group_channel_url(channel));
        match action {
            OperatorAction::Add => HttpRequest::post(url)
                .with_json(&OperatorIds {
                    operator_ids: vec![user.clone()],
                })
                .map_err(TransportError::Encode),
            OperatorAction::Remove => Ok(HttpRequest::delete(format!(
                "{url}?operator_ids={}",
                urlencoding::encode(&user.to_string())
            ))),
        }
    }

    pub fn invite(
        &self,
        channel: &ObjectId,
        users: &[ObjectId],
    ) -> Result<HttpRequest, TransportError> {
        HttpRequest::post(format!("{}/invite", self.group_channel_url(channel)))
            .with_json(&UserIds {
                user_ids: users.to_vec(),
            })
            .map_err(TransportError::Encode)
    }

    /// Removes another member from the channel.
    pub fn kick(&self, channel: &ObjectId, user: &ObjectId) -> Result<HttpRequest, TransportError> {
        HttpRequest::put(format!("{}/leave", self.group_channel_url(channel)))
            .with_json(&UserIds {
                user_ids: vec![user.clone()],
            })
            .map_err(TransportError::Encode)
    }
}

fn with_optional_user(
    req: HttpRequest,
    user_id: Option<&ObjectId>,
) -> Result<HttpRequest, TransportError> {
    match user_id {
        Some(user_id) => req
            .with_json(&UserIdBody { user_id })
            .map_err(TransportError::Encode),
        None => Ok(req),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Join,
    Exit,
}

impl Presence {
    fn path(self) -> &'static str {
        match self {
            Presence::Join => "join",
            Presence::Exit => "leave",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorAction {
    Add,
    Remove,
}

#[derive(Serialize)]
struct UserIdBody<'a> {
    user_id: &'a ObjectId,
}

#[derive(Serialize)]
struct UserIds {
    user_ids: Vec<ObjectId>,
}

#[derive(Serialize)]
struct OperatorIds {
    operator_ids: Vec<ObjectId>,
}

/// Options for image messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub height: u32,
    pub width: u32,
    pub file_name: String,
    pub file_type: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            height: 780,
            width: 780,
            file_name: "image.png".to_string(),
            file_type: "image/png".to_string(),
        }
    }
}

/// Dimensions attached to an image message.
#[derive(Debug, Clone, Serialize)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
}

/// Body of `POST .../messages`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "message_type")]
pub enum MessageBody {
    #[serde(rename = "MESG")]
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<ObjectId>,
        message: String,
    },
    #[serde(rename = "FILE")]
    File {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<ObjectId>,
        url: String,
        file_name: String,
        file_type: String,
        custom_type: &'static str,
        #[serde(serialize_with = "serialize_as_json_string")]
        data: ImageData,
    },
}

impl MessageBody {
    pub fn text(user_id: Option<ObjectId>, message: impl Into<String>) -> Self {
        MessageBody::Text {
            user_id,
            message: message.into(),
        }
    }

    pub fn image(user_id: Option<ObjectId>, url: impl Into<String>, opts: &ImageOptions) -> Self {
        MessageBody::File {
            user_id,
            url: url.into(),
            file_name: opts.file_name.clone(),
            file_type: opts.file_type.clone(),
            custom_type: "image",
            data: ImageData {
                width: opts.width,
                height: opts.height,
            },
        }
    }
}

// The server stores `data` as an opaque string.
fn serialize_as_json_string<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: Serialize,
{
    let encoded = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&encoded)
}

/// One page of `GET .../members`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembersPage {
    #[serde(default)]
    pub members: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub next: Option<String>,
}

impl MembersPage {
    /// Continuation token, if there are more pages.
    pub fn next_token(&self) -> Option<&str> {
        self.next.as_deref().filter(|t| !t.is_empty())
    }
}
