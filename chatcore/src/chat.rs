//! Chat channel domain types and the `data` sub-document embedded in a
//! channel payload.
//!
//! Channel payloads carry a `data` field holding a JSON-encoded string. The
//! interesting part of it lives under `chatInfo`:
//!
//! ```json
//! {"chatInfo": {"operatorsIdList": ["u1", "u2"], "permalink": "https://...", "frozen": false}}
//! ```

use crate::error::{ObjectError, json_kind};
use crate::types::ObjectId;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Payload keys of a group channel.
pub mod keys {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "custom_type";
    pub const MEMBER_STATE: &str = "member_state";
    pub const MEMBER_COUNT: &str = "member_count";
    pub const JOINED_MEMBER_COUNT: &str = "joined_member_count";
    pub const UNREAD_COUNT: &str = "unread_message_count";
    pub const IS_HIDDEN: &str = "is_hidden";
    pub const IS_PUSH_ENABLED: &str = "is_push_enabled";
    pub const IS_DISCOVERABLE: &str = "is_discoverable";
    pub const CREATED_AT: &str = "created_at";
    pub const INVITED_AT: &str = "invited_at";
    pub const COVER_URL: &str = "cover_url";
    pub const DATA: &str = "data";
}

/// Kind of chat, as carried in `custom_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatType {
    /// `opengroup`
    Public,
    /// `group`
    Private,
    /// `chat`
    Direct,
    Other(String),
}

impl ChatType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "opengroup" => ChatType::Public,
            "group" => ChatType::Private,
            "chat" => ChatType::Direct,
            other => ChatType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChatType::Public => "opengroup",
            ChatType::Private => "group",
            ChatType::Direct => "chat",
            ChatType::Other(s) => s,
        }
    }
}

/// The logged-in user's relation to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberState {
    Joined,
    Invited,
    None,
    Other(String),
}

impl MemberState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "joined" => MemberState::Joined,
            "invited" => MemberState::Invited,
            "none" => MemberState::None,
            other => MemberState::Other(other.to_string()),
        }
    }
}

/// The `chatInfo` block of a channel's `data` field.
///
/// Keeps the raw object so unknown keys stay reachable through [`ChatMeta::get`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatMeta {
    raw: serde_json::Map<String, Value>,
}

impl ChatMeta {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn as_map(&self) -> &serde_json::Map<String, Value> {
        &self.raw
    }

    /// Operator ids; empty when the list is absent.
    pub fn operator_ids(&self) -> Vec<ObjectId> {
        self.raw
            .get("operatorsIdList")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(ObjectId::from_json).collect())
            .unwrap_or_default()
    }

    pub fn permalink(&self) -> Option<&str> {
        self.raw.get("permalink").and_then(Value::as_str)
    }

    pub fn frozen(&self) -> Option<bool> {
        self.raw.get("frozen").and_then(Value::as_bool)
    }
}

impl From<serde_json::Map<String, Value>> for ChatMeta {
    fn from(raw: serde_json::Map<String, Value>) -> Self {
        Self { raw }
    }
}

/// Extracts [`ChatMeta`] from the value of a channel's `data` field.
///
/// A missing `data` field or a document without an object-valued `chatInfo`
/// yields empty metadata. A string that is not valid JSON, or a `data` value
/// that is neither a string nor an object, is a data format error.
pub fn parse_chat_meta(data: &Value) -> Result<ChatMeta, ObjectError> {
    let document = match data {
        Value::Null => return Ok(ChatMeta::default()),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .map_err(|e| ObjectError::data_format(keys::DATA, e))?,
        Value::Object(_) => data.clone(),
        other => {
            return Err(ObjectError::data_format(
                keys::DATA,
                format!("expected a JSON string, got {}", json_kind(other)),
            ));
        }
    };

    let meta = match document {
        Value::Object(mut root) => match root.remove("chatInfo") {
            Some(Value::Object(info)) => ChatMeta::from(info),
            _ => ChatMeta::default(),
        },
        _ => ChatMeta::default(),
    };
    Ok(meta)
}

/// Converts a seconds-since-epoch payload value to a timestamp.
pub fn timestamp_from_secs(value: &Value) -> Option<DateTime<Utc>> {
    value.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0))
}
