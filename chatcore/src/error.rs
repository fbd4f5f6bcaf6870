use thiserror::Error;

/// Failure to obtain a usable response from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] anyhow::Error),

    #[error("server responded with status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("expected a JSON object from {url}, got {found}")]
    UnexpectedShape { url: String, found: &'static str },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors surfaced by entity accessors and actions.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An embedded JSON sub-document could not be parsed.
    #[error("field `{field}` is not valid JSON: {reason}")]
    DataFormat { field: &'static str, reason: String },
}

impl ObjectError {
    pub fn data_format(field: &'static str, reason: impl ToString) -> Self {
        ObjectError::DataFormat {
            field,
            reason: reason.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ObjectError::Transport(_))
    }

    pub fn is_data_format(&self) -> bool {
        matches!(self, ObjectError::DataFormat { .. })
    }
}

pub type Result<T> = std::result::Result<T, ObjectError>;

/// Short name for the JSON type of `value`, used in error messages.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
