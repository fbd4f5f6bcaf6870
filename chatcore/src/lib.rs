//! Runtime-agnostic core of the chat client: the HTTP seam, the lazily
//! fetched resource cache, chat domain types and request builders.

pub mod chat;
pub mod endpoints;
pub mod error;
pub mod fresh;
pub mod net;
pub mod types;

pub use error::{ObjectError, TransportError};
pub use fresh::{FreshObject, Payload, PayloadSource};
pub use types::ObjectId;
