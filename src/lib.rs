// Core modules, re-exported so callers need a single dependency.
pub use chatcore::{chat as chat_types, endpoints, error, fresh, net, types};
pub use chatcore::{FreshObject, ObjectError, ObjectId, Payload, TransportError};

pub mod chat;
pub mod chat_user;
pub mod client;
pub mod config;
pub mod factory;
pub mod image;
pub mod user;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use chat::Chat;
pub use chat_user::ChatUser;
pub use client::Client;
pub use config::ClientConfig;
pub use factory::{DefaultEntityFactory, EntityFactory};
pub use image::Image;
pub use user::UserRef;
