use crate::chat::Chat;
use crate::chat_user::ChatUser;
use crate::client::Client;
use crate::image::Image;
use chatcore::{ObjectId, Payload};
use std::sync::Arc;

/// Builds the sibling entities a [`Chat`] hands out (operators, members,
/// covers). Injected at construction so callers can control how they are
/// seeded.
pub trait EntityFactory: Send + Sync {
    fn chat_user(&self, id: ObjectId, chat: &Chat, seed: Option<Payload>) -> ChatUser;

    fn image(&self, url: String, client: &Arc<Client>) -> Image;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEntityFactory;

impl EntityFactory for DefaultEntityFactory {
    fn chat_user(&self, id: ObjectId, chat: &Chat, seed: Option<Payload>) -> ChatUser {
        match seed {
            Some(payload) => ChatUser::with_payload(id, chat, payload),
            None => ChatUser::new(id, chat),
        }
    }

    fn image(&self, url: String, client: &Arc<Client>) -> Image {
        Image::new(url, client)
    }
}
