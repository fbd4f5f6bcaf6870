use async_trait::async_trait;
use chatcore::{ObjectId, Payload};

/// What an action needs to know about a user it targets.
#[async_trait]
pub trait UserRef: Send + Sync {
    fn user_id(&self) -> ObjectId;

    /// Data already known about the user, used to seed views built from it.
    async fn known_payload(&self) -> Option<Payload> {
        None
    }
}

#[async_trait]
impl UserRef for ObjectId {
    fn user_id(&self) -> ObjectId {
        self.clone()
    }
}

#[async_trait]
impl<'a> UserRef for &'a str {
    fn user_id(&self) -> ObjectId {
        ObjectId::from(*self)
    }
}

#[async_trait]
impl UserRef for String {
    fn user_id(&self) -> ObjectId {
        ObjectId::from(self.as_str())
    }
}
