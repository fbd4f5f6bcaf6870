use crate::chat::Chat;
use crate::config::ClientConfig;
use crate::user::UserRef;
use async_trait::async_trait;
use chatcore::endpoints::{Api, ImageOptions, MembersPage, MessageBody, OperatorAction, Presence};
use chatcore::fresh::{Payload, PayloadSource, payload_from_body};
use chatcore::net::{HttpClient, HttpRequest, HttpResponse};
use chatcore::{ObjectId, TransportError};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Credentials of the logged-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: String,
    pub user_id: Option<ObjectId>,
}

/// Shared handle to the chat API.
///
/// Builds auth headers per call and performs every server-side action a
/// [`Chat`] delegates to it. Views hold an `Arc<Client>`.
pub struct Client {
    pub(crate) http_client: Arc<dyn HttpClient>,
    pub(crate) config: ClientConfig,
    pub(crate) api: Api,
    session: RwLock<Option<Session>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("http_client", &"<dyn HttpClient>")
            .finish()
    }
}

impl Client {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ClientConfig) -> Arc<Self> {
        let api = Api::new(config.api_root.clone());
        Arc::new(Self {
            http_client,
            config,
            api,
            session: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub async fn login(&self, key: impl Into<String>, user_id: Option<ObjectId>) {
        *self.session.write().await = Some(Session {
            key: key.into(),
            user_id,
        });
    }

    pub async fn logout(&self) {
        *self.session.write().await = None;
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Id of the logged-in user, if known.
    pub async fn user_id(&self) -> Option<ObjectId> {
        self.session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.user_id.clone())
    }

    /// Headers attached to every API call.
    pub async fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("User-Agent".to_string(), self.config.user_agent.clone());
        if let Some(session) = self.session.read().await.as_ref() {
            headers.insert("Session-Key".to_string(), session.key.clone());
        }
        headers
    }

    /// Opens a view over a channel. Nothing is fetched until an accessor
    /// needs it.
    pub fn chat(self: &Arc<Self>, channel_url: impl Into<ObjectId>) -> Chat {
        Chat::new(self, channel_url)
    }

    /// Sends an authenticated request and rejects non-2xx responses.
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let request = request.with_headers(self.headers().await);
        debug!("{} {}", request.method, request.url);
        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(TransportError::Status {
                code: response.status_code,
                body: response.body_string(),
            });
        }
        Ok(response)
    }

    pub async fn send_text_message(
        &self,
        content: &str,
        chat: &Chat,
    ) -> Result<(), TransportError> {
        info!("Sending text message to {}", chat.channel_url());
        let body = MessageBody::text(self.user_id().await, content);
        self.send(self.api.send_message(chat.channel_url(), &body)?)
            .await?;
        Ok(())
    }

    pub async fn send_image_message(
        &self,
        url: &str,
        chat: &Chat,
        opts: &ImageOptions,
    ) -> Result<(), TransportError> {
        info!("Sending image {url} to {}", chat.channel_url());
        let body = MessageBody::image(self.user_id().await, url, opts);
        self.send(self.api.send_message(chat.channel_url(), &body)?)
            .await?;
        Ok(())
    }

    pub async fn mark_chat_read(&self, chat: &Chat) -> Result<(), TransportError> {
        let user_id = self.user_id().await;
        self.send(self.api.mark_read(chat.channel_url(), user_id.as_ref())?)
            .await?;
        Ok(())
    }

    pub async fn modify_chat_presence(
        &self,
        presence: Presence,
        chat: &Chat,
    ) -> Result<(), TransportError> {
        info!("{presence:?} {}", chat.channel_url());
        let user_id = self.user_id().await;
        self.send(
            self.api
                .presence(chat.channel_url(), presence, user_id.as_ref())?,
        )
        .await?;
        Ok(())
    }

    pub async fn modify_chat_operator(
        &self,
        action: OperatorAction,
        user: &(dyn UserRef + '_),
        chat: &Chat,
    ) -> Result<(), TransportError> {
        let user_id = user.user_id();
        info!("Operator {action:?} {user_id} in {}", chat.channel_url());
        self.send(
            self.api
                .modify_operator(chat.channel_url(), action, &user_id)?,
        )
        .await?;
        Ok(())
    }

    pub async fn invite_users_to_chat(
        &self,
        users: &[&(dyn UserRef + '_)],
        chat: &Chat,
    ) -> Result<(), TransportError> {
        let ids: Vec<ObjectId> = users.iter().map(|u| u.user_id()).collect();
        info!("Inviting {} user(s) to {}", ids.len(), chat.channel_url());
        self.send(self.api.invite(chat.channel_url(), &ids)?).await?;
        Ok(())
    }

    pub async fn kick_chat_user(
        &self,
        user: &(dyn UserRef + '_),
        chat: &Chat,
    ) -> Result<(), TransportError> {
        let user_id = user.user_id();
        info!("Kicking {user_id} from {}", chat.channel_url());
        self.send(self.api.kick(chat.channel_url(), &user_id)?)
            .await?;
        Ok(())
    }

    /// Fetches one page of a channel's member list.
    pub async fn list_chat_members(
        &self,
        chat: &Chat,
        token: Option<&str>,
    ) -> Result<MembersPage, TransportError> {
        let request =
            self.api
                .members_page(chat.channel_url(), self.config.paginated_size, token);
        let response = self.send(request).await?;
        response.json().map_err(TransportError::MalformedBody)
    }
}

#[async_trait]
impl PayloadSource for Client {
    async fn fetch_payload(&self, url: &str) -> Result<Payload, TransportError> {
        let response = self.send(HttpRequest::get(url)).await?;
        payload_from_body(url, &response.body)
    }
}
