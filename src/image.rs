use crate::client::Client;
use chatcore::TransportError;
use chatcore::net::HttpRequest;
use log::debug;
use std::sync::Arc;

/// A remote image reference, e.g. a chat cover.
#[derive(Debug, Clone)]
pub struct Image {
    url: String,
    client: Arc<Client>,
}

impl Image {
    pub fn new(url: impl Into<String>, client: &Arc<Client>) -> Self {
        Self {
            url: url.into(),
            client: client.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Downloads the image bytes.
    ///
    /// Images live on a CDN, so no auth headers are sent.
    pub async fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        debug!("downloading image {}", self.url);
        let request = HttpRequest::get(&self.url)
            .with_header("User-Agent", self.client.config().user_agent.clone());
        let response = self.client.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(TransportError::Status {
                code: response.status_code,
                body: response.body_string(),
            });
        }
        Ok(response.body)
    }
}
