use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::Client;
use crate::config::ClientConfig;
use chatcore::net::{HttpClient, HttpRequest, HttpResponse};

pub const TEST_API_ROOT: &str = "https://api.test/v3";

/// HTTP client that serves scripted responses per `METHOD url` and records
/// every request it sees. The last scripted response for a route repeats;
/// unknown routes get a 404.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    routes: Arc<Mutex<HashMap<String, VecDeque<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    delay: Option<Duration>,
}

fn route_key(method: &str, url: &str) -> String {
    format!("{method} {url}")
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response, to keep requests in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, method: &str, url: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry(route_key(method, url))
            .or_default()
            .push_back(response);
    }

    pub fn respond_json(&self, method: &str, url: &str, body: serde_json::Value) {
        self.respond(
            method,
            url,
            HttpResponse {
                status_code: 200,
                body: serde_json::to_vec(&body).unwrap(),
            },
        );
    }

    pub fn respond_status(&self, method: &str, url: &str, status_code: u16) {
        self.respond(method, url, HttpResponse::empty(status_code));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests seen for `METHOD url`.
    pub fn count(&self, method: &str, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

#[async_trait::async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, anyhow::Error> {
        let key = route_key(&request.method, &request.url);
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| HttpResponse::empty(404)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FailingMockHttpClient;

#[async_trait::async_trait]
impl HttpClient for FailingMockHttpClient {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, anyhow::Error> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        api_root: TEST_API_ROOT.to_string(),
        ..ClientConfig::default()
    }
}

pub fn create_test_client(http: &MockHttpClient) -> Arc<Client> {
    Client::new(Arc::new(http.clone()), test_config())
}

pub fn create_test_client_with_failing_http() -> Arc<Client> {
    Client::new(Arc::new(FailingMockHttpClient), test_config())
}

pub fn channel_url(channel: &str) -> String {
    format!("{TEST_API_ROOT}/group_channels/{channel}")
}
