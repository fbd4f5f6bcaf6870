/// Settings shared by every request a [`crate::client::Client`] makes.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Root of the chat API, without a trailing slash.
    pub api_root: String,
    pub user_agent: String,
    /// Page size for paginated listings.
    pub paginated_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: "https://api-us-1.sendbird.com/v3".to_string(),
            user_agent: concat!("chat-rust/", env!("CARGO_PKG_VERSION")).to_string(),
            paginated_size: 25,
        }
    }
}
