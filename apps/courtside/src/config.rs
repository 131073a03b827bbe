use std::env;
#[cfg(test)]
use std::sync::Mutex;

/// Courtside client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// The backend server address (defaults to "127.0.0.1:8000")
    pub server: String,
}

impl Config {
    /// Build a configuration for the given server address.
    pub fn new(server: impl Into<String>) -> Self {
        let server = server.into();
        // Normalize localhost to IPv4 to avoid IPv6 (::1) preference on macOS
        let server = if server.starts_with("localhost") {
            server.replacen("localhost", "127.0.0.1", 1)
        } else {
            server
        };
        Self { server }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let server =
            env::var("COURTSIDE_SERVER").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        Self::new(server)
    }

    /// Whether to speak TLS to this server (https/wss vs http/ws). An
    /// explicit scheme in the address always wins.
    fn use_tls(&self) -> bool {
        !self.server.contains("127.0.0.1") && !self.server.contains("localhost")
    }

    /// Base URL for the REST collaborator.
    pub fn api_base_url(&self) -> String {
        if self.server.starts_with("http://") || self.server.starts_with("https://") {
            return self.server.clone();
        }
        if self.use_tls() {
            format!("https://{}", self.server)
        } else {
            format!("http://{}", self.server)
        }
    }

    /// WebSocket endpoint delivering pushed notifications.
    pub fn notifications_ws_url(&self) -> String {
        let mut url = if self.server.starts_with("ws://") || self.server.starts_with("wss://") {
            self.server.clone()
        } else if self.server.starts_with("http://") {
            self.server.replacen("http://", "ws://", 1)
        } else if self.server.starts_with("https://") {
            self.server.replacen("https://", "wss://", 1)
        } else if self.use_tls() {
            format!("wss://{}", self.server)
        } else {
            format!("ws://{}", self.server)
        };
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str("ws/notifications/");
        url
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:8000".to_string(),
        }
    }
}
