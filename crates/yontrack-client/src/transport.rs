use crate::error::{ClientError, Result};
use yontrack_config::Config;

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "X-Ontrack-Token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Token(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl Auth {
    /// Token first, then username/password, else anonymous.
    pub fn from_config(config: &Config) -> Self {
        if let Some(token) = config.token() {
            Auth::Token(token.to_string())
        } else if let Some(username) = config.username() {
            Auth::Basic {
                username: username.to_string(),
                password: config.password().map(str::to_string),
            }
        } else {
            Auth::None
        }
    }
}

/// A GraphQL POST, ready to send.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub auth: Auth,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Sends requests to the server.
///
/// Failures to reach the server are reported as [`ClientError::Connection`]
/// so the client can retry them.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("yontrack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        builder = match &request.auth {
            Auth::Token(token) => builder.header(TOKEN_HEADER, token),
            Auth::Basic { username, password } => builder.basic_auth(username, password.as_deref()),
            Auth::None => builder,
        };

        let response = builder.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::Connection(e.to_string())
            } else {
                ClientError::Transport(e)
            }
        })?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(Response { status, body })
    }
}
