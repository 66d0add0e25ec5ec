use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// Retry policy for connection-level failures.
///
/// `retries` is the number of extra attempts after the first one, so the
/// default of `0` means a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRetry {
    #[serde(default)]
    pub retries: u32,
    /// Seconds to wait between two attempts.
    #[serde(default = "default_wait")]
    pub wait: u64,
}

fn default_wait() -> u64 {
    5
}

impl Default for ConnectionRetry {
    fn default() -> Self {
        Self {
            retries: 0,
            wait: default_wait(),
        }
    }
}

/// A named connection to a remote server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub url: String,
    /// Username for basic authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Token authentication; takes priority over username/password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// A disabled connection never reaches the network.
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub retry: ConnectionRetry,
}

impl Config {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: None,
            password: None,
            token: None,
            disabled: false,
            retry: ConnectionRetry::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    pub fn with_retry(mut self, retry: ConnectionRetry) -> Self {
        self.retry = retry;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// The token, ignoring empty values left by older files.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

/// Content of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    /// Name of the configuration used by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(default)]
    pub configurations: Vec<Config>,
}

impl RootConfig {
    pub fn find(&self, name: &str) -> Option<&Config> {
        self.configurations.iter().find(|c| c.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Config> {
        self.configurations.iter_mut().find(|c| c.name == name)
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.as_deref().filter(|s| !s.is_empty())
    }

    pub fn selected_config(&self) -> Result<&Config> {
        let name = self.selected_name().ok_or(ConfigError::NoSelection)?;
        self.find(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ignores_empty_value() {
        let config = Config::new("local", "http://localhost:8080").with_token("");
        assert!(config.token().is_none());
        let config = config.with_token("abc");
        assert_eq!(config.token(), Some("abc"));
    }

    #[test]
    fn test_selected_config_without_selection() {
        let root = RootConfig {
            selected: Some(String::new()),
            configurations: vec![Config::new("local", "http://localhost:8080")],
        };
        assert!(matches!(
            root.selected_config(),
            Err(ConfigError::NoSelection)
        ));
    }

    #[test]
    fn test_selected_config_dangling_name() {
        let root = RootConfig {
            selected: Some("prod".into()),
            configurations: vec![Config::new("local", "http://localhost:8080")],
        };
        let err = root.selected_config().unwrap_err();
        assert_eq!(err.to_string(), "No configuration named prod");
    }

    #[test]
    fn test_deserialize_legacy_profile() {
        let yaml = "name: old\nurl: http://ontrack\nusername: ''\npassword: ''\ntoken: xyz\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.token(), Some("xyz"));
        assert!(config.username().is_none());
        assert!(!config.disabled);
        assert_eq!(config.retry, ConnectionRetry::default());
    }

    #[test]
    fn test_retry_wait_defaults_when_missing() {
        let retry: ConnectionRetry = serde_yaml::from_str("retries: 3").unwrap();
        assert_eq!(retry.retries, 3);
        assert_eq!(retry.wait, 5);
    }
}
