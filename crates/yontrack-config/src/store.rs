use crate::error::{ConfigError, Result};
use crate::types::{Config, RootConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the configuration, in the home directory.
pub const CONFIG_FILE_NAME: &str = ".yontrack-config.yaml";

/// Access to the configuration file.
///
/// Each operation reads the whole file and, for updates, writes it back
/// entirely. Concurrent writers are not coordinated.
///
/// # Example
///
/// ```rust
/// use yontrack_config::{Config, ConfigStore};
///
/// let dir = tempfile::tempdir()?;
/// let store = ConfigStore::with_path(dir.path().join("config.yaml"));
///
/// store.add(Config::new("local", "http://localhost:8080").with_token("secret"))?;
/// assert_eq!(store.selected()?.name, "local");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store located at `$HOME/.yontrack-config.yaml`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(Self::with_path(home.join(CONFIG_FILE_NAME)))
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file. A missing file is an empty configuration.
    pub fn read_root(&self) -> Result<RootConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RootConfig::default());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(RootConfig::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn write_root(&self, root: &RootConfig) -> Result<()> {
        let yaml = serde_yaml::to_string(root)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// The configuration currently selected.
    pub fn selected(&self) -> Result<Config> {
        self.read_root()?.selected_config().cloned()
    }

    /// Adds a configuration and makes it the selected one.
    pub fn add(&self, config: Config) -> Result<()> {
        let mut root = self.read_root()?;
        if root.find(&config.name).is_some() {
            return Err(ConfigError::AlreadyExists(config.name));
        }
        root.selected = Some(config.name.clone());
        root.configurations.push(config);
        self.write_root(&root)
    }

    pub fn select(&self, name: &str) -> Result<()> {
        let mut root = self.read_root()?;
        if root.find(name).is_none() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        root.selected = Some(name.to_string());
        self.write_root(&root)
    }

    /// Enables or disables a configuration, the selected one when `name` is
    /// `None`. Returns the name of the updated configuration.
    pub fn set_disabled(&self, name: Option<&str>, disabled: bool) -> Result<String> {
        let mut root = self.read_root()?;
        let target = match name {
            Some(name) => name.to_string(),
            None => root
                .selected_name()
                .ok_or(ConfigError::NoSelection)?
                .to_string(),
        };
        let config = root
            .find_mut(&target)
            .ok_or_else(|| ConfigError::NotFound(target.clone()))?;
        config.disabled = disabled;
        self.write_root(&root)?;
        Ok(target)
    }
}
