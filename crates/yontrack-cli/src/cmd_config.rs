use crate::App;
use anyhow::Result;
use clap::Subcommand;
use yontrack_config::{Config, ConnectionRetry, RootConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigOp {
    /// Create a configuration and select it
    Create {
        /// Name of the configuration
        name: String,

        /// URL of the server
        url: String,

        /// Username for basic authentication
        #[arg(short, long)]
        username: Option<String>,

        /// Password for basic authentication
        #[arg(short, long)]
        password: Option<String>,

        /// Token authentication, takes priority over username/password
        #[arg(short, long)]
        token: Option<String>,

        /// Extra attempts when the server cannot be reached
        #[arg(long, default_value_t = 0)]
        retries: u32,

        /// Seconds between two attempts
        #[arg(long, default_value_t = 5)]
        wait: u64,

        /// Create the configuration as disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Select the configuration to use
    Select {
        /// Name of the configuration
        name: String,
    },
    /// List the configurations, the selected one marked with `*`
    List,
    /// Display the selected configuration
    Current,
    /// Disable a configuration so that no call reaches the server
    Disable {
        /// Name of the configuration, the selected one by default
        name: Option<String>,
    },
    /// Enable a configuration
    Enable {
        /// Name of the configuration, the selected one by default
        name: Option<String>,
    },
}

pub fn run(app: &App, op: ConfigOp) -> Result<()> {
    let store = app.store();
    match op {
        ConfigOp::Create {
            name,
            url,
            username,
            password,
            token,
            retries,
            wait,
            disabled,
        } => {
            let mut config = Config::new(name, url)
                .with_retry(ConnectionRetry { retries, wait })
                .disabled(disabled);
            if let Some(username) = username {
                config = config.with_basic_auth(username, password);
            }
            if let Some(token) = token {
                config = config.with_token(token);
            }
            let name = config.name.clone();
            store.add(config)?;
            tracing::info!(%name, path = %store.path().display(), "configuration created");
            Ok(())
        }
        ConfigOp::Select { name } => {
            store.select(&name)?;
            Ok(())
        }
        ConfigOp::List => {
            for line in list_lines(&store.read_root()?) {
                println!("{line}");
            }
            Ok(())
        }
        ConfigOp::Current => {
            let config = store.selected()?;
            println!("{}", describe(&config));
            Ok(())
        }
        ConfigOp::Disable { name } => {
            let name = store.set_disabled(name.as_deref(), true)?;
            println!("Configuration {name} disabled.");
            Ok(())
        }
        ConfigOp::Enable { name } => {
            let name = store.set_disabled(name.as_deref(), false)?;
            println!("Configuration {name} enabled.");
            Ok(())
        }
    }
}

fn describe(config: &Config) -> String {
    let mut line = format!("{} {}", config.name, config.url);
    if config.disabled {
        line.push_str(" (disabled)");
    }
    line
}

fn list_lines(root: &RootConfig) -> Vec<String> {
    let selected = root.selected_name();
    root.configurations
        .iter()
        .map(|c| {
            let marker = if Some(c.name.as_str()) == selected { '*' } else { ' ' };
            format!("{marker} {}", describe(c))
        })
        .collect()
}
