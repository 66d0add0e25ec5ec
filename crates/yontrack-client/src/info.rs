use crate::client::Client;
use crate::error::Result;
use serde::Deserialize;
use serde_json::json;

const VERSION_QUERY: &str = "{ info { version { display } } }";

#[derive(Debug, Default, Deserialize)]
struct InfoData {
    info: Option<Info>,
}

#[derive(Debug, Deserialize)]
struct Info {
    version: Option<Version>,
}

#[derive(Debug, Deserialize)]
struct Version {
    display: Option<String>,
}

/// Display version of the server, `None` when the client is disabled.
pub fn server_version(client: &Client) -> Result<Option<String>> {
    let data: InfoData = client.call(VERSION_QUERY, json!({}))?;
    Ok(data.info.and_then(|i| i.version).and_then(|v| v.display))
}
