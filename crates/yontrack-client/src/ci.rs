use crate::client::{Client, Payload};
use crate::error::Result;
use crate::refs::Id;
use serde::{Deserialize, Serialize};
use serde_json::json;

const CONFIGURE_BUILD_MUTATION: &str = r#"
mutation CIConfig($config: String!, $ci: String, $scm: String, $env: [CIEnv!]!) {
    configureBuild(input: {config: $config, ci: $ci, scm: $scm, env: $env}) {
        errors {
            message
            exception
        }
        build {
            id
            name
            displayName
            branch {
                id
                name
                displayName
                project {
                    id
                    name
                }
            }
        }
    }
}
"#;

/// One CI environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CiEnv {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigureBuild {
    /// CI configuration, as YAML text.
    pub config: String,
    /// CI engine identifier, detected by the server when absent.
    pub ci: Option<String>,
    pub scm: Option<String>,
    pub env: Vec<CiEnv>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredBuild {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub branch: ConfiguredBranch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredBranch {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub project: ConfiguredProject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredProject {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigureData {
    configure_build: Option<ConfigureNode>,
}

#[derive(Debug, Deserialize)]
struct ConfigureNode {
    #[serde(flatten)]
    payload: Payload,
    build: Option<ConfiguredBuild>,
}

/// Lets the server set up project, branch and build from a CI configuration.
///
/// Returns `None` when the client is disabled.
pub fn configure_build(client: &Client, input: &ConfigureBuild) -> Result<Option<ConfiguredBuild>> {
    let data: ConfigureData = client.call(
        CONFIGURE_BUILD_MUTATION,
        json!({
            "config": input.config,
            "ci": input.ci.as_deref().filter(|c| !c.is_empty()),
            "scm": input.scm.as_deref().filter(|s| !s.is_empty()),
            "env": input.env,
        }),
    )?;
    let Some(node) = data.configure_build else {
        return Ok(None);
    };
    node.payload.check()?;
    Ok(node.build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_replying, last_body};

    const REPLY: &str = r#"{"data":{"configureBuild":{"errors":[],"build":{
        "id":"30","name":"12","displayName":"v1.2",
        "branch":{"id":"20","name":"main","displayName":"main",
        "project":{"id":"10","name":"yontrack"}}}}}}"#;

    #[test]
    fn test_configure_build() {
        let (client, requests) = client_replying(REPLY);
        let input = ConfigureBuild {
            config: "version: v1\n".into(),
            ci: Some("github".into()),
            scm: None,
            env: vec![CiEnv {
                name: "GITHUB_REF".into(),
                value: "refs/heads/main".into(),
            }],
        };
        let build = configure_build(&client, &input).unwrap().unwrap();
        assert_eq!(build.name, "12");
        assert_eq!(build.branch.project.name, "yontrack");
        assert_eq!(build.branch.project.id.to_string(), "10");

        let vars = &last_body(&requests)["variables"];
        assert_eq!(vars["ci"], "github");
        assert!(vars["scm"].is_null());
        assert_eq!(vars["env"], json!([{"name": "GITHUB_REF", "value": "refs/heads/main"}]));
    }

    #[test]
    fn test_configure_build_errors() {
        let (client, _) = client_replying(
            r#"{"data":{"configureBuild":{"errors":[{"message":"No CI engine detected","exception":"CIEngineNotDetected"}],"build":null}}}"#,
        );
        let err = configure_build(&client, &ConfigureBuild::default()).unwrap_err();
        assert_eq!(err.to_string(), "1) No CI engine detected\n");
    }

    #[test]
    fn test_serialized_build_uses_camel_case() {
        let (client, _) = client_replying(REPLY);
        let build = configure_build(&client, &ConfigureBuild::default())
            .unwrap()
            .unwrap();
        let value = serde_json::to_value(&build).unwrap();
        assert_eq!(value["displayName"], "v1.2");
        assert_eq!(value["branch"]["project"]["id"], "10");
    }
}
