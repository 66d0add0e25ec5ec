use crate::client::Client;
use crate::error::Result;
use crate::refs::Id;
use serde::{Deserialize, Serialize};
use serde_json::json;

const LIST_QUERY: &str = "{ projects { id name } }";

const SETUP_MUTATION: &str = r#"
mutation ProjectSetup($project: String!) {
    createProjectOrGet(input: {name: $project}) {
        errors { message }
    }
}
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

pub fn list_projects(client: &Client) -> Result<Vec<Project>> {
    let data: ProjectList = client.call(LIST_QUERY, json!({}))?;
    Ok(data.projects)
}

/// Creates the project unless it already exists.
pub fn setup_project(client: &Client, project: &str) -> Result<()> {
    client.mutate(
        SETUP_MUTATION,
        json!({ "project": project }),
        &["createProjectOrGet"],
    )
}
