use crate::client::Client;
use crate::error::Result;
use crate::refs::BranchRef;
use serde_json::{Value, json};

const SETUP_MUTATION: &str = r#"
mutation BranchSetup($project: String!, $branch: String!) {
    createProjectOrGet(input: {name: $project}) {
        errors { message }
    }
    createBranchOrGet(input: {projectName: $project, name: $branch}) {
        errors { message }
    }
}
"#;

const GIT_CONFIG_MUTATION: &str = r#"
mutation SetBranchGitConfig($project: String!, $branch: String!, $gitBranch: String!) {
    setBranchGitConfigProperty(input: {project: $project, branch: $branch, gitBranch: $gitBranch}) {
        errors { message }
    }
}
"#;

const AUTO_VERSIONING_MUTATION: &str = r#"
mutation SetAutoVersioning($project: String!, $branch: String!, $configurations: [AutoVersioningSourceConfigInput!]!) {
    setAutoVersioningConfigByName(input: {project: $project, branch: $branch, configurations: $configurations}) {
        errors { message }
    }
}
"#;

/// Creates the project and the branch, reusing existing ones.
pub fn setup_branch(client: &Client, branch: &BranchRef) -> Result<()> {
    client.mutate(
        SETUP_MUTATION,
        json!({ "project": branch.project, "branch": branch.branch }),
        &["createProjectOrGet", "createBranchOrGet"],
    )
}

pub fn set_branch_git_config(client: &Client, branch: &BranchRef, git_branch: &str) -> Result<()> {
    client.mutate(
        GIT_CONFIG_MUTATION,
        json!({
            "project": branch.project,
            "branch": branch.branch,
            "gitBranch": git_branch,
        }),
        &["setBranchGitConfigProperty"],
    )
}

/// Replaces the auto-versioning configuration of the branch.
///
/// Each configuration is passed through as given.
pub fn set_auto_versioning_config(
    client: &Client,
    branch: &BranchRef,
    configurations: &[Value],
) -> Result<()> {
    client.mutate(
        AUTO_VERSIONING_MUTATION,
        json!({
            "project": branch.project,
            "branch": branch.branch,
            "configurations": configurations,
        }),
        &["setAutoVersioningConfigByName"],
    )
}
