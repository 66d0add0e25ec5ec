use crate::client::Client;
use crate::error::Result;
use crate::refs::{BranchRef, BuildRef};
use crate::run_info::RunInfo;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Property type holding the Git commit of a build.
pub const GIT_COMMIT_PROPERTY: &str =
    "net.nemerosa.ontrack.extension.git.property.GitCommitPropertyType";

/// Number of builds returned by a search when no count is given.
pub const DEFAULT_SEARCH_COUNT: u32 = 10;

const SETUP_MUTATION: &str = r#"
mutation BuildSetup(
    $project: String!,
    $branch: String!,
    $build: String!,
    $description: String,
    $runInfo: RunInfoInput,
    $releaseProperty: Boolean!,
    $release: String!
) {
    createBuildOrGet(input: {projectName: $project, branchName: $branch, name: $build, description: $description, runInfo: $runInfo}) {
        errors { message }
    }
    setBuildReleaseProperty(input: {project: $project, branch: $branch, build: $build, release: $release}) @include(if: $releaseProperty) {
        errors { message }
    }
}
"#;

const PROJECT_SEARCH_QUERY: &str = r#"
query BuildProjectSearch($project: String!, $buildProjectFilter: BuildSearchForm!) {
    builds(project: $project, buildProjectFilter: $buildProjectFilter) {
        name
        branch { name }
    }
}
"#;

const BRANCH_SEARCH_QUERY: &str = r#"
query BuildBranchSearch($project: String!, $branch: String!, $buildBranchFilter: StandardBuildFilter!) {
    builds(project: $project, branch: $branch, buildBranchFilter: $buildBranchFilter) {
        name
        branch { name }
    }
}
"#;

const GIT_COMMIT_MUTATION: &str = r#"
mutation SetBuildGitCommitProperty($project: String!, $branch: String!, $build: String!, $commit: String!) {
    setBuildGitCommitProperty(input: {project: $project, branch: $branch, build: $build, commit: $commit}) {
        errors { message }
    }
}
"#;

const RELEASE_MUTATION: &str = r#"
mutation SetBuildReleaseProperty($project: String!, $branch: String!, $build: String!, $release: String!) {
    setBuildReleaseProperty(input: {project: $project, branch: $branch, build: $build, release: $release}) {
        errors { message }
    }
}
"#;

const AUTO_VERSIONING_CHECK_MUTATION: &str = r#"
mutation CheckAutoVersioning($project: String!, $branch: String!, $build: String!) {
    checkAutoVersioning(input: {project: $project, branch: $branch, build: $build}) {
        errors { message }
    }
}
"#;

const CHANGE_LOG_QUERY: &str = r#"
query ChangeLogExport($from: Int!, $to: Int!, $request: SCMChangeLogExportInput) {
    scmChangeLog(from: $from, to: $to) {
        export(request: $request)
    }
}
"#;

#[derive(Debug, Clone, Default)]
pub struct BuildSetup {
    pub description: Option<String>,
    /// Release label, set as a property of the build.
    pub release: Option<String>,
    pub run_info: Option<RunInfo>,
}

/// Creates the build unless it exists, optionally labelling it.
pub fn setup_build(client: &Client, build: &BuildRef, setup: &BuildSetup) -> Result<()> {
    let release = setup.release.as_deref().filter(|r| !r.is_empty());
    client.mutate(
        SETUP_MUTATION,
        json!({
            "project": build.project,
            "branch": build.branch,
            "build": build.build,
            "description": setup.description.as_deref().unwrap_or_default(),
            "runInfo": setup.run_info,
            "releaseProperty": release.is_some(),
            "release": release.unwrap_or_default(),
        }),
        &["createBuildOrGet", "setBuildReleaseProperty"],
    )
}

/// Criteria shared by project and branch searches.
#[derive(Debug, Clone, Default)]
pub struct BuildSearch {
    pub count: Option<u32>,
    pub with_promotion: Option<String>,
    /// Git commit, looked up through [`GIT_COMMIT_PROPERTY`].
    pub commit: Option<String>,
}

impl BuildSearch {
    fn form(&self, count: &str, promotion: &str, property: &str, property_value: &str) -> Value {
        let mut form = Map::new();
        let max = self.count.unwrap_or(DEFAULT_SEARCH_COUNT);
        if max > 0 {
            form.insert(count.to_string(), json!(max));
        }
        if let Some(promotion_name) = self.with_promotion.as_deref().filter(|p| !p.is_empty()) {
            form.insert(promotion.to_string(), json!(promotion_name));
        }
        if let Some(commit) = self.commit.as_deref().filter(|c| !c.is_empty()) {
            form.insert(property.to_string(), json!(GIT_COMMIT_PROPERTY));
            form.insert(property_value.to_string(), json!(commit));
        }
        Value::Object(form)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub name: String,
    pub branch: BranchName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchName {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
struct BuildList {
    #[serde(default)]
    builds: Vec<BuildSummary>,
}

/// Searches builds across all branches of a project.
pub fn search_project_builds(
    client: &Client,
    project: &str,
    search: &BuildSearch,
) -> Result<Vec<BuildSummary>> {
    let form = search.form("maximumCount", "promotionName", "property", "propertyValue");
    let data: BuildList = client.call(
        PROJECT_SEARCH_QUERY,
        json!({ "project": project, "buildProjectFilter": form }),
    )?;
    Ok(data.builds)
}

pub fn search_branch_builds(
    client: &Client,
    branch: &BranchRef,
    search: &BuildSearch,
) -> Result<Vec<BuildSummary>> {
    let form = search.form(
        "count",
        "withPromotionLevel",
        "withProperty",
        "withPropertyValue",
    );
    let data: BuildList = client.call(
        BRANCH_SEARCH_QUERY,
        json!({
            "project": branch.project,
            "branch": branch.branch,
            "buildBranchFilter": form,
        }),
    )?;
    Ok(data.builds)
}

pub fn set_build_git_commit(client: &Client, build: &BuildRef, commit: &str) -> Result<()> {
    client.mutate(
        GIT_COMMIT_MUTATION,
        json!({
            "project": build.project,
            "branch": build.branch,
            "build": build.build,
            "commit": commit,
        }),
        &["setBuildGitCommitProperty"],
    )
}

pub fn set_build_release(client: &Client, build: &BuildRef, release: &str) -> Result<()> {
    client.mutate(
        RELEASE_MUTATION,
        json!({
            "project": build.project,
            "branch": build.branch,
            "build": build.build,
            "release": release,
        }),
        &["setBuildReleaseProperty"],
    )
}

/// Asks the server to check the auto-versioning state of the build's
/// dependencies.
pub fn check_auto_versioning(client: &Client, build: &BuildRef) -> Result<()> {
    client.mutate(
        AUTO_VERSIONING_CHECK_MUTATION,
        json!({
            "project": build.project,
            "branch": build.branch,
            "build": build.build,
        }),
        &["checkAutoVersioning"],
    )
}

/// Formatting options of a change log export.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// `Group=type1,type2|Other=type3`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeLogData {
    scm_change_log: Option<ChangeLogNode>,
}

#[derive(Debug, Deserialize)]
struct ChangeLogNode {
    export: Option<String>,
}

/// Formatted change log between two builds, identified by their ids.
pub fn export_change_log(
    client: &Client,
    from: i64,
    to: i64,
    export: &ChangeLogExport,
) -> Result<Option<String>> {
    let data: ChangeLogData = client.call(
        CHANGE_LOG_QUERY,
        json!({ "from": from, "to": to, "request": export }),
    )?;
    Ok(data.scm_change_log.and_then(|c| c.export))
}
