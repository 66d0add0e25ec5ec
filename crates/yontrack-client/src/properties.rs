use crate::client::Client;
use crate::error::Result;
use crate::refs::{BranchRef, BuildRef};
use serde_json::{Map, Value, json};

/// The entity a property is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyEntity {
    Project(String),
    Branch(BranchRef),
    Build(BuildRef),
}

impl PropertyEntity {
    fn type_name(&self) -> &'static str {
        match self {
            PropertyEntity::Project(_) => "Project",
            PropertyEntity::Branch(_) => "Branch",
            PropertyEntity::Build(_) => "Build",
        }
    }

    fn names(&self) -> Vec<(&'static str, &str)> {
        match self {
            PropertyEntity::Project(project) => vec![("project", project.as_str())],
            PropertyEntity::Branch(b) => vec![
                ("project", b.project.as_str()),
                ("branch", b.branch.as_str()),
            ],
            PropertyEntity::Build(b) => vec![
                ("project", b.project.as_str()),
                ("branch", b.branch.as_str()),
                ("build", b.build.as_str()),
            ],
        }
    }

    fn mutation_name(&self) -> String {
        format!("set{}Property", self.type_name())
    }
}

fn set_property_mutation(entity: &PropertyEntity, value: &str) -> String {
    let names = entity.names();
    let declarations: Vec<String> = names
        .iter()
        .map(|(name, _)| format!("${name}: String!"))
        .collect();
    let inputs: Vec<String> = names
        .iter()
        .map(|(name, _)| format!("{name}: ${name}"))
        .collect();
    let value = if value.trim().is_empty() {
        "null"
    } else {
        value.trim()
    };
    format!(
        "mutation SetProperty({}, $property: String!) {{\n    {}(input: {{{}, property: $property, value: {}}}) {{\n        errors {{ message }}\n    }}\n}}",
        declarations.join(", "),
        entity.mutation_name(),
        inputs.join(", "),
        value,
    )
}

/// Sets a property of any type.
///
/// `value` is a GraphQL input literal, for example
/// `{url: "https://example.com", name: "Docs"}`, written as is into the
/// mutation.
pub fn set_property(
    client: &Client,
    entity: &PropertyEntity,
    property_type: &str,
    value: &str,
) -> Result<()> {
    let mut variables = Map::new();
    for (name, entity_name) in entity.names() {
        variables.insert(name.to_string(), json!(entity_name));
    }
    variables.insert("property".to_string(), json!(property_type));

    let query = set_property_mutation(entity, value);
    let node = entity.mutation_name();
    client.mutate(&query, Value::Object(variables), &[node.as_str()])
}

const GITHUB_MUTATION: &str = r#"
mutation SetProjectGitHubProperty(
    $project: String!,
    $configuration: String!,
    $repository: String!,
    $indexationInterval: Int,
    $issueServiceConfigurationIdentifier: String
) {
    setProjectGitHubConfigurationProperty(input: {
        project: $project,
        configuration: $configuration,
        repository: $repository,
        indexationInterval: $indexationInterval,
        issueServiceConfigurationIdentifier: $issueServiceConfigurationIdentifier
    }) {
        errors { message }
    }
}
"#;

const AUTO_VALIDATION_STAMP_MUTATION: &str = r#"
mutation SetProjectAutoValidationStampProperty($project: String!, $autoCreate: Boolean!, $autoCreateIfNotPredefined: Boolean!) {
    setProjectAutoValidationStampProperty(input: {project: $project, isAutoCreate: $autoCreate, isAutoCreateIfNotPredefined: $autoCreateIfNotPredefined}) {
        errors { message }
    }
}
"#;

const AUTO_PROMOTION_LEVEL_MUTATION: &str = r#"
mutation SetProjectAutoPromotionLevelProperty($project: String!, $autoCreate: Boolean!) {
    setProjectAutoPromotionLevelProperty(input: {project: $project, isAutoCreate: $autoCreate}) {
        errors { message }
    }
}
"#;

/// Link between a project and a GitHub repository.
#[derive(Debug, Clone, Default)]
pub struct GitHubConfig {
    /// Name of the GitHub configuration registered on the server.
    pub configuration: String,
    /// `owner/name`
    pub repository: String,
    /// Minutes between two indexations.
    pub indexation_interval: Option<u32>,
    pub issue_service: Option<String>,
}

pub fn set_project_github_config(
    client: &Client,
    project: &str,
    github: &GitHubConfig,
) -> Result<()> {
    client.mutate(
        GITHUB_MUTATION,
        json!({
            "project": project,
            "configuration": github.configuration,
            "repository": github.repository,
            "indexationInterval": github.indexation_interval,
            "issueServiceConfigurationIdentifier": github.issue_service,
        }),
        &["setProjectGitHubConfigurationProperty"],
    )
}

pub fn set_project_auto_validation_stamp(
    client: &Client,
    project: &str,
    auto_create: bool,
    auto_create_if_not_predefined: bool,
) -> Result<()> {
    client.mutate(
        AUTO_VALIDATION_STAMP_MUTATION,
        json!({
            "project": project,
            "autoCreate": auto_create,
            "autoCreateIfNotPredefined": auto_create_if_not_predefined,
        }),
        &["setProjectAutoValidationStampProperty"],
    )
}

pub fn set_project_auto_promotion_level(
    client: &Client,
    project: &str,
    auto_create: bool,
) -> Result<()> {
    client.mutate(
        AUTO_PROMOTION_LEVEL_MUTATION,
        json!({ "project": project, "autoCreate": auto_create }),
        &["setProjectAutoPromotionLevelProperty"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_replying, last_body, last_query};

    #[test]
    fn test_build_property_mutation() {
        let entity = PropertyEntity::Build(BuildRef::new("p", "feature/1", "12"));
        let query = set_property_mutation(&entity, r#" {name: "x"} "#);
        assert!(query.starts_with(
            "mutation SetProperty($project: String!, $branch: String!, $build: String!, $property: String!)"
        ));
        assert!(query.contains(
            r#"setBuildProperty(input: {project: $project, branch: $branch, build: $build, property: $property, value: {name: "x"}})"#
        ));
    }

    #[test]
    fn test_empty_value_is_null() {
        let query = set_property_mutation(&PropertyEntity::Project("p".into()), "  ");
        assert!(query.contains("value: null"));
    }

    #[test]
    fn test_set_property_checks_entity_node() {
        let (client, requests) = client_replying(
            r#"{"data":{"setBranchProperty":{"errors":[{"message":"Property not found"}]}}}"#,
        );
        let entity = PropertyEntity::Branch(BranchRef::new("p", "main"));
        let err = set_property(&client, &entity, "com.example.Type", "{}").unwrap_err();
        assert_eq!(err.to_string(), "1) Property not found\n");

        let vars = &last_body(&requests)["variables"];
        assert_eq!(vars["project"], "p");
        assert_eq!(vars["branch"], "main");
        assert_eq!(vars["property"], "com.example.Type");
    }

    #[test]
    fn test_github_config() {
        let (client, requests) = client_replying(r#"{"data":{}}"#);
        let github = GitHubConfig {
            configuration: "GitHub".into(),
            repository: "nemerosa/ontrack".into(),
            indexation_interval: Some(30),
            issue_service: None,
        };
        set_project_github_config(&client, "ontrack", &github).unwrap();
        let vars = &last_body(&requests)["variables"];
        assert_eq!(vars["indexationInterval"], 30);
        assert!(vars["issueServiceConfigurationIdentifier"].is_null());
        assert!(last_query(&requests).contains("setProjectGitHubConfigurationProperty"));
    }

    #[test]
    fn test_auto_flags() {
        let (client, requests) = client_replying(r#"{"data":{}}"#);
        set_project_auto_validation_stamp(&client, "p", true, false).unwrap();
        let vars = &last_body(&requests)["variables"];
        assert_eq!(vars["autoCreate"], true);
        assert_eq!(vars["autoCreateIfNotPredefined"], false);
    }
}
