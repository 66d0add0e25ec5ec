use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::refs::BranchRef;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CHML_THRESHOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(CRITICAL|HIGH|MEDIUM|LOW)=(\d+)$").expect("CHML threshold regex should compile")
});

/// Severity level of a CHML validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChmlLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for ChmlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChmlLevel::Critical => "CRITICAL",
            ChmlLevel::High => "HIGH",
            ChmlLevel::Medium => "MEDIUM",
            ChmlLevel::Low => "LOW",
        })
    }
}

/// A `LEVEL=value` threshold, such as `HIGH=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChmlThreshold {
    pub level: ChmlLevel,
    pub value: u32,
}

impl FromStr for ChmlThreshold {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid =
            || ClientError::Input(format!("{s} must match (CRITICAL|HIGH|MEDIUM|LOW)=<int>"));
        let captures = CHML_THRESHOLD.captures(s).ok_or_else(invalid)?;
        let level = match &captures[1] {
            "CRITICAL" => ChmlLevel::Critical,
            "HIGH" => ChmlLevel::High,
            "MEDIUM" => ChmlLevel::Medium,
            _ => ChmlLevel::Low,
        };
        let value = captures[2].parse().map_err(|_| invalid())?;
        Ok(Self { level, value })
    }
}

const GENERIC_TEMPLATE: &str = r#"
mutation SetupValidationStamp($project: String!, $branch: String!, $validation: String!, $description: String, $dataType: String) {
    setupValidationStamp(input: {project: $project, branch: $branch, validation: $validation, description: $description, dataType: $dataType, dataTypeConfig: DATA_TYPE_CONFIG}) {
        errors { message }
    }
}
"#;

const TESTS_MUTATION: &str = r#"
mutation SetupTestSummaryValidationStamp($project: String!, $branch: String!, $validation: String!, $description: String, $warningIfSkipped: Boolean!, $failWhenNoResults: Boolean!) {
    setupTestSummaryValidationStamp(input: {project: $project, branch: $branch, validation: $validation, description: $description, warningIfSkipped: $warningIfSkipped, failWhenNoResults: $failWhenNoResults}) {
        errors { message }
    }
}
"#;

const PERCENTAGE_MUTATION: &str = r#"
mutation SetupPercentageValidationStamp($project: String!, $branch: String!, $validation: String!, $description: String, $warning: Int, $failure: Int, $okIfGreater: Boolean!) {
    setupPercentageValidationStamp(input: {project: $project, branch: $branch, validation: $validation, description: $description, warningThreshold: $warning, failureThreshold: $failure, okIfGreater: $okIfGreater}) {
        errors { message }
    }
}
"#;

const CHML_MUTATION: &str = r#"
mutation SetupCHMLValidationStamp($project: String!, $branch: String!, $validation: String!, $description: String, $warningLevel: CHML!, $warningValue: Int!, $failedLevel: CHML!, $failedValue: Int!) {
    setupCHMLValidationStamp(input: {
        project: $project,
        branch: $branch,
        validation: $validation,
        description: $description,
        warningLevel: {level: $warningLevel, value: $warningValue},
        failedLevel: {level: $failedLevel, value: $failedValue}
    }) {
        errors { message }
    }
}
"#;

/// Name and description of a validation stamp.
#[derive(Debug, Clone, Default)]
pub struct StampSpec {
    pub name: String,
    pub description: Option<String>,
}

impl StampSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    fn variables(&self, branch: &BranchRef) -> serde_json::Map<String, serde_json::Value> {
        let mut vars = serde_json::Map::new();
        vars.insert("project".into(), json!(branch.project));
        vars.insert("branch".into(), json!(branch.branch));
        vars.insert("validation".into(), json!(self.name));
        vars.insert(
            "description".into(),
            json!(self.description.as_deref().unwrap_or_default()),
        );
        vars
    }
}

/// Creates or updates a validation stamp.
///
/// `data_type_config` is a GraphQL input literal, inserted as is.
pub fn setup_validation_stamp(
    client: &Client,
    branch: &BranchRef,
    stamp: &StampSpec,
    data_type: Option<&str>,
    data_type_config: Option<&str>,
) -> Result<()> {
    let config = data_type_config
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("null");
    let query = GENERIC_TEMPLATE.replace("DATA_TYPE_CONFIG", config);
    let mut vars = stamp.variables(branch);
    vars.insert(
        "dataType".into(),
        json!(data_type.filter(|t| !t.is_empty())),
    );
    client.mutate(&query, vars.into(), &["setupValidationStamp"])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TestsStampConfig {
    pub warning_if_skipped: bool,
    pub fail_when_no_results: bool,
}

pub fn setup_tests_validation_stamp(
    client: &Client,
    branch: &BranchRef,
    stamp: &StampSpec,
    config: TestsStampConfig,
) -> Result<()> {
    let mut vars = stamp.variables(branch);
    vars.insert("warningIfSkipped".into(), json!(config.warning_if_skipped));
    vars.insert("failWhenNoResults".into(), json!(config.fail_when_no_results));
    client.mutate(TESTS_MUTATION, vars.into(), &["setupTestSummaryValidationStamp"])
}

/// Thresholds of a percentage validation stamp. A threshold of zero is
/// sent as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentageStampConfig {
    pub warning: u32,
    pub failure: u32,
    pub ok_if_greater: bool,
}

pub fn setup_percentage_validation_stamp(
    client: &Client,
    branch: &BranchRef,
    stamp: &StampSpec,
    config: PercentageStampConfig,
) -> Result<()> {
    let positive = |value: u32| (value > 0).then_some(value);
    let mut vars = stamp.variables(branch);
    vars.insert("warning".into(), json!(positive(config.warning)));
    vars.insert("failure".into(), json!(positive(config.failure)));
    vars.insert("okIfGreater".into(), json!(config.ok_if_greater));
    client.mutate(PERCENTAGE_MUTATION, vars.into(), &["setupPercentageValidationStamp"])
}

pub fn setup_chml_validation_stamp(
    client: &Client,
    branch: &BranchRef,
    stamp: &StampSpec,
    warning: ChmlThreshold,
    failed: ChmlThreshold,
) -> Result<()> {
    let mut vars = stamp.variables(branch);
    vars.insert("warningLevel".into(), json!(warning.level));
    vars.insert("warningValue".into(), json!(warning.value));
    vars.insert("failedLevel".into(), json!(failed.level));
    vars.insert("failedValue".into(), json!(failed.value));
    client.mutate(CHML_MUTATION, vars.into(), &["setupCHMLValidationStamp"])
}
