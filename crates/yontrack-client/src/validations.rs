use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::refs::BuildRef;
use crate::run_info::RunInfo;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::str::FromStr;
use std::sync::LazyLock;

static METRIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)=(\d+(\.\d+)?)$").expect("metric regex should compile"));

/// A named numeric measure, parsed from `name=number[.number]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

impl FromStr for Metric {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ClientError::Input(format!("Metric {s} must match name=number[.number]"));
        let captures = METRIC.captures(s).ok_or_else(invalid)?;
        let value = captures[2].parse().map_err(|_| invalid())?;
        Ok(Self {
            name: captures[1].to_string(),
            value,
        })
    }
}

/// Parses `a=1,b=2.5` lists. Empty input gives no metrics.
pub fn parse_metric_list(list: &str) -> Result<Vec<Metric>> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}

/// Target of a validation run.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub build: BuildRef,
    pub validation: String,
    pub description: Option<String>,
    pub run_info: Option<RunInfo>,
}

impl ValidationRun {
    pub fn new(build: BuildRef, validation: impl Into<String>) -> Self {
        Self {
            build,
            validation: validation.into(),
            description: None,
            run_info: None,
        }
    }

    fn variables(&self) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert("project".into(), json!(self.build.project));
        vars.insert("branch".into(), json!(self.build.branch));
        vars.insert("build".into(), json!(self.build.build));
        vars.insert("validationStamp".into(), json!(self.validation));
        vars.insert(
            "description".into(),
            json!(self.description.as_deref().unwrap_or_default()),
        );
        vars
    }

    fn variables_with_run_info(&self) -> Map<String, Value> {
        let mut vars = self.variables();
        vars.insert("runInfo".into(), json!(self.run_info));
        vars
    }
}

const GENERIC_TEMPLATE: &str = r#"
mutation CreateValidationRun(
    $project: String!,
    $branch: String!,
    $build: String!,
    $validationStamp: String!,
    $validationRunStatus: String,
    $description: String,
    $dataTypeId: String,
    $runInfo: RunInfoInput
) {
    createValidationRun(input: {
        project: $project,
        branch: $branch,
        build: $build,
        validationStamp: $validationStamp,
        validationRunStatus: $validationRunStatus,
        description: $description,
        dataTypeId: $dataTypeId,
        data: VALIDATION_DATA,
        runInfo: $runInfo
    }) {
        errors { message }
    }
}
"#;

const TESTS_MUTATION: &str = r#"
mutation ValidateBuildWithTests($project: String!, $branch: String!, $build: String!, $validationStamp: String!, $description: String!, $runInfo: RunInfoInput, $passed: Int!, $skipped: Int!, $failed: Int!) {
    validateBuildWithTests(input: {project: $project, branch: $branch, build: $build, validation: $validationStamp, description: $description, runInfo: $runInfo, passed: $passed, skipped: $skipped, failed: $failed}) {
        errors { message }
    }
}
"#;

const PERCENTAGE_MUTATION: &str = r#"
mutation ValidateBuildWithPercentage($project: String!, $branch: String!, $build: String!, $validationStamp: String!, $description: String!, $value: Int!) {
    validateBuildWithPercentage(input: {project: $project, branch: $branch, build: $build, validation: $validationStamp, description: $description, value: $value}) {
        errors { message }
    }
}
"#;

const CHML_MUTATION: &str = r#"
mutation ValidateBuildWithCHML($project: String!, $branch: String!, $build: String!, $validationStamp: String!, $description: String!, $runInfo: RunInfoInput, $critical: Int!, $high: Int!, $medium: Int!, $low: Int!) {
    validateBuildWithCHML(input: {project: $project, branch: $branch, build: $build, validation: $validationStamp, description: $description, runInfo: $runInfo, critical: $critical, high: $high, medium: $medium, low: $low}) {
        errors { message }
    }
}
"#;

const METRICS_MUTATION: &str = r#"
mutation ValidateBuildWithMetrics($project: String!, $branch: String!, $build: String!, $validationStamp: String!, $description: String!, $metrics: [MetricsEntryInput!]!) {
    validateBuildWithMetrics(input: {project: $project, branch: $branch, build: $build, validation: $validationStamp, description: $description, metrics: $metrics}) {
        errors { message }
    }
}
"#;

/// Generic validation: an explicit status, typed data, or both.
///
/// A status is required when no data type is given, and a data type is
/// required when data is given. `data` is a GraphQL input literal.
pub fn validate(
    client: &Client,
    run: &ValidationRun,
    status: Option<&str>,
    data_type: Option<&str>,
    data: Option<&str>,
) -> Result<()> {
    let status = status.filter(|s| !s.is_empty());
    let data_type = data_type.filter(|t| !t.is_empty());
    let data = data.map(str::trim).filter(|d| !d.is_empty());

    if data_type.is_none() && status.is_none() {
        return Err(ClientError::Input(
            "Status is required if no data is provided.".into(),
        ));
    }
    if data.is_some() && data_type.is_none() {
        return Err(ClientError::Input(
            "Data type is required if some data is provided".into(),
        ));
    }

    let query = GENERIC_TEMPLATE.replace("VALIDATION_DATA", data.unwrap_or("null"));
    let mut vars = run.variables_with_run_info();
    vars.insert("validationRunStatus".into(), json!(status));
    vars.insert("dataTypeId".into(), json!(data_type));
    if run.description.is_none() {
        vars.insert("description".into(), Value::Null);
    }
    client.mutate(&query, vars.into(), &["createValidationRun"])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub passed: u64,
    pub skipped: u64,
    pub failed: u64,
}

pub fn validate_with_tests(client: &Client, run: &ValidationRun, counts: TestCounts) -> Result<()> {
    let mut vars = run.variables_with_run_info();
    vars.insert("passed".into(), json!(counts.passed));
    vars.insert("skipped".into(), json!(counts.skipped));
    vars.insert("failed".into(), json!(counts.failed));
    client.mutate(TESTS_MUTATION, vars.into(), &["validateBuildWithTests"])
}

pub fn validate_with_percentage(client: &Client, run: &ValidationRun, value: u32) -> Result<()> {
    let mut vars = run.variables();
    vars.insert("value".into(), json!(value));
    client.mutate(PERCENTAGE_MUTATION, vars.into(), &["validateBuildWithPercentage"])
}

/// Number of issues per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChmlCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

pub fn validate_with_chml(client: &Client, run: &ValidationRun, counts: ChmlCounts) -> Result<()> {
    let mut vars = run.variables_with_run_info();
    vars.insert("critical".into(), json!(counts.critical));
    vars.insert("high".into(), json!(counts.high));
    vars.insert("medium".into(), json!(counts.medium));
    vars.insert("low".into(), json!(counts.low));
    client.mutate(CHML_MUTATION, vars.into(), &["validateBuildWithCHML"])
}

pub fn validate_with_metrics(client: &Client, run: &ValidationRun, metrics: &[Metric]) -> Result<()> {
    let mut vars = run.variables();
    vars.insert("metrics".into(), json!(metrics));
    client.mutate(METRICS_MUTATION, vars.into(), &["validateBuildWithMetrics"])
}
