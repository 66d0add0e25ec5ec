use crate::App;
use crate::args::{RunInfoArgs, ScopedBuildArgs, required};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::Path;
use yontrack_client::validations::{
    self, ChmlCounts, Metric, TestCounts, ValidationRun, parse_metric_list,
};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    build: ScopedBuildArgs,

    /// Name of the validation stamp
    #[arg(short, long, global = true)]
    validation: Option<String>,

    /// Description of the validation run
    #[arg(short, long, global = true)]
    description: Option<String>,

    #[command(flatten)]
    run_info: RunInfoArgs,

    /// Status of the run, required when no data type is given
    #[arg(short, long)]
    status: Option<String>,

    /// Fully qualified type of the validation data
    #[arg(short = 't', long)]
    data_type: Option<String>,

    /// GraphQL literal for the validation data
    #[arg(short = 'o', long)]
    data: Option<String>,

    #[command(subcommand)]
    data_kind: Option<ValidationData>,
}

#[derive(Subcommand, Debug)]
pub enum ValidationData {
    /// Number of passed, skipped and failed tests
    Tests {
        #[arg(long, default_value_t = 0)]
        passed: u64,

        #[arg(long, default_value_t = 0)]
        skipped: u64,

        #[arg(long, default_value_t = 0)]
        failed: u64,
    },
    /// A percentage
    Percentage {
        #[arg(long)]
        value: u32,
    },
    /// Number of critical, high, medium and low issues
    Chml {
        #[arg(long, default_value_t = 0)]
        critical: u32,

        #[arg(long, default_value_t = 0)]
        high: u32,

        #[arg(long, default_value_t = 0)]
        medium: u32,

        #[arg(long, default_value_t = 0)]
        low: u32,
    },
    /// Named numeric metrics
    Metrics {
        /// Metric as name=value, repeatable
        #[arg(short, long, value_delimiter = ',')]
        metric: Vec<Metric>,

        /// Comma separated list of name=value metrics
        #[arg(long)]
        metrics: Option<String>,
    },
    /// Test summary read from JUnit XML reports
    Junit {
        /// Glob pattern of the reports, relative to the current directory
        #[arg(long)]
        pattern: String,
    },
}

pub fn run(app: &App, args: ValidateArgs) -> Result<()> {
    let mut run = ValidationRun::new(
        args.build.build_ref()?,
        required(&args.validation, "--validation")?,
    );
    run.description = args.description;
    run.run_info = args.run_info.run_info();

    match args.data_kind {
        None => validations::validate(
            &app.client()?,
            &run,
            args.status.as_deref(),
            args.data_type.as_deref(),
            args.data.as_deref(),
        )?,
        Some(ValidationData::Tests {
            passed,
            skipped,
            failed,
        }) => {
            let counts = TestCounts {
                passed,
                skipped,
                failed,
            };
            validations::validate_with_tests(&app.client()?, &run, counts)?;
        }
        Some(ValidationData::Percentage { value }) => {
            validations::validate_with_percentage(&app.client()?, &run, value)?
        }
        Some(ValidationData::Chml {
            critical,
            high,
            medium,
            low,
        }) => {
            let counts = ChmlCounts {
                critical,
                high,
                medium,
                low,
            };
            validations::validate_with_chml(&app.client()?, &run, counts)?;
        }
        Some(ValidationData::Metrics { metric, metrics }) => {
            let metrics = collect_metrics(metric, metrics.as_deref())?;
            validations::validate_with_metrics(&app.client()?, &run, &metrics)?;
        }
        Some(ValidationData::Junit { pattern }) => {
            let counts = junit_counts(Path::new("."), &pattern)?;
            tracing::info!(
                passed = counts.passed,
                skipped = counts.skipped,
                failed = counts.failed,
                "JUnit summary"
            );
            validations::validate_with_tests(&app.client()?, &run, counts)?;
        }
    }
    Ok(())
}

fn collect_metrics(mut metrics: Vec<Metric>, list: Option<&str>) -> Result<Vec<Metric>> {
    if let Some(list) = list {
        metrics.extend(parse_metric_list(list)?);
    }
    Ok(metrics)
}

fn junit_counts(root: &Path, pattern: &str) -> Result<TestCounts> {
    let summary = yontrack_ci::summarize_junit(root, pattern)
        .with_context(|| format!("Cannot read the JUnit reports matching {pattern}"))?;
    Ok(TestCounts {
        passed: summary.passed,
        skipped: summary.skipped,
        failed: summary.failed,
    })
}
