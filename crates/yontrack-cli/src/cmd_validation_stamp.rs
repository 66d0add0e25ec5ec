use crate::App;
use crate::args::{ScopedBranchArgs, required};
use anyhow::Result;
use clap::Subcommand;
use yontrack_client::validation_stamps::{
    self, ChmlThreshold, PercentageStampConfig, StampSpec, TestsStampConfig,
};

#[derive(Subcommand, Debug)]
pub enum ValidationStampOp {
    /// Create or update a validation stamp
    Setup {
        #[command(flatten)]
        branch: ScopedBranchArgs,

        /// Name of the validation stamp
        #[arg(short, long, global = true)]
        validation: Option<String>,

        /// Description of the validation stamp
        #[arg(short, long, global = true)]
        description: Option<String>,

        /// Data type of the stamp, none when absent
        #[command(subcommand)]
        data_type: Option<StampType>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StampType {
    /// Any data type, from its type and JSON configuration
    Generic {
        #[arg(short = 't', long)]
        data_type: Option<String>,

        #[arg(short = 'c', long)]
        data_config: Option<String>,
    },
    /// Test summary, with passed, skipped and failed tests
    Tests {
        /// Warning when some tests are skipped
        #[arg(short, long)]
        warning_if_skipped: bool,

        /// Failure when there are no tests at all
        #[arg(long)]
        fail_when_no_results: bool,
    },
    /// Percentage with thresholds, 0 for no threshold
    #[command(visible_alias = "percent")]
    Percentage {
        #[arg(short, long, default_value_t = 0)]
        warning: u32,

        #[arg(short, long, default_value_t = 0)]
        failure: u32,

        /// Higher values are better
        #[arg(short, long)]
        ok_if_greater: bool,
    },
    /// Issues per severity: critical, high, medium and low
    Chml {
        /// Warning threshold, as LEVEL=N
        #[arg(short, long)]
        warning: ChmlThreshold,

        /// Failure threshold, as LEVEL=N
        #[arg(short, long)]
        failed: ChmlThreshold,
    },
}

pub fn run(app: &App, op: ValidationStampOp) -> Result<()> {
    let ValidationStampOp::Setup {
        branch,
        validation,
        description,
        data_type,
    } = op;

    let branch = branch.branch_ref()?;
    let stamp = StampSpec {
        name: required(&validation, "--validation")?.to_string(),
        description,
    };
    let client = app.client()?;
    match data_type {
        None => validation_stamps::setup_validation_stamp(&client, &branch, &stamp, None, None)?,
        Some(StampType::Generic {
            data_type,
            data_config,
        }) => validation_stamps::setup_validation_stamp(
            &client,
            &branch,
            &stamp,
            data_type.as_deref(),
            data_config.as_deref(),
        )?,
        Some(StampType::Tests {
            warning_if_skipped,
            fail_when_no_results,
        }) => validation_stamps::setup_tests_validation_stamp(
            &client,
            &branch,
            &stamp,
            TestsStampConfig {
                warning_if_skipped,
                fail_when_no_results,
            },
        )?,
        Some(StampType::Percentage {
            warning,
            failure,
            ok_if_greater,
        }) => validation_stamps::setup_percentage_validation_stamp(
            &client,
            &branch,
            &stamp,
            PercentageStampConfig {
                warning,
                failure,
                ok_if_greater,
            },
        )?,
        Some(StampType::Chml { warning, failed }) => {
            validation_stamps::setup_chml_validation_stamp(&client, &branch, &stamp, warning, failed)?
        }
    }
    Ok(())
}
