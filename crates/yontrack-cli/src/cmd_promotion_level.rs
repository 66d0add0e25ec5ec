use crate::App;
use crate::args::{BranchArgs, ScopedBranchArgs, required};
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use yontrack_client::promotions::{self, AutoPromotion, Subscription};
use yontrack_client::validation_stamps::{self, StampSpec, TestsStampConfig};
use yontrack_client::{BranchRef, Client};

#[derive(Subcommand, Debug)]
pub enum PromotionLevelOp {
    /// Create or update a promotion level and its auto promotion
    Setup {
        #[command(flatten)]
        branch: BranchArgs,

        /// Name of the promotion level
        #[arg(short = 'l', long)]
        promotion: String,

        /// Description of the promotion level
        #[arg(short, long)]
        description: Option<String>,

        /// Validation stamps the promotion needs
        #[arg(short, long = "validation", value_delimiter = ',')]
        validations: Vec<String>,

        /// Promotion levels the promotion needs
        #[arg(short = 'o', long = "depends-on", value_delimiter = ',')]
        promotions: Vec<String>,

        /// Regex of validation stamps to include
        #[arg(short, long)]
        include: Option<String>,

        /// Regex of validation stamps to exclude
        #[arg(short = 'x', long)]
        exclude: Option<String>,
    },
    /// Set up validation stamps and promotion levels from a YAML file
    Auto {
        #[command(flatten)]
        branch: BranchArgs,

        #[arg(short, long, default_value = ".ontrack/promotions.yaml")]
        yaml: PathBuf,
    },
    /// Subscribe to new promotion runs of a promotion level
    Subscribe {
        #[command(flatten)]
        branch: ScopedBranchArgs,

        /// Name of the promotion level
        #[arg(short = 'l', long, global = true)]
        promotion: Option<String>,

        /// Name of the subscription
        #[arg(short, long, global = true)]
        name: Option<String>,

        /// Custom template for the notification
        #[arg(long, global = true)]
        template: Option<String>,

        #[command(subcommand)]
        channel: Channel,
    },
}

#[derive(Subcommand, Debug)]
pub enum Channel {
    /// Notifications sent to a Slack channel
    Slack {
        /// Slack channel, like #my-channel
        #[arg(short, long)]
        channel: String,

        /// INFO, SUCCESS, WARNING or ERROR
        #[arg(short = 't', long = "type", default_value = "INFO")]
        message_type: String,
    },
    /// Any notification channel with its JSON configuration
    Generic {
        /// Notification channel, like mail or slack
        #[arg(short, long)]
        channel: String,

        /// JSON configuration of the channel
        #[arg(short = 'v', long)]
        channel_config: String,
    },
}

impl Channel {
    fn into_parts(self) -> Result<(String, Value)> {
        match self {
            Channel::Slack {
                channel,
                message_type,
            } => Ok((
                "slack".to_string(),
                json!({ "channel": channel, "type": message_type }),
            )),
            Channel::Generic {
                channel,
                channel_config,
            } => {
                let config = serde_json::from_str(&channel_config).with_context(|| {
                    format!("Invalid JSON for the channel configuration: {channel_config}")
                })?;
                Ok((channel, config))
            }
        }
    }
}

/// Content of the promotions YAML file.
#[derive(Debug, Default, Deserialize)]
struct AutoPromotions {
    #[serde(default)]
    validations: Vec<ValidationConfig>,
    #[serde(default)]
    promotions: Vec<PromotionConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationConfig {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    data_type_config: Option<String>,
    #[serde(default)]
    tests: Option<TestsConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestsConfig {
    #[serde(default)]
    warning_if_skipped: bool,
    #[serde(default)]
    fail_when_no_results: bool,
}

#[derive(Debug, Deserialize)]
struct PromotionConfig {
    name: String,
    #[serde(default)]
    validations: Vec<String>,
    #[serde(default)]
    promotions: Vec<String>,
}

/// One remote call of `pl auto`, in order.
#[derive(Debug, Clone)]
enum Step {
    TestsStamp(StampSpec, TestsStampConfig),
    Stamp {
        stamp: StampSpec,
        data_type: Option<String>,
        data_type_config: Option<String>,
    },
    Promotion {
        name: String,
        auto: AutoPromotion,
    },
}

/// Listed validations come first, then the ones only referenced by
/// promotions, set up without a data type, then the promotions.
fn plan(root: AutoPromotions) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut known = BTreeSet::new();

    for validation in root.validations {
        known.insert(validation.name.clone());
        let stamp = StampSpec {
            name: validation.name,
            description: validation.description,
        };
        steps.push(match validation.tests {
            Some(tests) => Step::TestsStamp(
                stamp,
                TestsStampConfig {
                    warning_if_skipped: tests.warning_if_skipped,
                    fail_when_no_results: tests.fail_when_no_results,
                },
            ),
            None => Step::Stamp {
                stamp,
                data_type: validation.data_type,
                data_type_config: validation.data_type_config,
            },
        });
    }

    for promotion in &root.promotions {
        for validation in &promotion.validations {
            if known.insert(validation.clone()) {
                steps.push(Step::Stamp {
                    stamp: StampSpec::new(validation.as_str()),
                    data_type: None,
                    data_type_config: None,
                });
            }
        }
    }

    for promotion in root.promotions {
        steps.push(Step::Promotion {
            name: promotion.name,
            auto: AutoPromotion {
                validations: promotion.validations,
                promotions: promotion.promotions,
                include: None,
                exclude: None,
            },
        });
    }

    steps
}

fn read_promotions(path: &Path) -> Result<AutoPromotions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Cannot parse {}", path.display()))
}

fn apply(client: &Client, branch: &BranchRef, step: &Step) -> Result<()> {
    match step {
        Step::TestsStamp(stamp, config) => {
            tracing::info!(validation = %stamp.name, "tests validation stamp");
            validation_stamps::setup_tests_validation_stamp(client, branch, stamp, *config)?
        }
        Step::Stamp {
            stamp,
            data_type,
            data_type_config,
        } => {
            tracing::info!(validation = %stamp.name, "validation stamp");
            validation_stamps::setup_validation_stamp(
                client,
                branch,
                stamp,
                data_type.as_deref(),
                data_type_config.as_deref(),
            )?
        }
        Step::Promotion { name, auto } => {
            tracing::info!(promotion = %name, auto = auto.is_enabled(), "promotion level");
            promotions::setup_promotion_level(client, branch, name, None, auto)?
        }
    }
    Ok(())
}

pub fn run(app: &App, op: PromotionLevelOp) -> Result<()> {
    match op {
        PromotionLevelOp::Setup {
            branch,
            promotion,
            description,
            validations,
            promotions: depends_on,
            include,
            exclude,
        } => {
            let auto = AutoPromotion {
                validations,
                promotions: depends_on,
                include,
                exclude,
            };
            let client = app.client()?;
            promotions::setup_promotion_level(
                &client,
                &branch.branch_ref(),
                &promotion,
                description.as_deref(),
                &auto,
            )?;
        }
        PromotionLevelOp::Auto { branch, yaml } => {
            let steps = plan(read_promotions(&yaml)?);
            let client = app.client()?;
            let branch = branch.branch_ref();
            for step in &steps {
                apply(&client, &branch, step)?;
            }
        }
        PromotionLevelOp::Subscribe {
            branch,
            promotion,
            name,
            template,
            channel,
        } => {
            let branch = branch.branch_ref()?;
            let promotion = required(&promotion, "--promotion")?;
            let name = required(&name, "--name")?;
            let (channel, config) = channel.into_parts()?;
            let mut subscription = Subscription::on_promotion(name, channel, config);
            subscription.template = template;
            let client = app.client()?;
            promotions::subscribe_promotion_level(&client, &branch, promotion, &subscription)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMOTIONS: &str = r#"
validations:
  - name: unit-tests
    description: Unit tests
    tests:
      warningIfSkipped: true
  - name: coverage
    dataType: net.nemerosa.ontrack.extension.general.validation.PercentageValidationDataType
    dataTypeConfig: "{warningThreshold: 80}"
promotions:
  - name: BRONZE
    validations:
      - unit-tests
      - lint
  - name: SILVER
    promotions:
      - BRONZE
    validations:
      - deploy
      - lint
  - name: GOLD
"#;

    fn names(steps: &[Step]) -> Vec<String> {
        steps
            .iter()
            .map(|s| match s {
                Step::TestsStamp(stamp, _) => format!("tests:{}", stamp.name),
                Step::Stamp { stamp, data_type, .. } => match data_type {
                    Some(_) => format!("typed:{}", stamp.name),
                    None => format!("plain:{}", stamp.name),
                },
                Step::Promotion { name, auto } => format!("promotion:{name}:{}", auto.is_enabled()),
            })
            .collect()
    }

    #[test]
    fn test_plan_order() {
        let root: AutoPromotions = serde_yaml::from_str(PROMOTIONS).unwrap();
        assert_eq!(
            names(&plan(root)),
            [
                "tests:unit-tests",
                "typed:coverage",
                "plain:lint",
                "plain:deploy",
                "promotion:BRONZE:true",
                "promotion:SILVER:true",
                "promotion:GOLD:false",
            ]
        );
    }

    #[test]
    fn test_plan_tests_config() {
        let root: AutoPromotions = serde_yaml::from_str(PROMOTIONS).unwrap();
        let steps = plan(root);
        let Step::TestsStamp(stamp, config) = &steps[0] else {
            panic!("expected a tests stamp");
        };
        assert_eq!(stamp.description.as_deref(), Some("Unit tests"));
        assert!(config.warning_if_skipped);
        assert!(!config.fail_when_no_results);
    }

    #[test]
    fn test_empty_file() {
        let root: AutoPromotions = serde_yaml::from_str("{}").unwrap();
        assert!(plan(root).is_empty());
    }

    #[test]
    fn test_channels() {
        let (channel, config) = Channel::Slack {
            channel: "#builds".into(),
            message_type: "SUCCESS".into(),
        }
        .into_parts()
        .unwrap();
        assert_eq!(channel, "slack");
        assert_eq!(config, json!({"channel": "#builds", "type": "SUCCESS"}));

        let err = Channel::Generic {
            channel: "mail".into(),
            channel_config: "{not json".into(),
        }
        .into_parts()
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_subscribe_flags_after_channel() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(subcommand)]
            op: PromotionLevelOp,
        }

        let parsed = Harness::try_parse_from([
            "t", "subscribe", "slack", "-p", "p", "-b", "main", "-l", "BRONZE", "-n", "sub", "-c",
            "#builds", "--template", "Promoted",
        ])
        .unwrap();
        let PromotionLevelOp::Subscribe {
            branch,
            promotion,
            name,
            template,
            channel,
        } = parsed.op
        else {
            panic!("expected a subscription");
        };
        assert_eq!(branch.branch_ref().unwrap().branch, "main");
        assert_eq!(promotion.as_deref(), Some("BRONZE"));
        assert_eq!(name.as_deref(), Some("sub"));
        assert_eq!(template.as_deref(), Some("Promoted"));
        assert!(matches!(channel, Channel::Slack { message_type, .. } if message_type == "INFO"));
    }
}
