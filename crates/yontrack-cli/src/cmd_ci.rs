use crate::App;
use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::PathBuf;
use yontrack_ci::{EnvSources, collect_env, expand_config};
use yontrack_client::ci::{self, CiEnv, ConfigureBuild, ConfiguredBuild};

#[derive(Subcommand, Debug)]
pub enum CiOp {
    /// Create the project, branch and build from a CI configuration file
    Config {
        /// CI configuration file
        #[arg(short, long, default_value = ".yontrack/ci.yaml")]
        file: PathBuf,

        /// Environment variable as KEY=VALUE, repeatable
        #[arg(short, long = "env", value_delimiter = ',')]
        env: Vec<String>,

        /// Passes all the environment variables starting with this prefix
        #[arg(long = "env-all", value_delimiter = ',')]
        env_all: Vec<String>,

        /// File with one KEY=VALUE per line
        #[arg(long)]
        env_file: Option<PathBuf>,

        /// CI engine, guessed by the server from the environment when absent
        #[arg(long)]
        ci: Option<String>,

        /// SCM engine, guessed by the server from the environment when absent
        #[arg(long)]
        scm: Option<String>,

        /// Output of the command: env or json
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Env,
    Json,
}

impl Output {
    fn parse(value: Option<&str>) -> Result<Option<Self>> {
        match value {
            None | Some("") => Ok(None),
            Some("env") => Ok(Some(Output::Env)),
            Some("json") => Ok(Some(Output::Json)),
            Some(other) => bail!("unsupported output type {other}"),
        }
    }
}

pub fn run(app: &App, op: CiOp) -> Result<()> {
    let CiOp::Config {
        file,
        env,
        env_all,
        env_file,
        ci,
        scm,
        output,
    } = op;
    let output = Output::parse(output.as_deref())?;
    tracing::info!(file = %file.display(), ?ci, ?scm, ?output, "CI configuration");

    let sources = EnvSources {
        file: env_file.as_deref(),
        prefixes: &env_all,
        assignments: &env,
    };
    let env = collect_env(&sources, std::env::vars())?;
    for (name, value) in &env {
        tracing::info!("Env: {name}={value}");
    }

    let initial = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read configuration file {}", file.display()))?;
    let config = expand_config(&initial).context("failed to expand configuration")?;
    tracing::info!("Configuration content:\n{config}");

    let input = ConfigureBuild {
        config,
        ci,
        scm,
        env: env
            .into_iter()
            .map(|(name, value)| CiEnv { name, value })
            .collect(),
    };
    let client = app.client()?;
    let build = ci::configure_build(&client, &input)?;

    match (output, build) {
        (Some(Output::Env), Some(build)) => {
            for line in env_lines(&build) {
                println!("{line}");
            }
        }
        (Some(Output::Json), Some(build)) => {
            println!("{}", serde_json::to_string_pretty(&build)?);
        }
        _ => {}
    }
    Ok(())
}

fn env_lines(build: &ConfiguredBuild) -> Vec<String> {
    let branch = &build.branch;
    let project = &branch.project;
    [
        ("PROJECT_ID", project.id.to_string()),
        ("PROJECT_NAME", project.name.clone()),
        ("BRANCH_ID", branch.id.to_string()),
        ("BRANCH_NAME", branch.name.clone()),
        ("BUILD_ID", build.id.to_string()),
        ("BUILD_NAME", build.name.clone()),
    ]
    .into_iter()
    .map(|(name, value)| format!("export YONTRACK_{name}={value}"))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yontrack_client::Id;
    use yontrack_client::ci::{ConfiguredBranch, ConfiguredProject};

    #[test]
    fn test_output_parse() {
        assert_eq!(Output::parse(None).unwrap(), None);
        assert_eq!(Output::parse(Some("")).unwrap(), None);
        assert_eq!(Output::parse(Some("env")).unwrap(), Some(Output::Env));
        assert_eq!(Output::parse(Some("json")).unwrap(), Some(Output::Json));
        let err = Output::parse(Some("xml")).unwrap_err();
        assert_eq!(err.to_string(), "unsupported output type xml");
    }

    #[test]
    fn test_env_lines() {
        let build = ConfiguredBuild {
            id: Id::Int(30),
            name: "1.2.3".into(),
            display_name: None,
            branch: ConfiguredBranch {
                id: Id::Int(20),
                name: "main".into(),
                display_name: None,
                project: ConfiguredProject {
                    id: Id::Str("10".into()),
                    name: "yontrack".into(),
                },
            },
        };
        assert_eq!(
            env_lines(&build),
            [
                "export YONTRACK_PROJECT_ID=10",
                "export YONTRACK_PROJECT_NAME=yontrack",
                "export YONTRACK_BRANCH_ID=20",
                "export YONTRACK_BRANCH_NAME=main",
                "export YONTRACK_BUILD_ID=30",
                "export YONTRACK_BUILD_NAME=1.2.3",
            ]
        );
    }
}
