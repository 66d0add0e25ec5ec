use crate::App;
use crate::args::{BranchArgs, GenericPropertyArgs, ScopedBranchArgs};
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use yontrack_client::branches;
use yontrack_client::properties::{self, PropertyEntity};

#[derive(Subcommand, Debug)]
pub enum BranchOp {
    /// Create the project and the branch if they do not exist
    Setup {
        #[command(flatten)]
        branch: BranchArgs,
    },
    /// Set a property on the branch
    SetProperty {
        #[command(flatten)]
        branch: ScopedBranchArgs,

        #[command(subcommand)]
        property: BranchProperty,
    },
    /// Set the auto versioning configuration of the branch from a YAML file
    AutoVersioning {
        #[command(flatten)]
        branch: BranchArgs,

        /// YAML file with a list of `dependencies`
        #[arg(short, long, default_value = ".ontrack/auto-versioning.yaml")]
        yaml: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum BranchProperty {
    /// Any property, from its type and value
    Generic(GenericPropertyArgs),
    /// Git branch associated with the branch
    Git {
        #[arg(long)]
        git_branch: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct AutoVersioningFile {
    #[serde(default)]
    dependencies: Vec<Value>,
}

pub fn run(app: &App, op: BranchOp) -> Result<()> {
    match op {
        BranchOp::Setup { branch } => {
            let client = app.client()?;
            branches::setup_branch(&client, &branch.branch_ref())?;
        }
        BranchOp::SetProperty { branch, property } => {
            let branch = branch.branch_ref()?;
            let client = app.client()?;
            match property {
                BranchProperty::Generic(generic) => properties::set_property(
                    &client,
                    &PropertyEntity::Branch(branch),
                    &generic.property,
                    &generic.value,
                )?,
                BranchProperty::Git { git_branch } => {
                    branches::set_branch_git_config(&client, &branch, &git_branch)?
                }
            }
        }
        BranchOp::AutoVersioning { branch, yaml } => {
            let dependencies = read_dependencies(&yaml)?;
            tracing::info!(count = dependencies.len(), file = %yaml.display(), "auto versioning dependencies");
            let client = app.client()?;
            branches::set_auto_versioning_config(&client, &branch.branch_ref(), &dependencies)?;
        }
    }
    Ok(())
}

fn read_dependencies(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let file: AutoVersioningFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Cannot parse {}", path.display()))?;
    Ok(file.dependencies)
}
