use crate::App;
use crate::args::{BuildArgs, GenericPropertyArgs, RunInfoArgs, ScopedBuildArgs};
use anyhow::Result;
use clap::{Args, Subcommand};
use yontrack_client::BranchRef;
use yontrack_client::builds::{
    self, BuildSearch, BuildSetup, BuildSummary, ChangeLogExport, DEFAULT_SEARCH_COUNT,
};
use yontrack_client::properties::{self, PropertyEntity};

#[derive(Subcommand, Debug)]
pub enum BuildOp {
    /// Create the build, with its project and branch, if it does not exist
    Setup {
        #[command(flatten)]
        build: BuildArgs,

        /// Description of the build
        #[arg(short, long)]
        description: Option<String>,

        /// Release label attached to the build
        #[arg(short, long)]
        release: Option<String>,

        #[command(flatten)]
        run_info: RunInfoArgs,
    },
    /// Search builds on a branch, or across the project when no branch is given
    Search(SearchArgs),
    /// Set a property on the build
    SetProperty {
        #[command(flatten)]
        build: ScopedBuildArgs,

        #[command(subcommand)]
        property: BuildProperty,
    },
    /// Ask the server to check the auto versioning of the build
    #[command(visible_alias = "av-check")]
    AutoVersioningCheck {
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Change log between two builds
    #[command(visible_alias = "log")]
    Changelog {
        #[command(subcommand)]
        op: ChangelogOp,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Project name
    #[arg(short, long, env = "YONTRACK_PROJECT_NAME")]
    project: String,

    /// Branch name, the whole project is searched when absent
    #[arg(short, long)]
    branch: Option<String>,

    /// Maximum number of builds to return
    #[arg(long, default_value_t = DEFAULT_SEARCH_COUNT)]
    count: u32,

    /// Builds must have this promotion
    #[arg(long)]
    with_promotion: Option<String>,

    /// Git commit of the build
    #[arg(long)]
    commit: Option<String>,

    /// Prefixes each build with its branch
    #[arg(long)]
    display_branch: bool,
}

#[derive(Subcommand, Debug)]
pub enum BuildProperty {
    /// Any property, from its type and value
    Generic(GenericPropertyArgs),
    /// Git commit of the build
    GitCommit {
        #[arg(short, long)]
        commit: String,
    },
    /// Release label of the build
    Release {
        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChangelogOp {
    /// Formatted change log
    #[command(visible_alias = "format")]
    Export {
        /// Id of the first build
        #[arg(long)]
        from: i64,

        /// Id of the last build
        #[arg(long)]
        to: i64,

        /// text (default), markdown or html
        #[arg(long)]
        format: Option<String>,

        /// Grouping of the issues per type
        #[arg(long)]
        grouping: Option<String>,

        /// Group for unclassified issues
        #[arg(long)]
        alt_group: Option<String>,

        /// Comma separated list of issue types to ignore
        #[arg(long)]
        exclude: Option<String>,
    },
}

pub fn run(app: &App, op: BuildOp) -> Result<()> {
    let client = app.client()?;
    match op {
        BuildOp::Setup {
            build,
            description,
            release,
            run_info,
        } => {
            let setup = BuildSetup {
                description,
                release,
                run_info: run_info.run_info(),
            };
            builds::setup_build(&client, &build.build_ref(), &setup)?;
        }
        BuildOp::Search(args) => {
            let search = BuildSearch {
                count: Some(args.count),
                with_promotion: args.with_promotion,
                commit: args.commit,
            };
            let lines = match args.branch.as_deref() {
                Some(branch) => {
                    let branch = BranchRef::new(&args.project, branch);
                    build_lines(
                        &builds::search_branch_builds(&client, &branch, &search)?,
                        args.display_branch,
                    )
                }
                None => build_lines(
                    &builds::search_project_builds(&client, &args.project, &search)?,
                    args.display_branch,
                ),
            };
            for line in lines {
                println!("{line}");
            }
        }
        BuildOp::SetProperty { build, property } => {
            let build = build.build_ref()?;
            match property {
                BuildProperty::Generic(generic) => properties::set_property(
                    &client,
                    &PropertyEntity::Build(build),
                    &generic.property,
                    &generic.value,
                )?,
                BuildProperty::GitCommit { commit } => {
                    builds::set_build_git_commit(&client, &build, &commit)?
                }
                BuildProperty::Release { value } => {
                    builds::set_build_release(&client, &build, &value)?
                }
            }
        }
        BuildOp::AutoVersioningCheck { build } => {
            builds::check_auto_versioning(&client, &build.build_ref())?
        }
        BuildOp::Changelog {
            op:
                ChangelogOp::Export {
                    from,
                    to,
                    format,
                    grouping,
                    alt_group,
                    exclude,
                },
        } => {
            let export = ChangeLogExport {
                format,
                grouping,
                alt_group,
                exclude,
            };
            if let Some(log) = builds::export_change_log(&client, from, to, &export)? {
                println!("{log}");
            }
        }
    }
    Ok(())
}

fn build_lines(builds: &[BuildSummary], display_branch: bool) -> Vec<String> {
    builds
        .iter()
        .map(|b| {
            if display_branch {
                format!("{}/{}", b.branch.name, b.name)
            } else {
                b.name.clone()
            }
        })
        .collect()
}
