use anyhow::{Result, anyhow};
use clap::Args;
use yontrack_client::{BranchRef, BuildRef, RunInfo};

/// Value of a flag declared `global`, which clap leaves optional so that it
/// is accepted before and after a nested subcommand.
pub fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("the following required argument was not provided: {flag}"))
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project name
    #[arg(short, long, env = "YONTRACK_PROJECT_NAME")]
    pub project: String,
}

#[derive(Args, Debug, Clone)]
pub struct BranchArgs {
    /// Project name
    #[arg(short, long, env = "YONTRACK_PROJECT_NAME")]
    pub project: String,

    /// Branch name, normalized before use
    #[arg(short, long, env = "YONTRACK_BRANCH_NAME")]
    pub branch: String,
}

impl BranchArgs {
    pub fn branch_ref(&self) -> BranchRef {
        BranchRef::new(&self.project, &self.branch)
    }
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Project name
    #[arg(short, long, env = "YONTRACK_PROJECT_NAME")]
    pub project: String,

    /// Branch name, normalized before use
    #[arg(short, long, env = "YONTRACK_BRANCH_NAME")]
    pub branch: String,

    /// Build name
    #[arg(short = 'n', long, env = "YONTRACK_BUILD_NAME")]
    pub build: String,
}

impl BuildArgs {
    pub fn build_ref(&self) -> BuildRef {
        BuildRef::new(&self.project, &self.branch, &self.build)
    }
}

/// Project flag shared by a command and its subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopedProjectArgs {
    /// Project name
    #[arg(short, long, env = "YONTRACK_PROJECT_NAME", global = true)]
    pub project: Option<String>,
}

impl ScopedProjectArgs {
    pub fn project(&self) -> Result<&str> {
        required(&self.project, "--project")
    }
}

/// Project and branch flags shared by a command and its subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopedBranchArgs {
    /// Project name
    #[arg(short, long, env = "YONTRACK_PROJECT_NAME", global = true)]
    pub project: Option<String>,

    /// Branch name, normalized before use
    #[arg(short, long, env = "YONTRACK_BRANCH_NAME", global = true)]
    pub branch: Option<String>,
}

impl ScopedBranchArgs {
    pub fn branch_ref(&self) -> Result<BranchRef> {
        Ok(BranchRef::new(
            required(&self.project, "--project")?,
            required(&self.branch, "--branch")?,
        ))
    }
}

/// Project, branch and build flags shared by a command and its subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopedBuildArgs {
    /// Project name
    #[arg(short, long, env = "YONTRACK_PROJECT_NAME", global = true)]
    pub project: Option<String>,

    /// Branch name, normalized before use
    #[arg(short, long, env = "YONTRACK_BRANCH_NAME", global = true)]
    pub branch: Option<String>,

    /// Build name
    #[arg(short = 'n', long, env = "YONTRACK_BUILD_NAME", global = true)]
    pub build: Option<String>,
}

impl ScopedBuildArgs {
    pub fn build_ref(&self) -> Result<BuildRef> {
        Ok(BuildRef::new(
            required(&self.project, "--project")?,
            required(&self.branch, "--branch")?,
            required(&self.build, "--build")?,
        ))
    }
}

/// A property set from its type and raw value.
#[derive(Args, Debug, Clone)]
pub struct GenericPropertyArgs {
    /// Fully qualified type of the property
    #[arg(long)]
    pub property: String,

    /// GraphQL literal for the value, an empty value deletes the property
    #[arg(long, default_value = "")]
    pub value: String,
}

/// Where and how the run was produced.
#[derive(Args, Debug, Clone, Default)]
pub struct RunInfoArgs {
    /// Type of source, like "github"
    #[arg(long, global = true)]
    pub source_type: Option<String>,

    /// URI to the source of the run, like the URL of a workflow
    #[arg(long, global = true)]
    pub source_uri: Option<String>,

    /// Type of trigger, like "push"
    #[arg(long, global = true)]
    pub trigger_type: Option<String>,

    /// Data associated with the trigger, like a commit
    #[arg(long, global = true)]
    pub trigger_data: Option<String>,

    /// Duration of the run, in seconds
    #[arg(long, global = true)]
    pub run_time: Option<u64>,
}

impl RunInfoArgs {
    /// `None` when no run info flag is given.
    pub fn run_info(&self) -> Option<RunInfo> {
        RunInfo {
            source_type: self.source_type.clone(),
            source_uri: self.source_uri.clone(),
            trigger_type: self.trigger_type.clone(),
            trigger_data: self.trigger_data.clone(),
            run_time: self.run_time,
        }
        .into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_is_normalized() {
        let args = BuildArgs {
            project: "p".into(),
            branch: "feature/login".into(),
            build: "12".into(),
        };
        assert_eq!(args.build_ref().branch, "feature-login");
    }

    #[test]
    fn test_scoped_args_are_checked() {
        let scoped = ScopedBuildArgs {
            project: Some("p".into()),
            branch: Some("release/1.0".into()),
            build: None,
        };
        let err = scoped.build_ref().unwrap_err();
        assert_eq!(
            err.to_string(),
            "the following required argument was not provided: --build"
        );

        let scoped = ScopedBranchArgs {
            project: Some("p".into()),
            branch: Some("release/1.0".into()),
        };
        assert_eq!(scoped.branch_ref().unwrap().branch, "release-1.0");
        assert!(ScopedProjectArgs::default().project().is_err());
    }

    #[test]
    fn test_run_info_absent_without_flags() {
        assert!(RunInfoArgs::default().run_info().is_none());
        let args = RunInfoArgs {
            run_time: Some(30),
            ..Default::default()
        };
        assert_eq!(args.run_info().and_then(|r| r.run_time), Some(30));
    }
}
