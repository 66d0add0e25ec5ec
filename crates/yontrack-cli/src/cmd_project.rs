use crate::App;
use crate::args::{GenericPropertyArgs, ProjectArgs, ScopedProjectArgs};
use anyhow::Result;
use clap::{ArgAction, Subcommand};
use yontrack_client::projects::{self, Project};
use yontrack_client::properties::{self, GitHubConfig, PropertyEntity};

#[derive(Subcommand, Debug)]
pub enum ProjectOp {
    /// List the projects
    List {
        /// Display the ids instead of the names
        #[arg(short = 'i', long)]
        show_id: bool,
    },
    /// Create the project if it does not exist
    Setup {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Set a property on the project
    SetProperty {
        #[command(flatten)]
        project: ScopedProjectArgs,

        #[command(subcommand)]
        property: ProjectProperty,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectProperty {
    /// Any property, from its type and value
    Generic(GenericPropertyArgs),
    /// GitHub configuration of the project
    #[command(name = "github")]
    GitHub {
        /// Name of the GitHub configuration on the server
        #[arg(long)]
        configuration: String,

        /// Repository, as owner/name
        #[arg(long)]
        repository: String,

        /// Indexation interval, in minutes
        #[arg(long)]
        indexation: Option<u32>,

        /// Identifier of the issue service
        #[arg(long)]
        issue_service: Option<String>,
    },
    /// Automatic creation of validation stamps
    #[command(visible_alias = "avs")]
    AutoValidationStamp {
        #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = true, default_missing_value = "true")]
        auto_create: bool,

        /// Creates the stamps even when no predefined stamp exists
        #[arg(long)]
        auto_create_if_not_predefined: bool,
    },
    /// Automatic creation of promotion levels
    #[command(visible_alias = "apl")]
    AutoPromotionLevel {
        #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = true, default_missing_value = "true")]
        auto_create: bool,
    },
}

pub fn run(app: &App, op: ProjectOp) -> Result<()> {
    let client = app.client()?;
    match op {
        ProjectOp::List { show_id } => {
            for line in project_lines(&projects::list_projects(&client)?, show_id) {
                println!("{line}");
            }
        }
        ProjectOp::Setup { project } => projects::setup_project(&client, &project.project)?,
        ProjectOp::SetProperty { project, property } => {
            let project = project.project()?.to_string();
            match property {
                ProjectProperty::Generic(generic) => properties::set_property(
                    &client,
                    &PropertyEntity::Project(project),
                    &generic.property,
                    &generic.value,
                )?,
                ProjectProperty::GitHub {
                    configuration,
                    repository,
                    indexation,
                    issue_service,
                } => {
                    let github = GitHubConfig {
                        configuration,
                        repository,
                        indexation_interval: indexation,
                        issue_service,
                    };
                    properties::set_project_github_config(&client, &project, &github)?;
                }
                ProjectProperty::AutoValidationStamp {
                    auto_create,
                    auto_create_if_not_predefined,
                } => properties::set_project_auto_validation_stamp(
                    &client,
                    &project,
                    auto_create,
                    auto_create_if_not_predefined,
                )?,
                ProjectProperty::AutoPromotionLevel { auto_create } => {
                    properties::set_project_auto_promotion_level(&client, &project, auto_create)?
                }
            }
        }
    }
    Ok(())
}

fn project_lines(projects: &[Project], show_id: bool) -> Vec<String> {
    projects
        .iter()
        .map(|p| if show_id { p.id.to_string() } else { p.name.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use yontrack_client::Id;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        op: ProjectOp,
    }

    #[test]
    fn test_project_lines() {
        let projects = vec![
            Project {
                id: Id::Int(1),
                name: "ontrack".into(),
            },
            Project {
                id: Id::Str("2".into()),
                name: "yontrack".into(),
            },
        ];
        assert_eq!(project_lines(&projects, false), ["ontrack", "yontrack"]);
        assert_eq!(project_lines(&projects, true), ["1", "2"]);
    }

    #[test]
    fn test_auto_create_defaults_to_true() {
        let parsed = Harness::try_parse_from(["t", "set-property", "-p", "p", "avs"]).unwrap();
        assert!(matches!(
            parsed.op,
            ProjectOp::SetProperty {
                property: ProjectProperty::AutoValidationStamp {
                    auto_create: true,
                    auto_create_if_not_predefined: false,
                },
                ..
            }
        ));

        let parsed =
            Harness::try_parse_from(["t", "set-property", "apl", "--auto-create=false", "-p", "p"])
                .unwrap();
        assert!(matches!(
            parsed.op,
            ProjectOp::SetProperty {
                property: ProjectProperty::AutoPromotionLevel { auto_create: false },
                ..
            }
        ));
    }
}
