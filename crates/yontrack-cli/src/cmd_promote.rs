use crate::App;
use crate::args::BuildArgs;
use anyhow::Result;
use clap::Args;
use yontrack_client::promotions;

#[derive(Args, Debug)]
pub struct PromoteArgs {
    #[command(flatten)]
    build: BuildArgs,

    /// Name of the promotion level
    #[arg(short = 'l', long)]
    promotion: String,

    /// Description of the promotion
    #[arg(short, long)]
    description: Option<String>,
}

pub fn run(app: &App, args: PromoteArgs) -> Result<()> {
    let client = app.client()?;
    promotions::promote(
        &client,
        &args.build.build_ref(),
        &args.promotion,
        args.description.as_deref(),
    )?;
    Ok(())
}
