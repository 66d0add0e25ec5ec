use crate::App;
use anyhow::Result;
use clap::Args;
use yontrack_client::info;

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Display only the CLI version
    #[arg(short, long)]
    cli: bool,

    /// Display only the version of the server
    #[arg(short, long)]
    ontrack: bool,
}

pub fn run(app: &App, args: VersionArgs) -> Result<()> {
    let both = args.cli == args.ontrack;
    if args.cli && !both {
        println!("{CLI_VERSION}");
        return Ok(());
    }

    let client = app.client()?;
    let server_version = info::server_version(&client)?.unwrap_or_default();
    if both {
        println!("CLI Version {CLI_VERSION}");
        println!("Ontrack URL {}", client.config().url);
        println!("Ontrack Version {server_version}");
    } else {
        println!("{server_version}");
    }
    Ok(())
}
