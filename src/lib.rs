pub mod args;
pub mod cli;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod enum_patch;
pub mod error;
pub mod invoker;
pub mod logging;
pub mod pipeline;
pub mod reconcile;
pub mod source_patch;
pub mod spec_doc;

use anyhow::{Context, Result};
use cli::Cli;
use config::ConfigFile;

pub fn run(cli: Cli) -> Result<()> {
    let client = cli.command.client();
    let args = cli.command.args();

    let (file, base) = ConfigFile::load(cli.config.as_deref())?;
    let config = file
        .resolve(&base, client, &args.overrides())
        .with_context(|| format!("failed to configure {client} client"))?;

    if args.dry_run {
        println!("{}", pipeline::plan_command(&config)?);
        return Ok(());
    }

    let report = pipeline::run_pipeline(&config)
        .with_context(|| format!("failed to generate {client} client"))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", diagnostics::summarize(&report));
    }

    Ok(())
}
