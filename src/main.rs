use clap::Parser;
use openapi_client_gen::cli::Cli;
use openapi_client_gen::logging::init_logging;
use openapi_client_gen::run;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);
    run(cli)
}
