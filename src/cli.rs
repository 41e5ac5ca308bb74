use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::client::ClientKind;
use crate::config::{CONFIG_ENV, ConfigOverrides};

#[derive(Parser)]
#[command(name = "openapi-client-gen")]
#[command(about = "Generate HTTP client packages from OpenAPI documents", long_about = None)]
pub struct Cli {
    /// YAML configuration file (default: ./openapi-client-generator.yaml).
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the PHP client package.
    #[command(name = "generate-client-php", alias = "openapi:generate-client-php")]
    GenerateClientPhp(GenerateArgs),
    /// Generate the JavaScript client package.
    #[command(name = "generate-client-js", alias = "openapi:generate-client-js")]
    GenerateClientJs(GenerateArgs),
    /// Generate the NodeJS (typescript-axios) client package and patch its enums.
    #[command(name = "generate-client-nodejs", alias = "openapi:generate-client-nodejs")]
    GenerateClientNodejs(GenerateArgs),
}

impl Commands {
    pub fn client(&self) -> ClientKind {
        match self {
            Self::GenerateClientPhp(_) => ClientKind::Php,
            Self::GenerateClientJs(_) => ClientKind::Js,
            Self::GenerateClientNodejs(_) => ClientKind::NodeJs,
        }
    }

    pub fn args(&self) -> &GenerateArgs {
        match self {
            Self::GenerateClientPhp(args)
            | Self::GenerateClientJs(args)
            | Self::GenerateClientNodejs(args) => args,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Directory holding the root specification document.
    #[arg(long)]
    pub apidoc_dir: Option<PathBuf>,
    /// Output directory; replaces `output_dir_template` plus client suffix.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Generator command, e.g. "npx @openapitools/openapi-generator-cli".
    #[arg(long)]
    pub generator_bin: Option<String>,
    /// Print the generator command and exit without touching the output.
    #[arg(long)]
    pub dry_run: bool,
    /// Print the run report as JSON instead of the text summary.
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            apidoc_dir: self.apidoc_dir.clone(),
            output_dir: self.output_dir.clone(),
            generator_bin: self.generator_bin.clone(),
        }
    }
}
