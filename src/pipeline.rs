use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::args::GeneratorArgs;
use crate::client::ClientKind;
use crate::config::GenerationConfig;
use crate::error::{GenerateError, Result};
use crate::invoker::{
    GeneratorOutput, command_line, generate_arguments, invoke_generator, resolve_generator_bin,
};
use crate::reconcile::{ClearReport, clear_directory};

pub const LICENSE_FILE: &str = "LICENSE.md";
const BUNDLED_LICENSE: &str = include_str!("../templates/LICENSE-template.md");

#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub client: ClientKind,
    pub output_dir: PathBuf,
    pub cleared: ClearReport,
    pub generator: GeneratorOutput,
    pub patched: Vec<PathBuf>,
    pub license_seeded: bool,
}

/// Reconcile, generate, patch, seed the license; strictly in that order.
///
/// A failing phase stops the run. Earlier phases are not rolled back, so the
/// output directory may be left partially regenerated.
pub fn run_pipeline(config: &GenerationConfig) -> Result<PipelineReport> {
    config.validate()?;
    // Resolve the generator before anything is deleted.
    let command = resolve_generator_bin(config.generator_bin.as_deref())?;

    let cleared = clear_directory(&config.output_dir, &config.ignored_paths)?;
    fs::create_dir_all(&config.output_dir)
        .map_err(|err| GenerateError::fs(&config.output_dir, err))?;

    let extra = GeneratorArgs::from_config(config);
    let generator = invoke_generator(&command, config, &extra)?;

    let patched = config.client.patcher().patch(config)?;
    let license_seeded = seed_license(&config.output_dir, config.license_template.as_deref())?;

    Ok(PipelineReport {
        client: config.client,
        output_dir: config.output_dir.clone(),
        cleared,
        generator,
        patched,
        license_seeded,
    })
}

/// The generator command line a run would execute, without running anything.
pub fn plan_command(config: &GenerationConfig) -> Result<String> {
    config.validate()?;
    let command = resolve_generator_bin(config.generator_bin.as_deref())?;
    let args = generate_arguments(config, &GeneratorArgs::from_config(config));
    Ok(command_line(&command, &args))
}

/// Writes `LICENSE.md` into `output_dir` unless one is already there.
/// Returns whether a file was written.
pub fn seed_license(output_dir: &Path, template: Option<&Path>) -> Result<bool> {
    let dest = output_dir.join(LICENSE_FILE);
    if dest.exists() {
        return Ok(false);
    }

    match template {
        Some(source) => {
            fs::copy(source, &dest).map_err(|err| GenerateError::fs(source, err))?;
        }
        None => {
            fs::write(&dest, BUNDLED_LICENSE).map_err(|err| GenerateError::fs(&dest, err))?;
        }
    }
    tracing::info!(path = %dest.display(), "template LICENSE.md copied to package");
    Ok(true)
}
