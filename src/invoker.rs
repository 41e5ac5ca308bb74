use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::args::{GeneratorArgs, render_command_line};
use crate::config::GenerationConfig;
use crate::error::{GenerateError, Result};

pub const GENERATOR_BIN_ENV: &str = "OPENAPI_GENERATOR_BIN";
pub const DEFAULT_GENERATOR_BIN: &str = "openapi-generator-cli";

const STDERR_TAIL_LINES: usize = 20;

/// Program plus any leading words, e.g. `npx @openapitools/openapi-generator-cli`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    pub program: PathBuf,
    pub leading_args: Vec<String>,
}

impl GeneratorCommand {
    /// Splits `command` on whitespace, unless the whole string names an
    /// existing file (a path with spaces in it).
    pub fn parse(command: &str) -> Option<Self> {
        let whole = Path::new(command.trim());
        if !command.trim().is_empty() && whole.is_file() {
            return Some(Self {
                program: whole.to_path_buf(),
                leading_args: Vec::new(),
            });
        }
        let mut words = command.split_whitespace();
        let program = PathBuf::from(words.next()?);
        Some(Self {
            program,
            leading_args: words.map(str::to_string).collect(),
        })
    }
}

/// Output captured from a finished generator run.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorOutput {
    pub command_line: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Resolution order: explicit command, `OPENAPI_GENERATOR_BIN`, then
/// `openapi-generator-cli` on `PATH`. The program must exist either way, so a
/// typo fails before the output directory is touched.
pub fn resolve_generator_bin(explicit: Option<&str>) -> Result<GeneratorCommand> {
    let configured = explicit
        .and_then(GeneratorCommand::parse)
        .or_else(|| {
            env::var(GENERATOR_BIN_ENV)
                .ok()
                .as_deref()
                .and_then(GeneratorCommand::parse)
        })
        .unwrap_or_else(|| GeneratorCommand {
            program: PathBuf::from(DEFAULT_GENERATOR_BIN),
            leading_args: Vec::new(),
        });

    let program = which::which(&configured.program).map_err(|err| GenerateError::Subprocess {
        message: format!(
            "generator {} not found ({err}); set generator_bin or {GENERATOR_BIN_ENV}",
            configured.program.display()
        ),
        stderr: String::new(),
    })?;
    tracing::debug!(program = %program.display(), "resolved generator");
    Ok(GeneratorCommand {
        program,
        leading_args: configured.leading_args,
    })
}

/// `generate -i <spec> -g <generator> -o <output>` followed by `extra`.
pub fn generate_arguments(config: &GenerationConfig, extra: &GeneratorArgs) -> Vec<String> {
    let mut args = vec![
        "generate".to_string(),
        "-i".to_string(),
        config.spec_path.to_string_lossy().into_owned(),
        "-g".to_string(),
        config.generator_name.clone(),
        "-o".to_string(),
        config.output_dir.to_string_lossy().into_owned(),
    ];
    args.extend(extra.as_slice().iter().cloned());
    args
}

pub fn command_line(command: &GeneratorCommand, args: &[String]) -> String {
    let mut words = vec![command.program.to_string_lossy().into_owned()];
    words.extend(command.leading_args.iter().cloned());
    words.extend(args.iter().cloned());
    render_command_line(&words)
}

/// Runs the generator to completion. A launch failure or a nonzero exit is
/// reported as [`GenerateError::Subprocess`] with the tail of stderr.
pub fn invoke_generator(
    command: &GeneratorCommand,
    config: &GenerationConfig,
    extra: &GeneratorArgs,
) -> Result<GeneratorOutput> {
    let args = generate_arguments(config, extra);
    let line = command_line(command, &args);
    tracing::info!(client = %config.client, command = %line, "running generator");

    let output = Command::new(&command.program)
        .args(&command.leading_args)
        .args(&args)
        .output()
        .map_err(|err| GenerateError::Subprocess {
            message: format!("failed to spawn {}: {err}", command.program.display()),
            stderr: String::new(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !stdout.trim().is_empty() {
        tracing::debug!("generator stdout:\n{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        tracing::debug!("generator stderr:\n{}", stderr.trim_end());
    }

    if !output.status.success() {
        return Err(GenerateError::Subprocess {
            message: format!("{line} exited with {}", output.status),
            stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
        });
    }

    Ok(GeneratorOutput {
        command_line: line,
        stdout,
        stderr,
        exit_code: output.status.code(),
    })
}

fn tail_lines(input: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = input.lines().collect();
    if lines.len() <= max_lines {
        return input.trim_end().to_string();
    }
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
