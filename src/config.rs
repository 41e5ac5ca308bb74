use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::client::ClientKind;
use crate::error::{GenerateError, Result};
use crate::source_patch::SourcePatch;

pub const DEFAULT_CONFIG_FILE: &str = "openapi-client-generator.yaml";
pub const CONFIG_ENV: &str = "OPENAPI_CLIENT_GENERATOR_CONFIG";

const DEFAULT_APIDOC_DIR: &str = "api-docs";
const DEFAULT_SPEC_FILE: &str = "index.yaml";
const DEFAULT_OUTPUT_TEMPLATE: &str = "../openapi-client";

/// Raw contents of the YAML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub apidoc_dir: Option<PathBuf>,
    pub spec_file: Option<String>,
    pub output_root: Option<PathBuf>,
    pub output_dir_template: Option<PathBuf>,
    pub git_user: Option<String>,
    pub git_repo_template: Option<String>,
    pub git_host: Option<String>,
    pub generator_bin: Option<String>,
    pub license_template: Option<PathBuf>,
    pub php_args: ClientSection,
    pub js_args: ClientSection,
    pub nodejs_args: ClientSection,
}

/// Per-client settings (`php_args`, `js_args`, `nodejs_args`).
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSection {
    pub generator: Option<String>,
    pub params: IndexMap<String, Value>,
    pub template_dir: Option<PathBuf>,
    pub files_for_ignore: Vec<String>,
    pub source_patches: Vec<SourcePatch>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub apidoc_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub generator_bin: Option<String>,
}

/// Everything one pipeline run needs, resolved and read-only.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub client: ClientKind,
    pub spec_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_root: PathBuf,
    pub generator_name: String,
    pub generator_bin: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub additional_params: IndexMap<String, String>,
    pub git_user: Option<String>,
    pub git_repo: Option<String>,
    pub git_host: Option<String>,
    pub ignored_paths: BTreeSet<String>,
    pub license_template: Option<PathBuf>,
    pub source_patches: Vec<SourcePatch>,
}

impl ConfigFile {
    /// Loads the configuration file and returns it with the directory that
    /// relative paths inside it resolve against.
    ///
    /// An explicit path must exist. Without one, the default file in the
    /// working directory is used when present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf)> {
        let cwd = env::current_dir().map_err(|err| GenerateError::fs(".", err))?;

        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(GenerateError::config(format!(
                        "config file does not exist: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let candidate = cwd.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok((Self::default(), cwd));
                }
                candidate
            }
        };

        let contents = fs::read_to_string(&path).map_err(|err| GenerateError::fs(&path, err))?;
        let file = Self::parse(&contents)
            .map_err(|err| GenerateError::config(format!("{}: {err}", path.display())))?;
        let base = absolutize(path.parent().unwrap_or(Path::new(".")), &cwd);
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok((file, base))
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, serde_yaml_bw::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_bw::from_str(contents)
    }

    pub fn section(&self, client: ClientKind) -> &ClientSection {
        match client {
            ClientKind::Php => &self.php_args,
            ClientKind::Js => &self.js_args,
            ClientKind::NodeJs => &self.nodejs_args,
        }
    }

    /// Layers defaults, this file and `overrides` into the config for one
    /// client type.
    pub fn resolve(
        &self,
        base: &Path,
        client: ClientKind,
        overrides: &ConfigOverrides,
    ) -> Result<GenerationConfig> {
        let section = self.section(client);

        let apidoc_dir = overrides
            .apidoc_dir
            .clone()
            .or_else(|| self.apidoc_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_APIDOC_DIR));
        let spec_file = non_empty(self.spec_file.as_deref()).unwrap_or(DEFAULT_SPEC_FILE);
        let spec_path = absolutize(&apidoc_dir, base).join(spec_file);
        if !spec_path.is_file() {
            return Err(GenerateError::config(format!(
                "specification document not found: {}",
                spec_path.display()
            )));
        }

        let template = self
            .output_dir_template
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_TEMPLATE));
        let output_dir = match &overrides.output_dir {
            Some(dir) => {
                let cwd = env::current_dir().map_err(|err| GenerateError::fs(".", err))?;
                absolutize(dir, &cwd)
            }
            None => absolutize(&with_suffix(&template, client.output_suffix())?, base),
        };

        // The root never follows `--output-dir`, or the guard below could not fail.
        let output_root = match &self.output_root {
            Some(root) => absolutize(root, base),
            None => absolutize(&template, base)
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| GenerateError::config("output_dir_template has no parent"))?,
        };

        let generator_name = non_empty(section.generator.as_deref())
            .unwrap_or(client.default_generator())
            .to_string();

        let mut additional_params = IndexMap::new();
        for (name, value) in &section.params {
            additional_params.insert(name.clone(), param_to_string(name, value)?);
        }

        let git_repo = non_empty(self.git_repo_template.as_deref())
            .map(|template| format!("{template}-{}", client.output_suffix()));

        let config = GenerationConfig {
            client,
            spec_path,
            output_dir,
            output_root,
            generator_name,
            generator_bin: overrides
                .generator_bin
                .clone()
                .or_else(|| self.generator_bin.clone()),
            template_dir: section
                .template_dir
                .as_ref()
                .map(|dir| absolutize(dir, base)),
            additional_params,
            git_user: self.git_user.clone(),
            git_repo,
            git_host: self.git_host.clone(),
            ignored_paths: section
                .files_for_ignore
                .iter()
                .map(|path| normalize_relative(path))
                .filter(|path| !path.is_empty())
                .collect(),
            license_template: self
                .license_template
                .as_ref()
                .map(|path| absolutize(path, base)),
            source_patches: section.source_patches.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl GenerationConfig {
    /// Directory that holds the root specification document.
    pub fn spec_dir(&self) -> &Path {
        self.spec_path.parent().unwrap_or(Path::new("."))
    }

    /// Rejects an output directory that is not strictly inside the output
    /// root; clearing anything else could destroy unrelated files.
    pub fn validate(&self) -> Result<()> {
        if self.generator_name.trim().is_empty() {
            return Err(GenerateError::config("generator name is empty"));
        }
        let output_dir = normalize_path(&self.output_dir);
        let output_root = normalize_path(&self.output_root);
        if !output_dir.is_absolute() {
            return Err(GenerateError::config(format!(
                "output directory must be absolute: {}",
                self.output_dir.display()
            )));
        }
        if output_dir == output_root || !output_dir.starts_with(&output_root) {
            return Err(GenerateError::config(format!(
                "output directory {} is not inside output root {}",
                output_dir.display(),
                output_root.display()
            )));
        }
        Ok(())
    }
}

fn param_to_string(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(value) => Ok(value.clone()),
        Value::Bool(value) => Ok(value.to_string()),
        Value::Number(value) => Ok(value.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(GenerateError::config(format!(
            "generator parameter {name} must be a scalar"
        ))),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn with_suffix(path: &Path, suffix: &str) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        GenerateError::config(format!(
            "output_dir_template has no final component: {}",
            path.display()
        ))
    })?;
    let mut name = OsString::from(name);
    name.push(format!("-{suffix}"));
    Ok(path.with_file_name(name))
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Resolves `.` and `..` lexically, without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Ignore-list entries are compared as `/`-separated relative paths.
pub fn normalize_relative(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}
