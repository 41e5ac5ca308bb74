#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use openapi_client_gen::client::ClientKind;
use openapi_client_gen::config::GenerationConfig;
use walkdir::WalkDir;

pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn spec_path() -> PathBuf {
    fixtures_root().join("api-docs/index.yaml")
}

pub fn copy_dir(src: &Path, dest: &Path) {
    for entry in WalkDir::new(src).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(src).unwrap();
        let dest_path = dest.join(rel);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::copy(entry.path(), dest_path).unwrap();
    }
}

pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Sorted `/`-separated relative paths of every file under `root`.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

pub fn generation_config(
    client: ClientKind,
    output_root: &Path,
    output_dir: &Path,
    generator_bin: &Path,
) -> GenerationConfig {
    GenerationConfig {
        client,
        spec_path: spec_path(),
        output_dir: output_dir.to_path_buf(),
        output_root: output_root.to_path_buf(),
        generator_name: client.default_generator().to_string(),
        generator_bin: Some(generator_bin.to_string_lossy().into_owned()),
        template_dir: None,
        additional_params: IndexMap::new(),
        git_user: None,
        git_repo: None,
        git_host: None,
        ignored_paths: BTreeSet::new(),
        license_template: None,
        source_patches: Vec::new(),
    }
}

/// A stand-in for openapi-generator-cli. It records its arguments in
/// `<out>/.generator-args`, copies `fixtures` into `<out>`, and exits with
/// status 3 when `fail` is set.
pub fn create_fake_generator(dir: &Path, fixtures: Option<&Path>, fail: bool) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let fixtures = fixtures
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_default();

    if cfg!(windows) {
        let path = dir.join("openapi-generator-cli.cmd");
        let contents = format!(
            r#"@echo off
if not "%1"=="generate" exit /b 1
if "{fail}"=="1" (
  echo error: generator exploded 1>&2
  exit /b 3
)
set OUT=
:loop
if "%~1"=="" goto done
if "%~1"=="-o" (
  set OUT=%~2
  shift
  shift
  goto loop
)
shift
goto loop
:done
if "%OUT%"=="" exit /b 1
if not exist "%OUT%" mkdir "%OUT%"
echo generated> "%OUT%\.generator-args"
if not "{fixtures}"=="" xcopy /E /I /Y /Q "{fixtures}" "%OUT%" >nul
exit /b 0
"#,
            fail = if fail { "1" } else { "0" },
            fixtures = fixtures,
        );
        fs::write(&path, contents).unwrap();
        path
    } else {
        let path = dir.join("openapi-generator-cli");
        let contents = format!(
            r#"#!/usr/bin/env bash
set -euo pipefail
all_args=("$@")
cmd="${{1:-}}"
shift || true
[[ "$cmd" == "generate" ]] || {{ echo "unknown command $cmd" >&2; exit 1; }}
if [[ "{fail}" == "1" ]]; then
  echo "error: generator exploded" >&2
  exit 3
fi
out=""
while [[ $# -gt 0 ]]; do
  case "$1" in
    -o)
      out="$2"
      shift 2
      ;;
    *)
      shift
      ;;
  esac
done
[[ -n "$out" ]] || {{ echo "missing -o" >&2; exit 1; }}
mkdir -p "$out"
printf '%s\n' "${{all_args[@]}}" > "$out/.generator-args"
if [[ -n "{fixtures}" ]]; then
  cp -R "{fixtures}/." "$out/"
fi
echo "generated client in $out"
"#,
            fail = if fail { "1" } else { "0" },
            fixtures = fixtures,
        );
        fs::write(&path, contents).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
        }
        path
    }
}
