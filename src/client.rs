use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::GenerationConfig;
use crate::enum_patch::EnumPatcher;
use crate::error::Result;
use crate::source_patch::apply_source_patches;

/// Target client packages this tool knows how to produce.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Php,
    Js,
    NodeJs,
}

impl ClientKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Js => "js",
            Self::NodeJs => "nodejs",
        }
    }

    /// Appended to `output_dir_template` and `git_repo_template`.
    /// The NodeJS client shares the `-js` package location.
    pub fn output_suffix(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Js | Self::NodeJs => "js",
        }
    }

    pub fn default_generator(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Js => "javascript",
            Self::NodeJs => "typescript-axios",
        }
    }

    /// Post-generation step for this client type.
    pub fn patcher(self) -> Box<dyn ClientPatch> {
        match self {
            Self::NodeJs => Box::new(EnumPatcher::typescript()),
            Self::Php | Self::Js => Box::new(ConfiguredSourcePatches),
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rewrites generated output after the generator has run.
/// Returns the files that were changed.
pub trait ClientPatch {
    fn patch(&self, config: &GenerationConfig) -> Result<Vec<PathBuf>>;
}

impl ClientPatch for EnumPatcher {
    fn patch(&self, config: &GenerationConfig) -> Result<Vec<PathBuf>> {
        self.patch_tree(&config.output_dir, &config.spec_path)
    }
}

struct ConfiguredSourcePatches;

impl ClientPatch for ConfiguredSourcePatches {
    fn patch(&self, config: &GenerationConfig) -> Result<Vec<PathBuf>> {
        apply_source_patches(&config.output_dir, &config.source_patches)
    }
}
