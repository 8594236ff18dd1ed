//! Compiler options read from a TOML file

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options steering one compilation
///
/// ```toml
/// include_builtins = true
/// module_extension = "run"
/// search_paths = ["lib"]
///
/// [defines]
/// DEBUG = "1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileOptions {
    /// Register the primitive classes before user code
    #[serde(default = "default_include_builtins")]
    pub include_builtins: bool,

    /// Extension given to imports written without one
    #[serde(default = "default_module_extension")]
    pub module_extension: String,

    /// Directories searched for imports after the importing file's own
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Preprocessor defines handed to the code generator
    #[serde(default)]
    pub defines: IndexMap<String, String>,
}

fn default_include_builtins() -> bool {
    true
}

fn default_module_extension() -> String {
    "run".to_string()
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            include_builtins: default_include_builtins(),
            module_extension: default_module_extension(),
            search_paths: Vec::new(),
            defines: IndexMap::new(),
        }
    }
}

impl CompileOptions {
    /// Parse options from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse compiler options")
    }

    /// Load options from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse options file: {}", path.display()))
    }
}
