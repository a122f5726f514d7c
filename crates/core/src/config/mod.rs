//! Configuration module for keyhoist
//!
//! Every parameter the refactoring passes and reporters need lives here:
//! the sentinel call shape, the generated container, the walked file set,
//! the package registry and caption endpoints, and the report output.
//! Configuration can be loaded from TOML files and/or environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.keyhoist/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".keyhoist").join("config.toml"))
}

/// Main configuration structure for keyhoist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Call extraction and rewrite configuration
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Package registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Caption endpoint configuration
    #[serde(default)]
    pub captions: CaptionsConfig,

    /// Report output configuration
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Text pattern scanning configuration
    #[serde(default)]
    pub scan: ScanConfig,
}

/// How the constants container is written when it already exists
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GenerationMode {
    /// Keep existing entries and identifiers, add new ones at the end
    #[default]
    Append,
    /// Ignore the existing file and regenerate it from this run only
    Overwrite,
}

/// What to do when two keys normalize to the same identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollisionPolicy {
    /// Append `_2`, `_3`, ... to the later identifier
    #[default]
    Suffix,
    /// Abort the run
    Error,
}

/// Configuration for the extract / generate / rewrite passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Root directory walked recursively
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Source file extensions (without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns matched against path components and relative paths
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Honour .gitignore files while walking
    #[serde(default = "default_respect_gitignore")]
    pub respect_gitignore: bool,

    /// Receiver expression text of the lookup call (e.g. `NexgenAMCaption`)
    #[serde(default = "default_receiver")]
    pub receiver: String,

    /// Invoked member name of the lookup call (e.g. `Get`)
    #[serde(default = "default_method")]
    pub method: String,

    /// Only calls whose first argument equals this category are hoisted
    #[serde(default = "default_category")]
    pub category: String,

    /// Parameter name of the category argument, for calls using named arguments
    #[serde(default = "default_category_parameter")]
    pub category_parameter: String,

    /// Parameter name of the key argument, for calls using named arguments
    #[serde(default = "default_key_parameter")]
    pub key_parameter: String,

    /// Name of the generated static class
    #[serde(default = "default_container")]
    pub container: String,

    /// Generated file path, relative to `root` unless absolute
    #[serde(default = "default_constants_file")]
    pub constants_file: PathBuf,

    /// Optional file-scoped namespace for the generated class
    #[serde(default)]
    pub namespace: Option<String>,

    /// Extra `using` directives emitted at the top of the generated file
    #[serde(default)]
    pub usings: Vec<String>,

    #[serde(default)]
    pub mode: GenerationMode,

    #[serde(default)]
    pub on_collision: CollisionPolicy,

    /// Skip (and count) files whose syntax tree contains errors
    #[serde(default = "default_skip_on_syntax_error")]
    pub skip_on_syntax_error: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extensions: default_extensions(),
            exclude: default_exclude(),
            respect_gitignore: default_respect_gitignore(),
            receiver: default_receiver(),
            method: default_method(),
            category: default_category(),
            category_parameter: default_category_parameter(),
            key_parameter: default_key_parameter(),
            container: default_container(),
            constants_file: default_constants_file(),
            namespace: None,
            usings: Vec::new(),
            mode: GenerationMode::default(),
            on_collision: CollisionPolicy::default(),
            skip_on_syntax_error: default_skip_on_syntax_error(),
        }
    }
}

impl ExtractConfig {
    /// Absolute (or root-joined) path of the generated constants file
    pub fn constants_path(&self) -> PathBuf {
        if self.constants_file.is_absolute() {
            self.constants_file.clone()
        } else {
            self.root.join(&self.constants_file)
        }
    }
}

/// Named toggles for the package compatibility filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityPolicy {
    /// Consider prerelease versions (`1.2.0-beta`)
    #[serde(default = "default_false")]
    pub include_prerelease: bool,

    /// Skip versions the registry marks as unlisted
    #[serde(default = "default_true")]
    pub require_listed: bool,

    /// Accept `netX.Y` targets lower than the target framework
    #[serde(default = "default_true")]
    pub allow_forward_compatible: bool,

    /// Accept `netstandard2.0` / `netstandard2.1` targets
    #[serde(default = "default_true")]
    pub allow_netstandard: bool,

    /// Accept versions that declare no dependency groups at all
    #[serde(default = "default_true")]
    pub treat_no_dependency_groups_as_compatible: bool,
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        Self {
            include_prerelease: default_false(),
            require_listed: default_true(),
            allow_forward_compatible: default_true(),
            allow_netstandard: default_true(),
            treat_no_dependency_groups_as_compatible: default_true(),
        }
    }
}

/// Configuration for the NuGet registration API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registration base URL; `{base}/{id}/index.json` is requested per package
    #[serde(default = "default_registry_base_url")]
    pub base_url: String,

    /// Target framework moniker packages are evaluated against
    #[serde(default = "default_target_framework")]
    pub target_framework: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per package before the row is marked as an error
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,

    #[serde(default)]
    pub policy: CompatibilityPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_base_url(),
            target_framework: default_target_framework(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            policy: CompatibilityPolicy::default(),
        }
    }
}

/// Configuration for the authenticated caption list endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct CaptionsConfig {
    /// Endpoint returning `[{ id, module, label, caption, language }]`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token (or use KEYHOIST_CAPTIONS_TOKEN env var)
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts before giving up
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl std::fmt::Debug for CaptionsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionsConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "***REDACTED***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .finish()
    }
}

/// Configuration for spreadsheet output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Directory workbooks are written to, relative to the working directory
    #[serde(default = "default_reports_dir")]
    pub output_dir: PathBuf,

    /// Write `extraction.xlsx` after `hoist` / `extract`
    #[serde(default = "default_true")]
    pub write_extraction_report: bool,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_reports_dir(),
            write_extraction_report: default_true(),
        }
    }
}

/// One named text pattern searched by the `scan` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPattern {
    /// Sheet name in the scan report
    pub name: String,

    /// Regular expression; capture group 1 (or the whole match) is reported
    pub regex: String,

    /// File extensions the pattern applies to
    pub extensions: Vec<String>,
}

/// Configuration for the `scan` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_scan_patterns")]
    pub patterns: Vec<ScanPattern>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            patterns: default_scan_patterns(),
        }
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let extract = &self.extract;

        for (name, value) in [
            ("extract.receiver", &extract.receiver),
            ("extract.method", &extract.method),
            ("extract.category", &extract.category),
            ("extract.category_parameter", &extract.category_parameter),
            ("extract.key_parameter", &extract.key_parameter),
            ("extract.container", &extract.container),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{name} must not be empty")));
            }
        }

        if !is_valid_identifier(&extract.container) {
            return Err(Error::config(format!(
                "extract.container '{}' is not a valid C# identifier",
                extract.container
            )));
        }

        if extract.extensions.is_empty() {
            return Err(Error::config(
                "extract.extensions must list at least one extension".to_string(),
            ));
        }

        for pattern in &extract.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::config(format!("Invalid extract.exclude pattern '{pattern}': {e}"))
            })?;
        }

        if self.registry.timeout_secs == 0 {
            return Err(Error::config(
                "registry.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.registry.retry_attempts == 0 {
            return Err(Error::config(
                "registry.retry_attempts must be greater than 0".to_string(),
            ));
        }
        if self.captions.timeout_secs == 0 {
            return Err(Error::config(
                "captions.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.captions.retry_attempts == 0 {
            return Err(Error::config(
                "captions.retry_attempts must be greater than 0".to_string(),
            ));
        }

        for pattern in &self.scan.patterns {
            if pattern.name.trim().is_empty() {
                return Err(Error::config("scan pattern name must not be empty".to_string()));
            }
            regex::Regex::new(&pattern.regex).map_err(|e| {
                Error::config(format!(
                    "Invalid regex for scan pattern '{}': {e}",
                    pattern.name
                ))
            })?;
        }

        Ok(())
    }

    /// Apply a `--root` override, keeping a relative constants file under it
    pub fn with_root(mut self, root: &Path) -> Self {
        self.extract.root = root.to_path_buf();
        self
    }
}

/// Checks `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
