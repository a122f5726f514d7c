//! Default values and functions for configuration

use super::ScanPattern;
use std::path::PathBuf;

// Default constants
pub(crate) const DEFAULT_RECEIVER: &str = "NexgenAMCaption";
pub(crate) const DEFAULT_METHOD: &str = "Get";
pub(crate) const DEFAULT_CATEGORY: &str = "Inspection";
pub(crate) const DEFAULT_CATEGORY_PARAMETER: &str = "category";
pub(crate) const DEFAULT_KEY_PARAMETER: &str = "key";
pub(crate) const DEFAULT_CONTAINER: &str = "FormConstants";
pub(crate) const DEFAULT_CONSTANTS_FILE: &str = "FormConstants.cs";
pub(crate) const DEFAULT_REGISTRY_BASE_URL: &str =
    "https://api.nuget.org/v3/registration5-semver1/";
pub(crate) const DEFAULT_TARGET_FRAMEWORK: &str = "net10.0";
pub(crate) const DEFAULT_REPORTS_DIR: &str = "reports";

pub(crate) fn default_root() -> PathBuf {
    PathBuf::from(".")
}

pub(crate) fn default_extensions() -> Vec<String> {
    vec!["cs".to_string()]
}

pub(crate) fn default_exclude() -> Vec<String> {
    vec!["bin".to_string(), "obj".to_string(), ".git".to_string()]
}

pub(crate) fn default_respect_gitignore() -> bool {
    false
}

pub(crate) fn default_receiver() -> String {
    DEFAULT_RECEIVER.to_string()
}

pub(crate) fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

pub(crate) fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

pub(crate) fn default_category_parameter() -> String {
    DEFAULT_CATEGORY_PARAMETER.to_string()
}

pub(crate) fn default_key_parameter() -> String {
    DEFAULT_KEY_PARAMETER.to_string()
}

pub(crate) fn default_container() -> String {
    DEFAULT_CONTAINER.to_string()
}

pub(crate) fn default_constants_file() -> PathBuf {
    PathBuf::from(DEFAULT_CONSTANTS_FILE)
}

pub(crate) fn default_skip_on_syntax_error() -> bool {
    true
}

pub(crate) fn default_registry_base_url() -> String {
    DEFAULT_REGISTRY_BASE_URL.to_string()
}

pub(crate) fn default_target_framework() -> String {
    DEFAULT_TARGET_FRAMEWORK.to_string()
}

pub(crate) fn default_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_retry_attempts() -> usize {
    3
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_false() -> bool {
    false
}

pub(crate) fn default_reports_dir() -> PathBuf {
    PathBuf::from(DEFAULT_REPORTS_DIR)
}

pub(crate) fn default_scan_patterns() -> Vec<ScanPattern> {
    vec![
        ScanPattern {
            name: "api_routes".to_string(),
            regex: r#""(/?api/[^"\s]*)""#.to_string(),
            extensions: vec!["cs".to_string()],
        },
        ScanPattern {
            name: "ui_strings".to_string(),
            regex: r#"\b(?:Text|Title|Placeholder)\s*=\s*"([^"{][^"]*)""#.to_string(),
            extensions: vec!["xaml".to_string(), "axml".to_string(), "xml".to_string()],
        },
    ]
}
