//! Source file discovery
//!
//! Walks a root directory and returns every file with one of the configured
//! extensions, minus excluded paths, in sorted order.

use glob::Pattern;
use ignore::WalkBuilder;
use keyhoist_core::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Filter describing which files a pass visits
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: Vec<String>,
    exclude: Vec<Pattern>,
    respect_gitignore: bool,
    skip: Vec<PathBuf>,
}

impl FileFilter {
    /// Build a filter from extensions (without dots) and exclude globs
    pub fn new(extensions: &[String], exclude: &[String], respect_gitignore: bool) -> Result<Self> {
        let exclude = exclude
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| Error::config(format!("Invalid exclude pattern '{p}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude,
            respect_gitignore,
            skip: Vec::new(),
        })
    }

    /// Never return this exact file (e.g. the generated constants file)
    pub fn skipping(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip.push(path.into());
        self
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.exclude.iter().any(|pattern| {
            pattern.matches_path(relative)
                || relative
                    .components()
                    .any(|c| pattern.matches(&c.as_os_str().to_string_lossy()))
        })
    }

    fn is_skipped(&self, path: &Path) -> bool {
        self.skip.iter().any(|s| same_file(s, path))
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Collect matching files under `root`, sorted by path
///
/// Sorting makes first-occurrence semantics independent of the platform's
/// directory enumeration order.
pub fn discover_files(root: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::invalid_input(format!(
            "Root directory does not exist: {}",
            root.display()
        )));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(filter.respect_gitignore)
        .hidden(false)
        .require_git(false)
        .filter_entry({
            let filter = filter.clone();
            let root = root.to_path_buf();
            move |entry| entry.depth() == 0 || !filter.is_excluded(&root, entry.path())
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error reading file entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        if !filter.has_extension(path) || filter.is_skipped(path) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn default_filter() -> FileFilter {
        FileFilter::new(
            &["cs".to_string()],
            &["bin".to_string(), "obj".to_string(), ".git".to_string()],
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_extension_and_exclude_filters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "b/Page.cs");
        touch(root, "a/View.cs");
        touch(root, "a/View.xaml");
        touch(root, "bin/Debug/Gen.cs");
        touch(root, "src/obj/Temp.cs");

        let files = discover_files(root, &default_filter()).unwrap();
        assert_eq!(names(root, &files), vec!["a/View.cs", "b/Page.cs"]);
    }

    #[test]
    fn test_skipping_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "FormConstants.cs");
        touch(root, "Page.cs");

        let filter = default_filter().skipping(root.join("FormConstants.cs"));
        let files = discover_files(root, &filter).unwrap();
        assert_eq!(names(root, &files), vec!["Page.cs"]);
    }

    #[test]
    fn test_gitignore_toggle() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join(".gitignore"), "ignored/\n").unwrap();
        touch(root, "ignored/Skip.cs");
        touch(root, "Keep.cs");

        let files = discover_files(root, &default_filter()).unwrap();
        assert_eq!(files.len(), 2);

        let respecting = FileFilter::new(&["cs".to_string()], &[], true).unwrap();
        let files = discover_files(root, &respecting).unwrap();
        assert_eq!(names(root, &files), vec!["Keep.cs"]);
    }

    #[test]
    fn test_missing_root() {
        let result = discover_files(Path::new("/definitely/not/here"), &default_filter());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        assert!(FileFilter::new(&["cs".to_string()], &["[".to_string()], false).is_err());
    }
}
