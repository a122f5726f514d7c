//! Named regex scans over source text (API routes, UI strings)

use crate::discovery::{discover_files, FileFilter};
use keyhoist_core::config::ScanPattern;
use keyhoist_core::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One regex hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    pub pattern: String,
    /// Capture group 1, or the whole match when the regex has no groups
    pub value: String,
    pub file: PathBuf,
    /// 1-based
    pub line: usize,
}

/// A compiled [`ScanPattern`]
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    regex: Regex,
    filter: FileFilter,
}

impl CompiledPattern {
    pub fn new(pattern: &ScanPattern, exclude: &[String]) -> Result<Self> {
        let regex = Regex::new(&pattern.regex).map_err(|e| {
            Error::config(format!("Invalid regex for scan pattern '{}': {e}", pattern.name))
        })?;
        Ok(Self {
            name: pattern.name.clone(),
            regex,
            filter: FileFilter::new(&pattern.extensions, exclude, false)?,
        })
    }

    /// Every hit in one text, in order
    pub fn scan_text(&self, file: &Path, text: &str) -> Vec<ScanHit> {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(1).or_else(|| caps.get(0))?;
                let line = line_starts.partition_point(|&start| start <= m.start());
                Some(ScanHit {
                    pattern: self.name.clone(),
                    value: m.as_str().to_string(),
                    file: file.to_path_buf(),
                    line,
                })
            })
            .collect()
    }
}

/// Run every pattern over the files under `root` that carry its extensions
///
/// Results are grouped by pattern, in the order the patterns are configured.
pub fn scan_tree(
    root: &Path,
    patterns: &[ScanPattern],
    exclude: &[String],
) -> Result<Vec<(String, Vec<ScanHit>)>> {
    let mut results = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let compiled = CompiledPattern::new(pattern, exclude)?;
        let mut hits = Vec::new();
        for file in discover_files(root, &compiled.filter)? {
            match std::fs::read_to_string(&file) {
                Ok(text) => hits.extend(compiled.scan_text(&file, &text)),
                Err(e) => warn!("Skipping {}: {e}", file.display()),
            }
        }
        info!("Pattern {}: {} hits", compiled.name, hits.len());
        results.push((compiled.name, hits));
    }
    Ok(results)
}
