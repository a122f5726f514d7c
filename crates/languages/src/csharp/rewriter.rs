//! Rewrite pass: replace matched calls with references to generated constants

use super::matcher::{for_each_call, CallMatcher, Verdict, Visit};
use super::{CSharpParser, SourceUnit};
use keyhoist_core::error::{Error, Result};
use keyhoist_core::mapping::ConstantMapping;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::extractor::ParseFailure;

/// Result of rewriting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    Unchanged,
    Rewritten { text: String, replacements: usize },
}

/// Counters for one rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub files_scanned: usize,
    /// Files whose text changed (written unless dry-run)
    pub files_rewritten: Vec<PathBuf>,
    pub replacements: usize,
    pub parse_failures: Vec<ParseFailure>,
}

/// Replaces matched calls with `<Container>.<IDENT>`, leaving all other bytes intact
pub struct CallRewriter<'m, M: CallMatcher> {
    matcher: M,
    mapping: &'m ConstantMapping,
    container: String,
    parser: CSharpParser,
    skip_on_syntax_error: bool,
}

impl<'m, M: CallMatcher> CallRewriter<'m, M> {
    pub fn new(
        matcher: M,
        mapping: &'m ConstantMapping,
        container: impl Into<String>,
        skip_on_syntax_error: bool,
    ) -> Result<Self> {
        Ok(Self {
            matcher,
            mapping,
            container: container.into(),
            parser: CSharpParser::new()?,
            skip_on_syntax_error,
        })
    }

    /// Rewrite source text without touching the filesystem
    pub fn rewrite_source(&mut self, path: impl Into<PathBuf>, text: &str) -> Result<RewriteResult> {
        let unit = self.parser.parse(path, text.to_string())?;
        self.rewrite_unit(&unit)
    }

    /// Rewrite every file in place; with `dry_run` nothing is written
    pub fn rewrite_files(&mut self, files: &[PathBuf], dry_run: bool) -> Result<RewriteSummary> {
        let mut summary = RewriteSummary::default();

        for path in files {
            summary.files_scanned += 1;
            let result = match self.rewrite_path(path) {
                Ok(result) => result,
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    summary.parse_failures.push(ParseFailure {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if let RewriteResult::Rewritten { text, replacements } = result {
                if dry_run {
                    info!("Would rewrite {} ({replacements} calls)", path.display());
                } else {
                    write_in_place(path, &text)?;
                    debug!("Rewrote {} ({replacements} calls)", path.display());
                }
                summary.replacements += replacements;
                summary.files_rewritten.push(path.clone());
            }
        }

        info!(
            "Rewrote {} calls in {} of {} files",
            summary.replacements,
            summary.files_rewritten.len(),
            summary.files_scanned
        );
        Ok(summary)
    }

    fn rewrite_path(&mut self, path: &Path) -> Result<RewriteResult> {
        let unit = self.parser.parse_file(path)?;
        self.rewrite_unit(&unit)
    }

    fn rewrite_unit(&self, unit: &SourceUnit) -> Result<RewriteResult> {
        if self.skip_on_syntax_error && unit.has_syntax_errors() {
            return Err(Error::parse_path(&unit.path, "Syntax errors"));
        }

        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for_each_call(unit, |call| {
            let Verdict::Match(found) = self.matcher.evaluate(call) else {
                return Visit::Continue;
            };
            match self.mapping.lookup(&found.category, &found.raw_key) {
                Some(entry) => {
                    edits.push((
                        call.span.clone(),
                        format!("{}.{}", self.container, entry.identifier),
                    ));
                    Visit::SkipChildren
                }
                None => Visit::Continue,
            }
        });

        if edits.is_empty() {
            return Ok(RewriteResult::Unchanged);
        }

        let replacements = edits.len();
        let text = apply_edits(&unit.text, edits);
        if text == unit.text {
            return Ok(RewriteResult::Unchanged);
        }
        Ok(RewriteResult::Rewritten { text, replacements })
    }
}

/// Apply non-overlapping byte-span edits back to front
fn apply_edits(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut text = source.to_string();
    for (span, replacement) in edits {
        text.replace_range(span, &replacement);
    }
    text
}

fn write_in_place(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| Error::io_at(path, e))
}
