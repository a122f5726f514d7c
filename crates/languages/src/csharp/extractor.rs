//! Extraction pass: collect every matched lookup call from a file set

use super::matcher::{for_each_call, CallMatcher, Verdict, Visit};
use super::{CSharpParser, SourceUnit};
use keyhoist_core::entities::{MatchRecord, SourceLocation};
use keyhoist_core::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file skipped because it could not be read or parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Counters for one extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub files_scanned: usize,
    pub parse_failures: Vec<ParseFailure>,
    /// Calls whose shape and category matched
    pub matches: usize,
    /// Calls whose shape matched but whose category did not
    pub filtered: usize,
}

/// Records found by one pass, in file order then document order
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<MatchRecord>,
    pub summary: ExtractionSummary,
}

/// Runs a [`CallMatcher`] over files and collects [`MatchRecord`]s
pub struct CallExtractor<M: CallMatcher> {
    matcher: M,
    parser: CSharpParser,
    skip_on_syntax_error: bool,
}

impl<M: CallMatcher> CallExtractor<M> {
    pub fn new(matcher: M, skip_on_syntax_error: bool) -> Result<Self> {
        Ok(Self {
            matcher,
            parser: CSharpParser::new()?,
            skip_on_syntax_error,
        })
    }

    /// Extract from every file; unreadable or unparsable files are counted, not fatal
    pub fn extract_files(&mut self, files: &[PathBuf]) -> Extraction {
        let mut extraction = Extraction::default();

        for path in files {
            extraction.summary.files_scanned += 1;
            match self.load(path) {
                Ok(unit) => {
                    let found = self.extract_unit(&unit, &mut extraction);
                    if found > 0 {
                        debug!("{}: {found} matched calls", path.display());
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    extraction.summary.parse_failures.push(ParseFailure {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Scanned {} files: {} matched calls, {} filtered by category, {} skipped",
            extraction.summary.files_scanned,
            extraction.summary.matches,
            extraction.summary.filtered,
            extraction.summary.parse_failures.len()
        );
        extraction
    }

    /// Extract from in-memory source text
    pub fn extract_source(&mut self, path: impl Into<PathBuf>, text: &str) -> Result<Extraction> {
        let unit = self.parser.parse(path, text.to_string())?;
        self.check_syntax(&unit)?;
        let mut extraction = Extraction::default();
        extraction.summary.files_scanned = 1;
        self.extract_unit(&unit, &mut extraction);
        Ok(extraction)
    }

    fn load(&mut self, path: &Path) -> Result<SourceUnit> {
        let unit = self.parser.parse_file(path)?;
        self.check_syntax(&unit)?;
        Ok(unit)
    }

    fn check_syntax(&self, unit: &SourceUnit) -> Result<()> {
        if self.skip_on_syntax_error && unit.has_syntax_errors() {
            let line = unit
                .first_error_line()
                .map(|l| format!(" near line {l}"))
                .unwrap_or_default();
            return Err(Error::parse_path(
                &unit.path,
                format!("Syntax errors{line}"),
            ));
        }
        Ok(())
    }

    fn extract_unit(&self, unit: &SourceUnit, extraction: &mut Extraction) -> usize {
        let mut found = 0;
        for_each_call(unit, |call| {
            match self.matcher.evaluate(call) {
                Verdict::Match(m) => {
                    found += 1;
                    extraction.records.push(MatchRecord::new(
                        m.category,
                        m.raw_key,
                        SourceLocation::new(&unit.path, call.line, call.column),
                    ));
                }
                Verdict::Filtered(_) => extraction.summary.filtered += 1,
                Verdict::NoMatch => {}
            }
            Visit::Continue
        });
        extraction.summary.matches += found;
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csharp::SentinelCall;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn extractor(skip: bool) -> CallExtractor<SentinelCall> {
        CallExtractor::new(SentinelCall::new("NexgenAMCaption", "Get", "Inspection"), skip).unwrap()
    }

    #[test]
    fn test_extract_source_records_and_counts() {
        let source = r#"class Page {
    void Load() {
        Title = NexgenAMCaption.Get("Inspection", "roomTitle");
        Sub = NexgenAMCaption.Get("Other", "x");
    }
}"#;
        let extraction = extractor(true).extract_source("Page.cs", source).unwrap();

        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.category, "Inspection");
        assert_eq!(record.raw_key, "roomTitle");
        assert_eq!(record.location.line, 3);
        assert_eq!(record.location.file, PathBuf::from("Page.cs"));
        assert_eq!(extraction.summary.matches, 1);
        assert_eq!(extraction.summary.filtered, 1);
    }

    #[test]
    fn test_extract_files_counts_failures() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("Good.cs");
        let broken = dir.path().join("Broken.cs");
        let binary = dir.path().join("Binary.cs");
        fs::write(
            &good,
            r#"class G { string T => NexgenAMCaption.Get("Inspection", "a"); }"#,
        )
        .unwrap();
        fs::write(
            &broken,
            r#"class B { void M( { NexgenAMCaption.Get("Inspection", "b"); "#,
        )
        .unwrap();
        fs::write(&binary, [0xffu8, 0xfe, 0x00]).unwrap();

        let extraction = extractor(true).extract_files(&[binary.clone(), broken.clone(), good]);

        assert_eq!(extraction.summary.files_scanned, 3);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].raw_key, "a");
        let failed: Vec<&PathBuf> = extraction
            .summary
            .parse_failures
            .iter()
            .map(|f| &f.path)
            .collect();
        assert_eq!(failed, vec![&binary, &broken]);
    }

    #[test]
    fn test_syntax_errors_tolerated_when_not_skipping() {
        let source = r#"class B { void M() { var t = NexgenAMCaption.Get("Inspection", "b"); } "#;
        let extraction = extractor(false).extract_source("B.cs", source).unwrap();
        assert_eq!(extraction.records.len(), 1);
    }

    #[test]
    fn test_duplicates_are_all_recorded() {
        let source = r#"class P {
    string A => NexgenAMCaption.Get("Inspection", "same");
    string B => NexgenAMCaption.Get("Inspection", "same");
}"#;
        let extraction = extractor(true).extract_source("P.cs", source).unwrap();
        let lines: Vec<usize> = extraction.records.iter().map(|r| r.location.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }
}
