//! C# support: parsing, call matching, extraction, rewriting and the
//! generated constants container

pub mod container;
pub mod extractor;
pub mod literals;
pub mod matcher;
pub mod rewriter;

use keyhoist_core::error::{Error, Result};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

pub use container::{AppendOutcome, ContainerContents, ContainerSpec};
pub use extractor::{CallExtractor, Extraction, ExtractionSummary, ParseFailure};
pub use matcher::{CallMatch, CallMatcher, CallSite, SentinelCall, Verdict};
pub use rewriter::{CallRewriter, RewriteResult, RewriteSummary};

/// Reusable tree-sitter parser configured for C#
pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_c_sharp::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| Error::parse("<language>", format!("Failed to set C# language: {e}")))?;
        Ok(Self { parser })
    }

    /// Parse source text into a [`SourceUnit`]
    pub fn parse(&mut self, path: impl Into<PathBuf>, text: String) -> Result<SourceUnit> {
        let path = path.into();
        let tree = self
            .parser
            .parse(&text, None)
            .ok_or_else(|| Error::parse_path(&path, "Parser produced no syntax tree"))?;
        Ok(SourceUnit { path, text, tree })
    }

    /// Read a file as UTF-8 and parse it
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceUnit> {
        let bytes = std::fs::read(path).map_err(|e| Error::io_at(path, e))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| Error::parse_path(path, "File is not valid UTF-8"))?;
        self.parse(path, text)
    }
}

/// One parsed file: its path, text and syntax tree
pub struct SourceUnit {
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
}

impl SourceUnit {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Source text of a node
    pub fn node_text(&self, node: Node<'_>) -> &str {
        node_text(&self.text, node)
    }

    /// First error or missing node, for diagnostics
    pub fn first_error_line(&self) -> Option<usize> {
        first_error(self.root()).map(|n| n.start_position().row + 1)
    }
}

pub(crate) fn node_text<'a>(source: &'a str, node: Node<'_>) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}
